use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::http_client::HttpClientTrait;
use crate::domain::{
    Candidate, DomainError, FaceHandle, FaceService, IdentificationCandidate, PersistedFaceId,
    PersonEntity, PersonGroupId, PersonId, TrainingStatus, TrainingStatusKind,
};

/// Azure Face API configuration
#[derive(Debug, Clone)]
pub struct AzureFaceConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Upper bound on candidates returned per face by identify
    pub max_candidates: u32,
}

pub const DEFAULT_MAX_CANDIDATES: u32 = 10;

impl AzureFaceConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    pub fn with_max_candidates(mut self, max: u32) -> Self {
        self.max_candidates = max;
        self
    }
}

/// Azure Face API client backed by large person groups
#[derive(Debug)]
pub struct AzureFaceClient<C: HttpClientTrait> {
    client: C,
    config: AzureFaceConfig,
}

impl<C: HttpClientTrait> AzureFaceClient<C> {
    pub fn new(client: C, config: AzureFaceConfig) -> Self {
        Self { client, config }
    }

    fn build_url(&self, path: &str) -> String {
        format!(
            "{}/face/v1.0/{}",
            self.config.endpoint.trim_end_matches('/'),
            path
        )
    }

    fn group_url(&self, group_id: &PersonGroupId, suffix: &str) -> String {
        self.build_url(&format!("largepersongroups/{}{}", group_id, suffix))
    }

    fn json_headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Ocp-Apim-Subscription-Key", self.config.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn binary_headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Ocp-Apim-Subscription-Key", self.config.api_key.as_str()),
            ("Content-Type", "application/octet-stream"),
        ]
    }
}

fn decode<T: for<'de> Deserialize<'de>>(
    operation: &str,
    json: serde_json::Value,
) -> Result<T, DomainError> {
    serde_json::from_value(json).map_err(|e| {
        DomainError::service(operation, format!("Failed to parse response: {}", e))
    })
}

/// Maps the service's status strings, ignoring case
fn parse_training_status(status: &str) -> Result<TrainingStatusKind, DomainError> {
    match status.to_ascii_lowercase().as_str() {
        "notstarted" | "nonstarted" => Ok(TrainingStatusKind::NotStarted),
        "running" => Ok(TrainingStatusKind::Running),
        "succeeded" => Ok(TrainingStatusKind::Succeeded),
        "failed" => Ok(TrainingStatusKind::Failed),
        other => Err(DomainError::service(
            "training_status",
            format!("Unknown training status '{}'", other),
        )),
    }
}

#[async_trait]
impl<C: HttpClientTrait> FaceService for AzureFaceClient<C> {
    async fn detect(&self, image: Bytes) -> Result<Vec<FaceHandle>, DomainError> {
        let url = self.build_url("detect?returnFaceId=true");

        let response = self
            .client
            .post_bytes(&url, self.binary_headers(), image)
            .await
            .map_err(|e| e.in_operation("detect"))?;

        let faces: Vec<AzureDetectedFace> = decode("detect", response)?;
        Ok(faces.into_iter().map(|f| FaceHandle::new(f.face_id)).collect())
    }

    async fn identify(
        &self,
        faces: &[FaceHandle],
        group_id: &PersonGroupId,
        confidence_threshold: f64,
    ) -> Result<Vec<IdentificationCandidate>, DomainError> {
        let url = self.build_url("identify");
        let body = serde_json::json!({
            "faceIds": faces,
            "largePersonGroupId": group_id,
            "confidenceThreshold": confidence_threshold,
            "maxNumOfCandidatesReturned": self.config.max_candidates,
        });

        let response = self
            .client
            .post_json(&url, self.json_headers(), &body)
            .await
            .map_err(|e| e.in_operation("identify"))?;

        let results: Vec<AzureIdentifyResult> = decode("identify", response)?;
        Ok(results.into_iter().map(AzureIdentifyResult::into_domain).collect())
    }

    async fn create_person_group(
        &self,
        group_id: &PersonGroupId,
        display_name: &str,
    ) -> Result<(), DomainError> {
        let url = self.group_url(group_id, "");
        let body = serde_json::json!({ "name": display_name });

        self.client
            .put_json(&url, self.json_headers(), &body)
            .await
            .map_err(|e| e.in_operation("create_person_group"))?;

        Ok(())
    }

    async fn create_person(
        &self,
        group_id: &PersonGroupId,
        name: &str,
    ) -> Result<PersonEntity, DomainError> {
        let url = self.group_url(group_id, "/persons");
        let body = serde_json::json!({ "name": name });

        let response = self
            .client
            .post_json(&url, self.json_headers(), &body)
            .await
            .map_err(|e| e.in_operation("create_person"))?;

        let created: AzureCreatedPerson = decode("create_person", response)?;
        Ok(PersonEntity::new(PersonId::new(created.person_id), name))
    }

    async fn add_face(
        &self,
        group_id: &PersonGroupId,
        person_id: &PersonId,
        image: Bytes,
    ) -> Result<PersistedFaceId, DomainError> {
        let url = self.group_url(group_id, &format!("/persons/{}/persistedfaces", person_id));

        let response = self
            .client
            .post_bytes(&url, self.binary_headers(), image)
            .await
            .map_err(|e| e.in_operation("add_face"))?;

        let persisted: AzurePersistedFace = decode("add_face", response)?;
        Ok(PersistedFaceId::new(persisted.persisted_face_id))
    }

    async fn submit_training(&self, group_id: &PersonGroupId) -> Result<(), DomainError> {
        let url = self.group_url(group_id, "/train");

        self.client
            .post_json(&url, self.json_headers(), &serde_json::json!({}))
            .await
            .map_err(|e| e.in_operation("submit_training"))?;

        Ok(())
    }

    async fn training_status(
        &self,
        group_id: &PersonGroupId,
    ) -> Result<TrainingStatus, DomainError> {
        let url = self.group_url(group_id, "/training");

        let response = self
            .client
            .get_json(&url, self.json_headers())
            .await
            .map_err(|e| e.in_operation("training_status"))?;

        let status: AzureTrainingStatus = decode("training_status", response)?;
        let mut result = TrainingStatus::new(parse_training_status(&status.status)?);

        if let Some(message) = status.message {
            result = result.with_message(message);
        }
        if let Some(created) = status.created_date_time {
            result = result.with_created_at(created);
        }
        if let Some(last_action) = status.last_action_date_time {
            result = result.with_last_action_at(last_action);
        }

        Ok(result)
    }
}

// Azure Face API types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureDetectedFace {
    face_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureIdentifyResult {
    face_id: String,
    #[serde(default)]
    candidates: Vec<AzureCandidate>,
}

impl AzureIdentifyResult {
    fn into_domain(self) -> IdentificationCandidate {
        IdentificationCandidate::new(
            FaceHandle::new(self.face_id),
            self.candidates
                .into_iter()
                .map(|c| Candidate::new(PersonId::new(c.person_id), c.confidence))
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureCandidate {
    person_id: String,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureCreatedPerson {
    person_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzurePersistedFace {
    persisted_face_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureTrainingStatus {
    status: String,
    created_date_time: Option<DateTime<Utc>>,
    last_action_date_time: Option<DateTime<Utc>>,
    message: Option<String>,
}
