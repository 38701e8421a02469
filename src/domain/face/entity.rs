//! Face service entities and identifiers

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{validate_person_group_id, FaceValidationError};

/// Person group identifier - lowercase letters, digits, '-' and '_', max 64 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonGroupId(String);

impl PersonGroupId {
    /// Create a new PersonGroupId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, FaceValidationError> {
        let id = id.into();
        validate_person_group_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh random group ID (128-bit UUID v4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PersonGroupId {
    type Error = FaceValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PersonGroupId> for String {
    fn from(id: PersonGroupId) -> Self {
        id.0
    }
}

impl fmt::Display for PersonGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares an opaque identifier issued by the face service
macro_rules! service_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

service_id!(
    /// Handle for one detected face, only valid within the request that produced it
    FaceHandle
);

service_id!(
    /// Identifier of a person inside a person group
    PersonId
);

service_id!(
    /// Identifier of a face image stored against a person
    PersistedFaceId
);

/// A person created inside a person group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonEntity {
    pub person_id: PersonId,
    pub name: String,
}

impl PersonEntity {
    pub fn new(person_id: PersonId, name: impl Into<String>) -> Self {
        Self {
            person_id,
            name: name.into(),
        }
    }
}

/// A candidate person for one detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub person_id: PersonId,
    pub confidence: f64,
}

impl Candidate {
    pub fn new(person_id: PersonId, confidence: f64) -> Self {
        Self {
            person_id,
            confidence,
        }
    }
}

/// Identification result for one face handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationCandidate {
    pub face_id: FaceHandle,
    pub candidates: Vec<Candidate>,
}

impl IdentificationCandidate {
    pub fn new(face_id: FaceHandle, candidates: Vec<Candidate>) -> Self {
        Self { face_id, candidates }
    }

    /// Person IDs of every candidate, regardless of confidence ranking
    pub fn person_ids(&self) -> impl Iterator<Item = &PersonId> {
        self.candidates.iter().map(|c| &c.person_id)
    }
}

/// Remote training job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatusKind {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl TrainingStatusKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for TrainingStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Training status as reported by the face service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStatus {
    pub status: TrainingStatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_action_at: Option<DateTime<Utc>>,
}

impl TrainingStatus {
    pub fn new(status: TrainingStatusKind) -> Self {
        Self {
            status,
            message: None,
            created_at: None,
            last_action_at: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_last_action_at(mut self, last_action_at: DateTime<Utc>) -> Self {
        self.last_action_at = Some(last_action_at);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
