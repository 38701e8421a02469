use std::sync::Arc;
use std::time::Duration;

use super::azure_face::{AzureFaceClient, AzureFaceConfig};
use super::http_client::HttpClient;
use crate::domain::{DomainError, FaceService};

/// Factory for creating face service clients
#[derive(Debug)]
pub struct FaceServiceFactory;

impl FaceServiceFactory {
    /// Create an Azure face service client, checking credentials up front
    pub fn create(
        config: &AzureFaceConfig,
        request_timeout: Option<Duration>,
    ) -> Result<Arc<dyn FaceService>, DomainError> {
        Self::validate(config)?;

        let http_client = match request_timeout {
            Some(timeout) => HttpClient::with_timeout(timeout)?,
            None => HttpClient::new(),
        };

        Ok(Arc::new(AzureFaceClient::new(http_client, config.clone())))
    }

    fn validate(config: &AzureFaceConfig) -> Result<(), DomainError> {
        if config.endpoint.trim().is_empty() {
            return Err(DomainError::configuration("Face API endpoint is not configured"));
        }

        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(DomainError::configuration(format!(
                "Face API endpoint '{}' must be an http(s) URL",
                config.endpoint
            )));
        }

        if config.api_key.trim().is_empty() {
            return Err(DomainError::configuration("Face API key is not configured"));
        }

        if config.max_candidates == 0 {
            return Err(DomainError::configuration(
                "Face API max_candidates must be greater than zero",
            ));
        }

        Ok(())
    }
}
