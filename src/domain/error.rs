use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Service error: {operation} - {message}")]
    Service { operation: String, message: String },

    #[error("Training failed for person group '{group_id}': {message}")]
    TrainingFailed { group_id: String, message: String },

    #[error("No faces were uploaded to person group '{group_id}'")]
    NoTrainingFaces { group_id: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("I/O error: {path} - {message}")]
    Io { path: String, message: String },

    #[error("Cancelled: {message}")]
    Cancelled { message: String },

    #[error("Deadline exceeded: {message}")]
    DeadlineExceeded { message: String },
}

impl DomainError {
    pub fn service(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn training_failed(group_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TrainingFailed {
            group_id: group_id.into(),
            message: message.into(),
        }
    }

    pub fn no_training_faces(group_id: impl Into<String>) -> Self {
        Self::NoTrainingFaces {
            group_id: group_id.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::DeadlineExceeded {
            message: message.into(),
        }
    }

    /// Attribute a service error to the remote operation that failed
    pub fn in_operation(self, operation: &str) -> Self {
        match self {
            Self::Service { message, .. } => Self::service(operation, message),
            other => other,
        }
    }

    /// Whether this error stops a run regardless of per-item isolation
    pub fn is_interruption(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::DeadlineExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error() {
        let error = DomainError::service("detect", "HTTP 429: rate limit exceeded");
        assert_eq!(
            error.to_string(),
            "Service error: detect - HTTP 429: rate limit exceeded"
        );
    }

    #[test]
    fn test_training_failed_error() {
        let error = DomainError::training_failed("group-1", "no valid faces");
        assert_eq!(
            error.to_string(),
            "Training failed for person group 'group-1': no valid faces"
        );
    }

    #[test]
    fn test_in_operation_relabels_service_errors() {
        let error = DomainError::service("http", "HTTP 500").in_operation("add_face");
        assert_eq!(error.to_string(), "Service error: add_face - HTTP 500");

        let error = DomainError::validation("bad").in_operation("add_face");
        assert!(matches!(error, DomainError::Validation { .. }));
    }

    #[test]
    fn test_interruption() {
        assert!(DomainError::cancelled("stop").is_interruption());
        assert!(DomainError::deadline_exceeded("late").is_interruption());
        assert!(!DomainError::service("identify", "boom").is_interruption());
    }
}
