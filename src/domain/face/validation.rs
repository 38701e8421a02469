//! Face service validation utilities

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::DomainError;

/// Maximum length for person group IDs
pub const MAX_PERSON_GROUP_ID_LENGTH: usize = 64;

/// Maximum length for person display names
pub const MAX_PERSON_NAME_LENGTH: usize = 128;

/// Person group IDs: lowercase letters, digits, '-' and '_'
static PERSON_GROUP_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("valid person group id pattern"));

/// Face validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum FaceValidationError {
    /// Person group ID is empty
    EmptyGroupId,
    /// Person group ID exceeds maximum length
    GroupIdTooLong { length: usize, max: usize },
    /// Person group ID contains invalid characters
    InvalidGroupIdFormat { id: String },
    /// Person name is empty
    EmptyPersonName,
    /// Person name exceeds maximum length
    PersonNameTooLong { length: usize, max: usize },
    /// Confidence threshold out of range
    InvalidConfidenceThreshold { value: f64 },
}

impl fmt::Display for FaceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGroupId => write!(f, "Person group ID cannot be empty"),
            Self::GroupIdTooLong { length, max } => {
                write!(
                    f,
                    "Person group ID too long: {} characters (max {})",
                    length, max
                )
            }
            Self::InvalidGroupIdFormat { id } => {
                write!(
                    f,
                    "Invalid person group ID format '{}': only lowercase letters, digits, '-' and '_' are allowed",
                    id
                )
            }
            Self::EmptyPersonName => write!(f, "Person name cannot be empty"),
            Self::PersonNameTooLong { length, max } => {
                write!(f, "Person name too long: {} characters (max {})", length, max)
            }
            Self::InvalidConfidenceThreshold { value } => {
                write!(
                    f,
                    "Invalid confidence threshold {}: must be between 0 and 1",
                    value
                )
            }
        }
    }
}

impl std::error::Error for FaceValidationError {}

impl From<FaceValidationError> for DomainError {
    fn from(error: FaceValidationError) -> Self {
        DomainError::validation(error.to_string())
    }
}

/// Validate a person group ID
pub fn validate_person_group_id(id: &str) -> Result<(), FaceValidationError> {
    if id.is_empty() {
        return Err(FaceValidationError::EmptyGroupId);
    }

    if id.len() > MAX_PERSON_GROUP_ID_LENGTH {
        return Err(FaceValidationError::GroupIdTooLong {
            length: id.len(),
            max: MAX_PERSON_GROUP_ID_LENGTH,
        });
    }

    if !PERSON_GROUP_ID_PATTERN.is_match(id) {
        return Err(FaceValidationError::InvalidGroupIdFormat { id: id.to_string() });
    }

    Ok(())
}

/// Validate a person display name
pub fn validate_person_name(name: &str) -> Result<(), FaceValidationError> {
    if name.trim().is_empty() {
        return Err(FaceValidationError::EmptyPersonName);
    }

    let length = name.chars().count();
    if length > MAX_PERSON_NAME_LENGTH {
        return Err(FaceValidationError::PersonNameTooLong {
            length,
            max: MAX_PERSON_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validate an identification confidence threshold
pub fn validate_confidence_threshold(value: f64) -> Result<(), FaceValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(FaceValidationError::InvalidConfidenceThreshold { value });
    }

    Ok(())
}
