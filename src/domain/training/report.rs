//! Training run state and results

use std::fmt;
use std::path::PathBuf;

use crate::domain::face::{PersistedFaceId, PersonEntity, PersonGroupId, PersonId};
use crate::domain::DomainError;

/// Stages of a training run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
    Created,
    PeopleCreated,
    FacesUploaded,
    Submitted,
    Polling,
    Succeeded,
    Failed,
}

impl TrainingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for TrainingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::PeopleCreated => write!(f, "people_created"),
            Self::FacesUploaded => write!(f, "faces_uploaded"),
            Self::Submitted => write!(f, "submitted"),
            Self::Polling => write!(f, "polling"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of a single face upload
#[derive(Debug, Clone, PartialEq)]
pub enum UploadResult {
    Uploaded(PersistedFaceId),
    Failed(String),
}

/// One attempted face upload
#[derive(Debug, Clone, PartialEq)]
pub struct FaceUpload {
    pub person_id: PersonId,
    pub path: PathBuf,
    pub result: UploadResult,
}

impl FaceUpload {
    pub fn is_uploaded(&self) -> bool {
        matches!(self.result, UploadResult::Uploaded(_))
    }
}

/// A person left out of the group because creating it failed
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPerson {
    pub name: String,
    pub reason: String,
}

/// Terminal result of the remote training job
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingOutcome {
    Trained,
    Failed { message: Option<String> },
}

/// Everything a training run produced
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub group_id: PersonGroupId,
    pub people: Vec<PersonEntity>,
    pub skipped_people: Vec<SkippedPerson>,
    pub uploads: Vec<FaceUpload>,
    pub outcome: TrainingOutcome,
}

impl TrainingReport {
    pub fn state(&self) -> TrainingState {
        match self.outcome {
            TrainingOutcome::Trained => TrainingState::Succeeded,
            TrainingOutcome::Failed { .. } => TrainingState::Failed,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.outcome == TrainingOutcome::Trained
    }

    pub fn uploaded_count(&self) -> usize {
        self.uploads.iter().filter(|u| u.is_uploaded()).count()
    }

    pub fn failed_uploads(&self) -> impl Iterator<Item = &FaceUpload> {
        self.uploads.iter().filter(|u| !u.is_uploaded())
    }

    /// Group ID when training succeeded, `None` otherwise
    pub fn group_id_if_trained(&self) -> Option<&PersonGroupId> {
        self.is_trained().then_some(&self.group_id)
    }

    /// Group ID when training succeeded, `TrainingFailed` otherwise
    pub fn into_trained(self) -> Result<PersonGroupId, DomainError> {
        match self.outcome {
            TrainingOutcome::Trained => Ok(self.group_id),
            TrainingOutcome::Failed { message } => Err(DomainError::training_failed(
                self.group_id.as_str(),
                message.unwrap_or_else(|| "training job reported failure".to_string()),
            )),
        }
    }
}
