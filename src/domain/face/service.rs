//! Face service trait

use async_trait::async_trait;
use bytes::Bytes;

use super::{
    FaceHandle, IdentificationCandidate, PersistedFaceId, PersonEntity, PersonGroupId, PersonId,
    TrainingStatus,
};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Remote face detection, identification and training operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FaceService: Send + Sync {
    /// Detects faces in an image; an empty result means no face was found
    async fn detect(&self, image: Bytes) -> Result<Vec<FaceHandle>, DomainError>;

    /// Identifies candidate people for detected faces, one entry per face
    async fn identify(
        &self,
        faces: &[FaceHandle],
        group_id: &PersonGroupId,
        confidence_threshold: f64,
    ) -> Result<Vec<IdentificationCandidate>, DomainError>;

    /// Creates an empty person group
    async fn create_person_group(
        &self,
        group_id: &PersonGroupId,
        display_name: &str,
    ) -> Result<(), DomainError>;

    /// Creates a person inside a person group
    async fn create_person(
        &self,
        group_id: &PersonGroupId,
        name: &str,
    ) -> Result<PersonEntity, DomainError>;

    /// Adds a face image to a person
    async fn add_face(
        &self,
        group_id: &PersonGroupId,
        person_id: &PersonId,
        image: Bytes,
    ) -> Result<PersistedFaceId, DomainError>;

    /// Submits the person group for training
    async fn submit_training(&self, group_id: &PersonGroupId) -> Result<(), DomainError>;

    /// Gets the current training status of the person group
    async fn training_status(&self, group_id: &PersonGroupId)
        -> Result<TrainingStatus, DomainError>;
}
