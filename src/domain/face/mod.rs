//! Face service domain - identifiers, entities and the remote service contract

mod entity;
mod service;
mod validation;

pub use entity::{
    Candidate, FaceHandle, IdentificationCandidate, PersistedFaceId, PersonEntity,
    PersonGroupId, PersonId, TrainingStatus, TrainingStatusKind,
};
#[cfg(test)]
pub use service::MockFaceService;
pub use service::FaceService;
pub use validation::{
    validate_confidence_threshold, validate_person_group_id, validate_person_name,
    FaceValidationError, MAX_PERSON_GROUP_ID_LENGTH, MAX_PERSON_NAME_LENGTH,
};
