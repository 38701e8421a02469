//! Infrastructure services

mod face_identifier;
mod matching_service;
mod training_service;

pub use face_identifier::FaceIdentifier;
pub use matching_service::MatchingService;
pub use training_service::TrainingService;
