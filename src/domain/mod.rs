//! Domain layer - Core types and orchestration logic

pub mod batch;
pub mod cancellation;
pub mod error;
pub mod face;
pub mod matching;
pub mod training;

pub use batch::{fan_out, BatchReport, ItemOutcome};
pub use cancellation::CancellationSignal;
pub use error::DomainError;
pub use face::{
    Candidate, FaceHandle, FaceService, IdentificationCandidate, PersistedFaceId, PersonEntity,
    PersonGroupId, PersonId, TrainingStatus, TrainingStatusKind,
};
pub use matching::MatchReport;
pub use training::{
    FaceUpload, PersonCreationPolicy, SkippedPerson, TrainingConfig, TrainingOutcome,
    TrainingReport, TrainingState, UploadResult,
};
