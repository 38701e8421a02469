//! Training domain - configuration, run states and reports

mod config;
mod report;

pub use config::{
    PersonCreationPolicy, TrainingConfig, DEFAULT_MAX_POLL_ERRORS, DEFAULT_POLL_INTERVAL,
};
pub use report::{
    FaceUpload, SkippedPerson, TrainingOutcome, TrainingReport, TrainingState, UploadResult,
};
