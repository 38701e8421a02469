//! Face Identifier
//!
//! Builds person groups on a remote face service and checks whether two
//! images show a common person:
//! - Training: person group creation, concurrent person creation and face
//!   upload, training submission and status polling
//! - Matching: concurrent face detection with one batched identify call
//! - A shared client-side rate limiter in front of every remote call

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{DomainError, MatchReport, PersonGroupId, TrainingReport};
pub use infrastructure::image_source::ImageSource;
pub use infrastructure::rate_limit::{RateLimitConfig, RateLimiter};
pub use infrastructure::services::FaceIdentifier;
