//! Infrastructure layer - Face service client, rate limiting and pipelines

pub mod face_api;
pub mod image_source;
pub mod logging;
pub mod rate_limit;
pub mod services;
pub mod train_set;
