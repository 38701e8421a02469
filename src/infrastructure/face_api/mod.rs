//! Face service client implementations

mod azure_face;
mod factory;
mod http_client;

pub use azure_face::{AzureFaceClient, AzureFaceConfig, DEFAULT_MAX_CANDIDATES};
pub use factory::FaceServiceFactory;
pub use http_client::{HttpClient, HttpClientTrait, RequestBody};
