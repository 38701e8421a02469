use std::time::Duration;

use serde::Deserialize;

use crate::domain::{DomainError, PersonCreationPolicy, TrainingConfig};
use crate::infrastructure::face_api::{AzureFaceConfig, DEFAULT_MAX_CANDIDATES};
use crate::infrastructure::rate_limit::RateLimitConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub face_api: FaceApiSettings,
    pub rate_limit: RateLimitSettings,
    pub training: TrainingSettings,
    pub logging: LoggingConfig,
}

/// Face service endpoint and credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FaceApiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
    pub max_candidates: u32,
}

/// Client-side request budget shared by every remote call
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    pub poll_interval_secs: u64,
    /// No deadline when unset
    pub poll_deadline_secs: Option<u64>,
    pub max_poll_errors: u32,
    pub person_creation_policy: PersonCreationPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for FaceApiSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            request_timeout_secs: 30,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        let defaults = RateLimitConfig::default();

        Self {
            max_requests: defaults.max_requests,
            interval_ms: defaults.interval.as_millis() as u64,
        }
    }
}

impl Default for TrainingSettings {
    fn default() -> Self {
        let defaults = TrainingConfig::default();

        Self {
            poll_interval_secs: defaults.poll_interval.as_secs(),
            poll_deadline_secs: None,
            max_poll_errors: defaults.max_poll_errors,
            person_creation_policy: defaults.person_creation_policy,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local` and `APP__*` environment
    /// variables, later sources overriding earlier ones
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with_env(Self::environment())
    }

    pub(crate) fn environment() -> config::Environment {
        config::Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true)
    }

    pub(crate) fn load_with_env(env: config::Environment) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(env)
            .build()?;

        config.try_deserialize()
    }

    /// Check the settings that have no usable default
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.face_api.endpoint.trim().is_empty() {
            return Err(DomainError::configuration(
                "face_api.endpoint is not set (APP__FACE_API__ENDPOINT)",
            ));
        }

        if self.face_api.api_key.trim().is_empty() {
            return Err(DomainError::configuration(
                "face_api.api_key is not set (APP__FACE_API__API_KEY)",
            ));
        }

        if self.training.poll_interval_secs == 0 {
            return Err(DomainError::configuration(
                "training.poll_interval_secs must be greater than zero",
            ));
        }

        self.rate_limit_config().validate()
    }

    pub fn face_api_config(&self) -> AzureFaceConfig {
        AzureFaceConfig::new(&self.face_api.endpoint, &self.face_api.api_key)
            .with_max_candidates(self.face_api.max_candidates)
    }

    /// Per-request timeout, `None` when set to zero
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.face_api.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig::new(
            self.rate_limit.max_requests,
            Duration::from_millis(self.rate_limit.interval_ms),
        )
    }

    pub fn training_config(&self) -> TrainingConfig {
        let config = TrainingConfig::default()
            .with_poll_interval(Duration::from_secs(self.training.poll_interval_secs))
            .with_max_poll_errors(self.training.max_poll_errors)
            .with_person_creation_policy(self.training.person_creation_policy);

        match self.training.poll_deadline_secs {
            Some(secs) => config.with_poll_deadline(Duration::from_secs(secs)),
            None => config,
        }
    }
}
