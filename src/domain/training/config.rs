//! Training pipeline configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do when creating a person in the group fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonCreationPolicy {
    /// Wait for every creation, then abort the run on the first failure
    #[default]
    Abort,
    /// Drop the failed person from the run and continue with the rest
    Skip,
}

/// Configuration for a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Delay between training status polls
    pub poll_interval: Duration,
    /// Upper bound on the time spent polling, unbounded when `None`
    pub poll_deadline: Option<Duration>,
    /// Consecutive failed status polls tolerated before the run fails
    pub max_poll_errors: u32,
    pub person_creation_policy: PersonCreationPolicy,
}

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_POLL_ERRORS: u32 = 3;

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_deadline: None,
            max_poll_errors: DEFAULT_MAX_POLL_ERRORS,
            person_creation_policy: PersonCreationPolicy::default(),
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_poll_deadline(mut self, deadline: Duration) -> Self {
        self.poll_deadline = Some(deadline);
        self
    }

    pub fn with_max_poll_errors(mut self, max: u32) -> Self {
        self.max_poll_errors = max;
        self
    }

    pub fn with_person_creation_policy(mut self, policy: PersonCreationPolicy) -> Self {
        self.person_creation_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::default();

        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.poll_deadline, None);
        assert_eq!(config.max_poll_errors, 3);
        assert_eq!(config.person_creation_policy, PersonCreationPolicy::Abort);
    }

    #[test]
    fn test_builder() {
        let config = TrainingConfig::new()
            .with_poll_interval(Duration::from_secs(2))
            .with_poll_deadline(Duration::from_secs(60))
            .with_max_poll_errors(0)
            .with_person_creation_policy(PersonCreationPolicy::Skip);

        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.poll_deadline, Some(Duration::from_secs(60)));
        assert_eq!(config.max_poll_errors, 0);
        assert_eq!(config.person_creation_policy, PersonCreationPolicy::Skip);
    }

    #[test]
    fn test_policy_deserializes_snake_case() {
        let policy: PersonCreationPolicy = serde_json::from_str("\"skip\"").unwrap();
        assert_eq!(policy, PersonCreationPolicy::Skip);
    }
}
