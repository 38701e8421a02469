//! Rate limiter implementation
//!
//! Provides a sliding window admission gate for outbound face service calls.
//! Callers suspend until a call would not exceed `max_requests` acquisitions
//! within any trailing `interval`. Waiters are admitted first come, first
//! served: the tokio mutex queues them fairly and only the head waiter sleeps.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::domain::{CancellationSignal, DomainError};

pub const DEFAULT_MAX_REQUESTS: u32 = 10;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum acquisitions in any trailing window
    pub max_requests: u32,
    /// Window length
    pub interval: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, interval: Duration) -> Self {
        Self {
            max_requests,
            interval,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_requests == 0 {
            return Err(DomainError::configuration(
                "Rate limit max_requests must be greater than zero",
            ));
        }

        if self.interval.is_zero() {
            return Err(DomainError::configuration(
                "Rate limit interval must be greater than zero",
            ));
        }

        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_INTERVAL)
    }
}

/// Proof that a call was admitted
#[derive(Debug, Clone, Copy)]
pub struct RatePermit {
    acquired_at: Instant,
    waited: Duration,
}

impl RatePermit {
    /// When the call was admitted
    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }

    /// How long the caller was held back
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

/// Sliding window rate limiter shared by every outbound call
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    /// Admission times inside the current window, oldest first
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter, rejecting an empty budget up front
    pub fn new(config: RateLimitConfig) -> Result<Self, DomainError> {
        config.validate()?;

        Ok(Self {
            config,
            window: Mutex::new(VecDeque::with_capacity(config.max_requests as usize)),
        })
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait until a call is admitted
    pub async fn acquire(&self) -> RatePermit {
        let requested_at = Instant::now();
        let mut window = self.window.lock().await;

        loop {
            let now = Instant::now();
            self.evict_expired(&mut window, now);

            if window.len() < self.config.max_requests as usize {
                window.push_back(now);

                let permit = RatePermit {
                    acquired_at: now,
                    waited: now.duration_since(requested_at),
                };

                if !permit.waited.is_zero() {
                    debug!(
                        waited_ms = permit.waited.as_millis() as u64,
                        "Rate limiter admitted delayed call"
                    );
                }

                return permit;
            }

            if let Some(&oldest) = window.front() {
                sleep_until(oldest + self.config.interval).await;
            }
        }
    }

    /// Wait until a call is admitted or the signal is cancelled
    pub async fn acquire_until(
        &self,
        cancel: &CancellationSignal,
    ) -> Result<RatePermit, DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::cancelled("rate limiter wait was cancelled"));
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DomainError::cancelled("rate limiter wait was cancelled")),
            permit = self.acquire() => Ok(permit),
        }
    }

    /// Acquire a permit, then run the operation
    pub async fn run<F>(&self, operation: F) -> F::Output
    where
        F: Future,
    {
        self.acquire().await;
        operation.await
    }

    /// Number of calls that would be admitted right now without waiting
    pub async fn available(&self) -> usize {
        let mut window = self.window.lock().await;
        self.evict_expired(&mut window, Instant::now());
        self.config.max_requests as usize - window.len()
    }

    fn evict_expired(&self, window: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = window.front() {
            if now.duration_since(oldest) >= self.config.interval {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}
