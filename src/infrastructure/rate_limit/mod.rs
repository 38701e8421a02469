//! Client-side admission control for outbound calls

mod rate_limiter;

pub use rate_limiter::{
    RateLimitConfig, RateLimiter, RatePermit, DEFAULT_INTERVAL, DEFAULT_MAX_REQUESTS,
};
