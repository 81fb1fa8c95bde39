//! Rate limiting port.

use std::time::Duration;

/// Keyed request throttling.
pub trait RateLimiter: Send + Sync {
    /// Count a request against `key` and report whether it is allowed.
    fn check(&self, key: &str) -> Result<RateLimitDecision, RateLimitError>;
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the current window resets; surfaced as the retry-after
    /// hint on 429 responses.
    pub retry_after: Duration,
}

/// Rate limit errors. Callers fail open on these.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("backend error: {0}")]
    Backend(String),
}
