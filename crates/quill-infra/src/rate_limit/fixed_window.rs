//! Keyed fixed-window rate limiting.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use quill_core::ports::{RateLimitDecision, RateLimitError, RateLimiter};

// Stale windows are swept once the table grows past this.
const MAX_TRACKED_KEYS: usize = 10_000;

/// Limits for one route class.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    const WINDOW: Duration = Duration::from_secs(15 * 60);

    /// General API traffic: 100 requests / 15 min.
    pub fn general_api() -> Self {
        Self {
            max_requests: 100,
            window: Self::WINDOW,
        }
    }

    /// Login/register brute-force protection: 10 requests / 15 min.
    pub fn auth() -> Self {
        Self {
            max_requests: 10,
            window: Self::WINDOW,
        }
    }

    /// Contact form spam protection: 5 requests / 15 min.
    pub fn contact() -> Self {
        Self {
            max_requests: 5,
            window: Self::WINDOW,
        }
    }

    /// Admin surfaces: 50 requests / 15 min.
    pub fn admin() -> Self {
        Self {
            max_requests: 50,
            window: Self::WINDOW,
        }
    }
}

struct Window {
    started: Instant,
    count: u32,
}

/// Per-key fixed-window counters: each key's count resets at its window
/// boundary. A client can therefore burst up to twice the limit across
/// two adjacent windows; acceptable for this traffic.
pub struct FixedWindowLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check(&self, key: &str) -> Result<RateLimitDecision, RateLimitError> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| RateLimitError::Backend("window table poisoned".to_string()))?;
        let now = Instant::now();

        if windows.len() > MAX_TRACKED_KEYS {
            let window = self.config.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.config.window {
            window.started = now;
            window.count = 0;
        }

        let retry_after = self
            .config
            .window
            .saturating_sub(now.duration_since(window.started));

        if window.count >= self.config.max_requests {
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after,
            });
        }

        window.count += 1;
        Ok(RateLimitDecision {
            allowed: true,
            remaining: self.config.max_requests - window.count,
            retry_after,
        })
    }
}
