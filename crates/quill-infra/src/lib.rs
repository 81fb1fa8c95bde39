//! # Quill Infrastructure
//!
//! Concrete implementations of the `quill-core` ports: the SQLite
//! flush-on-write store and its schema setup, JWT + Argon2 authentication,
//! and the fixed-window rate limiter.

pub mod auth;
pub mod rate_limit;
pub mod store;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use rate_limit::{FixedWindowLimiter, RateLimitConfig};
pub use store::{ExecResult, SqliteStore, StoreError};
