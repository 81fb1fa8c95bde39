//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use quill_infra::SqliteStore;

/// Shared state: the injected store plus the metadata the health and feed
/// endpoints report.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqliteStore>,
    /// Public site origin, used for CORS and for feed links.
    pub site_url: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<SqliteStore>, site_url: String) -> Self {
        Self {
            store,
            site_url,
            started_at: Instant::now(),
        }
    }
}
