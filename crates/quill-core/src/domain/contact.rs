use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact form submission. Created by anonymous visitors; only the
/// `is_read` flag is ever mutated, and only by admins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
