use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity. Rows cascade away with their post or their author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
