use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category entity. Deleting a category leaves its posts in place with a
/// null `category_id` (enforced by the schema's ON DELETE SET NULL).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
