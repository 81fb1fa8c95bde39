//! Persistence adapter: an in-memory SQLite database, flushed whole to its
//! backing file after every mutating statement.

mod schema;
mod sqlite;

pub use schema::init_schema;
pub use sqlite::SqliteStore;

/// Result of a mutating statement.
#[derive(Debug, Clone, Copy)]
pub struct ExecResult {
    pub rows_affected: usize,
    /// Rowid of the last insert on this connection; only meaningful after
    /// an INSERT.
    pub inserted_id: i64,
}

/// Store errors. Handlers surface these as 500s; there is no retry.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store mutex poisoned")]
    Poisoned,
}
