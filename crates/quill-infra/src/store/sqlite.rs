//! The SQLite store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::backup::Backup;
use rusqlite::{Connection, Params, Row};

use super::{ExecResult, StoreError};

const BACKUP_PAGES_PER_STEP: std::ffi::c_int = 64;

/// Data-access handle over a single in-memory SQLite database.
///
/// Constructed once at startup and injected into the handlers. The whole
/// database file is loaded into memory on open, and every mutation
/// serializes the whole in-memory database back over the file - durability
/// is "last successful full write", with no write-ahead log and no
/// transaction spanning statements. The `Mutex` makes this a single-writer
/// store with read-after-write consistency inside the process.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open the database file into memory. A missing file starts the store
    /// empty; the first flush creates it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let mut conn = Connection::open_in_memory()?;

        if path.exists() {
            let src = Connection::open(path)?;
            let backup = Backup::new(&src, &mut conn)?;
            backup.run_to_completion(BACKUP_PAGES_PER_STEP, Duration::ZERO, None)?;
            tracing::info!(path = %path.display(), "database loaded into memory");
        } else {
            tracing::info!(path = %path.display(), "no database file yet, starting empty");
        }

        conn.pragma_update(None, "foreign_keys", true)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Ephemeral store with no backing file; flushes are no-ops. Used by
    /// tests and by runs without a configured data directory.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Run a SELECT and map every row.
    pub fn query<T>(
        &self,
        sql: &str,
        params: impl Params,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?;
        rows.collect::<rusqlite::Result<Vec<T>>>()
            .map_err(Into::into)
    }

    /// Run a SELECT and map the first row, if any.
    pub fn query_one<T>(
        &self,
        sql: &str,
        params: impl Params,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query_map(params, map)?;
        rows.next().transpose().map_err(Into::into)
    }

    /// Run an INSERT/UPDATE/DELETE, then flush the database to disk.
    pub fn execute(&self, sql: &str, params: impl Params) -> Result<ExecResult, StoreError> {
        let conn = self.lock()?;
        let rows_affected = conn.execute(sql, params)?;
        let inserted_id = conn.last_insert_rowid();
        self.flush(&conn)?;
        Ok(ExecResult {
            rows_affected,
            inserted_id,
        })
    }

    /// Run a batch of statements (schema setup), then flush once.
    pub fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        self.flush(&conn)
    }

    /// Serialize the entire in-memory database over the backing file.
    /// O(database size) per mutation; acceptable at this write volume.
    fn flush(&self, conn: &Connection) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut dst = Connection::open(path)?;
        let backup = Backup::new(conn, &mut dst)?;
        backup.run_to_completion(BACKUP_PAGES_PER_STEP, Duration::ZERO, None)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rusqlite::params;

    use super::*;
    use crate::store::init_schema;

    fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        init_schema(&store).unwrap();
        store
    }

    fn insert_user(store: &SqliteStore, email: &str) -> i64 {
        let now = Utc::now();
        store
            .execute(
                "INSERT INTO users (email, password_hash, display_name, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![email, "hash", "Someone", now, now],
            )
            .unwrap()
            .inserted_id
    }

    #[test]
    fn execute_reports_inserted_id_and_rows_affected() {
        let store = store();
        let first = insert_user(&store, "a@example.com");
        let second = insert_user(&store, "b@example.com");
        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let result = store
            .execute("DELETE FROM users WHERE id = ?", params![first])
            .unwrap();
        assert_eq!(result.rows_affected, 1);
    }

    #[test]
    fn query_one_returns_none_for_missing_rows() {
        let store = store();
        let row = store
            .query_one("SELECT id FROM users WHERE email = ?", params!["x@y.zz"], |r| {
                r.get::<_, i64>(0)
            })
            .unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn schema_init_is_idempotent() {
        let store = store();
        init_schema(&store).unwrap();
        insert_user(&store, "a@example.com");
        init_schema(&store).unwrap();
        let count: i64 = store
            .query_one("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap()
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn deleting_a_category_nulls_referencing_posts() {
        let store = store();
        let author = insert_user(&store, "a@example.com");
        let now = Utc::now();
        let category = store
            .execute(
                "INSERT INTO categories (name, slug, created_at) VALUES (?, ?, ?)",
                params!["Tech", "tech", now],
            )
            .unwrap()
            .inserted_id;
        let post = store
            .execute(
                "INSERT INTO posts (title, slug, content, author_id, category_id, status, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, 'draft', ?, ?)",
                params!["T", "t", "body", author, category, now, now],
            )
            .unwrap()
            .inserted_id;

        store
            .execute("DELETE FROM categories WHERE id = ?", params![category])
            .unwrap();

        let category_id: Option<i64> = store
            .query_one("SELECT category_id FROM posts WHERE id = ?", params![post], |r| {
                r.get(0)
            })
            .unwrap()
            .unwrap();
        assert_eq!(category_id, None);
    }

    #[test]
    fn deleting_a_post_cascades_its_comments() {
        let store = store();
        let author = insert_user(&store, "a@example.com");
        let now = Utc::now();
        let post = store
            .execute(
                "INSERT INTO posts (title, slug, content, author_id, status, created_at, updated_at)
                 VALUES (?, ?, ?, ?, 'published', ?, ?)",
                params!["T", "t", "body", author, now, now],
            )
            .unwrap()
            .inserted_id;
        store
            .execute(
                "INSERT INTO comments (post_id, user_id, content, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![post, author, "hi", now, now],
            )
            .unwrap();

        store
            .execute("DELETE FROM posts WHERE id = ?", params![post])
            .unwrap();

        let comments: i64 = store
            .query_one("SELECT COUNT(*) FROM comments", [], |r| r.get(0))
            .unwrap()
            .unwrap();
        assert_eq!(comments, 0);
    }

    #[test]
    fn reopen_restores_flushed_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            init_schema(&store).unwrap();
            insert_user(&store, "persisted@example.com");
        }

        let store = SqliteStore::open(&path).unwrap();
        let email: String = store
            .query_one("SELECT email FROM users WHERE id = 1", [], |r| r.get(0))
            .unwrap()
            .unwrap();
        assert_eq!(email, "persisted@example.com");
    }
}
