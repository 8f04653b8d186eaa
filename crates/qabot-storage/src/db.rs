//! SQLite connection for the question store.
//!
//! One connection behind a mutex. File databases run in WAL mode; every
//! database enforces foreign keys.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use qabot_core::error::QabotError;

use crate::migrations;

/// Concurrent writers from another process wait this long for the lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The question store's SQLite handle.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database file, creating parent directories, and
    /// bring the schema up to date.
    pub fn new(path: &Path) -> Result<Self, QabotError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| storage("open", e))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| storage("configure", e))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| storage("configure", e))?;

        let db = Self::prepare(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "Question database ready");
        Ok(db)
    }

    /// A private in-memory database, gone when dropped.
    pub fn in_memory() -> Result<Self, QabotError> {
        let conn = Connection::open_in_memory().map_err(|e| storage("open", e))?;
        Self::prepare(conn, None)
    }

    /// File backing this database; `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` while holding the connection. Calls never interleave.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, QabotError>
    where
        F: FnOnce(&Connection) -> Result<T, QabotError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| QabotError::Storage(format!("Connection lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Answers cascade with their question, so foreign keys must be on
    /// before migrating.
    fn prepare(conn: Connection, path: Option<PathBuf>) -> Result<Self, QabotError> {
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| storage("configure", e))?;
        let db = Self {
            conn: Mutex::new(conn),
            path,
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }
}

fn storage(step: &str, e: rusqlite::Error) -> QabotError {
    QabotError::Storage(format!("Failed to {} question database: {}", step, e))
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_questions(db: &Database) -> i64 {
        db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))
                .map_err(|e| QabotError::Storage(e.to_string()))
        })
        .unwrap()
    }

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        assert_eq!(count_questions(&db), 0);
        assert!(db.path().is_none());
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("qabot.db");
        let db = Database::new(&path).unwrap();
        assert_eq!(count_questions(&db), 0);
        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
    }

    #[test]
    fn test_reopen_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qabot.db");
        drop(Database::new(&path).unwrap());
        let db = Database::new(&path).unwrap();
        assert_eq!(count_questions(&db), 0);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::in_memory().unwrap();
        let enabled: i64 = db
            .with_conn(|conn| {
                conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                    .map_err(|e| QabotError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
