//! Database schema migrations.
//!
//! Version 1 creates the questions, answers, and users tables.

use rusqlite::Connection;
use tracing::info;

use qabot_core::error::QabotError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), QabotError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| QabotError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| QabotError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), QabotError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS questions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            author      TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  INTEGER NOT NULL,
            recipient   TEXT NOT NULL,
            is_closed   INTEGER NOT NULL DEFAULT 0,
            chat_id     INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_questions_recipient
            ON questions (recipient, is_closed, created_at DESC);

        CREATE INDEX IF NOT EXISTS idx_questions_author
            ON questions (author, is_closed, created_at DESC);

        CREATE TABLE IF NOT EXISTS answers (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            author      TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  INTEGER NOT NULL,
            question_id INTEGER NOT NULL,
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_answers_question
            ON answers (question_id, created_at DESC);

        CREATE TABLE IF NOT EXISTS users (
            name        TEXT PRIMARY KEY NOT NULL,
            user_id     INTEGER NOT NULL,
            chat_id     INTEGER NOT NULL
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| QabotError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}
