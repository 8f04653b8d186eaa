//! Repository implementations for SQLite-backed persistence.
//!
//! Provides QuestionRepository, AnswerRepository, and UserRepository that
//! operate on the Database struct using raw SQL.

use std::sync::Arc;

use rusqlite::{OptionalExtension, Row};

use qabot_core::error::QabotError;
use qabot_core::types::{
    Answer, AnswerId, ChatId, DraftAnswer, DraftQuestion, Page, Question, QuestionId, Recipient,
    Timestamp, UserChat, ALL_MEMBERS,
};

use crate::db::Database;

const QUESTION_COLUMNS: &str = "id, author, content, created_at, recipient, is_closed, chat_id";
const ANSWER_COLUMNS: &str = "a.id, a.author, a.content, a.created_at, a.question_id";

/// Repository for questions.
pub struct QuestionRepository {
    db: Arc<Database>,
}

impl QuestionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a confirmed question and return its id.
    pub fn insert(&self, draft: &DraftQuestion) -> Result<QuestionId, QabotError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO questions (author, content, created_at, recipient, is_closed, chat_id)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                rusqlite::params![
                    draft.author,
                    draft.text,
                    draft.created_at.0,
                    draft.recipient.as_str(),
                    draft.origin.chat().map(|c| c.0),
                ],
            )
            .map_err(|e| QabotError::Storage(format!("Failed to save question: {}", e)))?;
            Ok(QuestionId(conn.last_insert_rowid()))
        })
    }

    pub fn find_by_id(&self, id: QuestionId) -> Result<Option<Question>, QabotError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM questions WHERE id = ?1", QUESTION_COLUMNS),
                rusqlite::params![id.0],
                row_to_question,
            )
            .optional()
            .map_err(|e| QabotError::Storage(e.to_string()))
        })
    }

    /// Mark a question closed or reopen it. Unknown ids are ignored.
    pub fn set_closed(&self, id: QuestionId, closed: bool) -> Result<(), QabotError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE questions SET is_closed = ?1 WHERE id = ?2",
                rusqlite::params![closed as i32, id.0],
            )
            .map_err(|e| QabotError::Storage(format!("Failed to update question: {}", e)))?;
            Ok(())
        })
    }

    /// Delete a question; its answers go with it.
    pub fn delete(&self, id: QuestionId) -> Result<(), QabotError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM questions WHERE id = ?1", rusqlite::params![id.0])
                .map_err(|e| QabotError::Storage(format!("Failed to delete question: {}", e)))?;
            Ok(())
        })
    }

    /// Open questions addressed to `recipient`, newest first.
    pub fn find_open_to(
        &self,
        recipient: &Recipient,
        page: Page,
    ) -> Result<Vec<Question>, QabotError> {
        self.find_open_where("recipient", recipient.as_str(), page)
    }

    /// Open questions asked by `author`, newest first.
    pub fn find_open_from(&self, author: &str, page: Page) -> Result<Vec<Question>, QabotError> {
        self.find_open_where("author", author, page)
    }

    fn find_open_where(
        &self,
        column: &str,
        value: &str,
        page: Page,
    ) -> Result<Vec<Question>, QabotError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM questions
                     WHERE {} = ?1 AND is_closed = 0
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?2 OFFSET ?3",
                    QUESTION_COLUMNS, column
                ))
                .map_err(|e| QabotError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![value, page.limit, page.offset],
                    row_to_question,
                )
                .map_err(|e| QabotError::Storage(e.to_string()))?;

            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| QabotError::Storage(e.to_string()))
        })
    }
}

/// Repository for answers.
pub struct AnswerRepository {
    db: Arc<Database>,
}

impl AnswerRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a confirmed answer and return its id.
    ///
    /// Fails when the question does not exist.
    pub fn insert(&self, draft: &DraftAnswer) -> Result<AnswerId, QabotError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO answers (author, content, created_at, question_id)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![draft.author, draft.text, draft.created_at.0, draft.question_id.0],
            )
            .map_err(|e| QabotError::Storage(format!("Failed to save answer: {}", e)))?;
            Ok(AnswerId(conn.last_insert_rowid()))
        })
    }

    pub fn find_by_id(&self, id: AnswerId) -> Result<Option<Answer>, QabotError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM answers a WHERE a.id = ?1", ANSWER_COLUMNS),
                rusqlite::params![id.0],
                row_to_answer,
            )
            .optional()
            .map_err(|e| QabotError::Storage(e.to_string()))
        })
    }

    pub fn delete(&self, id: AnswerId) -> Result<(), QabotError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM answers WHERE id = ?1", rusqlite::params![id.0])
                .map_err(|e| QabotError::Storage(format!("Failed to delete answer: {}", e)))?;
            Ok(())
        })
    }

    /// Answers to a single question, newest first.
    pub fn find_for_question(
        &self,
        question: QuestionId,
        page: Page,
    ) -> Result<Vec<Answer>, QabotError> {
        self.query_list(
            &format!(
                "SELECT {} FROM answers a
                 WHERE a.question_id = ?1
                 ORDER BY a.created_at DESC, a.id DESC
                 LIMIT ?2 OFFSET ?3",
                ANSWER_COLUMNS
            ),
            rusqlite::params![question.0, page.limit, page.offset],
        )
    }

    /// Answers to any question asked by `author`, newest first.
    pub fn find_to_author(&self, author: &str, page: Page) -> Result<Vec<Answer>, QabotError> {
        self.query_list(
            &format!(
                "SELECT {} FROM answers a
                 JOIN questions q ON q.id = a.question_id
                 WHERE q.author = ?1
                 ORDER BY a.created_at DESC, a.id DESC
                 LIMIT ?2 OFFSET ?3",
                ANSWER_COLUMNS
            ),
            rusqlite::params![author, page.limit, page.offset],
        )
    }

    fn query_list(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Answer>, QabotError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| QabotError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map(params, row_to_answer)
                .map_err(|e| QabotError::Storage(e.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| QabotError::Storage(e.to_string()))
        })
    }
}

/// Repository for the username to private chat mapping.
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or refresh a user's private chat.
    pub fn upsert(&self, user: &UserChat) -> Result<(), QabotError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, user_id, chat_id) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET user_id = excluded.user_id, chat_id = excluded.chat_id",
                rusqlite::params![user.username, user.user_id, user.chat.0],
            )
            .map_err(|e| QabotError::Storage(format!("Failed to save user: {}", e)))?;
            Ok(())
        })
    }

    pub fn chat_for(&self, username: &str) -> Result<Option<ChatId>, QabotError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT chat_id FROM users WHERE name = ?1",
                rusqlite::params![username],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map(|chat| chat.map(ChatId))
            .map_err(|e| QabotError::Storage(e.to_string()))
        })
    }
}

// =============================================================================
// Row mapping helpers
// =============================================================================

fn row_to_question(row: &Row<'_>) -> rusqlite::Result<Question> {
    let recipient: String = row.get(4)?;
    let is_closed: i32 = row.get(5)?;
    let chat: Option<i64> = row.get(6)?;
    Ok(Question {
        id: QuestionId(row.get(0)?),
        author: row.get(1)?,
        text: row.get(2)?,
        created_at: Timestamp(row.get(3)?),
        recipient: recipient_from_column(recipient),
        is_closed: is_closed != 0,
        chat: chat.map(ChatId),
    })
}

fn row_to_answer(row: &Row<'_>) -> rusqlite::Result<Answer> {
    Ok(Answer {
        id: AnswerId(row.get(0)?),
        author: row.get(1)?,
        text: row.get(2)?,
        created_at: Timestamp(row.get(3)?),
        question_id: QuestionId(row.get(4)?),
    })
}

fn recipient_from_column(value: String) -> Recipient {
    if value == ALL_MEMBERS {
        Recipient::Everyone
    } else {
        Recipient::User(value)
    }
}
