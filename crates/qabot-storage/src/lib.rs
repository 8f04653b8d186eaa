//! Qabot Storage crate - SQLite persistence for questions, answers, and users.
//!
//! Provides a WAL-mode SQLite database with migrations, per-table
//! repositories, and `SqliteQaStore`, the `QaStore` implementation the
//! confirmation workflow commits to.

pub mod db;
pub mod migrations;
pub mod repository;

use std::path::Path;
use std::sync::Arc;

use qabot_core::error::Result;
use qabot_core::traits::QaStore;
use qabot_core::types::{
    Answer, AnswerId, ChatId, DraftAnswer, DraftQuestion, Page, Question, QuestionId, Recipient,
    UserChat,
};
use tracing::debug;

pub use db::Database;
pub use repository::{AnswerRepository, QuestionRepository, UserRepository};

/// `QaStore` backed by a single SQLite database.
pub struct SqliteQaStore {
    questions: QuestionRepository,
    answers: AnswerRepository,
    users: UserRepository,
}

impl SqliteQaStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            questions: QuestionRepository::new(db.clone()),
            answers: AnswerRepository::new(db.clone()),
            users: UserRepository::new(db),
        }
    }

    /// Open the database file at `path` and wrap it.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(Database::new(path)?)))
    }

    /// A store over a fresh in-memory database.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(Database::in_memory()?)))
    }
}

impl QaStore for SqliteQaStore {
    fn add_question(&self, draft: &DraftQuestion) -> Result<QuestionId> {
        let id = self.questions.insert(draft)?;
        debug!(question_id = %id, author = %draft.author, "Question stored");
        Ok(id)
    }

    fn add_answer(&self, draft: &DraftAnswer) -> Result<AnswerId> {
        let id = self.answers.insert(draft)?;
        debug!(answer_id = %id, question_id = %draft.question_id, "Answer stored");
        Ok(id)
    }

    fn get_question(&self, id: QuestionId) -> Result<Option<Question>> {
        self.questions.find_by_id(id)
    }

    fn get_answer(&self, id: AnswerId) -> Result<Option<Answer>> {
        self.answers.find_by_id(id)
    }

    fn close_question(&self, id: QuestionId) -> Result<()> {
        self.questions.set_closed(id, true)
    }

    fn open_question(&self, id: QuestionId) -> Result<()> {
        self.questions.set_closed(id, false)
    }

    fn delete_question(&self, id: QuestionId) -> Result<()> {
        self.questions.delete(id)
    }

    fn delete_answer(&self, id: AnswerId) -> Result<()> {
        self.answers.delete(id)
    }

    fn find_questions_to(&self, recipient: &Recipient, page: Page) -> Result<Vec<Question>> {
        self.questions.find_open_to(recipient, page)
    }

    fn find_questions_from(&self, author: &str, page: Page) -> Result<Vec<Question>> {
        self.questions.find_open_from(author, page)
    }

    fn find_answers_for(&self, question: QuestionId, page: Page) -> Result<Vec<Answer>> {
        self.answers.find_for_question(question, page)
    }

    fn find_answers_to(&self, author: &str, page: Page) -> Result<Vec<Answer>> {
        self.answers.find_to_author(author, page)
    }

    fn user_chat(&self, username: &str) -> Result<Option<ChatId>> {
        self.users.chat_for(username)
    }

    fn record_user_chat(&self, user: &UserChat) -> Result<()> {
        self.users.upsert(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qabot_core::types::{ChatOrigin, Timestamp};

    #[test]
    fn test_store_through_trait_object() {
        let store: Arc<dyn QaStore> = Arc::new(SqliteQaStore::in_memory().unwrap());
        let qid = store
            .add_question(&DraftQuestion {
                author: "alice".into(),
                text: "when is the exam?".into(),
                created_at: Timestamp(1),
                recipient: Recipient::User("bob".into()),
                origin: ChatOrigin::Inline,
            })
            .unwrap();

        let page = Page::new(10, 0);
        assert_eq!(
            store.find_questions_to(&Recipient::User("bob".into()), page).unwrap().len(),
            1
        );

        store
            .add_answer(&DraftAnswer {
                author: "bob".into(),
                text: "friday".into(),
                created_at: Timestamp(2),
                question_id: qid,
            })
            .unwrap();
        assert_eq!(store.find_answers_to("alice", page).unwrap().len(), 1);

        store.close_question(qid).unwrap();
        assert!(store.get_question(qid).unwrap().unwrap().is_closed);
        assert!(store.find_questions_from("alice", page).unwrap().is_empty());

        store.open_question(qid).unwrap();
        assert_eq!(store.find_questions_from("alice", page).unwrap().len(), 1);
    }

    #[test]
    fn test_open_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteQaStore::open(&dir.path().join("qabot.db")).unwrap();
        store
            .record_user_chat(&UserChat {
                user_id: 7,
                username: "alice".into(),
                chat: ChatId(70),
            })
            .unwrap();
        assert_eq!(store.user_chat("alice").unwrap(), Some(ChatId(70)));
    }
}
