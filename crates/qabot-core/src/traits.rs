//! Contracts for the bot's external collaborators.
//!
//! The confirmation workflow codes against these traits; `qabot-storage`
//! provides the SQLite store and the binary provides the messenger.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Answer, AnswerId, Button, ChatId, DraftAnswer, DraftQuestion, InlineArticle, MessageId, Page,
    Question, QuestionId, Recipient, UserChat,
};

/// Durable storage for committed questions, answers, and user chats.
///
/// Calls are synchronous and serialize internally. A missing row is
/// `Ok(None)`, never an error.
pub trait QaStore: Send + Sync {
    fn add_question(&self, draft: &DraftQuestion) -> Result<QuestionId>;

    fn add_answer(&self, draft: &DraftAnswer) -> Result<AnswerId>;

    fn get_question(&self, id: QuestionId) -> Result<Option<Question>>;

    fn get_answer(&self, id: AnswerId) -> Result<Option<Answer>>;

    fn close_question(&self, id: QuestionId) -> Result<()>;

    fn open_question(&self, id: QuestionId) -> Result<()>;

    /// Delete a question together with its answers.
    fn delete_question(&self, id: QuestionId) -> Result<()>;

    fn delete_answer(&self, id: AnswerId) -> Result<()>;

    /// Open questions addressed to `recipient`, newest first.
    fn find_questions_to(&self, recipient: &Recipient, page: Page) -> Result<Vec<Question>>;

    /// Open questions asked by `author`, newest first.
    fn find_questions_from(&self, author: &str, page: Page) -> Result<Vec<Question>>;

    fn find_answers_for(&self, question: QuestionId, page: Page) -> Result<Vec<Answer>>;

    /// Answers to questions asked by `author`, newest first.
    fn find_answers_to(&self, author: &str, page: Page) -> Result<Vec<Answer>>;

    /// Private chat previously recorded for `username`.
    fn user_chat(&self, username: &str) -> Result<Option<ChatId>>;

    /// Insert or refresh a username to private chat mapping.
    fn record_user_chat(&self, user: &UserChat) -> Result<()>;
}

/// Outbound side of the messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId>;

    /// Send a message with a single inline button under it.
    async fn send_button_message(
        &self,
        chat: ChatId,
        text: &str,
        button: &Button,
    ) -> Result<MessageId>;

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<()>;

    /// Show `text` to the user who pressed a button.
    async fn acknowledge_callback(&self, callback_id: &str, text: &str) -> Result<()>;

    /// Reply to an inline query with a page of articles.
    async fn answer_inline_query(
        &self,
        query_id: &str,
        articles: &[InlineArticle],
        next_offset: Option<u32>,
    ) -> Result<()>;
}
