//! Test doubles for the collaborator traits.
//!
//! `RecordingMessenger` captures every outbound call; `FailingStore` fails
//! every storage call.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use qabot_core::error::{QabotError, Result};
use qabot_core::traits::{Messenger, QaStore};
use qabot_core::types::{
    Answer, AnswerId, Button, ChatId, DraftAnswer, DraftQuestion, InlineArticle, MessageId, Page,
    Question, QuestionId, Recipient, UserChat,
};

/// One captured outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Send {
        chat: ChatId,
        text: String,
        message: MessageId,
    },
    SendButton {
        chat: ChatId,
        text: String,
        button: Button,
        message: MessageId,
    },
    Delete {
        chat: ChatId,
        message: MessageId,
    },
    Ack {
        callback_id: String,
        text: String,
    },
    Inline {
        query_id: String,
        articles: Vec<InlineArticle>,
        next_offset: Option<u32>,
    },
}

/// Messenger that records calls instead of talking to a platform.
pub struct RecordingMessenger {
    calls: Mutex<Vec<Outgoing>>,
    next_message: AtomicI64,
    fail: bool,
    changes: watch::Sender<usize>,
}

impl Default for RecordingMessenger {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_message: AtomicI64::new(1000),
            fail: false,
            changes: watch::channel(0).0,
        }
    }

    /// A messenger whose every call fails and records nothing.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<Outgoing> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Texts sent to `chat`, with or without a button, in order.
    pub fn sent_texts(&self, chat: ChatId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Outgoing::Send { chat: to, text, .. } | Outgoing::SendButton { chat: to, text, .. }
                    if to == chat =>
                {
                    Some(text)
                }
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<(ChatId, MessageId)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Outgoing::Delete { chat, message } => Some((chat, message)),
                _ => None,
            })
            .collect()
    }

    pub fn acks(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Outgoing::Ack { callback_id, text } => Some((callback_id, text)),
                _ => None,
            })
            .collect()
    }

    pub fn inline_answers(&self) -> Vec<(String, Vec<InlineArticle>, Option<u32>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Outgoing::Inline {
                    query_id,
                    articles,
                    next_offset,
                } => Some((query_id, articles, next_offset)),
                _ => None,
            })
            .collect()
    }

    /// Wait up to five seconds for the recorded calls to satisfy `pred`.
    pub async fn wait_until<F>(&self, pred: F) -> bool
    where
        F: Fn(&[Outgoing]) -> bool,
    {
        let mut rx = self.changes.subscribe();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if pred(&self.calls()) {
                    return;
                }
                if rx.changed().await.is_err() {
                    return;
                }
            }
        })
        .await
        .is_ok()
    }

    fn record(&self, call: Outgoing) -> Result<()> {
        if self.fail {
            return Err(QabotError::Messaging("platform unavailable".into()));
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        self.changes.send_modify(|n| *n += 1);
        Ok(())
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_message.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId> {
        let message = self.next_id();
        self.record(Outgoing::Send {
            chat,
            text: text.to_string(),
            message,
        })?;
        Ok(message)
    }

    async fn send_button_message(
        &self,
        chat: ChatId,
        text: &str,
        button: &Button,
    ) -> Result<MessageId> {
        let message = self.next_id();
        self.record(Outgoing::SendButton {
            chat,
            text: text.to_string(),
            button: button.clone(),
            message,
        })?;
        Ok(message)
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<()> {
        self.record(Outgoing::Delete { chat, message })
    }

    async fn acknowledge_callback(&self, callback_id: &str, text: &str) -> Result<()> {
        self.record(Outgoing::Ack {
            callback_id: callback_id.to_string(),
            text: text.to_string(),
        })
    }

    async fn answer_inline_query(
        &self,
        query_id: &str,
        articles: &[InlineArticle],
        next_offset: Option<u32>,
    ) -> Result<()> {
        self.record(Outgoing::Inline {
            query_id: query_id.to_string(),
            articles: articles.to_vec(),
            next_offset,
        })
    }
}

/// Store whose every call reports the database as unavailable.
#[derive(Debug, Default)]
pub struct FailingStore;

fn unavailable<T>() -> Result<T> {
    Err(QabotError::Storage("database is locked".into()))
}

impl QaStore for FailingStore {
    fn add_question(&self, _draft: &DraftQuestion) -> Result<QuestionId> {
        unavailable()
    }

    fn add_answer(&self, _draft: &DraftAnswer) -> Result<AnswerId> {
        unavailable()
    }

    fn get_question(&self, _id: QuestionId) -> Result<Option<Question>> {
        unavailable()
    }

    fn get_answer(&self, _id: AnswerId) -> Result<Option<Answer>> {
        unavailable()
    }

    fn close_question(&self, _id: QuestionId) -> Result<()> {
        unavailable()
    }

    fn open_question(&self, _id: QuestionId) -> Result<()> {
        unavailable()
    }

    fn delete_question(&self, _id: QuestionId) -> Result<()> {
        unavailable()
    }

    fn delete_answer(&self, _id: AnswerId) -> Result<()> {
        unavailable()
    }

    fn find_questions_to(&self, _recipient: &Recipient, _page: Page) -> Result<Vec<Question>> {
        unavailable()
    }

    fn find_questions_from(&self, _author: &str, _page: Page) -> Result<Vec<Question>> {
        unavailable()
    }

    fn find_answers_for(&self, _question: QuestionId, _page: Page) -> Result<Vec<Answer>> {
        unavailable()
    }

    fn find_answers_to(&self, _author: &str, _page: Page) -> Result<Vec<Answer>> {
        unavailable()
    }

    fn user_chat(&self, _username: &str) -> Result<Option<ChatId>> {
        unavailable()
    }

    fn record_user_chat(&self, _user: &UserChat) -> Result<()> {
        unavailable()
    }
}
