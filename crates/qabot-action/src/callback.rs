//! Confirmation protocol: button payloads and their effects.
//!
//! A payload is `verb|token`. `add|H` commits the pending draft `H`,
//! `ignore|H` (or `cancel|H`) drops it, and `close|N` closes question `N`.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use qabot_core::hashing::ContentId;
use qabot_core::types::{AnswerId, DraftAction, QuestionId};

use crate::commit::Committer;
use crate::error::FlowError;
use crate::event::CallbackQuery;
use crate::pending::PendingStore;
use crate::replies;

/// Separates the verb from the token in a button payload.
pub const CALLBACK_DELIMITER: char = '|';

/// A decoded button payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackData {
    Add(ContentId),
    Ignore(ContentId),
    Close(QuestionId),
}

impl CallbackData {
    /// Decode `verb|token`. The payload must split into exactly two parts on
    /// the first delimiter, with a known verb and a well-formed token.
    pub fn parse(data: &str) -> Result<Self, FlowError> {
        let malformed = || FlowError::MalformedCallback(data.to_string());
        let (verb, token) = data.split_once(CALLBACK_DELIMITER).ok_or_else(malformed)?;
        match verb {
            "add" => ContentId::parse(token).map(CallbackData::Add).ok_or_else(malformed),
            "ignore" | "cancel" => ContentId::parse(token)
                .map(CallbackData::Ignore)
                .ok_or_else(malformed),
            "close" => token
                .parse::<i64>()
                .map(|id| CallbackData::Close(QuestionId(id)))
                .map_err(|_| malformed()),
            _ => Err(malformed()),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            CallbackData::Add(_) => "add",
            CallbackData::Ignore(_) => "ignore",
            CallbackData::Close(_) => "close",
        }
    }
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            CallbackData::Add(id) | CallbackData::Ignore(id) => id.to_string(),
            CallbackData::Close(id) => id.to_string(),
        };
        write!(f, "{}{}{}", self.verb(), CALLBACK_DELIMITER, token)
    }
}

/// Terminal result of a button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Cancelled,
    QuestionAdded(QuestionId),
    AnswerAdded(AnswerId),
    /// The draft was never registered, was cancelled, or expired.
    DraftGone,
    QuestionClosed(QuestionId),
}

impl CallbackOutcome {
    pub fn reply(&self) -> &'static str {
        match self {
            CallbackOutcome::Cancelled => replies::CANCELLED,
            CallbackOutcome::QuestionAdded(_) => replies::QUESTION_ADDED,
            CallbackOutcome::AnswerAdded(_) => replies::ANSWER_ADDED,
            CallbackOutcome::DraftGone => replies::DRAFT_GONE,
            CallbackOutcome::QuestionClosed(_) => replies::QUESTION_CLOSED_BY_BUTTON,
        }
    }
}

/// Drives a pressed button to its outcome.
pub struct CallbackDispatcher {
    pending: Arc<PendingStore>,
    committer: Arc<Committer>,
}

impl CallbackDispatcher {
    pub fn new(pending: Arc<PendingStore>, committer: Arc<Committer>) -> Self {
        Self { pending, committer }
    }

    pub async fn dispatch(&self, query: &CallbackQuery) -> Result<CallbackOutcome, FlowError> {
        let data = CallbackData::parse(&query.data)?;
        debug!(callback_id = %query.id, user = %query.from.username, verb = data.verb(), "Dispatching callback");

        match data {
            CallbackData::Ignore(id) => {
                self.pending.cancel(&id).await;
                info!(content_id = %id, "Pending draft dismissed");
                Ok(CallbackOutcome::Cancelled)
            }
            CallbackData::Add(id) => match self.pending.take(&id).await {
                Some(draft) => self.commit(draft),
                None => {
                    info!(content_id = %id, "Confirmation for a draft that is gone");
                    Ok(CallbackOutcome::DraftGone)
                }
            },
            CallbackData::Close(id) => {
                self.committer.close(id, &query.from.username, query.chat)?;
                Ok(CallbackOutcome::QuestionClosed(id))
            }
        }
    }

    /// The acknowledgement goes to the presser alone, so every notification
    /// chat is sent to, including the one the button was pressed in.
    fn commit(&self, draft: DraftAction) -> Result<CallbackOutcome, FlowError> {
        match draft {
            DraftAction::Question(q) => {
                let question = self.committer.commit_question(&q, None)?;
                Ok(CallbackOutcome::QuestionAdded(question.id))
            }
            DraftAction::Answer(a) => {
                let answer = self.committer.commit_answer(&a, None)?;
                Ok(CallbackOutcome::AnswerAdded(answer.id))
            }
        }
    }
}
