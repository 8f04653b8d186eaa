use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hashing::{content_id, ContentId};

/// Receiver name that addresses a question to every member of the group.
pub const ALL_MEMBERS: &str = "all";

// =============================================================================
// Newtype Wrappers - Identifiers
// =============================================================================

/// A chat (group or private) on the messaging platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message inside a chat, as returned by the messaging platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistent identifier of a committed question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub i64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistent identifier of a committed answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnswerId(pub i64);

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix timestamp in seconds.
///
/// Compared by value. Two Timestamps with the same inner value are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }

    /// Human-readable form used in bot replies.
    pub fn format_short(&self) -> String {
        self.to_datetime().format("%d.%m.%Y %H:%M").to_string()
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Who a question is addressed to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    /// Every member of the group; answered in the all-members chat.
    Everyone,
    /// A single user, identified by username without the leading `@`.
    User(String),
}

impl Recipient {
    /// Parse a receiver name as typed by a user (`@bob`, `bob`, or `all`).
    ///
    /// Returns `None` when the name is blank after stripping `@`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().replace('@', "");
        if name.is_empty() {
            None
        } else if name == ALL_MEMBERS {
            Some(Recipient::Everyone)
        } else {
            Some(Recipient::User(name))
        }
    }

    /// Storage form: `all` for everyone, the bare username otherwise.
    pub fn as_str(&self) -> &str {
        match self {
            Recipient::Everyone => ALL_MEMBERS,
            Recipient::User(name) => name,
        }
    }

    pub fn is_user(&self, username: &str) -> bool {
        matches!(self, Recipient::User(name) if name == username)
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Everyone => write!(f, "{}", ALL_MEMBERS),
            Recipient::User(name) => write!(f, "@{}", name),
        }
    }
}

/// Where a question was asked from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatOrigin {
    /// Built from an inline query; the chat is unknown until the draft is committed.
    Inline,
    /// Posted directly in a chat via a slash command.
    Chat(ChatId),
}

impl ChatOrigin {
    pub fn chat(&self) -> Option<ChatId> {
        match self {
            ChatOrigin::Inline => None,
            ChatOrigin::Chat(chat) => Some(*chat),
        }
    }
}

// =============================================================================
// Draft actions
// =============================================================================

/// A question awaiting confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftQuestion {
    pub author: String,
    pub text: String,
    pub created_at: Timestamp,
    pub recipient: Recipient,
    pub origin: ChatOrigin,
}

/// An answer awaiting confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftAnswer {
    pub author: String,
    pub text: String,
    pub created_at: Timestamp,
    pub question_id: QuestionId,
}

/// A candidate question or answer that has not been persisted yet.
///
/// Immutable once built; the pending store hands out clones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftAction {
    Question(DraftQuestion),
    Answer(DraftAnswer),
}

impl DraftAction {
    pub fn author(&self) -> &str {
        match self {
            DraftAction::Question(q) => &q.author,
            DraftAction::Answer(a) => &a.author,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DraftAction::Question(q) => &q.text,
            DraftAction::Answer(a) => &a.text,
        }
    }

    pub fn created_at(&self) -> Timestamp {
        match self {
            DraftAction::Question(q) => q.created_at,
            DraftAction::Answer(a) => a.created_at,
        }
    }

    /// Content identifier used as the pending-store key.
    pub fn content_id(&self) -> ContentId {
        content_id(self.author(), self.text())
    }
}

// =============================================================================
// Committed entities
// =============================================================================

/// A persisted question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub author: String,
    pub text: String,
    pub created_at: Timestamp,
    pub recipient: Recipient,
    pub is_closed: bool,
    /// Chat the question was asked in; `None` for inline-originated questions.
    pub chat: Option<ChatId>,
}

/// A persisted answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub author: String,
    pub text: String,
    pub created_at: Timestamp,
    pub question_id: QuestionId,
}

/// A user's private chat with the bot, recorded so notifications can reach them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChat {
    pub user_id: i64,
    pub username: String,
    pub chat: ChatId,
}

/// Limit/offset window for list queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Offset of the page that follows this one when `returned` rows came back.
    pub fn next_offset(&self, returned: usize) -> u32 {
        self.offset + returned as u32
    }
}

// =============================================================================
// Outbound messaging shapes
// =============================================================================

/// A button that posts `payload` back to the bot when pressed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// One result row offered in reply to an inline query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineArticle {
    pub id: String,
    pub title: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

// =============================================================================
// Tests
// =============================================================================
