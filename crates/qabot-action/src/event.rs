//! Inbound bot events and their classification.

use serde::{Deserialize, Serialize};

use qabot_core::types::{ChatId, MessageId, Timestamp};

use crate::format;

/// The sender of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Username without the leading `@`; may be empty.
    #[serde(default)]
    pub username: String,
}

/// A button press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub data: String,
    /// Chat of the message the button belongs to; absent for inline messages.
    #[serde(default)]
    pub chat: Option<ChatId>,
}

/// Text typed after the bot's name in any chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub query: String,
    /// Opaque pagination cursor; empty on the first page.
    #[serde(default)]
    pub offset: String,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub chat: ChatId,
    /// True for a one-to-one chat with the bot.
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: Option<Timestamp>,
}

impl Message {
    pub fn sender(&self) -> &str {
        self.from.as_ref().map(|u| u.username.as_str()).unwrap_or("")
    }
}

/// One inbound update. At most one payload is expected to be set; when
/// several are, classification picks by priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: i64,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
    #[serde(default)]
    pub inline_query: Option<InlineQuery>,
    #[serde(default)]
    pub message: Option<Message>,
}

/// How an update is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Callback,
    InlineQuery,
    SlashCommand,
    /// Text framed with the bot marker; deleted after a delay.
    BotText,
    Ignored,
}

/// Decide where `update` goes, in priority order: button press, inline
/// query, slash command, bot-marked text, anything else.
pub fn classify(update: &Update) -> EventCategory {
    if update.callback_query.is_some() {
        return EventCategory::Callback;
    }
    if update.inline_query.is_some() {
        return EventCategory::InlineQuery;
    }
    match &update.message {
        Some(m) if m.text.starts_with('/') => EventCategory::SlashCommand,
        Some(m) if format::is_bot_text(&m.text) => EventCategory::BotText,
        _ => EventCategory::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User {
            id: 1,
            username: name.to_string(),
        }
    }

    fn message(text: &str) -> Message {
        Message {
            message_id: MessageId(10),
            chat: ChatId(-100),
            private: false,
            from: Some(user("alice")),
            text: text.to_string(),
            date: None,
        }
    }

    #[test]
    fn test_classify_priority() {
        let callback = CallbackQuery {
            id: "c1".into(),
            from: user("alice"),
            data: "add|x".into(),
            chat: None,
        };
        let inline = InlineQuery {
            id: "i1".into(),
            from: user("alice"),
            query: "question hi".into(),
            offset: String::new(),
        };

        let all = Update {
            update_id: 1,
            callback_query: Some(callback),
            inline_query: Some(inline.clone()),
            message: Some(message("/start")),
        };
        assert_eq!(classify(&all), EventCategory::Callback);

        let no_callback = Update {
            callback_query: None,
            ..all.clone()
        };
        assert_eq!(classify(&no_callback), EventCategory::InlineQuery);

        let only_message = Update {
            message: Some(message("/start")),
            ..Update::default()
        };
        assert_eq!(classify(&only_message), EventCategory::SlashCommand);
    }

    #[test]
    fn test_classify_messages() {
        let marked = Update {
            message: Some(message(&format::mark_as_bot_text("hi"))),
            ..Update::default()
        };
        assert_eq!(classify(&marked), EventCategory::BotText);

        let plain = Update {
            message: Some(message("just chatting")),
            ..Update::default()
        };
        assert_eq!(classify(&plain), EventCategory::Ignored);

        assert_eq!(classify(&Update::default()), EventCategory::Ignored);
    }

    #[test]
    fn test_update_from_json() {
        let json = r#"{
            "update_id": 5,
            "message": {
                "message_id": 42,
                "chat": 777,
                "private": true,
                "from": {"id": 9, "username": "alice"},
                "text": "/start"
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let msg = update.message.as_ref().unwrap();
        assert_eq!(msg.message_id, MessageId(42));
        assert_eq!(msg.chat, ChatId(777));
        assert!(msg.private);
        assert_eq!(msg.sender(), "alice");
        assert_eq!(classify(&update), EventCategory::SlashCommand);
    }

    #[test]
    fn test_callback_from_json_defaults() {
        let json = r#"{"callback_query": {"id": "c", "from": {"id": 1}}}"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let cb = update.callback_query.unwrap();
        assert_eq!(cb.data, "");
        assert_eq!(cb.from.username, "");
        assert_eq!(cb.chat, None);
    }

    #[test]
    fn test_sender_without_from() {
        let mut m = message("x");
        m.from = None;
        assert_eq!(m.sender(), "");
    }
}
