//! Line-oriented messenger that writes each outbound call as a JSON object.
//!
//! Stands in for a real platform client: a bridge process reads the lines
//! and performs the calls.

use std::io::Write;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use qabot_core::error::{QabotError, Result};
use qabot_core::traits::Messenger;
use qabot_core::types::{Button, ChatId, InlineArticle, MessageId};

#[derive(Debug, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum OutboundCall<'a> {
    SendMessage {
        chat: ChatId,
        message: MessageId,
        text: &'a str,
    },
    SendButtonMessage {
        chat: ChatId,
        message: MessageId,
        text: &'a str,
        button: &'a Button,
    },
    DeleteMessage {
        chat: ChatId,
        message: MessageId,
    },
    AnswerCallback {
        callback_id: &'a str,
        text: &'a str,
    },
    AnswerInlineQuery {
        query_id: &'a str,
        articles: &'a [InlineArticle],
        #[serde(skip_serializing_if = "Option::is_none")]
        next_offset: Option<u32>,
    },
}

pub struct ConsoleMessenger<W> {
    out: Mutex<W>,
    next_message: AtomicI64,
}

impl<W: Write + Send> ConsoleMessenger<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            next_message: AtomicI64::new(1),
        }
    }

    fn emit(&self, call: &OutboundCall<'_>) -> Result<()> {
        let line = serde_json::to_string(call)?;
        let mut out = self
            .out
            .lock()
            .map_err(|e| QabotError::Messaging(e.to_string()))?;
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_message.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl<W: Write + Send> Messenger for ConsoleMessenger<W> {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId> {
        let message = self.next_id();
        self.emit(&OutboundCall::SendMessage {
            chat,
            message,
            text,
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
        self.emit(&OutboundCall::SendButtonMessage {
            chat,
            message,
            text,
            button,
        })?;
        Ok(message)
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<()> {
        self.emit(&OutboundCall::DeleteMessage { chat, message })
    }

    async fn acknowledge_callback(&self, callback_id: &str, text: &str) -> Result<()> {
        self.emit(&OutboundCall::AnswerCallback { callback_id, text })
    }

    async fn answer_inline_query(
        &self,
        query_id: &str,
        articles: &[InlineArticle],
        next_offset: Option<u32>,
    ) -> Result<()> {
        self.emit(&OutboundCall::AnswerInlineQuery {
            query_id,
            articles,
            next_offset,
        })
    }
}
