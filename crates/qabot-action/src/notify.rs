//! Outbound messages that must not hold up the handler that caused them.
//!
//! Notifications and delayed deletions run as detached tasks. Failures are
//! logged and never retried. Process shutdown does not wait for them.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use qabot_core::config::CleanupConfig;
use qabot_core::error::Result;
use qabot_core::traits::Messenger;
use qabot_core::types::{Button, ChatId, MessageId};

#[derive(Clone)]
pub struct Notifier {
    messenger: Arc<dyn Messenger>,
    cleanup: CleanupConfig,
}

impl Notifier {
    pub fn new(messenger: Arc<dyn Messenger>, cleanup: CleanupConfig) -> Self {
        Self { messenger, cleanup }
    }

    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    pub fn cleanup(&self) -> &CleanupConfig {
        &self.cleanup
    }

    /// Send `text` to `chat` in the background.
    ///
    /// The sent message is deleted after the notification delay, if one is
    /// configured. The returned handle may be dropped.
    pub fn notify(&self, chat: ChatId, text: String) -> JoinHandle<()> {
        self.spawn_notification(chat, text, None)
    }

    /// Like [`Notifier::notify`], with one inline button under the message.
    pub fn notify_with_button(&self, chat: ChatId, text: String, button: Button) -> JoinHandle<()> {
        self.spawn_notification(chat, text, Some(button))
    }

    fn spawn_notification(
        &self,
        chat: ChatId,
        text: String,
        button: Option<Button>,
    ) -> JoinHandle<()> {
        let messenger = Arc::clone(&self.messenger);
        let delete_after = self.cleanup.notifications();
        tokio::spawn(async move {
            let sent = match &button {
                Some(button) => messenger.send_button_message(chat, &text, button).await,
                None => messenger.send_message(chat, &text).await,
            };
            match sent {
                Ok(message) => {
                    debug!(chat = %chat, message = %message, "Notification sent");
                    if let Some(delay) = delete_after {
                        tokio::time::sleep(delay).await;
                        delete(&*messenger, chat, message).await;
                    }
                }
                Err(e) => warn!(chat = %chat, error = %e, "Failed to send notification"),
            }
        })
    }

    /// Delete a message after `after`. `None` keeps the message.
    pub fn schedule_delete(
        &self,
        chat: ChatId,
        message: MessageId,
        after: Option<Duration>,
    ) -> Option<JoinHandle<()>> {
        let delay = after?;
        let messenger = Arc::clone(&self.messenger);
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            delete(&*messenger, chat, message).await;
        }))
    }

    /// Send a reply now and schedule its deletion.
    pub async fn reply(
        &self,
        chat: ChatId,
        text: &str,
        delete_after: Option<Duration>,
    ) -> Result<MessageId> {
        let message = self.messenger.send_message(chat, text).await?;
        self.schedule_delete(chat, message, delete_after);
        Ok(message)
    }
}

async fn delete(messenger: &dyn Messenger, chat: ChatId, message: MessageId) {
    debug!(chat = %chat, message = %message, "Deleting message");
    if let Err(e) = messenger.delete_message(chat, message).await {
        warn!(chat = %chat, message = %message, error = %e, "Failed to delete message");
    }
}
