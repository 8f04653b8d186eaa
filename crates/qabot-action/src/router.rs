//! Entry point for inbound updates.
//!
//! Classifies each update, runs the matching handler, and turns every
//! outcome (errors included) into a reply. Nothing propagates past `handle`.

use std::sync::Arc;

use tracing::{debug, warn};

use qabot_core::config::QabotConfig;
use qabot_core::traits::{Messenger, QaStore};
use qabot_core::types::UserChat;

use crate::callback::CallbackDispatcher;
use crate::command::CommandExecutor;
use crate::commit::Committer;
use crate::error::FlowError;
use crate::event::{classify, CallbackQuery, EventCategory, InlineQuery, Message, Update};
use crate::inline::{InlineAnswer, InlineHandler};
use crate::notify::Notifier;
use crate::pending::PendingStore;
use crate::permission::AccessPolicy;

pub struct EventRouter {
    store: Arc<dyn QaStore>,
    notifier: Notifier,
    callbacks: CallbackDispatcher,
    inline: InlineHandler,
    commands: CommandExecutor,
}

impl EventRouter {
    pub fn new(
        config: &QabotConfig,
        pending: Arc<PendingStore>,
        store: Arc<dyn QaStore>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        let notifier = Notifier::new(messenger, config.cleanup.clone());
        let committer = Arc::new(Committer::new(
            Arc::clone(&store),
            notifier.clone(),
            AccessPolicy::from_config(&config.bot),
            config.bot.all_members_chat(),
        ));
        let page_size = config.bot.inline_page_size;
        Self {
            store,
            notifier,
            callbacks: CallbackDispatcher::new(Arc::clone(&pending), Arc::clone(&committer)),
            inline: InlineHandler::new(pending, Arc::clone(&committer), page_size),
            commands: CommandExecutor::new(committer, page_size),
        }
    }

    /// Handle one update to completion and report how it was routed.
    pub async fn handle(&self, update: Update) -> EventCategory {
        let category = classify(&update);
        if let Some(message) = &update.message {
            self.remember_chat(message);
        }

        match category {
            EventCategory::Callback => {
                if let Some(query) = &update.callback_query {
                    self.on_callback(query).await;
                }
            }
            EventCategory::InlineQuery => {
                if let Some(query) = &update.inline_query {
                    self.on_inline_query(query).await;
                }
            }
            EventCategory::SlashCommand => {
                if let Some(message) = &update.message {
                    self.on_command(message).await;
                }
            }
            EventCategory::BotText => {
                if let Some(message) = &update.message {
                    self.notifier.schedule_delete(
                        message.chat,
                        message.message_id,
                        self.notifier.cleanup().inline_answers(),
                    );
                }
            }
            EventCategory::Ignored => {
                debug!(update_id = update.update_id, "Update ignored");
            }
        }
        category
    }

    async fn on_callback(&self, query: &CallbackQuery) {
        let reply = match self.callbacks.dispatch(query).await {
            Ok(outcome) => outcome.reply(),
            Err(e) => {
                log_failure("callback", &e);
                e.user_reply()
            }
        };
        if let Err(e) = self
            .notifier
            .messenger()
            .acknowledge_callback(&query.id, reply)
            .await
        {
            warn!(callback_id = %query.id, error = %e, "Failed to acknowledge callback");
        }
    }

    async fn on_inline_query(&self, query: &InlineQuery) {
        let answer = match self.inline.answer(query).await {
            Ok(answer) => answer,
            Err(e) => {
                log_failure("inline query", &e);
                InlineAnswer::message(e.inline_reply())
            }
        };
        if let Err(e) = self
            .notifier
            .messenger()
            .answer_inline_query(&query.id, &answer.articles, answer.next_offset)
            .await
        {
            warn!(query_id = %query.id, error = %e, "Failed to answer inline query");
        }
    }

    async fn on_command(&self, message: &Message) {
        let cleanup = self.notifier.cleanup();
        let (reply, delete_after) = match self.commands.execute(message) {
            Ok(reply) => (reply, cleanup.commands()),
            Err(e) => {
                log_failure("slash command", &e);
                (e.user_reply().to_string(), cleanup.errors())
            }
        };
        self.notifier
            .schedule_delete(message.chat, message.message_id, delete_after);
        if let Err(e) = self.notifier.reply(message.chat, &reply, delete_after).await {
            warn!(chat = %message.chat, error = %e, "Failed to send command reply");
        }
    }

    /// Private chats double as the address book for notifications.
    fn remember_chat(&self, message: &Message) {
        let Some(from) = message.from.as_ref().filter(|_| message.private) else {
            return;
        };
        if from.username.is_empty() {
            return;
        }
        let user = UserChat {
            user_id: from.id,
            username: from.username.clone(),
            chat: message.chat,
        };
        if let Err(e) = self.store.record_user_chat(&user) {
            warn!(user = %user.username, error = %e, "Failed to record private chat");
        }
    }
}

fn log_failure(source: &str, error: &FlowError) {
    if error.is_operational() {
        warn!(source, error = %error, "Event handling failed");
    } else {
        debug!(source, error = %error, "Event rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qabot_core::config::PendingConfig;
    use qabot_core::types::{ChatId, MessageId, QuestionId};
    use qabot_storage::SqliteQaStore;

    use crate::event::User;
    use crate::replies;
    use crate::testing::{FailingStore, Outgoing, RecordingMessenger};

    const GROUP: ChatId = ChatId(-100);

    fn config() -> QabotConfig {
        let mut config = QabotConfig::default();
        config.bot.all_members_chat_id = GROUP.0;
        config.bot.admins = vec!["moderator".into()];
        config
    }

    fn router(store: Arc<dyn QaStore>) -> (EventRouter, Arc<RecordingMessenger>) {
        let messenger = Arc::new(RecordingMessenger::new());
        let pending = Arc::new(PendingStore::spawn(PendingConfig::default()));
        let router = EventRouter::new(&config(), pending, store, messenger.clone());
        (router, messenger)
    }

    fn user(name: &str) -> User {
        User {
            id: 7,
            username: name.into(),
        }
    }

    fn message_update(chat: ChatId, private: bool, text: &str) -> Update {
        Update {
            update_id: 1,
            message: Some(Message {
                message_id: MessageId(55),
                chat,
                private,
                from: Some(user("alice")),
                text: text.into(),
                date: None,
            }),
            ..Update::default()
        }
    }

    #[tokio::test]
    async fn test_private_message_records_chat() {
        let store = Arc::new(SqliteQaStore::in_memory().unwrap());
        let (router, _) = router(store.clone());

        let category = router.handle(message_update(ChatId(42), true, "hi")).await;
        assert_eq!(category, EventCategory::Ignored);
        assert_eq!(store.user_chat("alice").unwrap(), Some(ChatId(42)));
    }

    #[tokio::test]
    async fn test_group_message_does_not_record_chat() {
        let store = Arc::new(SqliteQaStore::in_memory().unwrap());
        let (router, _) = router(store.clone());

        router.handle(message_update(GROUP, false, "hi")).await;
        assert_eq!(store.user_chat("alice").unwrap(), None);
    }

    #[tokio::test]
    async fn test_slash_command_replies_in_chat() {
        let store = Arc::new(SqliteQaStore::in_memory().unwrap());
        let (router, messenger) = router(store.clone());

        let category = router
            .handle(message_update(GROUP, false, "/question where?"))
            .await;
        assert_eq!(category, EventCategory::SlashCommand);
        assert!(store.get_question(QuestionId(1)).unwrap().is_some());
        assert!(messenger
            .sent_texts(GROUP)
            .contains(&"Вопрос принят, его id: 1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_command_is_deleted_after_error_delay() {
        let store = Arc::new(SqliteQaStore::in_memory().unwrap());
        let (router, messenger) = router(store);

        router.handle(message_update(GROUP, false, "/close abc")).await;
        assert_eq!(
            messenger.sent_texts(GROUP),
            vec![replies::BAD_COMMAND_FORMAT.to_string()]
        );

        tokio::time::sleep(std::time::Duration::from_secs(16)).await;
        let deleted = messenger.deleted();
        assert!(deleted.contains(&(GROUP, MessageId(55))));
        assert_eq!(deleted.len(), 2);
    }

    #[tokio::test]
    async fn test_storage_failure_becomes_reply() {
        let (router, messenger) = router(Arc::new(FailingStore));

        router
            .handle(message_update(GROUP, false, "/list_questions"))
            .await;
        assert_eq!(
            messenger.sent_texts(GROUP),
            vec![replies::STORAGE_ERROR.to_string()]
        );
    }

    #[tokio::test]
    async fn test_malformed_callback_is_acknowledged() {
        let store = Arc::new(SqliteQaStore::in_memory().unwrap());
        let (router, messenger) = router(store);

        let update = Update {
            callback_query: Some(CallbackQuery {
                id: "cb1".into(),
                from: user("alice"),
                data: "garbage".into(),
                chat: None,
            }),
            ..Update::default()
        };
        assert_eq!(router.handle(update).await, EventCategory::Callback);
        assert_eq!(
            messenger.acks(),
            vec![("cb1".to_string(), replies::APP_ERROR.to_string())]
        );
    }

    #[tokio::test]
    async fn test_unknown_inline_command_answers_with_message() {
        let store = Arc::new(SqliteQaStore::in_memory().unwrap());
        let (router, messenger) = router(store);

        let update = Update {
            inline_query: Some(InlineQuery {
                id: "iq1".into(),
                from: user("alice"),
                query: "dance now".into(),
                offset: String::new(),
            }),
            ..Update::default()
        };
        assert_eq!(router.handle(update).await, EventCategory::InlineQuery);
        let answers = messenger.inline_answers();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].1[0].title, replies::COMMAND_NOT_EXISTS);
        assert_eq!(answers[0].2, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bot_text_is_deleted_later() {
        let store = Arc::new(SqliteQaStore::in_memory().unwrap());
        let (router, messenger) = router(store);

        let text = crate::format::mark_as_bot_text("answer card");
        let category = router.handle(message_update(GROUP, false, &text)).await;
        assert_eq!(category, EventCategory::BotText);
        assert!(messenger.deleted().is_empty());

        tokio::time::sleep(std::time::Duration::from_secs(301)).await;
        assert!(messenger
            .calls()
            .contains(&Outgoing::Delete {
                chat: GROUP,
                message: MessageId(55)
            }));
    }
}
