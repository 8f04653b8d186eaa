//! Mutations against the question store, shared by button presses and slash
//! commands.
//!
//! Storage effects happen first and are never rolled back; the notifications
//! that follow are fire-and-forget.

use std::sync::Arc;

use tracing::{info, warn};

use qabot_core::traits::QaStore;
use qabot_core::types::{
    Answer, AnswerId, Button, ChatId, DraftAnswer, DraftQuestion, Question, QuestionId, Recipient,
};

use crate::callback::CallbackData;
use crate::error::FlowError;
use crate::format;
use crate::notify::Notifier;
use crate::permission::{AccessPolicy, Operation};
use crate::replies;

pub struct Committer {
    store: Arc<dyn QaStore>,
    notifier: Notifier,
    policy: AccessPolicy,
    all_members_chat: ChatId,
}

impl Committer {
    pub fn new(
        store: Arc<dyn QaStore>,
        notifier: Notifier,
        policy: AccessPolicy,
        all_members_chat: ChatId,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
            all_members_chat,
        }
    }

    pub fn store(&self) -> &Arc<dyn QaStore> {
        &self.store
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Persist a question, then tell its recipient: the group chat for
    /// everyone, the recipient's private chat otherwise. A directed question
    /// arrives with a button that closes it.
    ///
    /// `from_chat` is a chat that already holds a reply to the request and is
    /// not notified again. Button presses pass `None`.
    pub fn commit_question(
        &self,
        draft: &DraftQuestion,
        from_chat: Option<ChatId>,
    ) -> Result<Question, FlowError> {
        let id = self.store.add_question(draft)?;
        let question = Question {
            id,
            author: draft.author.clone(),
            text: draft.text.clone(),
            created_at: draft.created_at,
            recipient: draft.recipient.clone(),
            is_closed: false,
            chat: draft.origin.chat(),
        };
        info!(
            question_id = %id,
            author = %question.author,
            recipient = %question.recipient,
            "Question committed"
        );

        let text = format::question_notification(&question);
        match &question.recipient {
            Recipient::Everyone => {
                self.notify_all(self.group_chat().into_iter().collect(), from_chat, text)
            }
            Recipient::User(name) => {
                if let Some(chat) = self.private_chat(name).filter(|c| Some(*c) != from_chat) {
                    let close = Button::new(
                        replies::CLOSE_BUTTON,
                        CallbackData::Close(question.id).to_string(),
                    );
                    self.notifier.notify_with_button(chat, text, close);
                }
            }
        }
        Ok(question)
    }

    /// Persist an answer, then tell the asker and the group.
    ///
    /// An answer from the user a question was addressed to closes it.
    pub fn commit_answer(
        &self,
        draft: &DraftAnswer,
        from_chat: Option<ChatId>,
    ) -> Result<Answer, FlowError> {
        let question = self.question(draft.question_id)?;
        let id = self.store.add_answer(draft)?;
        let answer = Answer {
            id,
            author: draft.author.clone(),
            text: draft.text.clone(),
            created_at: draft.created_at,
            question_id: draft.question_id,
        };
        info!(
            answer_id = %id,
            question_id = %question.id,
            author = %answer.author,
            "Answer committed"
        );

        if !question.is_closed && question.recipient.is_user(&answer.author) {
            match self.store.close_question(question.id) {
                Ok(()) => info!(question_id = %question.id, "Question closed by its recipient's answer"),
                Err(e) => warn!(question_id = %question.id, error = %e, "Failed to auto-close question"),
            }
        }

        let mut targets = Vec::new();
        if let Some(chat) = self.private_chat(&question.author).or(question.chat) {
            targets.push(chat);
        }
        targets.extend(self.group_chat());
        self.notify_all(
            targets,
            from_chat,
            format::answer_notification(&question, &answer),
        );
        Ok(answer)
    }

    /// Close a question on behalf of `user` and tell its author.
    pub fn close(
        &self,
        id: QuestionId,
        user: &str,
        from_chat: Option<ChatId>,
    ) -> Result<Question, FlowError> {
        let mut question = self.question(id)?;
        self.policy.authorize(user, Operation::Close, &question)?;
        self.store.close_question(id)?;
        question.is_closed = true;
        info!(question_id = %id, user, "Question closed");

        let target = question.chat.or_else(|| self.private_chat(&question.author));
        if target.is_none() {
            info!(question_id = %id, author = %question.author, "No chat known for author; close notification skipped");
        }
        self.notify_all(
            target.into_iter().collect(),
            from_chat,
            format::close_notification(&question),
        );
        Ok(question)
    }

    pub fn open(&self, id: QuestionId, user: &str) -> Result<(), FlowError> {
        let question = self.question(id)?;
        self.policy.authorize(user, Operation::Open, &question)?;
        self.store.open_question(id)?;
        info!(question_id = %id, user, "Question reopened");
        Ok(())
    }

    pub fn delete_question(&self, id: QuestionId, user: &str) -> Result<(), FlowError> {
        let question = self.question(id)?;
        self.policy
            .authorize(user, Operation::DeleteQuestion, &question)?;
        self.store.delete_question(id)?;
        info!(question_id = %id, user, "Question deleted");
        Ok(())
    }

    pub fn delete_answer(&self, id: AnswerId, user: &str) -> Result<(), FlowError> {
        let answer = self
            .store
            .get_answer(id)?
            .ok_or(FlowError::AnswerNotFound(id))?;
        self.policy.authorize_answer_delete(user, &answer)?;
        self.store.delete_answer(id)?;
        info!(answer_id = %id, user, "Answer deleted");
        Ok(())
    }

    pub fn question(&self, id: QuestionId) -> Result<Question, FlowError> {
        self.store
            .get_question(id)?
            .ok_or(FlowError::QuestionNotFound(id))
    }

    /// The all-members chat, unless unconfigured.
    fn group_chat(&self) -> Option<ChatId> {
        (self.all_members_chat.0 != 0).then_some(self.all_members_chat)
    }

    /// A user's private chat. Lookup failures only cost a notification.
    fn private_chat(&self, username: &str) -> Option<ChatId> {
        match self.store.user_chat(username) {
            Ok(Some(chat)) => Some(chat),
            Ok(None) => {
                info!(user = username, "Private chat unknown; notification skipped");
                None
            }
            Err(e) => {
                warn!(user = username, error = %e, "Failed to look up private chat");
                None
            }
        }
    }

    fn notify_all(&self, mut targets: Vec<ChatId>, skip: Option<ChatId>, text: String) {
        targets.dedup();
        for chat in targets.into_iter().filter(|c| Some(*c) != skip) {
            self.notifier.notify(chat, text.clone());
        }
    }
}
