//! Access rules for mutating questions and answers.

use std::collections::HashSet;
use std::fmt;

use qabot_core::config::BotConfig;
use qabot_core::types::{Answer, Question};

use crate::error::FlowError;

/// A guarded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Close,
    Open,
    DeleteQuestion,
    DeleteAnswer,
    /// Listing every open group question for closing.
    AdminClose,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Close => "close a question",
            Operation::Open => "open a question",
            Operation::DeleteQuestion => "delete a question",
            Operation::DeleteAnswer => "delete an answer",
            Operation::AdminClose => "use the admin close listing",
        };
        write!(f, "{}", s)
    }
}

/// Static admin allow-list plus the ownership rules.
///
/// Close: author, recipient, or admin. Open and delete question: author or
/// admin. Delete answer: the answer's author or admin. A blank username is
/// never granted anything.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admins: HashSet<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins
                .into_iter()
                .map(|a| a.into().trim_start_matches('@').to_string())
                .collect(),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(config.admins.iter().cloned())
    }

    pub fn is_admin(&self, user: &str) -> bool {
        !user.is_empty() && self.admins.contains(user)
    }

    /// Whether `user` may perform `operation` on `question`.
    pub fn permits(&self, user: &str, operation: Operation, question: &Question) -> bool {
        if user.is_empty() {
            return false;
        }
        if self.is_admin(user) {
            return true;
        }
        match operation {
            Operation::Close => question.author == user || question.recipient.is_user(user),
            Operation::Open | Operation::DeleteQuestion => question.author == user,
            Operation::DeleteAnswer | Operation::AdminClose => false,
        }
    }

    pub fn authorize(
        &self,
        user: &str,
        operation: Operation,
        question: &Question,
    ) -> Result<(), FlowError> {
        if self.permits(user, operation, question) {
            Ok(())
        } else {
            Err(denied(user, operation))
        }
    }

    pub fn authorize_answer_delete(&self, user: &str, answer: &Answer) -> Result<(), FlowError> {
        if !user.is_empty() && (answer.author == user || self.is_admin(user)) {
            Ok(())
        } else {
            Err(denied(user, Operation::DeleteAnswer))
        }
    }

    pub fn authorize_admin(&self, user: &str, operation: Operation) -> Result<(), FlowError> {
        if self.is_admin(user) {
            Ok(())
        } else {
            Err(denied(user, operation))
        }
    }
}

fn denied(user: &str, operation: Operation) -> FlowError {
    FlowError::PermissionDenied {
        user: user.to_string(),
        operation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qabot_core::types::{AnswerId, QuestionId, Recipient, Timestamp};

    fn policy() -> AccessPolicy {
        AccessPolicy::new(["moderator", "@curator"])
    }

    fn question(recipient: Recipient) -> Question {
        Question {
            id: QuestionId(1),
            author: "alice".into(),
            text: "when is the exam?".into(),
            created_at: Timestamp(0),
            recipient,
            is_closed: false,
            chat: None,
        }
    }

    #[test]
    fn test_close_permission_gate() {
        let p = policy();
        let q = question(Recipient::User("bob".into()));
        assert!(p.permits("alice", Operation::Close, &q));
        assert!(p.permits("bob", Operation::Close, &q));
        assert!(p.permits("moderator", Operation::Close, &q));
        assert!(p.permits("curator", Operation::Close, &q));
        assert!(!p.permits("carol", Operation::Close, &q));
    }

    #[test]
    fn test_close_question_to_everyone() {
        let p = policy();
        let q = question(Recipient::Everyone);
        assert!(!p.permits("all", Operation::Close, &q));
        assert!(!p.permits("bob", Operation::Close, &q));
        assert!(p.permits("alice", Operation::Close, &q));
    }

    #[test]
    fn test_open_and_delete_exclude_recipient() {
        let p = policy();
        let q = question(Recipient::User("bob".into()));
        for op in [Operation::Open, Operation::DeleteQuestion] {
            assert!(p.permits("alice", op, &q));
            assert!(p.permits("moderator", op, &q));
            assert!(!p.permits("bob", op, &q));
        }
    }

    #[test]
    fn test_blank_user_never_permitted() {
        let p = policy();
        let mut q = question(Recipient::Everyone);
        q.author = String::new();
        assert!(!p.permits("", Operation::Close, &q));
        assert!(!p.is_admin(""));
    }

    #[test]
    fn test_authorize_returns_permission_denied() {
        let p = policy();
        let q = question(Recipient::User("bob".into()));
        assert!(p.authorize("bob", Operation::Close, &q).is_ok());
        let err = p.authorize("carol", Operation::Close, &q).unwrap_err();
        assert!(matches!(
            err,
            FlowError::PermissionDenied { ref user, operation: Operation::Close } if user == "carol"
        ));
    }

    #[test]
    fn test_answer_delete() {
        let p = policy();
        let answer = Answer {
            id: AnswerId(1),
            author: "bob".into(),
            text: "friday".into(),
            created_at: Timestamp(0),
            question_id: QuestionId(1),
        };
        assert!(p.authorize_answer_delete("bob", &answer).is_ok());
        assert!(p.authorize_answer_delete("moderator", &answer).is_ok());
        assert!(p.authorize_answer_delete("alice", &answer).is_err());
    }

    #[test]
    fn test_admin_only_operation() {
        let p = policy();
        assert!(p.authorize_admin("moderator", Operation::AdminClose).is_ok());
        assert!(p.authorize_admin("alice", Operation::AdminClose).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = BotConfig {
            admins: vec!["moderator".into()],
            ..BotConfig::default()
        };
        assert!(AccessPolicy::from_config(&config).is_admin("moderator"));
    }
}
