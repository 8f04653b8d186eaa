//! Error types for the confirmation workflow.

use qabot_core::error::QabotError;
use qabot_core::types::{AnswerId, QuestionId};

use crate::permission::Operation;
use crate::replies;

/// Failures while handling one inbound event.
///
/// Every variant maps to a plain-text reply; handlers convert the error
/// before it leaves the event boundary.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Malformed callback payload: {0:?}")]
    MalformedCallback(String),
    #[error("Malformed command: {0}")]
    MalformedCommand(String),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Question not found: {0}")]
    QuestionNotFound(QuestionId),
    #[error("Answer not found: {0}")]
    AnswerNotFound(AnswerId),
    #[error("User {user:?} is not allowed to {operation}")]
    PermissionDenied { user: String, operation: Operation },
    #[error("Collaborator failed: {0}")]
    Collaborator(#[from] QabotError),
}

impl FlowError {
    /// Reply shown for a slash command or a button press.
    pub fn user_reply(&self) -> &'static str {
        match self {
            FlowError::MalformedCallback(_) => replies::APP_ERROR,
            FlowError::MalformedCommand(_) => replies::BAD_COMMAND_FORMAT,
            FlowError::UnknownCommand(_) => replies::UNKNOWN_COMMAND,
            FlowError::QuestionNotFound(_) => replies::QUESTION_NOT_FOUND,
            FlowError::AnswerNotFound(_) => replies::ANSWER_NOT_FOUND,
            FlowError::PermissionDenied { .. } => replies::NO_PERMISSION,
            FlowError::Collaborator(_) => replies::STORAGE_ERROR,
        }
    }

    /// Reply shown as the single article of an inline query answer.
    pub fn inline_reply(&self) -> &'static str {
        match self {
            FlowError::MalformedCommand(_) => replies::BAD_QUERY_FORMAT,
            FlowError::UnknownCommand(_) => replies::COMMAND_NOT_EXISTS,
            other => other.user_reply(),
        }
    }

    /// Collaborator failures are operational problems; the rest are user mistakes.
    pub fn is_operational(&self) -> bool {
        matches!(self, FlowError::Collaborator(_))
    }
}
