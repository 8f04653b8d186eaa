//! Slash commands. These act on the question store directly, without a
//! confirmation step.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use qabot_core::types::{
    AnswerId, ChatOrigin, DraftAnswer, DraftQuestion, Page, QuestionId, Recipient, Timestamp,
};

use crate::commit::Committer;
use crate::error::FlowError;
use crate::event::Message;
use crate::format;
use crate::replies;

/// `/name` or `/name@botname`, then optional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashCommand {
    pub name: String,
    pub args: String,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<Self> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"(?s)^/([A-Za-z0-9_]+)(?:@\w+)?(?:\s+(.*))?$")
                .expect("Invalid slash command regex")
        });
        let caps = re.captures(text.trim())?;
        Some(Self {
            name: caps.get(1)?.as_str().to_string(),
            args: caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
        })
    }

    fn malformed(&self) -> FlowError {
        FlowError::MalformedCommand(format!("/{} {}", self.name, self.args))
    }

    fn id_arg(&self) -> Result<i64, FlowError> {
        self.args.parse().map_err(|_| self.malformed())
    }

    /// `<first> <rest>` with both parts non-empty.
    fn split_args(&self) -> Result<(&str, &str), FlowError> {
        let (first, rest) = self
            .args
            .split_once(char::is_whitespace)
            .ok_or_else(|| self.malformed())?;
        let rest = rest.trim();
        if first.is_empty() || rest.is_empty() {
            return Err(self.malformed());
        }
        Ok((first, rest))
    }
}

pub struct CommandExecutor {
    committer: Arc<Committer>,
    list_limit: u32,
}

impl CommandExecutor {
    pub fn new(committer: Arc<Committer>, list_limit: u32) -> Self {
        Self {
            committer,
            list_limit: list_limit.max(1),
        }
    }

    /// Run the slash command in `message` and return the reply text.
    pub fn execute(&self, message: &Message) -> Result<String, FlowError> {
        let command = SlashCommand::parse(&message.text)
            .ok_or_else(|| FlowError::MalformedCommand(message.text.clone()))?;
        let user = message.sender();
        let chat = Some(message.chat);
        let created_at = message.date.unwrap_or_else(Timestamp::now);
        let page = Page::new(self.list_limit, 0);
        let store = self.committer.store();
        debug!(user, command = %command.name, "Slash command");

        match command.name.as_str() {
            "start" => Ok(replies::GREETING.to_string()),
            "help" => Ok(replies::HELP.to_string()),
            "question" => {
                if command.args.is_empty() {
                    return Err(command.malformed());
                }
                let draft = DraftQuestion {
                    author: user.to_string(),
                    text: command.args.clone(),
                    created_at,
                    recipient: Recipient::Everyone,
                    origin: ChatOrigin::Chat(message.chat),
                };
                let question = self.committer.commit_question(&draft, chat)?;
                Ok(format::question_accepted(question.id))
            }
            "question_to" => {
                let (name, text) = command.split_args()?;
                let recipient = Recipient::parse(name).ok_or_else(|| command.malformed())?;
                let draft = DraftQuestion {
                    author: user.to_string(),
                    text: text.to_string(),
                    created_at,
                    recipient,
                    origin: ChatOrigin::Chat(message.chat),
                };
                let question = self.committer.commit_question(&draft, chat)?;
                Ok(format::question_accepted(question.id))
            }
            "answer" => {
                let (id, text) = command.split_args()?;
                let id = id.parse::<i64>().map_err(|_| command.malformed())?;
                let draft = DraftAnswer {
                    author: user.to_string(),
                    text: text.to_string(),
                    created_at,
                    question_id: QuestionId(id),
                };
                let answer = self.committer.commit_answer(&draft, chat)?;
                Ok(format::answer_saved(answer.id))
            }
            "close" => {
                let id = QuestionId(command.id_arg()?);
                self.committer.close(id, user, chat)?;
                Ok(replies::QUESTION_CLOSED.to_string())
            }
            "open" => {
                let id = QuestionId(command.id_arg()?);
                self.committer.open(id, user)?;
                Ok(replies::QUESTION_OPENED.to_string())
            }
            "delete_question" => {
                let id = QuestionId(command.id_arg()?);
                self.committer.delete_question(id, user)?;
                Ok(replies::QUESTION_DELETED.to_string())
            }
            "delete_answer" => {
                let id = AnswerId(command.id_arg()?);
                self.committer.delete_answer(id, user)?;
                Ok(replies::ANSWER_DELETED.to_string())
            }
            "list_questions" => {
                let found = store.find_questions_to(&Recipient::Everyone, page)?;
                Ok(format::question_list(&found))
            }
            "list_questions_to_me" => {
                let found = store.find_questions_to(&Recipient::User(user.to_string()), page)?;
                Ok(format::question_list(&found))
            }
            "list_my_questions" => {
                let found = store.find_questions_from(user, page)?;
                Ok(format::question_list(&found))
            }
            "list_answers" => {
                let question = self.committer.question(QuestionId(command.id_arg()?))?;
                let found = store.find_answers_for(question.id, page)?;
                Ok(format::answer_list(&question, &found))
            }
            "list_answers_to_me" => {
                let found = store.find_answers_to(user, page)?;
                Ok(format::answers_to_author_list(&found))
            }
            other => Err(FlowError::UnknownCommand(other.to_string())),
        }
    }
}
