//! Inline queries: draft building and paginated listings.
//!
//! `question`, `question_to` and `answer` never touch the question store.
//! They register a draft in the pending store and offer a confirmation
//! article whose buttons carry `add|H` and `ignore|H`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use qabot_core::hashing::ContentId;
use qabot_core::types::{
    Answer, Button, ChatOrigin, DraftAction, DraftAnswer, DraftQuestion, InlineArticle, Page,
    Question, QuestionId, Recipient, Timestamp,
};

use crate::callback::CallbackData;
use crate::commit::Committer;
use crate::error::FlowError;
use crate::event::InlineQuery;
use crate::format;
use crate::pending::PendingStore;
use crate::permission::Operation;
use crate::replies;

/// Articles plus the cursor for the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAnswer {
    pub articles: Vec<InlineArticle>,
    pub next_offset: Option<u32>,
}

impl InlineAnswer {
    /// A single article showing `text`.
    pub fn message(text: &str) -> Self {
        Self {
            articles: vec![format::message_article(text)],
            next_offset: None,
        }
    }

    /// Past the last page.
    pub fn end() -> Self {
        Self {
            articles: Vec::new(),
            next_offset: None,
        }
    }
}

/// A parsed inline query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineCommand {
    Empty,
    Question(String),
    QuestionTo(Recipient, String),
    Answer(QuestionId, String),
    ListQuestions,
    ListQuestionsToMe,
    ListMyQuestions,
    ListAnswers(QuestionId),
    ListAnswersToMe,
    CloseMy,
    CloseTo,
    AdminClose,
}

impl InlineCommand {
    pub fn parse(query: &str) -> Result<Self, FlowError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(InlineCommand::Empty);
        }
        let (command, args) = match query.split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (query, ""),
        };
        let malformed = || FlowError::MalformedCommand(query.to_string());

        match command {
            "question" => {
                if args.is_empty() {
                    return Err(malformed());
                }
                Ok(InlineCommand::Question(args.to_string()))
            }
            "question_to" => {
                let (name, text) = args.split_once(' ').ok_or_else(malformed)?;
                let recipient = Recipient::parse(name).ok_or_else(malformed)?;
                let text = text.trim();
                if text.is_empty() {
                    return Err(malformed());
                }
                Ok(InlineCommand::QuestionTo(recipient, text.to_string()))
            }
            "answer" => {
                let (id, text) = args.split_once(' ').ok_or_else(malformed)?;
                let id = id.parse::<i64>().map_err(|_| malformed())?;
                let text = text.trim();
                if text.is_empty() {
                    return Err(malformed());
                }
                Ok(InlineCommand::Answer(QuestionId(id), text.to_string()))
            }
            "list_questions" => Ok(InlineCommand::ListQuestions),
            "list_questions_to_me" => Ok(InlineCommand::ListQuestionsToMe),
            "list_my_questions" => Ok(InlineCommand::ListMyQuestions),
            "list_answers" => args
                .parse::<i64>()
                .map(|id| InlineCommand::ListAnswers(QuestionId(id)))
                .map_err(|_| malformed()),
            "list_answers_to_me" => Ok(InlineCommand::ListAnswersToMe),
            "close_my" => Ok(InlineCommand::CloseMy),
            "close_to" => Ok(InlineCommand::CloseTo),
            "a_close" => Ok(InlineCommand::AdminClose),
            other => Err(FlowError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_offset(offset: &str) -> Result<u32, FlowError> {
    if offset.is_empty() {
        return Ok(0);
    }
    offset
        .parse()
        .map_err(|_| FlowError::MalformedCommand(format!("offset {:?}", offset)))
}

pub struct InlineHandler {
    pending: Arc<PendingStore>,
    committer: Arc<Committer>,
    page_size: u32,
}

impl InlineHandler {
    pub fn new(pending: Arc<PendingStore>, committer: Arc<Committer>, page_size: u32) -> Self {
        Self {
            pending,
            committer,
            page_size: page_size.max(1),
        }
    }

    pub async fn answer(&self, query: &InlineQuery) -> Result<InlineAnswer, FlowError> {
        let user = query.from.username.as_str();
        debug!(user, query = %query.query, offset = %query.offset, "Inline query");

        let command = InlineCommand::parse(&query.query)?;
        let page = Page::new(self.page_size, parse_offset(&query.offset)?);
        let store = self.committer.store();

        match command {
            InlineCommand::Empty => Ok(InlineAnswer {
                articles: vec![InlineArticle {
                    id: "1".to_string(),
                    title: replies::ENTER_COMMAND.to_string(),
                    text: replies::EMPTY_MESSAGE.to_string(),
                    description: None,
                    buttons: Vec::new(),
                }],
                next_offset: None,
            }),
            InlineCommand::Question(text) => {
                self.offer(DraftAction::Question(DraftQuestion {
                    author: user.to_string(),
                    text,
                    created_at: Timestamp::now(),
                    recipient: Recipient::Everyone,
                    origin: ChatOrigin::Inline,
                }))
                .await
            }
            InlineCommand::QuestionTo(recipient, text) => {
                self.offer(DraftAction::Question(DraftQuestion {
                    author: user.to_string(),
                    text,
                    created_at: Timestamp::now(),
                    recipient,
                    origin: ChatOrigin::Inline,
                }))
                .await
            }
            InlineCommand::Answer(question_id, text) => {
                self.offer(DraftAction::Answer(DraftAnswer {
                    author: user.to_string(),
                    text,
                    created_at: Timestamp::now(),
                    question_id,
                }))
                .await
            }
            InlineCommand::ListQuestions => {
                let found = store.find_questions_to(&Recipient::Everyone, page)?;
                Ok(self.question_page(found, page, false))
            }
            InlineCommand::ListQuestionsToMe => {
                let found = store.find_questions_to(&Recipient::User(user.to_string()), page)?;
                Ok(self.question_page(found, page, false))
            }
            InlineCommand::ListMyQuestions => {
                let found = store.find_questions_from(user, page)?;
                Ok(self.question_page(found, page, false))
            }
            InlineCommand::ListAnswers(id) => {
                let found = store.find_answers_for(id, page)?;
                self.answer_page(found, page)
            }
            InlineCommand::ListAnswersToMe => {
                let found = store.find_answers_to(user, page)?;
                self.answer_page(found, page)
            }
            InlineCommand::CloseMy => {
                let found = store.find_questions_from(user, page)?;
                Ok(self.question_page(found, page, true))
            }
            InlineCommand::CloseTo => {
                let found = store.find_questions_to(&Recipient::User(user.to_string()), page)?;
                Ok(self.question_page(found, page, true))
            }
            InlineCommand::AdminClose => {
                self.committer
                    .policy()
                    .authorize_admin(user, Operation::AdminClose)?;
                let found = store.find_questions_to(&Recipient::Everyone, page)?;
                Ok(self.question_page(found, page, true))
            }
        }
    }

    /// Register `draft` and build the confirmation article for it.
    async fn offer(&self, draft: DraftAction) -> Result<InlineAnswer, FlowError> {
        let description = format::preview(draft.text());
        let id = self.pending.register(draft).await;
        Ok(InlineAnswer {
            articles: vec![confirmation_article(&id, description)],
            next_offset: None,
        })
    }

    fn question_page(&self, questions: Vec<Question>, page: Page, closable: bool) -> InlineAnswer {
        if questions.is_empty() {
            return empty_page(page, replies::NO_QUESTIONS);
        }
        let next_offset = self.next_offset(page, questions.len());
        let articles = questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let mut article = format::question_article(q, article_id(page, i));
                if closable {
                    article.buttons.push(Button::new(
                        replies::CLOSE_BUTTON,
                        CallbackData::Close(q.id).to_string(),
                    ));
                }
                article
            })
            .collect();
        InlineAnswer {
            articles,
            next_offset,
        }
    }

    fn answer_page(&self, answers: Vec<Answer>, page: Page) -> Result<InlineAnswer, FlowError> {
        if answers.is_empty() {
            return Ok(empty_page(page, replies::NO_ANSWERS));
        }
        let next_offset = self.next_offset(page, answers.len());
        let mut question_texts: HashMap<QuestionId, Option<String>> = HashMap::new();
        let mut articles = Vec::with_capacity(answers.len());
        for (i, a) in answers.iter().enumerate() {
            if !question_texts.contains_key(&a.question_id) {
                let text = self
                    .committer
                    .store()
                    .get_question(a.question_id)?
                    .map(|q| q.text);
                question_texts.insert(a.question_id, text);
            }
            let question_text = question_texts.get(&a.question_id).and_then(|t| t.as_deref());
            articles.push(format::answer_article(a, question_text, article_id(page, i)));
        }
        Ok(InlineAnswer {
            articles,
            next_offset,
        })
    }

    /// A full page may have a successor; a short one is the last.
    fn next_offset(&self, page: Page, returned: usize) -> Option<u32> {
        (returned as u32 >= self.page_size).then(|| page.next_offset(returned))
    }
}

fn empty_page(page: Page, message: &str) -> InlineAnswer {
    if page.offset == 0 {
        InlineAnswer::message(message)
    } else {
        InlineAnswer::end()
    }
}

fn article_id(page: Page, index: usize) -> String {
    (page.offset as usize + index).to_string()
}

fn confirmation_article(id: &ContentId, description: String) -> InlineArticle {
    InlineArticle {
        id: "1".to_string(),
        title: replies::SEND_TITLE.to_string(),
        text: format::mark_as_bot_text(replies::CONFIRM_PROMPT),
        description: Some(description),
        buttons: vec![
            Button::new(replies::CONFIRM_BUTTON, CallbackData::Add(id.clone()).to_string()),
            Button::new(replies::CANCEL_BUTTON, CallbackData::Ignore(id.clone()).to_string()),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert_eq!(InlineCommand::parse("").unwrap(), InlineCommand::Empty);
        assert_eq!(InlineCommand::parse("   ").unwrap(), InlineCommand::Empty);
    }

    #[test]
    fn test_parse_question() {
        assert_eq!(
            InlineCommand::parse("question when is the exam?").unwrap(),
            InlineCommand::Question("when is the exam?".into())
        );
        assert!(matches!(
            InlineCommand::parse("question"),
            Err(FlowError::MalformedCommand(_))
        ));
        assert!(matches!(
            InlineCommand::parse("question    "),
            Err(FlowError::MalformedCommand(_))
        ));
    }

    #[test]
    fn test_parse_question_to() {
        assert_eq!(
            InlineCommand::parse("question_to @bob are you there?").unwrap(),
            InlineCommand::QuestionTo(Recipient::User("bob".into()), "are you there?".into())
        );
        assert_eq!(
            InlineCommand::parse("question_to all hi").unwrap(),
            InlineCommand::QuestionTo(Recipient::Everyone, "hi".into())
        );
        for bad in ["question_to @bob", "question_to @ text", "question_to"] {
            assert!(
                matches!(InlineCommand::parse(bad), Err(FlowError::MalformedCommand(_))),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(
            InlineCommand::parse("answer 12 on friday").unwrap(),
            InlineCommand::Answer(QuestionId(12), "on friday".into())
        );
        for bad in ["answer 12", "answer twelve text", "answer"] {
            assert!(
                matches!(InlineCommand::parse(bad), Err(FlowError::MalformedCommand(_))),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_listings() {
        assert_eq!(
            InlineCommand::parse("list_answers 4").unwrap(),
            InlineCommand::ListAnswers(QuestionId(4))
        );
        assert!(InlineCommand::parse("list_answers 4 5").is_err());
        assert!(InlineCommand::parse("list_answers").is_err());
        assert_eq!(
            InlineCommand::parse("a_close").unwrap(),
            InlineCommand::AdminClose
        );
        assert_eq!(
            InlineCommand::parse("list_answers_to_me").unwrap(),
            InlineCommand::ListAnswersToMe
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert!(matches!(
            InlineCommand::parse("open_my"),
            Err(FlowError::UnknownCommand(ref c)) if c == "open_my"
        ));
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("").unwrap(), 0);
        assert_eq!(parse_offset("40").unwrap(), 40);
        assert!(parse_offset("-1").is_err());
    }

    #[test]
    fn test_confirmation_article_buttons() {
        let id = qabot_core::hashing::content_id("alice", "hi");
        let article = confirmation_article(&id, "hi".into());
        assert_eq!(article.title, replies::SEND_TITLE);
        assert!(format::is_bot_text(&article.text));
        assert_eq!(article.buttons.len(), 2);
        assert_eq!(article.buttons[0].payload, format!("add|{}", id));
        assert_eq!(article.buttons[1].payload, format!("ignore|{}", id));
    }

    // =========================================================================
    // Handler
    // =========================================================================

    mod handler {
        use super::*;
        use qabot_core::config::{CleanupConfig, PendingConfig};
        use qabot_core::traits::QaStore;
        use qabot_storage::SqliteQaStore;

        use crate::event::User;
        use crate::notify::Notifier;
        use crate::permission::AccessPolicy;
        use crate::testing::RecordingMessenger;

        fn handler(page_size: u32) -> (InlineHandler, Arc<SqliteQaStore>, Arc<PendingStore>) {
            let store = Arc::new(SqliteQaStore::in_memory().unwrap());
            let pending = Arc::new(PendingStore::spawn(PendingConfig::default()));
            let committer = Committer::new(
                store.clone(),
                Notifier::new(Arc::new(RecordingMessenger::new()), CleanupConfig::default()),
                AccessPolicy::new(["moderator"]),
                qabot_core::types::ChatId(0),
            );
            let handler = InlineHandler::new(Arc::clone(&pending), Arc::new(committer), page_size);
            (handler, store, pending)
        }

        fn query(from: &str, text: &str, offset: &str) -> InlineQuery {
            InlineQuery {
                id: "iq".into(),
                from: User {
                    id: 1,
                    username: from.into(),
                },
                query: text.into(),
                offset: offset.into(),
            }
        }

        fn ask(store: &SqliteQaStore, author: &str, text: &str, at: i64) {
            store
                .add_question(&DraftQuestion {
                    author: author.into(),
                    text: text.into(),
                    created_at: Timestamp(at),
                    recipient: Recipient::Everyone,
                    origin: ChatOrigin::Inline,
                })
                .unwrap();
        }

        #[tokio::test]
        async fn test_empty_query_hint() {
            let (h, _, _) = handler(5);
            let answer = h.answer(&query("alice", "", "")).await.unwrap();
            assert_eq!(answer.articles[0].title, replies::ENTER_COMMAND);
            assert_eq!(answer.next_offset, None);
        }

        #[tokio::test]
        async fn test_question_registers_draft_only() {
            let (h, store, pending) = handler(5);
            let answer = h.answer(&query("alice", "question hi all", "")).await.unwrap();
            assert_eq!(answer.articles.len(), 1);
            assert_eq!(pending.len().await, 1);
            assert!(store
                .find_questions_to(&Recipient::Everyone, Page::new(10, 0))
                .unwrap()
                .is_empty());

            let expected = qabot_core::hashing::content_id("alice", "hi all");
            assert_eq!(
                answer.articles[0].buttons[0].payload,
                CallbackData::Add(expected).to_string()
            );
        }

        #[tokio::test]
        async fn test_listing_pages() {
            let (h, store, _) = handler(2);
            ask(&store, "alice", "first", 1);
            ask(&store, "bob", "second", 2);
            ask(&store, "carol", "third", 3);

            let first = h.answer(&query("dave", "list_questions", "")).await.unwrap();
            assert_eq!(first.articles.len(), 2);
            assert_eq!(first.next_offset, Some(2));
            assert_eq!(first.articles[0].id, "0");
            assert!(first.articles[0].text.contains("third"));

            let second = h.answer(&query("dave", "list_questions", "2")).await.unwrap();
            assert_eq!(second.articles.len(), 1);
            assert_eq!(second.articles[0].id, "2");
            assert_eq!(second.next_offset, None);

            let past = h.answer(&query("dave", "list_questions", "4")).await.unwrap();
            assert!(past.articles.is_empty());
        }

        #[tokio::test]
        async fn test_empty_listing_message() {
            let (h, _, _) = handler(2);
            let answer = h.answer(&query("dave", "list_my_questions", "")).await.unwrap();
            assert_eq!(answer.articles.len(), 1);
            assert_eq!(answer.articles[0].title, replies::NO_QUESTIONS);
        }

        #[tokio::test]
        async fn test_close_my_offers_close_buttons() {
            let (h, store, _) = handler(5);
            ask(&store, "alice", "mine", 1);
            let answer = h.answer(&query("alice", "close_my", "")).await.unwrap();
            assert_eq!(answer.articles[0].buttons.len(), 1);
            assert_eq!(answer.articles[0].buttons[0].payload, "close|1");
        }

        #[tokio::test]
        async fn test_admin_close_requires_admin() {
            let (h, store, _) = handler(5);
            ask(&store, "alice", "anything", 1);

            let err = h.answer(&query("alice", "a_close", "")).await.unwrap_err();
            assert!(matches!(err, FlowError::PermissionDenied { .. }));

            let answer = h.answer(&query("moderator", "a_close", "")).await.unwrap();
            assert_eq!(answer.articles.len(), 1);
        }

        #[tokio::test]
        async fn test_answer_listing_shows_question_text() {
            let (h, store, _) = handler(5);
            ask(&store, "alice", "where?", 1);
            store
                .add_answer(&DraftAnswer {
                    author: "bob".into(),
                    text: "here".into(),
                    created_at: Timestamp(2),
                    question_id: QuestionId(1),
                })
                .unwrap();

            let answer = h.answer(&query("carol", "list_answers 1", "")).await.unwrap();
            assert_eq!(answer.articles.len(), 1);
            assert!(answer.articles[0].text.contains("where?"));
            assert!(answer.articles[0].text.contains("here"));
        }
    }
}
