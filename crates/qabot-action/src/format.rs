//! Text rendering for notifications, listings, and inline articles.

use qabot_core::types::{Answer, AnswerId, InlineArticle, Question, QuestionId};

use crate::replies;

/// Line that frames every bot-authored text posted through inline mode.
pub const BOT_MARKER: &str = "----------------------------------------";

/// Longest body prefix shown in an inline article description.
pub const MAX_DESCRIPTION_CHARS: usize = 64;

/// Frame `text` between marker lines so the bot can recognise it later.
pub fn mark_as_bot_text(text: &str) -> String {
    format!("{}\n{}\n{}", BOT_MARKER, text, BOT_MARKER)
}

pub fn is_bot_text(text: &str) -> bool {
    text.starts_with(BOT_MARKER)
}

pub fn question_accepted(id: QuestionId) -> String {
    format!("Вопрос принят, его id: {}", id)
}

pub fn answer_saved(id: AnswerId) -> String {
    format!("Ответ сохранен, его id: {}", id)
}

/// Tells the asker (and the group) that an answer arrived.
pub fn answer_notification(question: &Question, answer: &Answer) -> String {
    format!(
        "На вопрос [{}], заданный @{}:\n        \"{}\"\n появился ответ от @{}:\n        \"{}\"",
        question.id, question.author, question.text, answer.author, answer.text
    )
}

/// Tells the recipient (or the group) that a question was asked.
pub fn question_notification(question: &Question) -> String {
    format!(
        "@{} задал вопрос [{}]:\n\"{}\"",
        question.author, question.id, question.text
    )
}

pub fn close_notification(question: &Question) -> String {
    format!("Ваш вопрос [{}] был закрыт: \n{}", question.id, question.text)
}

/// Plain-text listing for slash commands.
pub fn question_list(questions: &[Question]) -> String {
    if questions.is_empty() {
        return replies::NO_QUESTIONS.to_string();
    }
    questions
        .iter()
        .map(|q| {
            format!(
                "[{}] @{} спросил {}:\n    {}",
                q.id,
                q.author,
                q.created_at.format_short(),
                q.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn answer_list(question: &Question, answers: &[Answer]) -> String {
    if answers.is_empty() {
        return replies::NO_ANSWERS.to_string();
    }
    let header = format!(
        "На вопрос [{}] от {}:\n    {}\n",
        question.id,
        question.created_at.format_short(),
        question.text
    );
    let body = answers
        .iter()
        .map(|a| {
            format!(
                "[{}] @{} ответил {}:\n    {}",
                a.id,
                a.author,
                a.created_at.format_short(),
                a.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    header + &body
}

/// Answers to the caller's own questions, for `/list_answers_to_me`.
pub fn answers_to_author_list(answers: &[Answer]) -> String {
    if answers.is_empty() {
        return replies::NO_ANSWERS.to_string();
    }
    answers
        .iter()
        .map(|a| {
            format!(
                "[{}] на вопрос [{}] @{} ответил {}:\n    {}",
                a.id,
                a.question_id,
                a.author,
                a.created_at.format_short(),
                a.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shorten `text` for an article description.
pub fn preview(text: &str) -> String {
    if text.chars().count() > MAX_DESCRIPTION_CHARS {
        let head: String = text.chars().take(MAX_DESCRIPTION_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

pub fn question_article(question: &Question, article_id: String) -> InlineArticle {
    let date = question.created_at.format_short();
    let text = format!(
        "Информация о вопросе [{}]\nЗадавший: @{}\nДата: {}\nТекст вопроса:\n\"{}\"",
        question.id, question.author, date, question.text
    );
    InlineArticle {
        id: article_id,
        title: format!("[{}] От @{} в {}", question.id, question.author, date),
        text: mark_as_bot_text(&text),
        description: Some(preview(&question.text)),
        buttons: Vec::new(),
    }
}

/// `question_text` is the text of the answered question, when still present.
pub fn answer_article(
    answer: &Answer,
    question_text: Option<&str>,
    article_id: String,
) -> InlineArticle {
    let date = answer.created_at.format_short();
    let text = format!(
        "Информация об ответе [{}]\nВопрос [{}]: {}\nОтветивший: @{}\nДата: {}\nТекст ответа:\n\"{}\"",
        answer.id,
        answer.question_id,
        question_text.unwrap_or(replies::EMPTY_MESSAGE),
        answer.author,
        date,
        answer.text
    );
    InlineArticle {
        id: article_id,
        title: format!("От @{} в {}", answer.author, date),
        text: mark_as_bot_text(&text),
        description: Some(preview(&answer.text)),
        buttons: Vec::new(),
    }
}

/// Single-article reply carrying only `message`.
pub fn message_article(message: &str) -> InlineArticle {
    InlineArticle {
        id: "1".to_string(),
        title: message.to_string(),
        text: mark_as_bot_text(message),
        description: None,
        buttons: Vec::new(),
    }
}
