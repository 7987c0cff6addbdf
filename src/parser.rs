use std::sync::LazyLock;

use chrono::{DateTime, Local};
use regex::Regex;
use thiserror::Error;

use crate::dates::{parse_date, DateError};

/// Literal marker that introduces a deadline inside a command.
pub const DEADLINE_KEYWORD: &str = "срок:";

/// Whitespace in the deadline clause is ASCII only; a no-break space does
/// not separate a clause.
static DEADLINE_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"[\t\n\f\r ]+{}[\t\n\f\r ]*([^\t\n\f\r ]+)",
        regex::escape(DEADLINE_KEYWORD)
    ))
    .expect("deadline clause pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command text")]
    EmptyCommand,

    #[error("missing task description")]
    MissingDescription,

    #[error("task description cannot be empty")]
    EmptyDescription,

    #[error("empty task ID")]
    MissingTaskId,

    #[error("invalid task ID format: {0}")]
    InvalidTaskId(String),

    #[error("task ID must be positive")]
    NonPositiveTaskId,

    #[error(transparent)]
    Date(#[from] DateError),
}

/// Structured result of parsing a task-creating command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    pub description: String,
    pub deadline: Option<DateTime<Local>>,
}

impl TaskInput {
    pub fn has_deadline(&self) -> bool {
        self.deadline.is_some()
    }
}

/// Parsed `/edit <id> <description> [срок: <date>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditInput {
    pub id: i64,
    pub task: TaskInput,
}

/// Splits command text into arguments on spaces and tabs, keeping quoted
/// spans together. Quotes are dropped from the output and an unterminated
/// quote runs to the end of the input.
pub fn split_args(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in text.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => quote = Some(c),
                ' ' | '\t' => {
                    if !current.is_empty() {
                        args.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            },
        }
    }

    if !current.is_empty() {
        args.push(current);
    }
    args
}

/// Parses the full text of an `/add` command.
///
/// The leading `/add` is optional. A deadline clause (`срок: <date>`) may
/// appear anywhere after the first word; the first clause supplies the
/// deadline and every clause is cut out of the description. A single pair
/// of matching quotes around what remains is removed.
pub fn parse_add_command(text: &str) -> Result<TaskInput, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    let body = strip_command(text, "/add").trim();
    if body.is_empty() {
        return Err(ParseError::MissingDescription);
    }

    parse_task_body(body)
}

/// Parses the full text of an `/edit` command: a task id followed by the
/// same body grammar `/add` accepts.
pub fn parse_edit_command(text: &str) -> Result<EditInput, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    let rest = strip_command(text, "/edit").trim_start();
    let (id_token, body) = match rest.split_once(char::is_whitespace) {
        Some((id, body)) => (id, body.trim()),
        None => (rest, ""),
    };

    let id = parse_task_id(id_token)?;
    if body.is_empty() {
        return Err(ParseError::MissingDescription);
    }

    Ok(EditInput {
        id,
        task: parse_task_body(body)?,
    })
}

/// Parses a positive task id.
pub fn parse_task_id(text: &str) -> Result<i64, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::MissingTaskId);
    }

    let id: i64 = text
        .parse()
        .map_err(|_| ParseError::InvalidTaskId(text.to_string()))?;
    if id <= 0 {
        return Err(ParseError::NonPositiveTaskId);
    }
    Ok(id)
}

/// Returns the command word of `text` without its leading slash and any
/// `@botname` suffix, or `None` for plain text.
pub fn command_name(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split_once('@').map_or(name, |(name, _)| name);
    Some(name)
}

/// Cuts a leading `command` token (optionally `command@botname`) from
/// `text`. Text that does not start with the command token is returned
/// unchanged.
fn strip_command<'a>(text: &'a str, command: &str) -> &'a str {
    let Some(rest) = text.strip_prefix(command) else {
        return text;
    };
    match rest.chars().next() {
        None => rest,
        Some(c) if c.is_whitespace() => rest,
        Some('@') => rest
            .find(char::is_whitespace)
            .map_or("", |at| &rest[at..]),
        Some(_) => text,
    }
}

fn parse_task_body(body: &str) -> Result<TaskInput, ParseError> {
    let mut deadline = None;
    let mut text = body.to_string();

    if let Some(captures) = DEADLINE_CLAUSE.captures(body) {
        deadline = Some(parse_date(&captures[1])?);
        text = DEADLINE_CLAUSE.replace_all(body, "").into_owned();
    }

    let description = strip_wrapping_quotes(text.trim()).trim();
    if description.is_empty() {
        return Err(ParseError::EmptyDescription);
    }

    Ok(TaskInput {
        description: description.to_string(),
        deadline,
    })
}

fn strip_wrapping_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}
