use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a task description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Lifecycle state of a task. Stored and serialized as the lowercase name.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Active,
    Done,
    Postponed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Active, TaskStatus::Done, TaskStatus::Postponed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Done => "done",
            TaskStatus::Postponed => "postponed",
        }
    }

    /// Parses a status read from an untyped source. An empty string means
    /// "not set" and is valid; the default is applied later.
    pub fn parse_optional(value: &str) -> Result<Option<TaskStatus>, ValidationError> {
        if value.is_empty() {
            return Ok(None);
        }
        value.parse().map(Some)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("user_id must be a positive integer")]
    InvalidUser,

    #[error("original_description cannot be empty")]
    EmptyDescription,

    #[error("original_description cannot exceed {} characters", MAX_DESCRIPTION_CHARS)]
    DescriptionTooLong,

    #[error("status must be one of: active, done, postponed (got {0:?})")]
    InvalidStatus(String),
}

/// A persisted task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Store-assigned identifier.
    pub id: i64,
    /// Owner, as reported by the chat transport.
    pub user_id: i64,
    /// Text the user typed.
    pub original_description: String,
    /// Alternate rendering of the description, preferred for display.
    #[serde(default)]
    pub processed_description: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Local>>,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl Task {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(self.user_id, &self.original_description)
    }

    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub fn is_postponed(&self) -> bool {
        self.status == TaskStatus::Postponed
    }

    pub fn has_deadline(&self) -> bool {
        self.deadline.is_some()
    }

    /// True when the task has a deadline, is not done, and the deadline
    /// lies strictly before `now`.
    pub fn is_overdue_at(&self, now: DateTime<Local>) -> bool {
        match self.deadline {
            Some(deadline) if !self.is_done() => deadline < now,
            _ => false,
        }
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Local::now())
    }

    /// The processed description when one is set, otherwise the original.
    pub fn effective_description(&self) -> &str {
        match self.processed_description.as_deref() {
            Some(processed) if !processed.is_empty() => processed,
            _ => &self.original_description,
        }
    }
}

/// A task that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub user_id: i64,
    pub original_description: String,
    pub processed_description: Option<String>,
    pub deadline: Option<DateTime<Local>>,
    pub status: Option<TaskStatus>,
    pub created_at: Option<DateTime<Local>>,
    pub updated_at: Option<DateTime<Local>>,
}

impl NewTask {
    pub fn new(user_id: i64, description: impl Into<String>) -> Self {
        NewTask {
            user_id,
            original_description: description.into(),
            processed_description: None,
            deadline: None,
            status: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<DateTime<Local>>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_processed_description(mut self, processed: impl Into<String>) -> Self {
        self.processed_description = Some(processed.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Local>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(self.user_id, &self.original_description)
    }

    /// Fills the status and creation time when unset and stamps the update
    /// time. Runs once, on creation.
    pub fn set_defaults(&mut self, now: DateTime<Local>) {
        self.status.get_or_insert(TaskStatus::Active);
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }

    /// Builds the stored form once the store has assigned `id`.
    pub fn into_task(self, id: i64) -> Task {
        let created_at = self.created_at.unwrap_or_else(Local::now);
        Task {
            id,
            user_id: self.user_id,
            original_description: self.original_description,
            processed_description: self.processed_description,
            deadline: self.deadline,
            status: self.status.unwrap_or_default(),
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        }
    }
}

fn validate_fields(user_id: i64, description: &str) -> Result<(), ValidationError> {
    if user_id <= 0 {
        return Err(ValidationError::InvalidUser);
    }
    if description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(())
}
