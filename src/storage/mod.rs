//! Persistence backends for tasks.
//!
//! The query engine only relies on the primitives of [`TaskStore`]; each
//! backend is responsible for serializing its own writes so a store can be
//! shared between threads.

pub mod json;
pub mod sqlite;

use std::path::Path;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::models::{NewTask, Task, TaskStatus};

pub use json::JsonTaskStore;
pub use sqlite::SqliteTaskStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt task record: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Storage primitives required by the task query engine.
///
/// `update` and `delete` report the number of affected rows so callers can
/// tell a missing task apart from a successful write.
pub trait TaskStore: Send + Sync {
    /// Persists `task` and returns it with its newly assigned id.
    fn insert(&self, task: NewTask) -> Result<Task, StoreError>;

    fn fetch(&self, id: i64) -> Result<Option<Task>, StoreError>;

    /// Writes every mutable field of `task`, matched by id.
    fn update(&self, task: &Task) -> Result<usize, StoreError>;

    fn delete(&self, id: i64) -> Result<usize, StoreError>;

    /// All tasks of `user_id`, optionally restricted to one status. No
    /// ordering is guaranteed.
    fn fetch_by_user(
        &self,
        user_id: i64,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>, StoreError>;

    /// Active tasks of `user_id` whose deadline lies strictly before `now`.
    /// No ordering is guaranteed.
    fn fetch_overdue(
        &self,
        user_id: i64,
        now: DateTime<Local>,
    ) -> Result<Vec<Task>, StoreError>;
}

/// Backend selected for a database path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Json,
}

impl Backend {
    /// `.json` files use the document store, anything else is SQLite.
    pub fn for_path(path: &Path) -> Backend {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Backend::Json,
            _ => Backend::Sqlite,
        }
    }
}

/// Opens the store at `path`, creating parent directories as needed.
pub fn open(path: &Path) -> Result<Box<dyn TaskStore>, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let store: Box<dyn TaskStore> = match Backend::for_path(path) {
        Backend::Sqlite => Box::new(SqliteTaskStore::open(path)?),
        Backend::Json => Box::new(JsonTaskStore::new(path)),
    };
    tracing::info!(path = %path.display(), backend = ?Backend::for_path(path), "task store opened");
    Ok(store)
}
