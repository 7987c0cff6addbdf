use std::cmp::Reverse;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::models::{NewTask, Task, TaskStatus, ValidationError};
use crate::storage::{StoreError, TaskStore};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("task validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("task with id {0} not found")]
    NotFound(i64),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Task lifecycle and query operations on top of a [`TaskStore`].
///
/// Holds no state of its own between calls; concurrent use relies on the
/// store serializing writes.
pub struct TaskRepository {
    store: Box<dyn TaskStore>,
}

impl TaskRepository {
    pub fn new(store: Box<dyn TaskStore>) -> Self {
        TaskRepository { store }
    }

    /// Validates, applies creation defaults and persists a new task.
    pub fn add(&self, mut task: NewTask) -> Result<Task, RepoError> {
        task.validate()?;
        task.set_defaults(Local::now());
        let task = self.store.insert(task)?;
        tracing::debug!(id = task.id, user_id = task.user_id, "task added");
        Ok(task)
    }

    pub fn get(&self, id: i64) -> Result<Task, RepoError> {
        self.store.fetch(id)?.ok_or(RepoError::NotFound(id))
    }

    /// Validates `task`, stamps `updated_at` and writes it back by id.
    pub fn update(&self, task: &mut Task) -> Result<(), RepoError> {
        task.validate()?;
        task.updated_at = Local::now();
        match self.store.update(task)? {
            0 => Err(RepoError::NotFound(task.id)),
            _ => Ok(()),
        }
    }

    pub fn delete(&self, id: i64) -> Result<(), RepoError> {
        match self.store.delete(id)? {
            0 => Err(RepoError::NotFound(id)),
            _ => {
                tracing::debug!(id, "task deleted");
                Ok(())
            }
        }
    }

    /// Every task of the user, newest first.
    pub fn list_by_user(&self, user_id: i64) -> Result<Vec<Task>, RepoError> {
        let mut tasks = self.store.fetch_by_user(user_id, None)?;
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }

    /// Active tasks ordered by their deadline, or by creation time for tasks
    /// without one. Both kinds share a single timeline.
    pub fn list_active(&self, user_id: i64) -> Result<Vec<Task>, RepoError> {
        let mut tasks = self.store.fetch_by_user(user_id, Some(TaskStatus::Active))?;
        tasks.sort_by_key(|t| (active_sort_key(t), t.id));
        Ok(tasks)
    }

    /// Tasks of the user with `status`, newest first.
    pub fn list_by_status(
        &self,
        user_id: i64,
        status: TaskStatus,
    ) -> Result<Vec<Task>, RepoError> {
        let mut tasks = self.store.fetch_by_user(user_id, Some(status))?;
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }

    /// Active tasks whose deadline has already passed, earliest first.
    pub fn list_overdue(&self, user_id: i64) -> Result<Vec<Task>, RepoError> {
        self.list_overdue_at(user_id, Local::now())
    }

    pub fn list_overdue_at(
        &self,
        user_id: i64,
        now: DateTime<Local>,
    ) -> Result<Vec<Task>, RepoError> {
        let mut tasks = self.store.fetch_overdue(user_id, now)?;
        tasks.sort_by_key(|t| (t.deadline, t.id));
        Ok(tasks)
    }
}

fn active_sort_key(task: &Task) -> DateTime<Local> {
    task.deadline.unwrap_or(task.created_at)
}

fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| Reverse((t.created_at, t.id)));
}
