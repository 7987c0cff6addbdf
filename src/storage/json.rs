use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::{StoreError, TaskStore};
use crate::models::{NewTask, Task, TaskStatus};

/// On-disk layout of the JSON store.
///
/// `next_id` only ever grows, so ids of deleted tasks are never handed out
/// again.
#[derive(Serialize, Deserialize, Debug)]
struct Document {
    #[serde(default = "first_id")]
    next_id: i64,
    #[serde(default)]
    tasks: Vec<Task>,
}

fn first_id() -> i64 {
    1
}

/// Task store kept in a single pretty-printed JSON file.
///
/// Every operation reads the whole document and writes it back; the mutex
/// serializes those read-modify-write cycles within the process.
pub struct JsonTaskStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonTaskStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document, or an empty one if the file does not exist yet.
    fn load(&self) -> Result<Document, StoreError> {
        if !self.path.exists() {
            return Ok(Document {
                next_id: first_id(),
                tasks: Vec::new(),
            });
        }
        let mut f = OpenOptions::new().read(true).open(&self.path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        if s.trim().is_empty() {
            return Ok(Document {
                next_id: first_id(),
                tasks: Vec::new(),
            });
        }
        let mut doc: Document = serde_json::from_str(&s)?;

        let mut seen = HashSet::new();
        if let Some(dup) = doc.tasks.iter().find(|t| !seen.insert(t.id)) {
            return Err(StoreError::Corrupt(format!("duplicate task id {}", dup.id)));
        }
        // Files written without `next_id` still must not hand out used ids.
        if let Some(max) = doc.tasks.iter().map(|t| t.id).max() {
            doc.next_id = doc.next_id.max(max + 1);
        }
        Ok(doc)
    }

    /// Overwrites the file with `doc`.
    fn save(&self, doc: &Document) -> Result<(), StoreError> {
        let s = serde_json::to_string_pretty(doc)?;
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    fn with_document<T>(
        &self,
        f: impl FnOnce(&mut Document) -> (T, bool),
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut doc = self.load()?;
        let (out, dirty) = f(&mut doc);
        if dirty {
            self.save(&doc)?;
        }
        Ok(out)
    }
}

impl TaskStore for JsonTaskStore {
    fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        self.with_document(|doc| {
            let id = doc.next_id.max(first_id());
            doc.next_id = id + 1;
            let task = task.into_task(id);
            doc.tasks.push(task.clone());
            (task, true)
        })
    }

    fn fetch(&self, id: i64) -> Result<Option<Task>, StoreError> {
        self.with_document(|doc| (doc.tasks.iter().find(|t| t.id == id).cloned(), false))
    }

    fn update(&self, task: &Task) -> Result<usize, StoreError> {
        self.with_document(|doc| match doc.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(t) => {
                t.original_description = task.original_description.clone();
                t.processed_description = task.processed_description.clone();
                t.deadline = task.deadline;
                t.status = task.status;
                t.updated_at = task.updated_at;
                (1, true)
            }
            None => (0, false),
        })
    }

    fn delete(&self, id: i64) -> Result<usize, StoreError> {
        self.with_document(|doc| {
            let len_before = doc.tasks.len();
            doc.tasks.retain(|t| t.id != id);
            let removed = len_before - doc.tasks.len();
            (removed, removed > 0)
        })
    }

    fn fetch_by_user(
        &self,
        user_id: i64,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>, StoreError> {
        self.with_document(|doc| {
            let tasks = doc
                .tasks
                .iter()
                .filter(|t| t.user_id == user_id)
                .filter(|t| status.map_or(true, |s| t.status == s))
                .cloned()
                .collect();
            (tasks, false)
        })
    }

    fn fetch_overdue(
        &self,
        user_id: i64,
        now: DateTime<Local>,
    ) -> Result<Vec<Task>, StoreError> {
        self.with_document(|doc| {
            let tasks = doc
                .tasks
                .iter()
                .filter(|t| t.user_id == user_id && t.is_active())
                .filter(|t| t.deadline.is_some_and(|d| d < now))
                .cloned()
                .collect();
            (tasks, false)
        })
    }
}
