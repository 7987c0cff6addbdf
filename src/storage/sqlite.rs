//! SQLite-backed task store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{StoreError, TaskStore};
use crate::models::{NewTask, Task, TaskStatus};

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id               INTEGER NOT NULL,
    original_description  TEXT NOT NULL,
    processed_description TEXT,
    deadline              TEXT,
    status                TEXT NOT NULL DEFAULT 'active'
                          CHECK (status IN ('active', 'done', 'postponed')),
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_user_id  ON tasks(user_id);
CREATE INDEX IF NOT EXISTS idx_tasks_status   ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_deadline ON tasks(deadline);
"#;

const TASK_COLUMNS: &str = "id, user_id, original_description, processed_description, \
                            deadline, status, created_at, updated_at";

impl ToSql for TaskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Task store over a single SQLite connection.
///
/// The connection sits behind a mutex, so all statements are serialized.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    /// Opens (or creates) the database file at `path` and applies the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// A private in-memory database, mostly useful in tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        apply_schema(&conn)?;
        Ok(SqliteTaskStore {
            conn: Mutex::new(conn),
        })
    }

    pub fn schema_version(&self) -> Result<u32, StoreError> {
        let conn = self.lock()?;
        Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Idempotent: every statement uses `IF NOT EXISTS`.
fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
        tracing::debug!(from = version, to = SCHEMA_VERSION, "task schema migrated");
    }
    Ok(())
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        original_description: row.get("original_description")?,
        processed_description: row.get("processed_description")?,
        deadline: row.get("deadline")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl TaskStore for SqliteTaskStore {
    fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut task = task.into_task(0); // placeholder until the row exists
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tasks (user_id, original_description, processed_description, \
             deadline, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task.user_id,
                task.original_description,
                task.processed_description,
                task.deadline,
                task.status,
                task.created_at,
                task.updated_at,
            ],
        )?;
        task.id = conn.last_insert_rowid();
        Ok(task)
    }

    fn fetch(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let conn = self.lock()?;
        let task = conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    fn update(&self, task: &Task) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE tasks \
             SET original_description = ?1, processed_description = ?2, deadline = ?3, \
                 status = ?4, updated_at = ?5 \
             WHERE id = ?6",
            params![
                task.original_description,
                task.processed_description,
                task.deadline,
                task.status,
                task.updated_at,
                task.id,
            ],
        )?;
        Ok(rows)
    }

    fn delete(&self, id: i64) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?)
    }

    fn fetch_by_user(
        &self,
        user_id: i64,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2) \
             ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![user_id, status], row_to_task)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    fn fetch_overdue(
        &self,
        user_id: i64,
        now: DateTime<Local>,
    ) -> Result<Vec<Task>, StoreError> {
        let conn = self.lock()?;
        // Stored deadlines carry the offset in effect when they were written,
        // so compare instants rather than text.
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE user_id = ?1 AND status = ?2 \
               AND deadline IS NOT NULL AND julianday(deadline) < julianday(?3)"
        ))?;
        let rows = stmt.query_map(params![user_id, TaskStatus::Active, now], row_to_task)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }
}
