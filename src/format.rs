//! Display text for tasks, as delivered to the chat transport.
//!
//! The glyphs and Russian labels are part of the observable output and are
//! kept byte-for-byte stable.

use chrono::{DateTime, Local};

use crate::models::{Task, TaskStatus};

pub const LIST_GLYPH: &str = "📋";
pub const ACTIVE_GLYPH: &str = "📝";
pub const DONE_GLYPH: &str = "✅";
pub const POSTPONED_GLYPH: &str = "⏸️";
pub const OVERDUE_GLYPH: &str = "🔴";
pub const DEADLINE_GLYPH: &str = "⏰";
pub const ERROR_GLYPH: &str = "❌";
pub const OVERDUE_MARKER: &str = "❗ ПРОСРОЧЕНО";

const NO_TASKS: &str = "Задач не найдено";
const DEADLINE_LABEL: &str = "Срок:";
const DEADLINE_FORMAT: &str = "%d.%m.%Y";

/// Renders `tasks` under `title`, numbering items from 1.
pub fn format_list(tasks: &[Task], title: &str, now: DateTime<Local>) -> String {
    if tasks.is_empty() {
        return format!("{LIST_GLYPH} {title}\n\n{ERROR_GLYPH} {NO_TASKS}");
    }

    let items: Vec<String> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| format_item(task, i + 1, now))
        .collect();
    format!("{LIST_GLYPH} {title}\n\n{}", items.join("\n"))
}

/// One task line, plus a deadline line when the task has a deadline.
pub fn format_item(task: &Task, ordinal: usize, now: DateTime<Local>) -> String {
    let overdue = task.is_active() && task.is_overdue_at(now);
    let mut out = format!(
        "{} {}. {} (ID: {})",
        status_glyph(task.status, overdue),
        ordinal,
        task.effective_description(),
        task.id
    );

    if let Some(deadline) = task.deadline {
        out.push_str(&deadline_line(deadline, overdue));
    }
    out
}

/// `❌ <message>`, the prefix every error reply carries.
pub fn format_error(message: &str) -> String {
    format!("{ERROR_GLYPH} {message}")
}

pub fn format_deadline(deadline: DateTime<Local>) -> String {
    deadline.format(DEADLINE_FORMAT).to_string()
}

fn status_glyph(status: TaskStatus, overdue: bool) -> &'static str {
    match status {
        TaskStatus::Done => DONE_GLYPH,
        TaskStatus::Postponed => POSTPONED_GLYPH,
        TaskStatus::Active if overdue => OVERDUE_GLYPH,
        TaskStatus::Active => ACTIVE_GLYPH,
    }
}

fn deadline_line(deadline: DateTime<Local>, overdue: bool) -> String {
    let date = format_deadline(deadline);
    if overdue {
        format!("\n   {DEADLINE_GLYPH} {DEADLINE_LABEL} {date} {OVERDUE_MARKER}")
    } else {
        format!("\n   {DEADLINE_GLYPH} {DEADLINE_LABEL} {date}")
    }
}
