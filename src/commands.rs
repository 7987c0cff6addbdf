use std::io::{self, BufReader};

use anyhow::Context;
use chrono::{DateTime, Local};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::bot::Bot;
use crate::format::format_deadline;
use crate::models::{Task, TaskStatus};
use crate::repository::TaskRepository;
use crate::transport::{run_console, Shutdown};

/// Sends a single message to the bot and prints the reply.
pub fn cmd_send(bot: &Bot, user_id: i64, text: &str) {
    println!("{}", bot.handle(user_id, text));
}

/// Runs an interactive chat session on stdin/stdout until end of input,
/// `/quit`, or a shutdown signal.
pub fn cmd_chat(bot: &Bot, user_id: i64, shutdown: &Shutdown) -> anyhow::Result<()> {
    println!("Chatting as user {user_id}. Type /help for commands, /quit to leave.\n");
    let stdin = BufReader::new(io::stdin());
    let mut stdout = io::stdout();
    run_console(bot, user_id, stdin, &mut stdout, shutdown).context("console session failed")
}

/// Lists tasks in a formatted table, or as JSON.
///
/// By default only active tasks are shown, in deadline order; `all` shows
/// every task, newest first.
pub fn cmd_list(repo: &TaskRepository, user_id: i64, all: bool, json: bool) -> anyhow::Result<()> {
    let tasks = if all {
        repo.list_by_user(user_id)?
    } else {
        repo.list_active(user_id)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    println!("{}", task_table(&tasks, Local::now()));
    Ok(())
}

/// Table view of `tasks` with status and deadline columns.
pub fn task_table(tasks: &[Task], now: DateTime<Local>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
            Cell::new("Deadline").add_attribute(Attribute::Bold),
            Cell::new("Time Left").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    let today = now.date_naive();

    for t in tasks {
        let overdue = t.is_active() && t.is_overdue_at(now);
        let (deadline_str, time_left_str) = match t.deadline {
            Some(deadline) => {
                let days_left = (deadline.date_naive() - today).num_days();
                let left = if overdue {
                    format!("{}d overdue", days_left.abs().max(1))
                } else if days_left < 0 {
                    format!("{}d ago", -days_left)
                } else if days_left == 0 {
                    "Today".to_string()
                } else {
                    format!("{}d", days_left)
                };
                (format_deadline(deadline), left)
            }
            None => ("-".to_string(), "-".to_string()),
        };

        let status_color = match t.status {
            TaskStatus::Done => Color::Green,
            TaskStatus::Postponed => Color::Grey,
            TaskStatus::Active if overdue => Color::Red,
            TaskStatus::Active => Color::Yellow,
        };

        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(t.effective_description()),
            Cell::new(deadline_str),
            Cell::new(time_left_str).fg(if overdue { Color::Red } else { Color::Reset }),
            Cell::new(t.status).fg(status_color),
        ]);
    }

    table
}
