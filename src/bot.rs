//! Chat command dispatch.
//!
//! Every inbound message is an independent unit of work: it is parsed,
//! executed against the repository and answered with display text. Errors
//! never escape [`Bot::handle`]; they become `❌` replies.

use chrono::Local;
use thiserror::Error;

use crate::dates::DateError;
use crate::format::{format_deadline, format_error, format_item, format_list, DEADLINE_GLYPH};
use crate::models::{NewTask, Task, TaskStatus, ValidationError, MAX_DESCRIPTION_CHARS};
use crate::parser::{
    command_name, parse_add_command, parse_edit_command, parse_task_id, ParseError,
};
use crate::repository::{RepoError, TaskRepository};

const WELCOME_TEXT: &str = "\
🤖 Добро пожаловать в Task Assistant Bot!

Этот бот поможет вам управлять задачами. Доступные команды:

📝 /add \"Описание задачи\" срок: 2025-07-15 - добавить задачу
📋 /list - показать все активные задачи
✅ /done [id] - отметить задачу как выполненную
✏️ /edit [id] новое_описание срок: ... - редактировать задачу
❓ /help - показать справку

Удачного планирования! 🚀";

const HELP_TEXT: &str = "\
📚 Справка по командам:

📝 Добавление задачи:
/add \"Описание задачи\" срок: 2025-07-15
Пример: /add \"Купить продукты\" срок: 2025-07-20

📋 Просмотр задач:
/list - показать все активные задачи (отсортированы по сроку)
/all - показать все задачи
/overdue - показать просроченные задачи

✅ Отметка выполнения:
/done [id] - отметить задачу как выполненную
Пример: /done 3
/postpone [id] - отложить задачу
/delete [id] - удалить задачу

✏️ Редактирование задачи:
/edit [id] новое_описание срок: 2025-07-25
Пример: /edit 2 \"Купить продукты и готовить ужин\" срок: 2025-07-21

📊 Форматы дат:
- 2025-07-15 (YYYY-MM-DD)
- 15.07.2025 (DD.MM.YYYY)
- 15/07/2025 (DD/MM/YYYY)
- 2025/07/15 (YYYY/MM/DD)
- 15-07-2025 (DD-MM-YYYY)
- 07/15/2025 (MM/DD/YYYY)

❓ /help - показать эту справку";

const PLAIN_TEXT_HINT: &str = "Используйте /help для получения списка доступных команд";
const UNKNOWN_COMMAND: &str =
    "❓ Неизвестная команда. Используйте /help для просмотра доступных команд.";
const STORAGE_FAILURE: &str = "Произошла ошибка при обработке команды. Попробуйте позже.";

const ACTIVE_TITLE: &str = "Активные задачи";
const ALL_TITLE: &str = "Все задачи";
const OVERDUE_TITLE: &str = "Просроченные задачи";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Repository(#[from] RepoError),
}

/// Routes chat messages to task operations.
pub struct Bot {
    repo: TaskRepository,
}

impl Bot {
    pub fn new(repo: TaskRepository) -> Self {
        Bot { repo }
    }

    pub fn repository(&self) -> &TaskRepository {
        &self.repo
    }

    /// Answers one message from `user_id`. Always produces a reply.
    pub fn handle(&self, user_id: i64, text: &str) -> String {
        let command = command_name(text).unwrap_or("");
        tracing::info!(user_id, command, "message received");

        match self.dispatch(user_id, text) {
            Ok(reply) => reply,
            Err(err) => {
                match &err {
                    CommandError::Repository(RepoError::Storage(source)) => {
                        tracing::error!(user_id, command, error = %source, "command failed");
                    }
                    other => {
                        tracing::debug!(user_id, command, error = %other, "command rejected");
                    }
                }
                format_error(&user_message(&err))
            }
        }
    }

    fn dispatch(&self, user_id: i64, text: &str) -> Result<String, CommandError> {
        let Some(command) = command_name(text) else {
            return Ok(PLAIN_TEXT_HINT.to_string());
        };
        let args = text.trim_start().splitn(2, char::is_whitespace).nth(1).unwrap_or("");

        match command {
            "start" => Ok(WELCOME_TEXT.to_string()),
            "help" => Ok(HELP_TEXT.to_string()),
            "add" => self.add(user_id, text),
            "list" => Ok(list_reply(ACTIVE_TITLE, &self.repo.list_active(user_id)?)),
            "all" => Ok(list_reply(ALL_TITLE, &self.repo.list_by_user(user_id)?)),
            "overdue" => Ok(list_reply(OVERDUE_TITLE, &self.repo.list_overdue(user_id)?)),
            "done" => self.set_status(user_id, args, TaskStatus::Done),
            "postpone" => self.set_status(user_id, args, TaskStatus::Postponed),
            "delete" => self.delete(user_id, args),
            "edit" => self.edit(user_id, text),
            _ => Ok(UNKNOWN_COMMAND.to_string()),
        }
    }

    fn add(&self, user_id: i64, text: &str) -> Result<String, CommandError> {
        let input = parse_add_command(text)?;
        let task = self
            .repo
            .add(NewTask::new(user_id, input.description).with_deadline(input.deadline))?;

        let mut reply = format!(
            "✅ Задача добавлена (ID: {})\n📝 {}",
            task.id,
            task.effective_description()
        );
        if let Some(deadline) = task.deadline {
            reply.push_str(&format!("\n{DEADLINE_GLYPH} Срок: {}", format_deadline(deadline)));
        }
        Ok(reply)
    }

    fn set_status(
        &self,
        user_id: i64,
        args: &str,
        status: TaskStatus,
    ) -> Result<String, CommandError> {
        let id = parse_task_id(args)?;
        let mut task = self.owned_task(user_id, id)?;
        task.status = status;
        self.repo.update(&mut task)?;

        Ok(match status {
            TaskStatus::Done => format!("✅ Задача {id} отмечена как выполненная"),
            TaskStatus::Postponed => format!("⏸️ Задача {id} отложена"),
            TaskStatus::Active => format!("📝 Задача {id} снова активна"),
        })
    }

    fn delete(&self, user_id: i64, args: &str) -> Result<String, CommandError> {
        let id = parse_task_id(args)?;
        self.owned_task(user_id, id)?;
        self.repo.delete(id)?;
        Ok(format!("🗑 Задача {id} удалена"))
    }

    fn edit(&self, user_id: i64, text: &str) -> Result<String, CommandError> {
        let input = parse_edit_command(text)?;
        let mut task = self.owned_task(user_id, input.id)?;
        task.original_description = input.task.description;
        task.processed_description = None;
        if input.task.deadline.is_some() {
            task.deadline = input.task.deadline;
        }
        self.repo.update(&mut task)?;

        Ok(format!(
            "✏️ Задача обновлена\n{}",
            format_item(&task, 1, Local::now())
        ))
    }

    /// Loads task `id`, treating tasks of other users as missing.
    fn owned_task(&self, user_id: i64, id: i64) -> Result<Task, CommandError> {
        let task = self.repo.get(id)?;
        if task.user_id != user_id {
            return Err(RepoError::NotFound(id).into());
        }
        Ok(task)
    }
}

fn list_reply(title: &str, tasks: &[Task]) -> String {
    format_list(tasks, title, Local::now())
}

/// Corrective text shown to the user for `err`. Storage details stay in the
/// logs.
pub fn user_message(err: &CommandError) -> String {
    match err {
        CommandError::Parse(err) => parse_message(err),
        CommandError::Repository(RepoError::Validation(err)) => validation_message(err),
        CommandError::Repository(RepoError::NotFound(id)) => {
            format!("Задача с ID {id} не найдена")
        }
        CommandError::Repository(RepoError::Storage(_)) => STORAGE_FAILURE.to_string(),
    }
}

fn parse_message(err: &ParseError) -> String {
    match err {
        ParseError::EmptyCommand | ParseError::MissingDescription => {
            "Укажите описание задачи. Пример: /add \"Купить продукты\" срок: 2025-07-20".to_string()
        }
        ParseError::EmptyDescription => "Описание задачи не может быть пустым".to_string(),
        ParseError::MissingTaskId => "Укажите ID задачи. Пример: /done 3".to_string(),
        ParseError::InvalidTaskId(raw) => format!("Некорректный ID задачи: {raw}"),
        ParseError::NonPositiveTaskId => "ID задачи должен быть положительным числом".to_string(),
        ParseError::Date(DateError::InvalidInput) => "Не указана дата срока".to_string(),
        ParseError::Date(DateError::InvalidFormat { supported }) => format!(
            "Неверный формат даты. Поддерживаемые форматы: {}",
            supported.join(", ")
        ),
    }
}

fn validation_message(err: &ValidationError) -> String {
    match err {
        ValidationError::InvalidUser => "Не удалось определить пользователя".to_string(),
        ValidationError::EmptyDescription => "Описание задачи не может быть пустым".to_string(),
        ValidationError::DescriptionTooLong => format!(
            "Описание задачи слишком длинное (максимум {MAX_DESCRIPTION_CHARS} символов)"
        ),
        ValidationError::InvalidStatus(_) => "Недопустимый статус задачи".to_string(),
    }
}
