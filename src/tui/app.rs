use ratatui::widgets::TableState;

use crate::bot::Bot;
use crate::models::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub speaker: Speaker,
    pub text: String,
}

pub struct App<'a> {
    bot: &'a Bot,
    pub user_id: i64,
    /// Active tasks, in the order `/list` shows them.
    pub tasks: Vec<Task>,
    pub state: TableState,
    pub messages: Vec<ChatLine>,
    pub input_buffer: String,
    /// Rows scrolled back from the bottom of the conversation.
    pub scroll_back: u16,
}

impl<'a> App<'a> {
    /// Creates the console state and greets the user with `/start`.
    pub fn new(bot: &'a Bot, user_id: i64) -> App<'a> {
        let mut app = App {
            bot,
            user_id,
            tasks: Vec::new(),
            state: TableState::default(),
            messages: Vec::new(),
            input_buffer: String::new(),
            scroll_back: 0,
        };
        app.send("/start");
        app
    }

    /// Sends the input line as a chat message.
    pub fn submit(&mut self) {
        let text = std::mem::take(&mut self.input_buffer);
        let text = text.trim();
        if !text.is_empty() {
            self.send(text);
        }
    }

    /// Delivers `text` to the bot, records both sides and refreshes the
    /// task panel.
    pub fn send(&mut self, text: &str) {
        let reply = self.bot.handle(self.user_id, text);
        self.messages.push(ChatLine {
            speaker: Speaker::User,
            text: text.to_string(),
        });
        self.messages.push(ChatLine {
            speaker: Speaker::Bot,
            text: reply,
        });
        self.scroll_back = 0;
        self.reload();
    }

    /// Reloads the active task list and keeps the selection in range.
    pub fn reload(&mut self) {
        match self.bot.repository().list_active(self.user_id) {
            Ok(tasks) => self.tasks = tasks,
            Err(e) => {
                tracing::error!(error = %e, "failed to refresh task panel");
                self.tasks.clear();
            }
        }

        if self.tasks.is_empty() {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= self.tasks.len() {
                self.state.select(Some(self.tasks.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    /// Selects the next task, wrapping around.
    pub fn next(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.tasks.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous task, wrapping around.
    pub fn previous(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.tasks.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.state.selected().and_then(|i| self.tasks.get(i))
    }

    /// Runs `/<command> <id>` for the selected task through the chat, so the
    /// action shows up in the conversation.
    pub fn act_on_selected(&mut self, command: &str) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            self.send(&format!("/{command} {id}"));
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_back = self.scroll_back.saturating_add(3);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_back = self.scroll_back.saturating_sub(3);
    }
}
