//! Full-screen chat console: task panel on the left, conversation on the
//! right, message input at the bottom.

pub mod app;
pub mod ui;

use std::{error::Error, io};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use app::App;
use ui::ui;

use crate::bot::Bot;
use crate::transport::{Shutdown, POLL_INTERVAL};

pub fn run_tui(bot: &Bot, user_id: i64, shutdown: &Shutdown) -> Result<(), Box<dyn Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(bot, user_id);

    let res = run_app(&mut terminal, &mut app, shutdown);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal console failed");
        return Err(err.into());
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, shutdown: &Shutdown) -> io::Result<()> {
    while !shutdown.is_triggered() {
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => shutdown.trigger(),
            KeyCode::Esc => return Ok(()),
            KeyCode::Enter => app.submit(),
            KeyCode::Char(c) => app.input_buffer.push(c),
            KeyCode::Backspace => {
                app.input_buffer.pop();
            }
            KeyCode::Down => app.next(),
            KeyCode::Up => app.previous(),
            KeyCode::F(2) => app.act_on_selected("done"),
            KeyCode::F(3) => app.act_on_selected("postpone"),
            KeyCode::F(8) => app.act_on_selected("delete"),
            KeyCode::PageUp => app.scroll_up(),
            KeyCode::PageDown => app.scroll_down(),
            _ => {}
        }
    }
    Ok(())
}
