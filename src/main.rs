//! # taskmate
//!
//! A chat-style task assistant. Every interface funnels plain messages into
//! the same command dispatcher, so the bot behaves identically in a line
//! console, the full-screen console, and one-shot `send` calls.
//!
//! ## Usage
//!
//! ```bash
//! # Full-screen console (default)
//! taskmate
//! taskmate ui
//!
//! # Line console on stdin/stdout
//! taskmate chat
//!
//! # One message, one reply
//! taskmate send "/add Купить молоко срок: 25.12.2024"
//! taskmate send /list
//!
//! # Table or JSON listing
//! taskmate list --all
//! taskmate list --json
//! ```
//!
//! ## Configuration
//!
//! * `TASKMATE_DB`: database file; `.json` selects the JSON store, anything
//!   else SQLite. Defaults to `~/.local/share/taskmate/tasks.db` on Linux.
//! * `TASKMATE_USER`: sender id reported by the consoles (default `1`).
//! * `TASKMATE_LOG` or `RUST_LOG`: log filter (default `info`).
//!
//! `--db` and `--user` override the environment.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use taskmate::bot::Bot;
use taskmate::commands::{cmd_chat, cmd_list, cmd_send};
use taskmate::config::Config;
use taskmate::repository::TaskRepository;
use taskmate::storage;
use taskmate::transport::Shutdown;
use taskmate::tui::run_tui;

#[derive(Parser)]
#[command(name = "taskmate")]
#[command(about = "Chat-style personal task assistant", long_about = None)]
struct Cli {
    /// Database file (`.json` for the JSON store, otherwise SQLite)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// User id to send messages as
    #[arg(long, global = true)]
    user: Option<i64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the bot on stdin/stdout
    Chat,
    /// Open the full-screen console
    Ui,
    /// Send one message and print the reply
    Send {
        /// Message text, e.g. "/add Buy milk срок: 25.12.2024"
        text: String,
    },
    /// List tasks
    List {
        /// Show every task, not only active ones
        #[arg(short, long)]
        all: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "taskmate", &mut io::stdout());
        return Ok(());
    }

    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(user) = cli.user {
        anyhow::ensure!(user > 0, "--user must be a positive integer, got {user}");
        config.user_id = user;
    }

    let full_screen = matches!(cli.command, Some(Commands::Ui) | None);
    init_tracing(&config, full_screen)?;

    let store = storage::open(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let bot = Bot::new(TaskRepository::new(store));

    let shutdown = Shutdown::new();
    shutdown
        .install_signal_handler()
        .context("failed to install signal handler")?;

    match cli.command {
        Some(Commands::Chat) => cmd_chat(&bot, config.user_id, &shutdown)?,
        Some(Commands::Send { text }) => cmd_send(&bot, config.user_id, &text),
        Some(Commands::List { all, json }) => cmd_list(bot.repository(), config.user_id, all, json)?,
        Some(Commands::Ui) | None => {
            run_tui(&bot, config.user_id, &shutdown).map_err(|e| anyhow::anyhow!("Error running TUI: {e}"))?
        }
        Some(Commands::Completions { .. }) => {}
    }

    tracing::info!("taskmate stopped");
    Ok(())
}

/// Logs go to stderr, except while the full-screen console owns the terminal;
/// then they are appended to a file next to the database.
fn init_tracing(config: &Config, full_screen: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if full_screen {
        let path = config.log_path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else {
        builder.with_writer(io::stderr).init();
    }
    Ok(())
}
