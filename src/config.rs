use std::path::PathBuf;

use thiserror::Error;

/// Environment variable overriding the database path.
pub const DB_ENV: &str = "TASKMATE_DB";
/// Environment variable holding the sender id used by the local consoles.
pub const USER_ENV: &str = "TASKMATE_USER";
/// Environment variable holding the log filter (falls back to `RUST_LOG`).
pub const LOG_ENV: &str = "TASKMATE_LOG";

const DEFAULT_USER_ID: i64 = 1;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{} must be a positive integer, got {:?}", USER_ENV, .0)]
    InvalidUser(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Database file. A `.json` extension selects the JSON store.
    pub db_path: PathBuf,
    /// Sender id the console transports report for every message.
    pub user_id: i64,
    /// `tracing_subscriber::EnvFilter` directive string.
    pub log_filter: String,
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Unset or empty
    /// variables fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = get(DB_ENV).map(PathBuf::from).unwrap_or_else(default_db_path);

        let user_id = match get(USER_ENV) {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(id) if id > 0 => id,
                _ => return Err(ConfigError::InvalidUser(raw)),
            },
            None => DEFAULT_USER_ID,
        };

        let log_filter = get(LOG_ENV)
            .or_else(|| get("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Config {
            db_path,
            user_id,
            log_filter,
        })
    }

    /// Log file used while the full-screen console owns the terminal.
    pub fn log_path(&self) -> PathBuf {
        let mut p = self.db_path.clone();
        p.set_file_name("taskmate.log");
        p
    }
}

/// `~/.local/share/taskmate/tasks.db` on Linux, `./tasks.db` when no data
/// directory is known.
pub fn default_db_path() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("taskmate");
    p.push("tasks.db");
    p
}
