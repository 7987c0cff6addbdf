//! Personal task assistant driven by chat-style messages.
//!
//! Text such as `/add Buy milk срок: 25.12.2024` goes into [`bot::Bot::handle`]
//! and a formatted reply comes back. Tasks live in SQLite or a JSON file
//! behind [`storage::TaskStore`].

pub mod bot;
pub mod commands;
pub mod config;
pub mod dates;
pub mod format;
pub mod models;
pub mod parser;
pub mod quota;
pub mod repository;
pub mod storage;
pub mod transport;
pub mod tui;
