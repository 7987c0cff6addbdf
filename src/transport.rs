//! Line-oriented chat transport over any reader/writer pair, plus the
//! shutdown token shared by every transport loop.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::bot::Bot;

/// How often a waiting loop re-checks the shutdown token.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

const QUIT_COMMANDS: [&str; 2] = ["/quit", "/exit"];

/// Cooperative cancellation signal handed to transport loops.
#[derive(Clone, Debug, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Routes SIGINT, SIGTERM and SIGHUP to this token instead of killing the
    /// process.
    pub fn install_signal_handler(&self) -> Result<(), ctrlc::Error> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            tracing::info!("shutdown signal received");
            token.trigger();
        })
    }
}

/// Feeds each input line to `bot` as a message from `user_id` and writes the
/// reply followed by a blank line.
///
/// Returns on end of input, on `/quit`, or once `shutdown` fires. Input is
/// read on a helper thread so a blocked read does not delay shutdown.
pub fn run_console<R, W>(
    bot: &Bot,
    user_id: i64,
    input: R,
    output: &mut W,
    shutdown: &Shutdown,
) -> io::Result<()>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    let (tx, rx) = mpsc::channel::<io::Result<String>>();
    thread::spawn(move || {
        for line in input.lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    tracing::info!(user_id, "console session started");
    loop {
        if shutdown.is_triggered() {
            break;
        }

        let line = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line?,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if QUIT_COMMANDS.contains(&text) {
            break;
        }

        let reply = bot.handle(user_id, text);
        writeln!(output, "{reply}\n")?;
        output.flush()?;
    }
    tracing::info!(user_id, "console session ended");
    Ok(())
}
