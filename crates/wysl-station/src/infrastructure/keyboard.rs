//! Operator console.
//!
//! Reads one line at a time.  `start` and `quit` (case-insensitive, surrounding
//! whitespace ignored) are posted to the coordinator; anything else gets a
//! fixed reply and is otherwise ignored.  A `Terminate` from the coordinator
//! is honoured before the next prompt.

use std::io::{self, BufRead, Write};
use std::thread::JoinHandle;

use tracing::{debug, info};
use wysl_core::Command;

use crate::application::mailbox::{Mailbox, MailboxClosed};

/// Printed for any line that is not a known command.
pub const REJECTION: &str = "I beg your pardon?";

const PROMPT: &str = "> ";

/// Maps an operator line to a command.
pub fn parse_admin_command(line: &str) -> Option<Command> {
    match line.trim().to_lowercase().as_str() {
        "quit" => Some(Command::Terminate),
        "start" => Some(Command::Start),
        _ => None,
    }
}

/// Spawns the console reader on stdin/stdout.
///
/// The thread ends after `quit`, at end of input, or once the coordinator has
/// told it to stop or gone away.  A blocked `read_line` cannot be interrupted, so callers do not
/// join this thread.
///
/// # Errors
///
/// Returns the I/O error if the thread cannot be spawned.
pub fn start_keyboard(mailbox: Mailbox<Command>) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("keyboard".to_string())
        .spawn(move || keyboard_loop(&mailbox, io::stdin().lock(), io::stdout()))
}

/// Reads commands from `input` until `quit`, end of input, a `Terminate` from
/// the coordinator, or a closed mailbox.
pub fn keyboard_loop<R: BufRead, W: Write>(mailbox: &Mailbox<Command>, mut input: R, mut output: W) {
    let mut line = String::new();
    loop {
        match mailbox.poll() {
            Ok(Some(Command::Terminate)) => {
                debug!("console told to stop");
                break;
            }
            Ok(Some(other)) => debug!(?other, "unexpected command for console; ignored"),
            Ok(None) => {}
            Err(MailboxClosed) => {
                debug!("coordinator gone; console stopping");
                break;
            }
        }

        let _ = write!(output, "{PROMPT}");
        let _ = output.flush();

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => {
                debug!("console input closed");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!("console read failed: {e}");
                break;
            }
        }

        match parse_admin_command(&line) {
            Some(cmd) => {
                info!(?cmd, "console command");
                if mailbox.post(cmd).is_err() || cmd == Command::Terminate {
                    break;
                }
            }
            None => {
                let _ = writeln!(output, "{REJECTION}");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
