//! Tiny relay board terminal.
//!
//! ```text
//! relay-console <PORT> [BAUD]
//! ```
//!
//! Opens the relay board and writes every line typed on stdin to it verbatim
//! (without the newline), so the board grammar can be tried by hand:
//! `+A`, `-A`, `!B500`, `!A0!B0!C0!D0-A-B-C-D`.  Exits at end of input.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wysl_station::infrastructure::relay::{open_serial_port, SerialSettings};

const DEFAULT_BAUDRATE: u32 = 9600;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(port) = args.next() else {
        bail!("usage: relay-console <PORT> [BAUD]");
    };
    let baudrate = match args.next() {
        Some(b) => b.parse().with_context(|| format!("invalid baud rate {b:?}"))?,
        None => DEFAULT_BAUDRATE,
    };

    let settings = SerialSettings { port, baudrate };
    let mut board = open_serial_port(&settings).context("couldn't open that port")?;
    info!(port = %settings.port, baudrate, "relay board open");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let command = line.trim_end_matches(['\r', '\n']);
        if let Err(e) = board.write_all(command.as_bytes()).and_then(|()| board.flush()) {
            warn!("write failed: {e}");
        }
    }

    info!("relay console closed");
    Ok(())
}
