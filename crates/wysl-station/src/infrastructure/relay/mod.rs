//! Relay channel controller.
//!
//! Owns the serial connection to the relay board and turns [`Command`]s from
//! the coordinator into the board's ASCII grammar (see
//! [`wysl_core::protocol::relay`]).
//!
//! # Lifecycle
//!
//! 1. Open the port.  On failure post [`ErrorSignal::SerialError`] and stop;
//!    there is no retry.
//! 2. Write [`RESET_SEQUENCE`] so every channel starts off and not pulsing.
//! 3. Write each command as it arrives.  Commands with no board encoding are
//!    skipped.  A failed write is logged and play continues.
//! 4. On `Terminate`, or when the coordinator's end is dropped, write the
//!    reset sequence again and close the port.

use std::io::{self, Write};
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use wysl_core::{encode_command, Command, ErrorSignal, RelayMessage, RESET_SEQUENCE};

use crate::application::mailbox::{Mailbox, MailboxClosed};

/// Serial read/write timeout used when opening the board.
const SERIAL_TIMEOUT: Duration = Duration::from_millis(100);

/// Errors from the relay board connection.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The serial device could not be opened.
    #[error("failed to open serial port {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },

    /// Bytes could not be written to the board.
    #[error("failed to write to relay board: {0}")]
    Write(#[from] io::Error),
}

/// Where and how fast to talk to the relay board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Device path, e.g. `/dev/ttyACM0` or `COM5`.
    pub port: String,
    pub baudrate: u32,
}

/// Opens the relay board's serial port.
///
/// DTR is raised after opening; the board only accepts writes once it sees it.
///
/// # Errors
///
/// Returns [`RelayError::Open`] if the device cannot be opened.
pub fn open_serial_port(
    settings: &SerialSettings,
) -> Result<Box<dyn serialport::SerialPort>, RelayError> {
    let open_error = |source| RelayError::Open {
        path: settings.port.clone(),
        source,
    };
    let mut port = serialport::new(settings.port.as_str(), settings.baudrate)
        .timeout(SERIAL_TIMEOUT)
        .open()
        .map_err(open_error)?;
    port.write_data_terminal_ready(true).map_err(open_error)?;
    Ok(port)
}

/// Spawns the relay controller thread.
///
/// `open` runs on the new thread, so the writer it returns does not need to
/// be `Send`.  Pass `|| open_serial_port(&settings)` for the real board.
///
/// # Errors
///
/// Returns the I/O error if the thread cannot be spawned.
pub fn start_relay_controller<W, F>(
    mailbox: Mailbox<RelayMessage>,
    poll_interval: Duration,
    open: F,
) -> io::Result<JoinHandle<()>>
where
    W: Write,
    F: FnOnce() -> Result<W, RelayError> + Send + 'static,
{
    std::thread::Builder::new()
        .name("relay-controller".to_string())
        .spawn(move || match open() {
            Ok(writer) => relay_loop(mailbox, writer, poll_interval),
            Err(e) => {
                error!("{e}");
                let _ = mailbox.post(RelayMessage::Error(ErrorSignal::SerialError));
            }
        })
}

/// Runs the controller against an already open writer until told to stop.
pub fn relay_loop<W: Write>(mailbox: Mailbox<RelayMessage>, mut writer: W, poll_interval: Duration) {
    info!("relay controller started");
    write_logged(&mut writer, RESET_SEQUENCE.as_bytes());

    loop {
        match mailbox.take_timeout(poll_interval) {
            Ok(Some(RelayMessage::Command(Command::Terminate))) => break,
            Ok(Some(RelayMessage::Command(cmd))) => match encode_command(&cmd) {
                Some(bytes) => {
                    debug!(%bytes, "relay write");
                    write_logged(&mut writer, bytes.as_bytes());
                }
                None => debug!(?cmd, "command has no board encoding; ignored"),
            },
            Ok(Some(RelayMessage::Error(signal))) => {
                debug!(?signal, "error signal sent to relay controller; ignored")
            }
            Ok(None) => {}
            Err(MailboxClosed) => {
                warn!("coordinator went away without terminating the relay controller");
                break;
            }
        }
    }

    write_logged(&mut writer, RESET_SEQUENCE.as_bytes());
    info!("relay controller stopped");
}

fn write_logged<W: Write>(writer: &mut W, bytes: &[u8]) {
    if let Err(e) = write_bytes(writer, bytes) {
        warn!("{e}");
    }
}

fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<(), RelayError> {
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
