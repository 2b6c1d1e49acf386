//! ASCII command grammar of the relay board.
//!
//! ```text
//! +<L>            channel L on
//! -<L>            channel L off
//! !<L><ms>        pulse channel L every <ms> milliseconds (0 stops pulsing)
//! ```
//!
//! `L` is one of `A`–`D` for channels 1–4.  Commands are written back to back
//! with no separator.

use crate::protocol::messages::{ChannelAction, Command};

/// Stops pulsing on every channel, then turns every channel off.
pub const RESET_SEQUENCE: &str = "!A0!B0!C0!D0-A-B-C-D";

/// Encodes a relay command into the board grammar.
///
/// Returns `None` for commands the board does not understand (`QueryChannel`,
/// `Start`, `Terminate`); the controller ignores those.
pub fn encode_command(cmd: &Command) -> Option<String> {
    match *cmd {
        Command::ChannelOn(channel) => Some(format!("+{}", channel.letter())),
        Command::ChannelOff(channel) => Some(format!("-{}", channel.letter())),
        Command::PulseChannel {
            channel,
            interval_ms,
        } => Some(format!("!{}{}", channel.letter(), interval_ms)),
        Command::QueryChannel(_) | Command::Start | Command::Terminate => None,
    }
}

/// Encodes an action on a raw 1-based channel id.
///
/// Ids outside 1–4 produce no bytes.
pub fn encode_channel(channel_id: u8, action: ChannelAction) -> Option<String> {
    Command::for_channel(channel_id, action).and_then(|cmd| encode_command(&cmd))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
