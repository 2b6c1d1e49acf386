//! Network codec for events exchanged between the two stations.
//!
//! Wire format: one [`Event`] per UDP datagram, the payload being a fixed
//! ASCII phrase per tag.  There is no header, no length prefix and no
//! sequence number:
//!
//! ```text
//! "High intensity smile detected"   ->  Event::HighSmile
//! "Game over"                       ->  Event::GameOver
//! ```
//!
//! Delivery is best-effort.  A datagram that does not decode is protocol
//! noise: the receiver drops it and carries on.

use thiserror::Error;

use crate::protocol::messages::Event;

/// Largest datagram the receiver reads in one call.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Errors that can occur while decoding a datagram.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The datagram was empty.
    #[error("empty datagram")]
    Empty,

    /// The datagram exceeds [`MAX_DATAGRAM_SIZE`].
    #[error("datagram too large: {0} bytes")]
    Oversized(usize),

    /// The bytes are not one of the known event phrases.
    #[error("unknown event payload: {0:?}")]
    UnknownPayload(String),
}

/// Returns the wire phrase for `event`.
///
/// # Examples
///
/// ```rust
/// use wysl_core::{decode_event, encode_event, Event};
///
/// let bytes = encode_event(Event::Laughter);
/// assert_eq!(bytes, b"Laughter detected");
/// assert_eq!(decode_event(bytes), Ok(Event::Laughter));
/// ```
pub fn encode_event(event: Event) -> &'static [u8] {
    match event {
        Event::NoLaughter => b"No laughter detected",
        Event::Laughter => b"Laughter detected",
        Event::NoSmile => b"No smile detected",
        Event::LowSmile => b"Low intensity smile detected",
        Event::MediumSmile => b"Medium intensity smile detected",
        Event::HighSmile => b"High intensity smile detected",
        Event::GameOver => b"Game over",
        Event::StartGame => b"Start game",
        Event::EndGame => b"End game",
    }
}

/// Decodes one datagram into an [`Event`].
///
/// Matching is exact: no trimming, no case folding.
///
/// # Errors
///
/// Returns [`ProtocolError`] when the datagram is empty, too large or not a
/// known phrase.
pub fn decode_event(datagram: &[u8]) -> Result<Event, ProtocolError> {
    if datagram.is_empty() {
        return Err(ProtocolError::Empty);
    }
    if datagram.len() > MAX_DATAGRAM_SIZE {
        return Err(ProtocolError::Oversized(datagram.len()));
    }
    Event::ALL
        .into_iter()
        .find(|event| encode_event(*event) == datagram)
        .ok_or_else(|| ProtocolError::UnknownPayload(String::from_utf8_lossy(datagram).into_owned()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
