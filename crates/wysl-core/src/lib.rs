//! # wysl-core
//!
//! Shared library for Wet Yourself Laughing (WYSL) containing the event
//! vocabulary, the two wire grammars and the pure game rules.
//!
//! This crate is used by the station binary and its tests.  It has zero
//! dependencies on threads, sockets or serial ports.
//!
//! # Architecture overview
//!
//! WYSL is a two-player party game.  Each player sits at a *station* with a
//! camera, a microphone and a relay board driving a tickling feather and a
//! balloon.  When one player smiles, the other player's feather tickles them;
//! whoever laughs first gets the balloon squeezed and loses.
//!
//! This crate (`wysl-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – the tagged values that flow between threads
//!   ([`Event`], [`Command`], [`ErrorSignal`]), the network codec (one ASCII
//!   phrase per UDP datagram) and the relay board's ASCII command grammar.
//!
//! - **`domain`** – the game's state machine vocabulary: [`GameState`],
//!   [`Origin`], how a session ends ([`SessionEnd`]) and how smile intensity
//!   maps to a tickle speed ([`TickleSpeeds`]).

pub mod domain;
pub mod protocol;

pub use domain::game::{GameState, Origin, SessionEnd, SmileIntensity, TickleSpeeds, Verdict};
pub use protocol::codec::{decode_event, encode_event, ProtocolError, MAX_DATAGRAM_SIZE};
pub use protocol::messages::{
    ChannelAction, Command, Direction, ErrorSignal, Event, NetworkMessage, Payload, RelayChannel,
    RelayMessage,
};
pub use protocol::relay::{encode_channel, encode_command, RESET_SEQUENCE};
