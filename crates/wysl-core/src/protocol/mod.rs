//! Protocol module containing message types and the two wire codecs.

pub mod codec;
pub mod messages;
pub mod relay;

pub use codec::{decode_event, encode_event, ProtocolError, MAX_DATAGRAM_SIZE};
pub use messages::*;
pub use relay::{encode_channel, encode_command, RESET_SEQUENCE};
