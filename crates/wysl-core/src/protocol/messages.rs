//! All WYSL message types.
//!
//! Three closed tag sets travel between the station's threads:
//!
//! - [`Event`] – something a sensing worker classified, or something the peer
//!   station told us.  Carries no data beyond its tag.
//! - [`Command`] – a directive from the coordinator to an actuator or worker.
//!   Only the relay commands carry data (a channel, and for pulses an interval).
//! - [`ErrorSignal`] – a component failed and the session must end.
//!
//! Each source gets its own envelope ([`Payload`], [`RelayMessage`],
//! [`NetworkMessage`]) so the coordinator's dispatch `match` is checked for
//! exhaustiveness per source.

use std::fmt;

use crate::domain::game::SmileIntensity;

// ── Events ────────────────────────────────────────────────────────────────────

/// A classified occurrence produced by a sensing worker or received from the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    NoSmile,
    LowSmile,
    MediumSmile,
    HighSmile,
    NoLaughter,
    Laughter,
    StartGame,
    EndGame,
    GameOver,
}

impl Event {
    /// Every event tag, in declaration order.
    pub const ALL: [Event; 9] = [
        Event::NoSmile,
        Event::LowSmile,
        Event::MediumSmile,
        Event::HighSmile,
        Event::NoLaughter,
        Event::Laughter,
        Event::StartGame,
        Event::EndGame,
        Event::GameOver,
    ];

    /// Returns the smile intensity for the four smile events, `None` otherwise.
    pub fn smile_intensity(self) -> Option<SmileIntensity> {
        match self {
            Event::NoSmile => Some(SmileIntensity::None),
            Event::LowSmile => Some(SmileIntensity::Low),
            Event::MediumSmile => Some(SmileIntensity::Medium),
            Event::HighSmile => Some(SmileIntensity::High),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ── Relay channels ────────────────────────────────────────────────────────────

/// One of the four physical relay channels on the actuator board.
///
/// Channel ids 1–4 map to board letters A–D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RelayChannel {
    A = 1,
    B = 2,
    C = 3,
    D = 4,
}

impl RelayChannel {
    /// All four channels in id order.
    pub const ALL: [RelayChannel; 4] = [
        RelayChannel::A,
        RelayChannel::B,
        RelayChannel::C,
        RelayChannel::D,
    ];

    /// The 1-based channel id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// The letter the relay board uses for this channel.
    pub fn letter(self) -> char {
        match self {
            RelayChannel::A => 'A',
            RelayChannel::B => 'B',
            RelayChannel::C => 'C',
            RelayChannel::D => 'D',
        }
    }
}

impl TryFrom<u8> for RelayChannel {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RelayChannel::A),
            2 => Ok(RelayChannel::B),
            3 => Ok(RelayChannel::C),
            4 => Ok(RelayChannel::D),
            _ => Err(()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// A coordinator-to-component directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Energise a relay channel.
    ChannelOn(RelayChannel),
    /// De-energise a relay channel.
    ChannelOff(RelayChannel),
    /// Toggle a relay channel every `interval_ms`; an interval of 0 cancels pulsing.
    PulseChannel {
        channel: RelayChannel,
        interval_ms: u32,
    },
    /// Ask the board for a channel's state.  Not part of the board grammar the
    /// controller speaks, so it is ignored there.
    QueryChannel(RelayChannel),
    /// Shut down.  The sole cancellation primitive; also used by workers to
    /// acknowledge a shutdown.
    Terminate,
    /// Operator asked to start the game.
    Start,
}

/// What to do to a channel, before the channel id has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    On,
    Off,
    Pulse(u32),
    Query,
}

impl Command {
    /// Builds the relay command for a raw 1-based `channel_id`.
    ///
    /// Returns `None` for ids outside 1–4, which callers drop silently.
    pub fn for_channel(channel_id: u8, action: ChannelAction) -> Option<Command> {
        let channel = RelayChannel::try_from(channel_id).ok()?;
        Some(match action {
            ChannelAction::On => Command::ChannelOn(channel),
            ChannelAction::Off => Command::ChannelOff(channel),
            ChannelAction::Pulse(interval_ms) => Command::PulseChannel {
                channel,
                interval_ms,
            },
            ChannelAction::Query => Command::QueryChannel(channel),
        })
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// A session-fatal failure raised by a worker or controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSignal {
    CameraError,
    MicrophoneError,
    SerialError,
    NetworkError,
}

impl ErrorSignal {
    /// Human-readable description used in the termination message.
    pub fn describe(self) -> &'static str {
        match self {
            ErrorSignal::CameraError => "problem with the camera",
            ErrorSignal::MicrophoneError => "problem with the microphone",
            ErrorSignal::SerialError => "problem with the serial device",
            ErrorSignal::NetworkError => "problem with the network socket",
        }
    }
}

// ── Envelopes ─────────────────────────────────────────────────────────────────

/// Whether an event on the network queue is headed to the peer or came from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Recv,
}

/// The envelope exchanged with sensing workers over their duplex pipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Event(Event),
    Command(Command),
    Error(ErrorSignal),
}

/// The envelope on the relay controller's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMessage {
    Command(Command),
    Error(ErrorSignal),
}

/// The envelope on the network sync channel's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMessage {
    Event { event: Event, direction: Direction },
    Command(Command),
    Error(ErrorSignal),
}

impl NetworkMessage {
    /// An event headed to the peer.
    pub fn outbound(event: Event) -> Self {
        NetworkMessage::Event {
            event,
            direction: Direction::Send,
        }
    }

    /// An event that arrived from the peer.
    pub fn inbound(event: Event) -> Self {
        NetworkMessage::Event {
            event,
            direction: Direction::Recv,
        }
    }
}

impl From<Command> for RelayMessage {
    fn from(cmd: Command) -> Self {
        RelayMessage::Command(cmd)
    }
}

impl From<Command> for NetworkMessage {
    fn from(cmd: Command) -> Self {
        NetworkMessage::Command(cmd)
    }
}

impl From<Command> for Payload {
    fn from(cmd: Command) -> Self {
        Payload::Command(cmd)
    }
}

impl From<Event> for Payload {
    fn from(event: Event) -> Self {
        Payload::Event(event)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
