//! Game state machine vocabulary.
//!
//! A station's session moves through these states:
//!
//! ```text
//! Idle  ──start──►  InGame  ──laughter / game over / peer end──►  GameOver
//!   │                  │
//!   └──quit / fault────┴──────────────────────────────────────────►  Terminated
//! ```
//!
//! - `Idle`: waiting for the operator's `start` or the peer's `StartGame`.
//!   Classification events keep flowing but cause nothing.
//! - `InGame`: smiles are forwarded to the peer, the peer's smiles drive the
//!   local feather, laughter ends the game.
//! - `GameOver`: play ended normally, won or lost, or the peer ended it.
//! - `Terminated`: the operator quit, a sensing worker stopped, or a component
//!   failed.
//!
//! The coordinator is the only owner of a [`GameState`]; no other thread reads
//! or writes it.

use std::fmt;

use crate::protocol::messages::ErrorSignal;

/// Where the coordinator is in the game lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Idle,
    InGame,
    GameOver,
    Terminated,
}

impl GameState {
    /// Moves `Idle` to `InGame`.
    ///
    /// Returns `true` if the transition happened; any other state is left
    /// unchanged.
    pub fn start(&mut self) -> bool {
        if *self == GameState::Idle {
            *self = GameState::InGame;
            true
        } else {
            false
        }
    }

    /// Returns `true` once the session has ended, one way or another.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameState::GameOver | GameState::Terminated)
    }
}

/// Whether an event was produced at this station or received from the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

/// Result of a finished game from this station's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Win,
    Lose,
}

/// Why a session ended.
///
/// Only [`SessionEnd::Fault`] is an error; every other variant is a normal
/// lifecycle outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Play finished with a winner.
    GameOver(Verdict),
    /// The local operator quit.
    UserQuit,
    /// The peer station ended the game.
    PeerEnded,
    /// A sensing worker acknowledged shutdown on its own.
    WorkerStopped(String),
    /// A component failed.
    Fault(ErrorSignal),
}

impl SessionEnd {
    /// The state the coordinator is left in.
    pub fn final_state(&self) -> GameState {
        match self {
            SessionEnd::GameOver(_) | SessionEnd::PeerEnded => GameState::GameOver,
            SessionEnd::UserQuit | SessionEnd::WorkerStopped(_) | SessionEnd::Fault(_) => {
                GameState::Terminated
            }
        }
    }

    /// Returns `true` for device, sensing and network failures.
    pub fn is_fault(&self) -> bool {
        matches!(self, SessionEnd::Fault(_))
    }
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::GameOver(Verdict::Win) => write!(f, "Game over: you win!"),
            SessionEnd::GameOver(Verdict::Lose) => write!(f, "Game over: you lose!"),
            SessionEnd::UserQuit => write!(f, "Shutting down at user request."),
            SessionEnd::PeerEnded => write!(f, "Shutting down: the other player ended the game."),
            SessionEnd::WorkerStopped(name) => write!(f, "Shutting down: the {name} worker stopped."),
            SessionEnd::Fault(signal) => write!(f, "Shutting down due to a {}.", signal.describe()),
        }
    }
}

// ── Smile intensity ───────────────────────────────────────────────────────────

/// Four-level classification of a player's smile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SmileIntensity {
    None,
    Low,
    Medium,
    High,
}

/// Feather pulse intervals in milliseconds, one per smile intensity.
///
/// A bigger smile on the other side tickles faster, so the interval shrinks as
/// intensity grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickleSpeeds {
    pub slower_ms: u32,
    pub slow_ms: u32,
    pub fast_ms: u32,
    pub faster_ms: u32,
}

impl TickleSpeeds {
    /// The pulse interval for `intensity`.
    pub fn interval_for(&self, intensity: SmileIntensity) -> u32 {
        match intensity {
            SmileIntensity::None => self.slower_ms,
            SmileIntensity::Low => self.slow_ms,
            SmileIntensity::Medium => self.fast_ms,
            SmileIntensity::High => self.faster_ms,
        }
    }

    /// Returns `true` when each speed is strictly faster than the previous one.
    pub fn is_strictly_decreasing(&self) -> bool {
        self.slower_ms > self.slow_ms && self.slow_ms > self.fast_ms && self.fast_ms > self.faster_ms
    }
}

impl Default for TickleSpeeds {
    fn default() -> Self {
        Self {
            slower_ms: 1000,
            slow_ms: 500,
            fast_ms: 250,
            faster_ms: 100,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
