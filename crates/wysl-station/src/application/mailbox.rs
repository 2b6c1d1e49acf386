//! Duplex queue endpoints.
//!
//! Every thread in a station talks to the coordinator through a pair of
//! [`Mailbox`]es created by [`mailbox_pair`].  Whatever one end posts, the
//! other end takes, in FIFO order.  Both directions are unbounded so posting
//! never blocks.
//!
//! ```text
//!   coordinator end                      component end
//!  ┌──────────────┐  post ─────────► take ┌──────────────┐
//!  │   Mailbox    │                       │   Mailbox    │
//!  └──────────────┘  take ◄───────── post └──────────────┘
//! ```
//!
//! Taking is always non-blocking or bounded by a timeout; nothing in the
//! station waits forever on a mailbox.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use thiserror::Error;

/// The other end of the mailbox was dropped.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("mailbox peer has gone away")]
pub struct MailboxClosed;

/// One end of a duplex queue.
#[derive(Debug)]
pub struct Mailbox<T> {
    outbox: Sender<T>,
    inbox: Receiver<T>,
}

/// Creates two connected mailbox ends.
pub fn mailbox_pair<T>() -> (Mailbox<T>, Mailbox<T>) {
    let (a_tx, b_rx) = unbounded();
    let (b_tx, a_rx) = unbounded();
    (
        Mailbox {
            outbox: a_tx,
            inbox: a_rx,
        },
        Mailbox {
            outbox: b_tx,
            inbox: b_rx,
        },
    )
}

impl<T> Mailbox<T> {
    /// Posts `msg` to the other end.
    ///
    /// # Errors
    ///
    /// Returns [`MailboxClosed`] if the other end has been dropped.
    pub fn post(&self, msg: T) -> Result<(), MailboxClosed> {
        self.outbox.send(msg).map_err(|_| MailboxClosed)
    }

    /// Takes the next message if one is waiting.
    pub fn try_take(&self) -> Option<T> {
        self.inbox.try_recv().ok()
    }

    /// Waits up to `timeout` for the next message.
    ///
    /// Returns `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`MailboxClosed`] once the other end is dropped and the queue is
    /// empty.
    pub fn take_timeout(&self, timeout: Duration) -> Result<Option<T>, MailboxClosed> {
        match self.inbox.recv_timeout(timeout) {
            Ok(msg) => Ok(Some(msg)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(MailboxClosed),
        }
    }

    /// Like [`try_take`](Self::try_take) but distinguishes "empty" from "closed".
    ///
    /// # Errors
    ///
    /// Returns [`MailboxClosed`] once the other end is dropped and the queue is
    /// empty.
    pub fn poll(&self) -> Result<Option<T>, MailboxClosed> {
        match self.inbox.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(MailboxClosed),
        }
    }

    /// Number of messages waiting to be taken at this end.
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    /// Takes every message currently waiting, without blocking.
    pub fn drain(&self) -> Vec<T> {
        self.inbox.try_iter().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
