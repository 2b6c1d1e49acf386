//! Sensing worker seam.
//!
//! A sensing worker watches one player through one device (camera for
//! expressions, microphone for laughter) and reports what it sees as
//! [`Payload`]s on its own pipe:
//!
//! - `Payload::Event` for each classification,
//! - `Payload::Error` if its device fails,
//! - `Payload::Command(Command::Terminate)` if it stops on its own.
//!
//! The coordinator may post `Terminate` down the same pipe; a worker must
//! notice it within one poll cycle and return.
//!
//! Classifiers live outside this crate.  [`mock::ScriptedWorker`] stands in
//! for them until one is plugged in.

pub mod mock;

use std::io;
use std::thread::JoinHandle;

use tracing::info;
use wysl_core::Payload;

use crate::application::coordinator::WorkerLink;
use crate::application::mailbox::{mailbox_pair, Mailbox};

/// A classifier that runs on its own thread.
pub trait SensingWorker: Send {
    /// Name used for the thread, in logs, and in the session end reason.
    fn name(&self) -> &str;

    /// Runs until `Terminate` arrives on `pipe` or the coordinator's end is
    /// dropped.
    fn run(self: Box<Self>, pipe: Mailbox<Payload>);
}

/// Starts `worker` on a named thread and returns the coordinator's end of
/// its pipe.
///
/// # Errors
///
/// Returns the I/O error if the thread cannot be spawned.
pub fn spawn_worker(worker: Box<dyn SensingWorker>) -> io::Result<(WorkerLink, JoinHandle<()>)> {
    let name = worker.name().to_string();
    let (coordinator_end, worker_end) = mailbox_pair();

    let thread_name = name.clone();
    let handle = std::thread::Builder::new()
        .name(format!("sensing-{name}"))
        .spawn(move || {
            info!(worker = %thread_name, "sensing worker started");
            worker.run(worker_end);
            info!(worker = %thread_name, "sensing worker stopped");
        })?;

    Ok((
        WorkerLink {
            name,
            mailbox: coordinator_end,
        },
        handle,
    ))
}
