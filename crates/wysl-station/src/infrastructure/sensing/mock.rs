//! Scripted sensing worker.
//!
//! Replays a fixed list of payloads with a delay before each one, then idles
//! until told to stop.  Used by the station binary in place of the camera and
//! microphone classifiers, and by tests to drive the coordinator through real
//! threads.

use std::time::{Duration, Instant};

use wysl_core::{Command, Payload};

use super::SensingWorker;
use crate::application::mailbox::{Mailbox, MailboxClosed};

/// A [`SensingWorker`] that posts a pre-recorded script.
#[derive(Debug, Clone)]
pub struct ScriptedWorker {
    name: String,
    script: Vec<(Duration, Payload)>,
    poll_interval: Duration,
}

impl ScriptedWorker {
    /// Creates a worker with an empty script.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Vec::new(),
            poll_interval: Duration::from_millis(5),
        }
    }

    /// Appends `payload`, posted `delay` after the previous step.
    pub fn then(mut self, delay: Duration, payload: impl Into<Payload>) -> Self {
        self.script.push((delay, payload.into()));
        self
    }

    /// How often the idle worker checks for `Terminate`.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Waits until `deadline`, returning early with `true` if asked to stop.
fn stop_requested_before(pipe: &Mailbox<Payload>, deadline: Instant, poll: Duration) -> bool {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        match pipe.take_timeout(poll.min(deadline - now)) {
            Ok(Some(Payload::Command(Command::Terminate))) | Err(MailboxClosed) => return true,
            Ok(_) => {}
        }
    }
}

impl SensingWorker for ScriptedWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(self: Box<Self>, pipe: Mailbox<Payload>) {
        for (delay, payload) in &self.script {
            let deadline = Instant::now() + *delay;
            if stop_requested_before(&pipe, deadline, self.poll_interval) {
                return;
            }
            if pipe.post(*payload).is_err() {
                return;
            }
        }

        loop {
            match pipe.take_timeout(self.poll_interval) {
                Ok(Some(Payload::Command(Command::Terminate))) | Err(MailboxClosed) => return,
                Ok(_) => {}
            }
        }
    }
}
