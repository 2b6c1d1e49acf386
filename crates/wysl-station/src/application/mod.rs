//! Application layer for a station.
//!
//! Use cases in this layer orchestrate the domain types from `wysl_core` and
//! talk to the outside world only through [`mailbox::Mailbox`] endpoints and
//! the [`coordinator::Sleeper`] trait.  No sockets, no serial ports, no stdin.
//!
//! # Sub-modules
//!
//! - **`coordinator`** – the game loop.  Polls every worker and queue once per
//!   iteration, runs the state machine and issues relay and network commands.
//!
//! - **`mailbox`** – the duplex queue endpoint every thread talks through.
//!
//! - **`settings`** – game tunables handed to the coordinator at construction.

pub mod coordinator;
pub mod mailbox;
pub mod settings;
