//! Infrastructure layer for a station.
//!
//! Contains the device-facing threads: the relay board's serial link, the
//! UDP sync channel to the peer, the operator console, the sensing worker
//! seam and the configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and `wysl_core`,
//! but MUST NOT be imported by the `application` or domain layers.

pub mod keyboard;
pub mod network;
pub mod relay;
pub mod sensing;
pub mod storage;
