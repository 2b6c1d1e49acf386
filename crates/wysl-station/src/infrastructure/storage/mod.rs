//! Storage infrastructure: the station's configuration file.
//!
//! The `config` sub-module reads and writes the TOML file and turns it into
//! the typed settings each component is started with.

pub mod config;
