//! TOML-based configuration for a station.
//!
//! Reads and writes [`AppConfig`] from an explicit path or the
//! platform-appropriate config file:
//! - Windows:  `%APPDATA%\Wysl\config.toml`
//! - Linux:    `~/.config/wysl/config.toml`
//! - macOS:    `~/Library/Application Support/Wysl/config.toml`
//!
//! ```toml
//! [station]
//! log_level = "info"
//!
//! [relay]
//! port = "/dev/ttyACM0"
//! baudrate = 9600
//!
//! [network]
//! local_ip = "192.168.1.10"
//! local_port = 5005
//! remote_ip = "192.168.1.11"
//! remote_port = 5005
//!
//! [game]
//! slower_tickle = 1000
//! slow_tickle = 500
//! fast_tickle = 250
//! faster_tickle = 100
//! feather_channel = 1
//! balloon_channel = 2
//! squeeze_duration = 5.0
//! poll_interval_ms = 5
//! ```
//!
//! # Required fields
//!
//! `relay.port`, `network.local_ip` and `network.remote_ip` have no sensible
//! default: they depend on the machine and on the peer.  They deserialize as
//! `Option` so a partial file still loads (and `show-config` can display it),
//! and [`AppConfig::validate`] rejects the file until they are filled in.
//! Every other field falls back to its `#[serde(default = "...")]` value.

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wysl_core::{RelayChannel, TickleSpeeds};

use crate::application::settings::GameSettings;
use crate::infrastructure::network::NetworkSettings;
use crate::infrastructure::relay::SerialSettings;

/// Error type for configuration loading, saving and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A required field is absent.
    #[error("missing required setting `{0}`")]
    MissingField(&'static str),

    /// An IP address field does not parse.
    #[error("`{field}` is not a valid IP address: {value:?}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        #[source]
        source: AddrParseError,
    },

    /// A relay channel id is outside 1–4.
    #[error("`{field}` must be a relay channel between 1 and 4, got {value}")]
    InvalidChannel { field: &'static str, value: u8 },

    /// The squeeze duration is negative, NaN or infinite.
    #[error("`game.squeeze_duration` must be a non-negative number of seconds, got {0}")]
    InvalidSqueezeDuration(f64),

    /// The serial baud rate is zero.
    #[error("`relay.baudrate` must be greater than zero")]
    InvalidBaudrate,

    /// The four tickle speeds do not get strictly faster.
    #[error(
        "tickle speeds must strictly decrease from slower_tickle to faster_tickle, \
         got {slower}/{slow}/{fast}/{faster} ms"
    )]
    TickleSpeedsNotDecreasing {
        slower: u32,
        slow: u32,
        fast: u32,
        faster: u32,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub game: GameConfig,
}

/// General station behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationConfig {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Serial connection to the relay board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayConfig {
    /// Serial device path.  Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default = "default_baudrate")]
    pub baudrate: u32,
}

/// Addresses of this station and its peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// IP address to receive on.  Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_ip: Option<String>,
    #[serde(default = "default_port")]
    pub local_port: u16,
    /// The peer station's IP address.  Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,
    #[serde(default = "default_port")]
    pub remote_port: u16,
}

/// Game tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    /// Feather pulse interval (ms) for a peer with no smile.
    #[serde(default = "default_slower_tickle")]
    pub slower_tickle: u32,
    /// Feather pulse interval (ms) for a low intensity smile.
    #[serde(default = "default_slow_tickle")]
    pub slow_tickle: u32,
    /// Feather pulse interval (ms) for a medium intensity smile.
    #[serde(default = "default_fast_tickle")]
    pub fast_tickle: u32,
    /// Feather pulse interval (ms) for a high intensity smile.
    #[serde(default = "default_faster_tickle")]
    pub faster_tickle: u32,
    #[serde(default = "default_feather_channel")]
    pub feather_channel: u8,
    #[serde(default = "default_balloon_channel")]
    pub balloon_channel: u8,
    /// Seconds the balloon is squeezed after laughter.
    #[serde(default = "default_squeeze_duration")]
    pub squeeze_duration: f64,
    /// Idle sleep between polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_baudrate() -> u32 {
    9600
}
fn default_port() -> u16 {
    5005
}
fn default_slower_tickle() -> u32 {
    1000
}
fn default_slow_tickle() -> u32 {
    500
}
fn default_fast_tickle() -> u32 {
    250
}
fn default_faster_tickle() -> u32 {
    100
}
fn default_feather_channel() -> u8 {
    1
}
fn default_balloon_channel() -> u8 {
    2
}
fn default_squeeze_duration() -> f64 {
    5.0
}
fn default_poll_interval_ms() -> u64 {
    5
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: None,
            baudrate: default_baudrate(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            local_ip: None,
            local_port: default_port(),
            remote_ip: None,
            remote_port: default_port(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            slower_tickle: default_slower_tickle(),
            slow_tickle: default_slow_tickle(),
            fast_tickle: default_fast_tickle(),
            faster_tickle: default_faster_tickle(),
            feather_channel: default_feather_channel(),
            balloon_channel: default_balloon_channel(),
            squeeze_duration: default_squeeze_duration(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

/// Everything a station needs to start, checked and typed.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSettings {
    pub log_level: String,
    pub serial: SerialSettings,
    pub network: NetworkSettings,
    pub game: GameSettings,
}

impl AppConfig {
    /// Checks the file and converts it into [`StationSettings`].
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a missing required field, an
    /// unparsable address, an out-of-range channel, a bad squeeze duration, a
    /// zero baud rate or tickle speeds that do not strictly decrease.
    pub fn validate(&self) -> Result<StationSettings, ConfigError> {
        let port = self
            .relay
            .port
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::MissingField("relay.port"))?;
        if self.relay.baudrate == 0 {
            return Err(ConfigError::InvalidBaudrate);
        }

        let local_ip = parse_ip("network.local_ip", self.network.local_ip.as_deref())?;
        let remote_ip = parse_ip("network.remote_ip", self.network.remote_ip.as_deref())?;

        let game = &self.game;
        let tickle_speeds = TickleSpeeds {
            slower_ms: game.slower_tickle,
            slow_ms: game.slow_tickle,
            fast_ms: game.fast_tickle,
            faster_ms: game.faster_tickle,
        };
        if !tickle_speeds.is_strictly_decreasing() {
            return Err(ConfigError::TickleSpeedsNotDecreasing {
                slower: game.slower_tickle,
                slow: game.slow_tickle,
                fast: game.fast_tickle,
                faster: game.faster_tickle,
            });
        }

        let squeeze_duration = Duration::try_from_secs_f64(game.squeeze_duration)
            .map_err(|_| ConfigError::InvalidSqueezeDuration(game.squeeze_duration))?;

        Ok(StationSettings {
            log_level: self.station.log_level.clone(),
            serial: SerialSettings {
                port,
                baudrate: self.relay.baudrate,
            },
            network: NetworkSettings {
                local: SocketAddr::new(local_ip, self.network.local_port),
                remote: SocketAddr::new(remote_ip, self.network.remote_port),
            },
            game: GameSettings {
                tickle_speeds,
                feather_channel: check_channel("game.feather_channel", game.feather_channel)?,
                balloon_channel: check_channel("game.balloon_channel", game.balloon_channel)?,
                squeeze_duration,
                poll_interval: Duration::from_millis(game.poll_interval_ms),
            },
        })
    }
}

fn parse_ip(field: &'static str, value: Option<&str>) -> Result<IpAddr, ConfigError> {
    let value = value.ok_or(ConfigError::MissingField(field))?;
    value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidAddress {
            field,
            value: value.to_string(),
            source,
        })
}

fn check_channel(field: &'static str, value: u8) -> Result<u8, ConfigError> {
    RelayChannel::try_from(value)
        .map(RelayChannel::id)
        .map_err(|()| ConfigError::InvalidChannel { field, value })
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Loads `AppConfig` from the platform config file.
///
/// # Errors
///
/// See [`config_file_path`] and [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Writes `config` to `path` as pretty TOML, creating the directory.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `config` to the platform config file.
///
/// # Errors
///
/// See [`config_file_path`] and [`save_config_to`].
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Resolves the platform config base directory including the `Wysl`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Wysl"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("wysl"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("Wysl"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
