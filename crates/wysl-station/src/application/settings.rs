//! Game tunables handed to the coordinator.

use std::time::Duration;

use wysl_core::TickleSpeeds;

/// Settings the coordinator needs for one session.
///
/// Built once from the configuration file and passed to
/// [`Coordinator::new`](crate::application::coordinator::Coordinator::new).
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    /// Feather pulse interval per remote smile intensity.
    pub tickle_speeds: TickleSpeeds,
    /// Relay channel id (1–4) driving the feather.
    pub feather_channel: u8,
    /// Relay channel id (1–4) driving the balloon pump.
    pub balloon_channel: u8,
    /// How long the balloon stays energised after laughter, before the
    /// session ends.
    pub squeeze_duration: Duration,
    /// Sleep between coordinator iterations that found nothing to do.
    pub poll_interval: Duration,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            tickle_speeds: TickleSpeeds::default(),
            feather_channel: 1,
            balloon_channel: 2,
            squeeze_duration: Duration::from_secs(5),
            poll_interval: Duration::from_millis(5),
        }
    }
}
