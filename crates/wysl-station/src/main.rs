//! WYSL station entry point.
//!
//! ```text
//! wysl-station [play|show-config|save-config] [--config PATH]
//! ```
//!
//! `play` (the default) wires one station together and runs a session:
//!
//! ```text
//! main()
//!  └─ load + validate config
//!  └─ start threads
//!       ├─ relay controller   (serial port)
//!       ├─ network sync       (UDP sockets)
//!       ├─ keyboard           (stdin)
//!       └─ sensing workers    (expression, laughter)
//!  └─ Coordinator::run()      -- on this thread until the session ends
//!  └─ print the reason, join the relay and network threads
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use wysl_core::SessionEnd;
use wysl_station::application::coordinator::{Coordinator, CoordinatorLinks, ThreadSleeper};
use wysl_station::application::mailbox::mailbox_pair;
use wysl_station::infrastructure::keyboard::start_keyboard;
use wysl_station::infrastructure::network::start_network_sync;
use wysl_station::infrastructure::relay::{open_serial_port, start_relay_controller};
use wysl_station::infrastructure::sensing::{mock::ScriptedWorker, spawn_worker};
use wysl_station::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig, StationSettings,
};

const USAGE: &str = "usage: wysl-station [play|show-config|save-config] [--config PATH]";

/// Names of the sensing workers a station runs.
const WORKERS: [&str; 2] = ["expression", "laughter"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subcommand {
    Play,
    ShowConfig,
    SaveConfig,
}

#[derive(Debug, PartialEq, Eq)]
struct Cli {
    command: Subcommand,
    config: Option<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Cli> {
    let mut command = None;
    let mut config = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            "play" | "show-config" | "save-config" if command.is_none() => {
                command = Some(match arg.as_str() {
                    "play" => Subcommand::Play,
                    "show-config" => Subcommand::ShowConfig,
                    _ => Subcommand::SaveConfig,
                });
            }
            other => bail!("unexpected argument {other:?}\n{USAGE}"),
        }
    }

    Ok(Cli {
        command: command.unwrap_or(Subcommand::Play),
        config,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = parse_args(std::env::args().skip(1))?;

    let path = match cli.config {
        Some(path) => path,
        None => config_file_path().context("no --config given and no platform config directory")?,
    };
    let config = load_config_from(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.station.log_level)),
        )
        .init();

    match cli.command {
        Subcommand::ShowConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Subcommand::SaveConfig => {
            save_config_to(&config, &path)?;
            println!("Configuration written to {}", path.display());
            Ok(())
        }
        Subcommand::Play => {
            let settings = config
                .validate()
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            let end = play(settings)?;
            println!("{end}");
            Ok(())
        }
    }
}

/// Runs one session and returns why it ended.
fn play(settings: StationSettings) -> anyhow::Result<SessionEnd> {
    let session_id = Uuid::new_v4();
    let span = info_span!("session", id = %session_id);
    let _entered = span.enter();
    info!(
        serial = %settings.serial.port,
        local = %settings.network.local,
        remote = %settings.network.remote,
        "station starting"
    );

    let poll_interval = settings.game.poll_interval;

    // ── Relay controller ──────────────────────────────────────────────────────
    let (relay, relay_end) = mailbox_pair();
    let serial = settings.serial.clone();
    let relay_thread =
        start_relay_controller(relay_end, poll_interval, move || open_serial_port(&serial))
            .context("failed to start relay controller")?;

    // ── Network sync ──────────────────────────────────────────────────────────
    let (network, network_end) = mailbox_pair();
    let network_thread = start_network_sync(network_end, settings.network, poll_interval)
        .context("failed to start network sync")?;

    // ── Keyboard ──────────────────────────────────────────────────────────────
    // Not joined: it may be blocked reading stdin.
    let (keyboard, keyboard_end) = mailbox_pair();
    start_keyboard(keyboard_end).context("failed to start keyboard reader")?;

    // ── Sensing workers ───────────────────────────────────────────────────────
    let mut workers = Vec::with_capacity(WORKERS.len());
    let mut worker_threads = Vec::with_capacity(WORKERS.len());
    for name in WORKERS {
        let worker = ScriptedWorker::new(name).with_poll_interval(poll_interval);
        let (link, handle) = spawn_worker(Box::new(worker))
            .with_context(|| format!("failed to start {name} worker"))?;
        workers.push(link);
        worker_threads.push(handle);
    }

    println!("Ready. Type 'start' to begin or 'quit' to leave.");

    let coordinator = Coordinator::new(
        settings.game,
        CoordinatorLinks {
            relay,
            network,
            keyboard,
            workers,
        },
        Box::new(ThreadSleeper),
    );
    let end = coordinator.run();

    for (name, handle) in [("relay controller", relay_thread), ("network sync", network_thread)]
        .into_iter()
        .chain(WORKERS.into_iter().zip(worker_threads))
    {
        if handle.join().is_err() {
            warn!("{name} thread panicked");
        }
    }

    info!(reason = %end, "station stopped");
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_arguments_means_play_with_default_config() {
        let cli = parse_args(args(&[])).unwrap();
        assert_eq!(
            cli,
            Cli {
                command: Subcommand::Play,
                config: None
            }
        );
    }

    #[test]
    fn test_subcommand_and_config_in_any_order() {
        let a = parse_args(args(&["show-config", "--config", "station.toml"])).unwrap();
        let b = parse_args(args(&["--config", "station.toml", "show-config"])).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.command, Subcommand::ShowConfig);
        assert_eq!(a.config, Some(PathBuf::from("station.toml")));
    }

    #[test]
    fn test_save_config_subcommand() {
        let cli = parse_args(args(&["save-config"])).unwrap();
        assert_eq!(cli.command, Subcommand::SaveConfig);
    }

    #[test]
    fn test_config_flag_without_path_is_rejected() {
        assert!(parse_args(args(&["--config"])).is_err());
    }

    #[test]
    fn test_unknown_or_repeated_subcommand_is_rejected() {
        assert!(parse_args(args(&["dance"])).is_err());
        assert!(parse_args(args(&["play", "play"])).is_err());
    }
}
