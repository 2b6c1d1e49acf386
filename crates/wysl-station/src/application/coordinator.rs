//! Coordinator: the station's game loop.
//!
//! The coordinator is the only component that sees every source.  Once per
//! iteration it polls, without blocking:
//!
//! 1. each sensing worker's pipe (events are `Local`),
//! 2. the relay controller's queue,
//! 3. the network sync channel's queue (events tagged `Recv` are `Remote`),
//! 4. the keyboard queue.
//!
//! Each message either changes nothing, issues relay or network commands, or
//! ends the session.  Ending is not an exception: handlers return
//! [`ControlFlow::Break`] with a [`SessionEnd`], [`Coordinator::step`] turns
//! that into [`StepOutcome::Finished`], and [`Coordinator::run`] then forces
//! the relay board to a safe state and tells every thread to stop.
//!
//! # Architecture
//!
//! The coordinator owns the [`GameState`] and never touches a device.  It only
//! holds [`Mailbox`] ends, so it can be driven entirely from tests.  The one
//! blocking call it makes, the balloon squeeze after laughter, goes through
//! the [`Sleeper`] trait.

use std::ops::ControlFlow;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use wysl_core::{
    ChannelAction, Command, Direction, Event, GameState, NetworkMessage, Origin, Payload,
    RelayChannel, RelayMessage, SessionEnd, Verdict,
};

use crate::application::mailbox::Mailbox;
use crate::application::settings::GameSettings;

/// Blocks the calling thread for a while.
///
/// Production code uses [`ThreadSleeper`]; tests assert the requested duration.
#[cfg_attr(test, mockall::automock)]
pub trait Sleeper {
    fn pause(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// The coordinator's end of a sensing worker's pipe.
#[derive(Debug)]
pub struct WorkerLink {
    /// Worker name used in logs and in [`SessionEnd::WorkerStopped`].
    pub name: String,
    pub mailbox: Mailbox<Payload>,
}

/// Every queue and pipe the coordinator polls.
#[derive(Debug)]
pub struct CoordinatorLinks {
    pub relay: Mailbox<RelayMessage>,
    pub network: Mailbox<NetworkMessage>,
    pub keyboard: Mailbox<Command>,
    pub workers: Vec<WorkerLink>,
}

/// Result of one [`Coordinator::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Keep looping.  `handled` counts the messages taken this iteration.
    Continue { handled: usize },
    /// The session is over; call [`Coordinator::shutdown`].
    Finished(SessionEnd),
}

/// The game loop.
pub struct Coordinator {
    settings: GameSettings,
    state: GameState,
    links: CoordinatorLinks,
    sleeper: Box<dyn Sleeper + Send>,
}

impl Coordinator {
    /// Creates a coordinator in the `Idle` state.
    pub fn new(
        settings: GameSettings,
        links: CoordinatorLinks,
        sleeper: Box<dyn Sleeper + Send>,
    ) -> Self {
        Self {
            settings,
            state: GameState::Idle,
            links,
            sleeper,
        }
    }

    /// Current game state.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Runs iterations until the session ends, then shuts down.
    ///
    /// Iterations that found nothing to do are followed by a sleep of
    /// `poll_interval` to bound CPU use.
    pub fn run(mut self) -> SessionEnd {
        info!(workers = self.links.workers.len(), "coordinator running");
        let end = loop {
            match self.step() {
                StepOutcome::Finished(end) => break end,
                StepOutcome::Continue { handled: 0 } => {
                    std::thread::sleep(self.settings.poll_interval)
                }
                StepOutcome::Continue { .. } => {}
            }
        };
        self.shutdown(&end);
        end
    }

    /// Polls every source once.
    pub fn step(&mut self) -> StepOutcome {
        let mut handled = 0;
        match self.poll_sources(&mut handled) {
            ControlFlow::Continue(()) => StepOutcome::Continue { handled },
            ControlFlow::Break(end) => {
                if end.is_fault() {
                    error!(reason = %end, "session ended by fault");
                } else {
                    info!(reason = %end, "session ended");
                }
                self.state = end.final_state();
                StepOutcome::Finished(end)
            }
        }
    }

    /// Reacts to one event.
    ///
    /// While `Idle` everything except `StartGame` is ignored.  Once the session
    /// has ended everything is ignored.
    pub fn handle_event(&mut self, event: Event, origin: Origin) -> ControlFlow<SessionEnd> {
        if self.state.is_terminal() {
            debug!(%event, ?origin, state = ?self.state, "event ignored after session end");
            return ControlFlow::Continue(());
        }
        if self.state != GameState::InGame && event != Event::StartGame {
            debug!(%event, ?origin, state = ?self.state, "event ignored outside a game");
            return ControlFlow::Continue(());
        }

        match event {
            Event::StartGame => {
                if self.state.start() {
                    info!(?origin, "game started");
                } else {
                    debug!(?origin, "start ignored; game already running");
                }
                ControlFlow::Continue(())
            }
            Event::EndGame => match origin {
                Origin::Remote => ControlFlow::Break(SessionEnd::PeerEnded),
                Origin::Local => self.quit(),
            },
            Event::GameOver => {
                let verdict = match origin {
                    Origin::Remote => Verdict::Win,
                    Origin::Local => Verdict::Lose,
                };
                ControlFlow::Break(SessionEnd::GameOver(verdict))
            }
            Event::Laughter => {
                info!(?origin, "laughter detected; squeezing balloon");
                // The balloon is left on; shutdown turns every channel off.
                self.set_channel(self.settings.balloon_channel, ChannelAction::On);
                self.sleeper.pause(self.settings.squeeze_duration);
                self.send_to_peer(Event::GameOver);
                ControlFlow::Break(SessionEnd::GameOver(Verdict::Lose))
            }
            Event::NoLaughter => ControlFlow::Continue(()),
            Event::NoSmile | Event::LowSmile | Event::MediumSmile | Event::HighSmile => {
                self.on_smile(event, origin);
                ControlFlow::Continue(())
            }
        }
    }

    /// Forces the relay board safe and tells every thread to stop.
    ///
    /// Best effort: closed mailboxes are skipped.
    pub fn shutdown(&mut self, end: &SessionEnd) {
        info!(reason = %end, "shutting down");

        for channel in RelayChannel::ALL {
            self.set_channel(channel.id(), ChannelAction::Pulse(0));
            self.set_channel(channel.id(), ChannelAction::Off);
        }

        for worker in &self.links.workers {
            terminate(&worker.name, &worker.mailbox);
        }
        terminate("relay controller", &self.links.relay);
        terminate("network sync", &self.links.network);
        terminate("keyboard", &self.links.keyboard);
    }

    // ── Polling ───────────────────────────────────────────────────────────────

    fn poll_sources(&mut self, handled: &mut usize) -> ControlFlow<SessionEnd> {
        self.poll_workers(handled)?;
        self.poll_relay(handled)?;
        self.poll_network(handled)?;
        self.poll_keyboard(handled)
    }

    fn poll_workers(&mut self, handled: &mut usize) -> ControlFlow<SessionEnd> {
        for index in 0..self.links.workers.len() {
            let waiting = self.links.workers[index].mailbox.pending();
            for _ in 0..waiting {
                let Some(payload) = self.links.workers[index].mailbox.try_take() else {
                    break;
                };
                *handled += 1;
                self.on_worker_payload(index, payload)?;
            }
        }
        ControlFlow::Continue(())
    }

    fn on_worker_payload(&mut self, index: usize, payload: Payload) -> ControlFlow<SessionEnd> {
        debug!(worker = %self.links.workers[index].name, ?payload, "worker message");
        match payload {
            Payload::Event(event) => self.handle_event(event, Origin::Local),
            Payload::Error(signal) => ControlFlow::Break(SessionEnd::Fault(signal)),
            Payload::Command(Command::Terminate) => ControlFlow::Break(SessionEnd::WorkerStopped(
                self.links.workers[index].name.clone(),
            )),
            Payload::Command(other) => {
                warn!(worker = %self.links.workers[index].name, ?other, "unexpected worker command");
                ControlFlow::Continue(())
            }
        }
    }

    fn poll_relay(&mut self, handled: &mut usize) -> ControlFlow<SessionEnd> {
        for _ in 0..self.links.relay.pending() {
            let Some(msg) = self.links.relay.try_take() else {
                break;
            };
            *handled += 1;
            match msg {
                RelayMessage::Error(signal) => {
                    error!(?signal, "relay controller failed");
                    return ControlFlow::Break(SessionEnd::Fault(signal));
                }
                RelayMessage::Command(cmd) => self.on_command(cmd)?,
            }
        }
        ControlFlow::Continue(())
    }

    fn poll_network(&mut self, handled: &mut usize) -> ControlFlow<SessionEnd> {
        for _ in 0..self.links.network.pending() {
            let Some(msg) = self.links.network.try_take() else {
                break;
            };
            *handled += 1;
            match msg {
                NetworkMessage::Event {
                    event,
                    direction: Direction::Send,
                } => {
                    // Destined for the peer, not for us.
                    let _ = self.links.network.post(NetworkMessage::outbound(event));
                }
                NetworkMessage::Event {
                    event,
                    direction: Direction::Recv,
                } => self.handle_event(event, Origin::Remote)?,
                NetworkMessage::Error(signal) => {
                    error!(?signal, "network sync channel failed");
                    return ControlFlow::Break(SessionEnd::Fault(signal));
                }
                NetworkMessage::Command(cmd) => self.on_command(cmd)?,
            }
        }
        ControlFlow::Continue(())
    }

    fn poll_keyboard(&mut self, handled: &mut usize) -> ControlFlow<SessionEnd> {
        for _ in 0..self.links.keyboard.pending() {
            let Some(cmd) = self.links.keyboard.try_take() else {
                break;
            };
            *handled += 1;
            info!(?cmd, "operator command");
            self.on_command(cmd)?;
        }
        ControlFlow::Continue(())
    }

    // ── Handlers ──────────────────────────────────────────────────────────────

    fn on_command(&mut self, cmd: Command) -> ControlFlow<SessionEnd> {
        match cmd {
            Command::Terminate => self.quit(),
            Command::Start => {
                if self.state.start() {
                    info!("game started by operator");
                    self.send_to_peer(Event::StartGame);
                } else {
                    debug!(state = ?self.state, "start ignored");
                }
                ControlFlow::Continue(())
            }
            other => {
                debug!(?other, "command not addressed to the coordinator");
                ControlFlow::Continue(())
            }
        }
    }

    /// Graceful local termination; a running game is ended on the peer too.
    fn quit(&mut self) -> ControlFlow<SessionEnd> {
        if self.state == GameState::InGame {
            self.send_to_peer(Event::EndGame);
        }
        ControlFlow::Break(SessionEnd::UserQuit)
    }

    fn on_smile(&mut self, event: Event, origin: Origin) {
        let Some(intensity) = event.smile_intensity() else {
            return;
        };
        match origin {
            Origin::Local => self.send_to_peer(event),
            Origin::Remote => {
                let interval = self.settings.tickle_speeds.interval_for(intensity);
                debug!(?intensity, interval, "tickling");
                self.set_channel(self.settings.feather_channel, ChannelAction::Pulse(interval));
            }
        }
    }

    fn set_channel(&self, channel_id: u8, action: ChannelAction) {
        let Some(cmd) = Command::for_channel(channel_id, action) else {
            debug!(channel_id, ?action, "ignoring command for invalid relay channel");
            return;
        };
        if self.links.relay.post(cmd.into()).is_err() {
            warn!(?cmd, "relay controller gone; command dropped");
        }
    }

    fn send_to_peer(&self, event: Event) {
        if self.links.network.post(NetworkMessage::outbound(event)).is_err() {
            warn!(%event, "network channel gone; event not sent");
        }
    }
}

/// Posts `Terminate` to one component; a component that already exited is
/// skipped.
fn terminate<T: From<Command>>(component: &str, mailbox: &Mailbox<T>) {
    if mailbox.post(Command::Terminate.into()).is_err() {
        debug!(component, "already stopped; terminate not delivered");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::mailbox::mailbox_pair;
    use mockall::predicate::eq;
    use wysl_core::{ErrorSignal, TickleSpeeds};

    // ── Test harness ──────────────────────────────────────────────────────────

    /// The far ends of every link, as the threads would hold them.
    struct Harness {
        relay: Mailbox<RelayMessage>,
        network: Mailbox<NetworkMessage>,
        keyboard: Mailbox<Command>,
        expression: Mailbox<Payload>,
        laughter: Mailbox<Payload>,
    }

    impl Harness {
        fn relay_commands(&self) -> Vec<Command> {
            self.relay
                .drain()
                .into_iter()
                .filter_map(|m| match m {
                    RelayMessage::Command(c) => Some(c),
                    RelayMessage::Error(_) => None,
                })
                .collect()
        }
    }

    fn test_settings() -> GameSettings {
        GameSettings {
            tickle_speeds: TickleSpeeds {
                slower_ms: 1000,
                slow_ms: 500,
                fast_ms: 250,
                faster_ms: 100,
            },
            feather_channel: 1,
            balloon_channel: 2,
            squeeze_duration: Duration::from_millis(20),
            poll_interval: Duration::from_millis(1),
        }
    }

    fn build_with(settings: GameSettings, sleeper: MockSleeper) -> (Coordinator, Harness) {
        let (relay_near, relay_far) = mailbox_pair();
        let (network_near, network_far) = mailbox_pair();
        let (keyboard_near, keyboard_far) = mailbox_pair();
        let (expr_near, expr_far) = mailbox_pair();
        let (laugh_near, laugh_far) = mailbox_pair();
        let links = CoordinatorLinks {
            relay: relay_near,
            network: network_near,
            keyboard: keyboard_near,
            workers: vec![
                WorkerLink {
                    name: "expression".into(),
                    mailbox: expr_near,
                },
                WorkerLink {
                    name: "laughter".into(),
                    mailbox: laugh_near,
                },
            ],
        };
        let harness = Harness {
            relay: relay_far,
            network: network_far,
            keyboard: keyboard_far,
            expression: expr_far,
            laughter: laugh_far,
        };
        (Coordinator::new(settings, links, Box::new(sleeper)), harness)
    }

    fn build() -> (Coordinator, Harness) {
        build_with(test_settings(), MockSleeper::new())
    }

    /// Starts the game from the keyboard and discards the StartGame notice.
    fn start_game(coordinator: &mut Coordinator, h: &Harness) {
        h.keyboard.post(Command::Start).unwrap();
        assert_eq!(coordinator.step(), StepOutcome::Continue { handled: 1 });
        assert_eq!(coordinator.state(), GameState::InGame);
        h.network.drain();
    }

    const SMILES: [Event; 4] = [
        Event::NoSmile,
        Event::LowSmile,
        Event::MediumSmile,
        Event::HighSmile,
    ];

    // ── Idle ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_step_with_nothing_waiting_handles_nothing() {
        let (mut coordinator, _h) = build();
        assert_eq!(coordinator.step(), StepOutcome::Continue { handled: 0 });
        assert_eq!(coordinator.state(), GameState::Idle);
    }

    #[test]
    fn test_idle_ignores_every_event_except_start_game() {
        // Arrange
        let (mut coordinator, h) = build();

        // Act
        for event in Event::ALL.into_iter().filter(|e| *e != Event::StartGame) {
            h.expression.post(Payload::Event(event)).unwrap();
            h.network.post(NetworkMessage::inbound(event)).unwrap();
        }
        let outcome = coordinator.step();

        // Assert
        assert!(matches!(outcome, StepOutcome::Continue { .. }));
        assert_eq!(coordinator.state(), GameState::Idle);
        assert!(h.relay.drain().is_empty(), "no actuation while idle");
        assert!(h.network.drain().is_empty(), "no forwarding while idle");
    }

    #[test]
    fn test_keyboard_start_enters_game_and_notifies_peer() {
        // Arrange
        let (mut coordinator, h) = build();
        h.keyboard.post(Command::Start).unwrap();

        // Act
        coordinator.step();

        // Assert
        assert_eq!(coordinator.state(), GameState::InGame);
        assert_eq!(h.network.drain(), vec![NetworkMessage::outbound(Event::StartGame)]);
    }

    #[test]
    fn test_remote_start_game_enters_game_without_echo() {
        let (mut coordinator, h) = build();
        h.network.post(NetworkMessage::inbound(Event::StartGame)).unwrap();

        coordinator.step();

        assert_eq!(coordinator.state(), GameState::InGame);
        assert!(h.network.drain().is_empty());
    }

    #[test]
    fn test_second_start_is_ignored() {
        let (mut coordinator, h) = build();
        start_game(&mut coordinator, &h);

        h.keyboard.post(Command::Start).unwrap();
        coordinator.step();

        assert_eq!(coordinator.state(), GameState::InGame);
        assert!(h.network.drain().is_empty(), "StartGame must be sent only once");
    }

    // ── Smiles ────────────────────────────────────────────────────────────────

    #[test]
    fn test_local_smiles_are_forwarded_to_peer_without_actuation() {
        // Arrange
        let (mut coordinator, h) = build();
        start_game(&mut coordinator, &h);

        for smile in SMILES {
            // Act
            h.expression.post(Payload::Event(smile)).unwrap();
            coordinator.step();

            // Assert
            assert_eq!(h.network.drain(), vec![NetworkMessage::outbound(smile)]);
            assert!(h.relay.drain().is_empty());
        }
    }

    #[test]
    fn test_remote_smiles_pulse_feather_at_configured_speed() {
        // Arrange
        let (mut coordinator, h) = build();
        start_game(&mut coordinator, &h);
        let expected = [1000, 500, 250, 100];

        for (smile, interval_ms) in SMILES.into_iter().zip(expected) {
            // Act
            h.network.post(NetworkMessage::inbound(smile)).unwrap();
            coordinator.step();

            // Assert
            assert_eq!(
                h.relay_commands(),
                vec![Command::PulseChannel {
                    channel: RelayChannel::A,
                    interval_ms
                }],
                "wrong pulse for {smile}"
            );
            assert!(h.network.drain().is_empty(), "remote smiles are not echoed");
        }
    }

    #[test]
    fn test_remote_high_smile_uses_faster_tickle() {
        // Arrange: feather on channel 3, faster tickle 100 ms.
        let mut settings = test_settings();
        settings.feather_channel = 3;
        let (mut coordinator, h) = build_with(settings, MockSleeper::new());
        h.network.post(NetworkMessage::inbound(Event::StartGame)).unwrap();
        coordinator.step();

        // Act
        h.network.post(NetworkMessage::inbound(Event::HighSmile)).unwrap();
        coordinator.step();

        // Assert
        assert_eq!(
            h.relay_commands(),
            vec![Command::PulseChannel {
                channel: RelayChannel::C,
                interval_ms: 100
            }]
        );
    }

    #[test]
    fn test_invalid_feather_channel_sends_nothing() {
        let mut settings = test_settings();
        settings.feather_channel = 7;
        let (mut coordinator, h) = build_with(settings, MockSleeper::new());
        start_game(&mut coordinator, &h);

        h.network.post(NetworkMessage::inbound(Event::LowSmile)).unwrap();
        coordinator.step();

        assert!(h.relay.drain().is_empty());
    }

    // ── Laughter ──────────────────────────────────────────────────────────────

    #[test]
    fn test_local_laughter_squeezes_balloon_and_loses() {
        // Arrange
        let mut sleeper = MockSleeper::new();
        sleeper
            .expect_pause()
            .with(eq(Duration::from_millis(20)))
            .times(1)
            .return_const(());
        let (mut coordinator, h) = build_with(test_settings(), sleeper);
        start_game(&mut coordinator, &h);

        // Act
        h.laughter.post(Payload::Event(Event::Laughter)).unwrap();
        let outcome = coordinator.step();

        // Assert
        assert_eq!(outcome, StepOutcome::Finished(SessionEnd::GameOver(Verdict::Lose)));
        assert_eq!(coordinator.state(), GameState::GameOver);
        assert_eq!(h.relay_commands(), vec![Command::ChannelOn(RelayChannel::B)]);
        assert_eq!(h.network.drain(), vec![NetworkMessage::outbound(Event::GameOver)]);
    }

    #[test]
    fn test_remote_laughter_is_handled_like_local_laughter() {
        let mut sleeper = MockSleeper::new();
        sleeper.expect_pause().times(1).return_const(());
        let (mut coordinator, h) = build_with(test_settings(), sleeper);
        start_game(&mut coordinator, &h);

        h.network.post(NetworkMessage::inbound(Event::Laughter)).unwrap();
        let outcome = coordinator.step();

        assert_eq!(outcome, StepOutcome::Finished(SessionEnd::GameOver(Verdict::Lose)));
    }

    #[test]
    fn test_laughter_never_turns_the_balloon_back_off() {
        // The balloon stays energised after a hit; only shutdown clears it.
        let mut sleeper = MockSleeper::new();
        sleeper.expect_pause().return_const(());
        let (mut coordinator, h) = build_with(test_settings(), sleeper);
        start_game(&mut coordinator, &h);

        let flow = coordinator.handle_event(Event::Laughter, Origin::Local);

        assert!(matches!(flow, ControlFlow::Break(_)));
        let commands = h.relay_commands();
        assert!(commands.contains(&Command::ChannelOn(RelayChannel::B)));
        assert!(!commands.contains(&Command::ChannelOff(RelayChannel::B)));
    }

    #[test]
    fn test_repeated_no_laughter_changes_nothing() {
        let (mut coordinator, h) = build();
        start_game(&mut coordinator, &h);

        for _ in 0..5 {
            h.laughter.post(Payload::Event(Event::NoLaughter)).unwrap();
        }
        let outcome = coordinator.step();

        assert_eq!(outcome, StepOutcome::Continue { handled: 5 });
        assert!(h.relay.drain().is_empty(), "NoLaughter must not touch any channel");
        assert!(h.network.drain().is_empty());
    }

    // ── Game over and termination ─────────────────────────────────────────────

    #[test]
    fn test_remote_game_over_is_a_win() {
        let (mut coordinator, h) = build();
        start_game(&mut coordinator, &h);

        h.network.post(NetworkMessage::inbound(Event::GameOver)).unwrap();

        assert_eq!(
            coordinator.step(),
            StepOutcome::Finished(SessionEnd::GameOver(Verdict::Win))
        );
    }

    #[test]
    fn test_local_game_over_is_a_loss() {
        let (mut coordinator, h) = build();
        start_game(&mut coordinator, &h);

        h.expression.post(Payload::Event(Event::GameOver)).unwrap();

        assert_eq!(
            coordinator.step(),
            StepOutcome::Finished(SessionEnd::GameOver(Verdict::Lose))
        );
    }

    #[test]
    fn test_remote_end_game_ends_session_gracefully() {
        let (mut coordinator, h) = build();
        start_game(&mut coordinator, &h);

        h.network.post(NetworkMessage::inbound(Event::EndGame)).unwrap();

        assert_eq!(coordinator.step(), StepOutcome::Finished(SessionEnd::PeerEnded));
        assert_eq!(coordinator.state(), GameState::GameOver);
        assert!(coordinator.state().is_terminal());
        assert!(h.network.drain().is_empty(), "peer already knows");
    }

    #[test]
    fn test_events_after_game_over_are_ignored() {
        // Arrange: the peer has already won.
        let (mut coordinator, h) = build();
        start_game(&mut coordinator, &h);
        h.network.post(NetworkMessage::inbound(Event::GameOver)).unwrap();
        coordinator.step();
        assert_eq!(coordinator.state(), GameState::GameOver);
        h.relay.drain();

        // Act
        let start = coordinator.handle_event(Event::StartGame, Origin::Remote);
        let smile = coordinator.handle_event(Event::HighSmile, Origin::Remote);

        // Assert
        assert_eq!(start, ControlFlow::Continue(()));
        assert_eq!(smile, ControlFlow::Continue(()));
        assert_eq!(coordinator.state(), GameState::GameOver);
        assert!(h.relay.drain().is_empty());
    }

    #[test]
    fn test_quit_during_game_notifies_peer() {
        let (mut coordinator, h) = build();
        start_game(&mut coordinator, &h);

        h.keyboard.post(Command::Terminate).unwrap();

        assert_eq!(coordinator.step(), StepOutcome::Finished(SessionEnd::UserQuit));
        assert_eq!(h.network.drain(), vec![NetworkMessage::outbound(Event::EndGame)]);
    }

    #[test]
    fn test_quit_while_idle_does_not_notify_peer() {
        let (mut coordinator, h) = build();

        h.keyboard.post(Command::Terminate).unwrap();

        assert_eq!(coordinator.step(), StepOutcome::Finished(SessionEnd::UserQuit));
        assert!(h.network.drain().is_empty());
    }

    #[test]
    fn test_worker_terminate_ends_session() {
        let (mut coordinator, h) = build();

        h.laughter.post(Payload::Command(Command::Terminate)).unwrap();

        assert_eq!(
            coordinator.step(),
            StepOutcome::Finished(SessionEnd::WorkerStopped("laughter".into()))
        );
    }

    #[test]
    fn test_outbound_items_seen_by_coordinator_are_passed_through() {
        // Arrange
        let (mut coordinator, h) = build();
        h.network.post(NetworkMessage::outbound(Event::MediumSmile)).unwrap();

        // Act
        coordinator.step();

        // Assert: forwarded untouched even while idle.
        assert_eq!(h.network.drain(), vec![NetworkMessage::outbound(Event::MediumSmile)]);
    }

    // ── Faults ────────────────────────────────────────────────────────────────

    #[test]
    fn test_every_error_signal_is_fatal_from_its_source() {
        let cases: [(ErrorSignal, fn(&Harness, ErrorSignal)); 4] = [
            (ErrorSignal::CameraError, |h, s| h.expression.post(Payload::Error(s)).unwrap()),
            (ErrorSignal::MicrophoneError, |h, s| h.laughter.post(Payload::Error(s)).unwrap()),
            (ErrorSignal::SerialError, |h, s| h.relay.post(RelayMessage::Error(s)).unwrap()),
            (ErrorSignal::NetworkError, |h, s| h.network.post(NetworkMessage::Error(s)).unwrap()),
        ];

        for (signal, inject) in cases {
            let (mut coordinator, h) = build();
            inject(&h, signal);

            assert_eq!(
                coordinator.step(),
                StepOutcome::Finished(SessionEnd::Fault(signal)),
                "{signal:?} must end the session"
            );
            assert_eq!(coordinator.state(), GameState::Terminated);
        }
    }

    #[test]
    fn test_run_after_fault_forces_all_channels_off_and_stops_everyone() {
        for signal in [
            ErrorSignal::CameraError,
            ErrorSignal::MicrophoneError,
            ErrorSignal::SerialError,
            ErrorSignal::NetworkError,
        ] {
            // Arrange: a game in progress with the feather pulsing.
            let (mut coordinator, h) = build();
            start_game(&mut coordinator, &h);
            h.network.post(NetworkMessage::inbound(Event::HighSmile)).unwrap();
            coordinator.step();
            h.relay.drain();
            h.expression.post(Payload::Error(signal)).unwrap();

            // Act
            let end = coordinator.run();

            // Assert
            assert_eq!(end, SessionEnd::Fault(signal));
            let mut expected = Vec::new();
            for channel in RelayChannel::ALL {
                expected.push(Command::PulseChannel {
                    channel,
                    interval_ms: 0,
                });
                expected.push(Command::ChannelOff(channel));
            }
            expected.push(Command::Terminate);
            assert_eq!(h.relay_commands(), expected);
            assert_eq!(
                h.network.drain(),
                vec![NetworkMessage::Command(Command::Terminate)],
                "faults must not notify the peer"
            );
            assert_eq!(h.keyboard.drain(), vec![Command::Terminate]);
            assert_eq!(h.expression.drain(), vec![Payload::Command(Command::Terminate)]);
            assert_eq!(h.laughter.drain(), vec![Payload::Command(Command::Terminate)]);
        }
    }

    #[test]
    fn test_shutdown_tolerates_closed_worker_pipes() {
        // Arrange
        let (mut coordinator, h) = build();
        let Harness {
            relay, expression, laughter, ..
        } = h;
        drop(expression);
        drop(laughter);

        // Act
        coordinator.shutdown(&SessionEnd::UserQuit);

        // Assert
        assert_eq!(relay.drain().len(), 9, "eight channel commands plus terminate");
    }

    #[test]
    fn test_shutdown_completes_when_every_component_has_exited() {
        // Arrange
        let (mut coordinator, h) = build();
        drop(h);

        // Act: nothing is delivered, nothing panics.
        coordinator.shutdown(&SessionEnd::UserQuit);

        // Assert
        assert_eq!(coordinator.state(), GameState::Idle);
    }
}
