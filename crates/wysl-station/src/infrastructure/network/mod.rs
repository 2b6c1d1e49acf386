//! Network sync channel.
//!
//! Exchanges [`Event`]s with the peer station over UDP, one event per
//! datagram, using the ASCII phrases of [`wysl_core::protocol::codec`].
//!
//! Two sockets are used: a receive socket bound to the configured local
//! address, and a send socket bound to an ephemeral port that only ever calls
//! `send_to` on the peer's address.
//!
//! # Loop
//!
//! Each iteration:
//!
//! 1. takes at most one item from the coordinator.  Outbound events are
//!    encoded and sent; `Terminate` ends the loop.
//! 2. reads every datagram that is ready right now.  Known phrases are posted
//!    to the coordinator as inbound events; anything else is logged and
//!    dropped.
//! 3. sleeps for the poll interval if neither step had work.
//!
//! UDP gives no delivery or ordering guarantee and the channel adds none.
//! A lost datagram is simply lost.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::thread::JoinHandle;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use wysl_core::{
    decode_event, encode_event, Command, Direction, ErrorSignal, Event, NetworkMessage,
    MAX_DATAGRAM_SIZE,
};

use crate::application::mailbox::{Mailbox, MailboxClosed};

/// Errors raised while setting up the sync channel's sockets.
#[derive(Debug, Error)]
pub enum NetworkSyncError {
    /// The receive socket could not be bound to the local address.
    #[error("failed to bind receive socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The send socket could not be created.
    #[error("failed to create send socket: {0}")]
    SendSocket(#[source] io::Error),
}

/// Local and peer addresses of the sync channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSettings {
    /// Address the receive socket binds to.
    pub local: SocketAddr,
    /// Address of the peer station's receive socket.
    pub remote: SocketAddr,
}

/// The channel's bound socket pair.
#[derive(Debug)]
pub struct SyncSockets {
    recv: UdpSocket,
    send: UdpSocket,
}

impl SyncSockets {
    /// Address the receive socket is actually bound to.
    ///
    /// Differs from the configured address when port 0 was requested.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.recv.local_addr()
    }
}

/// Binds the receive socket (non-blocking, address reuse on) and the send
/// socket.
///
/// # Errors
///
/// Returns [`NetworkSyncError::Bind`] if the local address is unavailable, or
/// [`NetworkSyncError::SendSocket`] if the send socket cannot be created.
pub fn bind_sockets(settings: &NetworkSettings) -> Result<SyncSockets, NetworkSyncError> {
    let addr = settings.local;
    let bind_error = |source| NetworkSyncError::Bind { addr, source };

    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
        .map_err(bind_error)?;
    socket.set_reuse_address(true).map_err(bind_error)?;
    socket.set_nonblocking(true).map_err(bind_error)?;
    socket.bind(&addr.into()).map_err(bind_error)?;
    let recv: UdpSocket = socket.into();

    let unspecified: IpAddr = match settings.remote {
        SocketAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
        SocketAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
    };
    let send =
        UdpSocket::bind(SocketAddr::new(unspecified, 0)).map_err(NetworkSyncError::SendSocket)?;

    Ok(SyncSockets { recv, send })
}

/// Spawns the network sync thread.
///
/// Sockets are bound on the new thread.  A bind failure is reported to the
/// coordinator as [`ErrorSignal::NetworkError`] and the thread exits.
///
/// # Errors
///
/// Returns the I/O error if the thread cannot be spawned.
pub fn start_network_sync(
    mailbox: Mailbox<NetworkMessage>,
    settings: NetworkSettings,
    poll_interval: Duration,
) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("network-sync".to_string())
        .spawn(move || match bind_sockets(&settings) {
            Ok(sockets) => {
                info!(local = %settings.local, remote = %settings.remote, "network sync listening");
                network_loop(mailbox, sockets, settings.remote, poll_interval);
            }
            Err(e) => {
                error!("{e}");
                let _ = mailbox.post(NetworkMessage::Error(ErrorSignal::NetworkError));
            }
        })
}

/// Runs the channel on already bound sockets until told to stop.
pub fn network_loop(
    mailbox: Mailbox<NetworkMessage>,
    sockets: SyncSockets,
    remote: SocketAddr,
    poll_interval: Duration,
) {
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        let mut busy = false;

        match mailbox.poll() {
            Ok(Some(msg)) => {
                busy = true;
                match msg {
                    NetworkMessage::Event {
                        event,
                        direction: Direction::Send,
                    } => send_event(&sockets.send, remote, event),
                    NetworkMessage::Event {
                        direction: Direction::Recv,
                        ..
                    } => {
                        // Meant for the coordinator.
                        let _ = mailbox.post(msg);
                    }
                    NetworkMessage::Command(Command::Terminate) => break,
                    other => debug!(?other, "ignored by network sync"),
                }
            }
            Ok(None) => {}
            Err(MailboxClosed) => {
                warn!("coordinator went away without terminating network sync");
                break;
            }
        }

        if receive_ready(&sockets.recv, &mailbox, &mut buf) > 0 {
            busy = true;
        }

        if !busy {
            std::thread::sleep(poll_interval);
        }
    }

    info!("network sync stopped");
}

fn send_event(socket: &UdpSocket, remote: SocketAddr, event: Event) {
    match socket.send_to(encode_event(event), remote) {
        Ok(_) => debug!(%event, %remote, "sent"),
        Err(e) => warn!("failed to send {event} to {remote}: {e}"),
    }
}

/// Reads every datagram that is ready without blocking.
///
/// Returns how many datagrams were read, decodable or not.
fn receive_ready(socket: &UdpSocket, mailbox: &Mailbox<NetworkMessage>, buf: &mut [u8]) -> usize {
    let mut count = 0;
    loop {
        match socket.recv_from(buf) {
            Ok((len, src)) => {
                count += 1;
                match decode_event(&buf[..len]) {
                    Ok(event) => {
                        debug!(%event, %src, "received");
                        let _ = mailbox.post(NetworkMessage::inbound(event));
                    }
                    Err(e) => warn!("dropping datagram from {src}: {e}"),
                }
            }
            Err(e) if is_would_block(&e) => break,
            Err(e) => {
                warn!("network receive error: {e}");
                break;
            }
        }
    }
    count
}

/// Returns `true` when a non-blocking read simply found nothing to read.
fn is_would_block(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
