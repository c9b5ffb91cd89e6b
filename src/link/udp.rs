use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::command::CommandRouter;
use crate::error::LinkError;

const MAX_DATAGRAM: usize = 2048;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What happened to one received datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// Decoded and made live.
    Applied,
    /// Decoded and stored, but remote is not the active producer.
    Stored,
    /// Malformed; nothing changed.
    Dropped,
    /// No datagram before the read timeout.
    Idle,
}

/// Receives remote velocity commands as JSON twist datagrams.
#[derive(Debug)]
pub struct UdpCommandLink {
    socket: UdpSocket,
    router: Arc<CommandRouter>,
}

impl UdpCommandLink {
    pub fn bind(addr: SocketAddr, router: Arc<CommandRouter>) -> Result<Self, LinkError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        info!(addr = %socket.local_addr()?, "command link listening");
        Ok(Self { socket, router })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, LinkError> {
        Ok(self.socket.local_addr()?)
    }

    /// Wait up to the poll interval for one datagram and route it.
    pub fn recv_once(&self) -> Result<Received, LinkError> {
        let mut buf = [0u8; MAX_DATAGRAM];
        let (len, from) = match self.socket.recv_from(&mut buf) {
            Ok(r) => r,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Ok(Received::Idle);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(match self.router.submit_remote(&buf[..len]) {
            Ok(true) => Received::Applied,
            Ok(false) => Received::Stored,
            Err(e) => {
                debug!(%from, error = %e, "malformed datagram");
                Received::Dropped
            }
        })
    }

    /// Run the receive loop on its own thread until `shutdown` is set.
    pub fn spawn(self, shutdown: Arc<AtomicBool>) -> Result<JoinHandle<()>, LinkError> {
        let handle = thread::Builder::new()
            .name("command-link".into())
            .spawn(move || {
                while !shutdown.load(Ordering::Relaxed) {
                    if let Err(e) = self.recv_once() {
                        warn!(error = %e, "command link receive failed");
                        thread::sleep(POLL_INTERVAL);
                    }
                }
                debug!("command link stopped");
            })?;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandState, ControlMode, HandoverPolicy};
    use nalgebra::Vector3;

    fn link(mode: ControlMode) -> (UdpCommandLink, Arc<CommandRouter>, UdpSocket) {
        let router = Arc::new(CommandRouter::new(mode, HandoverPolicy::HoldLast));
        let link = UdpCommandLink::bind("127.0.0.1:0".parse().unwrap(), Arc::clone(&router)).unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.connect(link.local_addr().unwrap()).unwrap();
        (link, router, sender)
    }

    const TWIST: &[u8] = br#"{"linear":{"x":1.0,"y":2.0,"z":3.0},"angular":{"z":0.5}}"#;

    #[test]
    fn routes_remote_twist() {
        let (link, router, sender) = link(ControlMode::Remote);
        sender.send(TWIST).unwrap();
        assert_eq!(link.recv_once().unwrap(), Received::Applied);
        let cmd = router.snapshot();
        assert_eq!(cmd.target_local_velocity, Vector3::new(-2.0, 3.0, 1.0));
        assert_eq!(cmd.target_yaw_rate, 0.5_f64.to_degrees());
    }

    #[test]
    fn stored_while_local() {
        let (link, router, sender) = link(ControlMode::Local);
        sender.send(TWIST).unwrap();
        assert_eq!(link.recv_once().unwrap(), Received::Stored);
        assert_eq!(router.snapshot(), CommandState::hover());
    }

    #[test]
    fn malformed_is_dropped() {
        let (link, router, sender) = link(ControlMode::Remote);
        sender.send(TWIST).unwrap();
        link.recv_once().unwrap();
        let before = router.snapshot();
        sender.send(b"{\"linear\":").unwrap();
        assert_eq!(link.recv_once().unwrap(), Received::Dropped);
        assert_eq!(router.snapshot().to_bits(), before.to_bits());
    }

    #[test]
    fn idle_without_traffic() {
        let (link, _, _sender) = link(ControlMode::Remote);
        assert_eq!(link.recv_once().unwrap(), Received::Idle);
    }

    #[test]
    fn spawned_loop_stops_on_shutdown() {
        let (link, router, sender) = link(ControlMode::Remote);
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = link.spawn(Arc::clone(&shutdown)).unwrap();
        sender.send(TWIST).unwrap();
        for _ in 0..50 {
            if router.snapshot() != CommandState::hover() {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert_ne!(router.snapshot(), CommandState::hover());
        shutdown.store(true, Ordering::Relaxed);
        handle.join().unwrap();
    }
}
