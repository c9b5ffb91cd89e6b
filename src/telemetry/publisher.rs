use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, info, warn};

use super::imu::ImuSample;
use crate::error::LinkError;

/// Non-blocking hand-off from the physics tick to a sender thread.
///
/// The tick side never waits: when the queue is full the sample is dropped
/// and counted.
#[derive(Debug, Clone)]
pub struct ImuPublisher {
    tx: Sender<ImuSample>,
    dropped: Arc<AtomicU64>,
}

impl ImuPublisher {
    pub fn channel(depth: usize) -> (Self, Receiver<ImuSample>) {
        let (tx, rx) = crossbeam_channel::bounded(depth.max(1));
        (Self { tx, dropped: Arc::new(AtomicU64::new(0)) }, rx)
    }

    /// Queue a sample. Returns false if it was dropped.
    pub fn publish(&self, sample: ImuSample) -> bool {
        match self.tx.try_send(sample) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Spawn a thread that forwards every queued sample as one JSON datagram.
    /// The thread exits once every publisher clone is gone.
    pub fn spawn_udp_sender(
        rx: Receiver<ImuSample>,
        target: SocketAddr,
    ) -> Result<JoinHandle<()>, LinkError> {
        let bind: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let sock = UdpSocket::bind(bind)?;
        info!(%target, "imu publisher started");

        let handle = thread::Builder::new()
            .name("imu-publisher".into())
            .spawn(move || loop {
                match rx.recv_timeout(Duration::from_millis(250)) {
                    Ok(sample) => match serde_json::to_vec(&sample) {
                        Ok(bytes) => {
                            if let Err(e) = sock.send_to(&bytes, target) {
                                debug!(error = %e, "imu send failed");
                            }
                        }
                        Err(e) => warn!(error = %e, "imu sample not serializable"),
                    },
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::imu::{ImuConfig, ImuSampler};
    use crate::dynamics::state::State;

    fn sample() -> ImuSample {
        let mut imu = ImuSampler::new(ImuConfig { publish_rate: 1000.0, ..ImuConfig::default() }).unwrap();
        imu.observe(&State::default(), 0.01).unwrap()
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let (publisher, rx) = ImuPublisher::channel(2);
        assert!(publisher.publish(sample()));
        assert!(publisher.publish(sample()));
        assert!(!publisher.publish(sample()));
        assert_eq!(publisher.dropped(), 1);
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn forwards_json_over_udp() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let target = listener.local_addr().unwrap();

        let (publisher, rx) = ImuPublisher::channel(4);
        let handle = ImuPublisher::spawn_udp_sender(rx, target).unwrap();
        publisher.publish(sample());

        let mut buf = [0u8; 2048];
        let (len, _) = listener.recv_from(&mut buf).unwrap();
        let got: ImuSample = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(got.frame_id, "drone_imu");

        drop(publisher);
        handle.join().unwrap();
    }
}
