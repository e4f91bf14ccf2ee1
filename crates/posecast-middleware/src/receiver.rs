//! [`PoseReceiver`] – UDP listener for the telemetry stream.
//!
//! The counterpart of the sender: binds a UDP port, decodes every datagram
//! with [`decode_packet`] and keeps only the most recent pose.  Consumers
//! either poll [`PoseReceiver::latest`] or await changes on the
//! [`tokio::sync::watch`] receiver returned by [`PoseReceiver::subscribe`].
//! Camera-style consumers that want per-frame deltas use
//! [`PoseReceiver::tracker`].
//!
//! Malformed datagrams are logged and dropped; the loop keeps running.
//!
//! # Example
//!
//! ```rust,no_run
//! use posecast_middleware::PoseReceiver;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), posecast_types::PoseError> {
//! let mut receiver = PoseReceiver::bind("0.0.0.0:45678").await?;
//! let mut updates = receiver.subscribe();
//! while updates.changed().await.is_ok() {
//!     if let Some(pose) = *updates.borrow() {
//!         println!("{:?}", pose.sample);
//!     }
//! }
//! receiver.stop().await;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use posecast_types::{OrientationSample, PoseError};
use tokio::net::{ToSocketAddrs, UdpSocket};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::codec::decode_packet;
use crate::tracker::PoseTracker;

/// Largest datagram the receiver accepts; longer ones are truncated and will
/// fail to decode.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// A decoded pose plus where and when it arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceivedPose {
    pub sample: OrientationSample,
    pub peer: SocketAddr,
    pub received_at: DateTime<Utc>,
}

/// Background UDP listener holding the latest received pose.
pub struct PoseReceiver {
    local_addr: SocketAddr,
    latest: watch::Receiver<Option<ReceivedPose>>,
    received: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PoseReceiver {
    /// Bind `addr` and start receiving on a background task.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Setup`] if the socket cannot be bound.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, PoseError> {
        let socket = UdpSocket::bind(addr).await.map_err(|e| PoseError::Setup {
            endpoint: "receiver".to_string(),
            details: format!("bind failed: {e}"),
        })?;
        let local_addr = socket.local_addr().map_err(|e| PoseError::Setup {
            endpoint: "receiver".to_string(),
            details: e.to_string(),
        })?;
        info!(%local_addr, "pose receiver listening");

        let (latest_tx, latest) = watch::channel(None);
        let (shutdown, shutdown_rx) = oneshot::channel();
        let received = Arc::new(AtomicU64::new(0));
        let rejected = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(receive_loop(
            socket,
            latest_tx,
            shutdown_rx,
            Arc::clone(&received),
            Arc::clone(&rejected),
        ));

        Ok(Self {
            local_addr,
            latest,
            received,
            rejected,
            shutdown: Some(shutdown),
            task: Some(task),
        })
    }

    /// Address the socket is bound to (useful after binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Most recent pose, or `None` before the first valid datagram.
    pub fn latest(&self) -> Option<ReceivedPose> {
        *self.latest.borrow()
    }

    /// Watch handle that is notified on every accepted datagram.
    pub fn subscribe(&self) -> watch::Receiver<Option<ReceivedPose>> {
        self.latest.clone()
    }

    /// A [`PoseTracker`] reporting relative motion since its last call.
    pub fn tracker(&self) -> PoseTracker {
        PoseTracker::new(self.subscribe())
    }

    /// Datagrams decoded successfully.
    pub fn received_count(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Datagrams dropped as undecodable.
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Stop the receive loop and release the socket.  Idempotent.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "pose receiver task ended abnormally");
        }
    }
}

impl Drop for PoseReceiver {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn receive_loop(
    socket: UdpSocket,
    latest: watch::Sender<Option<ReceivedPose>>,
    mut shutdown: oneshot::Receiver<()>,
    received: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
) {
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = socket.recv_from(&mut buf) => match result {
                Ok((n, peer)) => match decode_packet(&buf[..n]) {
                    Ok(sample) => {
                        received.fetch_add(1, Ordering::Relaxed);
                        latest.send_replace(Some(ReceivedPose {
                            sample,
                            peer,
                            received_at: Utc::now(),
                        }));
                    }
                    Err(e) => {
                        rejected.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            %peer,
                            payload = %String::from_utf8_lossy(&buf[..n]),
                            error = %e,
                            "dropping invalid pose datagram"
                        );
                    }
                },
                Err(e) => warn!(error = %e, "recv_from failed"),
            },
        }
    }
    debug!("pose receiver stopped");
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
