//! [`PoseTracker`] – relative head motion on top of a [`PoseReceiver`].
//!
//! The sender always transmits absolute attitude.  Consumers that steer a
//! camera want the change since their previous frame instead, plus a way to
//! declare "the way I am facing now is straight ahead".  The tracker keeps a
//! reference pose for that:
//!
//! * [`take_delta`][PoseTracker::take_delta] returns the per-axis change from
//!   the reference to the latest pose, then moves the reference forward.
//! * [`recenter`][PoseTracker::recenter] sets the reference to the latest
//!   pose so the next delta is zero.
//!
//! The reference starts at zero.  Before the first datagram the latest pose
//! reads as zero too.
//!
//! # Example
//!
//! ```rust,no_run
//! use posecast_middleware::PoseReceiver;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), posecast_types::PoseError> {
//! let receiver = PoseReceiver::bind("0.0.0.0:45678").await?;
//! let mut tracker = receiver.tracker();
//! tracker.recenter();
//! // once per rendered frame:
//! let delta = tracker.take_delta();
//! println!("rotate camera by {delta:?}");
//! # Ok(())
//! # }
//! ```
//!
//! [`PoseReceiver`]: crate::receiver::PoseReceiver

use posecast_types::OrientationSample;
use tokio::sync::watch;
use tracing::debug;

use crate::receiver::ReceivedPose;

/// Per-frame delta tracker over the receiver's latest pose.
#[derive(Debug, Clone)]
pub struct PoseTracker {
    updates: watch::Receiver<Option<ReceivedPose>>,
    reference: OrientationSample,
}

impl PoseTracker {
    pub fn new(updates: watch::Receiver<Option<ReceivedPose>>) -> Self {
        Self {
            updates,
            reference: OrientationSample::default(),
        }
    }

    /// Latest received pose, zero before the first datagram.
    pub fn current(&self) -> OrientationSample {
        self.updates
            .borrow()
            .map(|pose| pose.sample)
            .unwrap_or_default()
    }

    /// Pose the next delta is measured from.
    pub fn reference(&self) -> OrientationSample {
        self.reference
    }

    /// Change since the previous call (or since the last recenter).
    ///
    /// Each axis is wrapped into `(-180, 180]`, so turning across the ±180°
    /// seam reads as a small step rather than a full revolution.
    pub fn take_delta(&mut self) -> OrientationSample {
        let current = self.current();
        let delta = angular_delta(&self.reference, &current);
        self.reference = current;
        delta
    }

    /// Make the latest pose the new reference; the next delta is zero until
    /// another datagram arrives.
    pub fn recenter(&mut self) -> OrientationSample {
        self.reference = self.current();
        debug!(reference = ?self.reference, "pose tracker recentered");
        self.reference
    }
}

fn angular_delta(from: &OrientationSample, to: &OrientationSample) -> OrientationSample {
    OrientationSample {
        yaw: wrap_degrees(to.yaw - from.yaw),
        pitch: wrap_degrees(to.pitch - from.pitch),
        roll: wrap_degrees(to.roll - from.roll),
    }
}

/// Map an angle difference into `(-180, 180]`.
fn wrap_degrees(d: f64) -> f64 {
    let wrapped = (d + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 { 180.0 } else { wrapped }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receiver::PoseReceiver;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::net::UdpSocket;

    const EPS: f64 = 1e-9;

    fn assert_close(got: OrientationSample, want: OrientationSample) {
        assert!(
            (got.yaw - want.yaw).abs() < EPS
                && (got.pitch - want.pitch).abs() < EPS
                && (got.roll - want.roll).abs() < EPS,
            "got {got:?}, want {want:?}"
        );
    }

    async fn deliver(
        receiver: &PoseReceiver,
        updates: &mut watch::Receiver<Option<ReceivedPose>>,
        payload: &[u8],
    ) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let to: SocketAddr = receiver.local_addr();
        socket.send_to(payload, to).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), updates.changed())
            .await
            .expect("timed out waiting for pose")
            .expect("receiver closed");
    }

    #[tokio::test]
    async fn delta_after_recenter_is_zero() {
        let mut receiver = PoseReceiver::bind("127.0.0.1:0").await.unwrap();
        let mut updates = receiver.subscribe();
        let mut tracker = receiver.tracker();

        deliver(&receiver, &mut updates, br#"{"yaw":57.30,"pitch":-11.46,"roll":-28.65}"#).await;
        let reference = tracker.recenter();

        assert_eq!(reference, OrientationSample::new(57.30, -11.46, -28.65));
        assert_close(tracker.take_delta(), OrientationSample::default());
        receiver.stop().await;
    }

    #[tokio::test]
    async fn two_datagrams_give_their_difference() {
        let mut receiver = PoseReceiver::bind("127.0.0.1:0").await.unwrap();
        let mut updates = receiver.subscribe();
        let mut tracker = receiver.tracker();

        deliver(&receiver, &mut updates, br#"{"yaw":10.00,"pitch":5.00,"roll":-2.00}"#).await;
        tracker.recenter();
        deliver(&receiver, &mut updates, br#"{"yaw":12.50,"pitch":4.00,"roll":1.00}"#).await;

        assert_close(tracker.take_delta(), OrientationSample::new(2.5, -1.0, 3.0));
        // Reference moved forward: nothing new, nothing to report.
        assert_close(tracker.take_delta(), OrientationSample::default());
        receiver.stop().await;
    }

    #[tokio::test]
    async fn recenter_zeroes_the_next_delta() {
        let mut receiver = PoseReceiver::bind("127.0.0.1:0").await.unwrap();
        let mut updates = receiver.subscribe();
        let mut tracker = receiver.tracker();

        deliver(&receiver, &mut updates, br#"{"yaw":30.00,"pitch":0.00,"roll":0.00}"#).await;
        assert_close(tracker.take_delta(), OrientationSample::new(30.0, 0.0, 0.0));

        deliver(&receiver, &mut updates, br#"{"yaw":75.00,"pitch":20.00,"roll":0.00}"#).await;
        tracker.recenter();
        assert_close(tracker.take_delta(), OrientationSample::default());
        receiver.stop().await;
    }

    #[tokio::test]
    async fn reads_zero_before_any_datagram() {
        let receiver = PoseReceiver::bind("127.0.0.1:0").await.unwrap();
        let mut tracker = receiver.tracker();
        assert_eq!(tracker.current(), OrientationSample::default());
        assert_close(tracker.take_delta(), OrientationSample::default());
    }

    #[test]
    fn crossing_the_seam_is_a_small_step() {
        let from = OrientationSample::new(179.0, 0.0, -170.0);
        let to = OrientationSample::new(-179.0, 0.0, 170.0);
        assert_close(angular_delta(&from, &to), OrientationSample::new(2.0, 0.0, -20.0));
    }

    #[test]
    fn wrap_degrees_keeps_half_turn_positive() {
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert!((wrap_degrees(540.0) - 180.0).abs() < EPS);
        assert!((wrap_degrees(-90.0) + 90.0).abs() < EPS);
        assert_eq!(wrap_degrees(0.0), 0.0);
    }
}
