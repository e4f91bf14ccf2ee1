//! `posecast-middleware` – Wire format and network plumbing.
//!
//! Moves orientation samples between the device and the remote listener
//! without caring what they mean.
//!
//! # Modules
//!
//! - [`codec`] – [`TelemetryEncoder`] (sample to compact JSON datagram) and
//!   [`decode_packet`] (the lenient inverse used by listeners).
//! - [`transport`] – the [`TelemetryTransport`] / [`TelemetryChannel`] traits
//!   and their UDP implementation, [`UdpTransport`].
//! - [`receiver`] – [`PoseReceiver`], a UDP listener that keeps the latest
//!   received pose.
//! - [`tracker`] – [`PoseTracker`], per-frame deltas against a recenterable
//!   reference pose.

pub mod codec;
pub mod receiver;
pub mod tracker;
pub mod transport;

pub use codec::{TelemetryEncoder, decode_packet};
pub use receiver::{PoseReceiver, ReceivedPose};
pub use tracker::PoseTracker;
pub use transport::{TelemetryChannel, TelemetryTransport, UdpChannel, UdpTransport};
