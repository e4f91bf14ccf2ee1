//! Best-effort datagram transport to a single fixed endpoint.
//!
//! Opening a [`TelemetryTransport`] yields a [`TelemetryChannel`]: a
//! connectionless handle that is shared by every tick's send and only ever
//! written to.  Each [`send`][TelemetryChannel::send] is one datagram, one
//! attempt: no retry, no acknowledgement, no ordering across sends.
//!
//! # Example
//!
//! ```rust,no_run
//! use posecast_middleware::{TelemetryChannel, TelemetryEncoder, TelemetryTransport, UdpTransport};
//! use posecast_types::{EndpointConfig, OrientationSample};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), posecast_types::PoseError> {
//! let channel = UdpTransport::default()
//!     .open(&EndpointConfig::new("192.168.31.188", 45678))
//!     .await?;
//! let packet = TelemetryEncoder::encode(&OrientationSample::default())?;
//! channel.send(packet).await?;
//! channel.close();
//! # Ok(())
//! # }
//! ```

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use posecast_types::{EndpointConfig, PoseError, TelemetryPacket};
use tokio::net::UdpSocket;
use tracing::{debug, info, instrument};

/// Opens channels to a remote endpoint.
#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    type Channel: TelemetryChannel;

    /// Establish a channel to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Setup`] if the endpoint cannot be resolved or no
    /// local socket can be created.
    async fn open(&self, endpoint: &EndpointConfig) -> Result<Self::Channel, PoseError>;
}

/// A write-only, fire-and-forget handle to one remote endpoint.
///
/// Implementations must tolerate concurrent `send` calls from many tasks.
#[async_trait]
pub trait TelemetryChannel: Send + Sync + 'static {
    /// Attempt to transmit `packet` as a single datagram.
    ///
    /// `Ok` means the payload was handed to the local network stack, not that
    /// anyone received it.  Returns the number of bytes handed over.
    ///
    /// # Errors
    ///
    /// * [`PoseError::ChannelClosed`] after [`close`][Self::close].
    /// * [`PoseError::Send`] when the local stack rejects the datagram.
    async fn send(&self, packet: TelemetryPacket) -> Result<usize, PoseError>;

    /// Stop accepting sends: every later [`send`][Self::send] returns
    /// [`PoseError::ChannelClosed`].  Idempotent; safe even if nothing was
    /// ever sent.
    ///
    /// Underlying resources are freed when the last handle is dropped, which
    /// may be after sends already in flight have finished.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

// ────────────────────────────────────────────────────────────────────────────
// UDP
// ────────────────────────────────────────────────────────────────────────────

/// UDP implementation of [`TelemetryTransport`].
///
/// Binds an ephemeral local port on the wildcard address of the endpoint's
/// address family unless [`with_bind_addr`][Self::with_bind_addr] is used.
#[derive(Debug, Clone, Default)]
pub struct UdpTransport {
    bind_addr: Option<SocketAddr>,
}

impl UdpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the local socket to a specific address (builder-style).
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }
}

#[async_trait]
impl TelemetryTransport for UdpTransport {
    type Channel = UdpChannel;

    #[instrument(skip(self, endpoint), fields(endpoint = %endpoint))]
    async fn open(&self, endpoint: &EndpointConfig) -> Result<UdpChannel, PoseError> {
        let setup_err = |details: String| PoseError::Setup {
            endpoint: endpoint.to_string(),
            details,
        };

        let addrs = tokio::net::lookup_host((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|e| setup_err(format!("cannot resolve host: {e}")))?;
        let peer = pick_peer(addrs)
            .ok_or_else(|| setup_err("host resolved to no addresses".to_string()))?;

        let local = self.bind_addr.unwrap_or_else(|| match peer {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        });
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| setup_err(format!("cannot bind {local}: {e}")))?;

        info!(%peer, local = ?socket.local_addr().ok(), "telemetry channel open");
        Ok(UdpChannel {
            socket,
            peer,
            closed: AtomicBool::new(false),
        })
    }
}

/// First IPv4 address, else the first address of any family.
///
/// Listeners bind `0.0.0.0`, so a name like `localhost` that resolves to
/// `::1` first must still reach them over IPv4.
fn pick_peer(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<SocketAddr> {
    let mut first = None;
    for addr in addrs {
        if addr.is_ipv4() {
            return Some(addr);
        }
        first.get_or_insert(addr);
    }
    first
}

/// An open UDP telemetry channel.
///
/// Never reads from its socket.  [`close`][TelemetryChannel::close] only
/// flips a flag that rejects further sends; the socket is released when the
/// last owner drops the channel.
#[derive(Debug)]
pub struct UdpChannel {
    socket: UdpSocket,
    peer: SocketAddr,
    closed: AtomicBool,
}

impl UdpChannel {
    /// Resolved remote address.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }
}

#[async_trait]
impl TelemetryChannel for UdpChannel {
    async fn send(&self, packet: TelemetryPacket) -> Result<usize, PoseError> {
        if self.is_closed() {
            return Err(PoseError::ChannelClosed);
        }
        self.socket
            .send_to(packet.as_bytes(), self.peer)
            .await
            .map_err(|e| PoseError::Send {
                endpoint: self.peer.to_string(),
                details: e.to_string(),
            })
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(peer = %self.peer, "telemetry channel closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
