//! [`TelemetryPipeline`] – sensor sampling to network telemetry.
//!
//! Each tick of the [`OrientationSource`]:
//!
//! 1. **Acquire** – the source polls the [`AttitudeSensor`]; ticks without a
//!    reading are skipped silently.
//! 2. **Transform** – [`SampleTransform`] converts radians to degrees and
//!    flips roll.
//! 3. **Encode** – [`TelemetryEncoder`] renders the compact JSON payload.
//!    Non-finite samples are logged and skipped.
//! 4. **Dispatch** – the packet is moved into a detached Tokio task that
//!    performs a single [`TelemetryChannel::send`].  The sampling task never
//!    waits on I/O, so a slow or failing send cannot delay the next tick.
//!
//! # States
//!
//! ```text
//!            start() ── transport open ok ──▶
//!   Idle                                      Streaming
//!            ◀────────────── stop() ─────────
//! ```
//!
//! A failed transport open leaves the pipeline `Idle` and is returned from
//! [`start`][TelemetryPipeline::start].  Nothing that happens during
//! `Streaming` changes the state; per-tick failures are counted in
//! [`StatsSnapshot`] and logged.
//!
//! # Example
//!
//! ```rust,no_run
//! use posecast_hal::SimAttitudeSensor;
//! use posecast_middleware::UdpTransport;
//! use posecast_runtime::{PipelineConfig, TelemetryPipeline};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), posecast_types::PoseError> {
//! let mut pipeline = TelemetryPipeline::new(
//!     PipelineConfig::default(),
//!     SimAttitudeSensor::default(),
//!     UdpTransport::default(),
//! );
//! pipeline.start().await?;
//! tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//! pipeline.stop().await;
//! # Ok(())
//! # }
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use posecast_hal::source::DEFAULT_SAMPLE_INTERVAL;
use posecast_hal::{AttitudeSensor, OrientationSource};
use posecast_middleware::{TelemetryChannel, TelemetryEncoder, TelemetryTransport};
use posecast_perception::{SampleTransform, format_display};
use posecast_types::{EndpointConfig, OrientationSample, PoseError, RawAttitude};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Listener address used when none is configured.
pub const DEFAULT_HOST: &str = "192.168.31.188";
pub const DEFAULT_PORT: u16 = 45678;

/// Fixed-at-construction settings for [`TelemetryPipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub endpoint: EndpointConfig,
    pub sample_interval: Duration,
}

impl PipelineConfig {
    /// Build a config from a sampling rate in hertz.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::InvalidConfig`] for a rate that is not a positive,
    /// finite number.
    pub fn from_rate_hz(endpoint: EndpointConfig, rate_hz: f64) -> Result<Self, PoseError> {
        if !rate_hz.is_finite() || rate_hz <= 0.0 {
            return Err(PoseError::InvalidConfig(format!(
                "sample rate must be a positive number of hertz, got {rate_hz}"
            )));
        }
        Ok(Self {
            endpoint,
            sample_interval: Duration::from_secs_f64(1.0 / rate_hz),
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::new(DEFAULT_HOST, DEFAULT_PORT),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// State & accounting
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No sampling, no open channel.
    Idle,
    /// Sampling, transforming, encoding and sending every tick.
    Streaming,
}

/// Counters shared by the sampling task and the detached send tasks.
#[derive(Debug, Default)]
struct PipelineStats {
    ticks: AtomicU64,
    encoded: AtomicU64,
    encode_failures: AtomicU64,
    send_attempts: AtomicU64,
    send_failures: AtomicU64,
    bytes_sent: AtomicU64,
}

/// Point-in-time copy of the pipeline counters.
///
/// `ticks` counts readings delivered by the sensor; `sensor_misses` counts
/// ticks where it had none.  `send_attempts` counts dispatched sends, so
/// after in-flight sends settle
/// `send_attempts == encoded` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    pub ticks: u64,
    pub sensor_misses: u64,
    pub encoded: u64,
    pub encode_failures: u64,
    pub send_attempts: u64,
    pub send_failures: u64,
    pub bytes_sent: u64,
}

/// Observer that receives every transformed sample, e.g. an on-screen label.
pub type DisplayObserver = Arc<dyn Fn(&OrientationSample) + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Per-tick work
// ─────────────────────────────────────────────────────────────────────────────

/// Everything one tick needs.  Moved into the sampling callback.
struct TickDispatcher<C> {
    channel: Arc<C>,
    stats: Arc<PipelineStats>,
    display: Option<DisplayObserver>,
}

impl<C: TelemetryChannel> TickDispatcher<C> {
    fn on_reading(&self, raw: RawAttitude) {
        self.stats.ticks.fetch_add(1, Ordering::Relaxed);

        let sample = SampleTransform::apply(raw);
        if let Some(display) = &self.display
            && panic::catch_unwind(AssertUnwindSafe(|| display(&sample))).is_err()
        {
            warn!("display observer panicked; tick continues");
        }
        debug!("{}", format_display(&sample));

        let packet = match TelemetryEncoder::encode(&sample) {
            Ok(packet) => packet,
            Err(e) => {
                self.stats.encode_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "skipping tick: sample could not be encoded");
                return;
            }
        };
        self.stats.encoded.fetch_add(1, Ordering::Relaxed);
        self.stats.send_attempts.fetch_add(1, Ordering::Relaxed);

        let channel = Arc::clone(&self.channel);
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            match channel.send(packet).await {
                Ok(n) => {
                    stats.bytes_sent.fetch_add(n as u64, Ordering::Relaxed);
                }
                // Send raced with stop(); not a failure.
                Err(PoseError::ChannelClosed) => debug!("in-flight send dropped after stop"),
                Err(e) => {
                    stats.send_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(error = %e, "telemetry send failed");
                }
            }
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TelemetryPipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Streams orientation samples from a sensor to one remote listener.
pub struct TelemetryPipeline<S: AttitudeSensor, T: TelemetryTransport> {
    config: PipelineConfig,
    source: OrientationSource<S>,
    transport: T,
    channel: Option<Arc<T::Channel>>,
    state: PipelineState,
    stats: Arc<PipelineStats>,
    display: Option<DisplayObserver>,
}

impl<S: AttitudeSensor, T: TelemetryTransport> TelemetryPipeline<S, T> {
    /// Build an idle pipeline.  Nothing is opened until
    /// [`start`][Self::start].
    pub fn new(config: PipelineConfig, sensor: S, transport: T) -> Self {
        Self {
            config,
            source: OrientationSource::new(sensor),
            transport,
            channel: None,
            state: PipelineState::Idle,
            stats: Arc::new(PipelineStats::default()),
            display: None,
        }
    }

    /// Register an observer for every transformed sample (builder-style).
    ///
    /// The observer runs on the sampling task and must return quickly.  It
    /// sees the values that are sent; it cannot change them.  A panicking
    /// observer is logged and the tick carries on.
    pub fn with_display<F>(mut self, observer: F) -> Self
    where
        F: Fn(&OrientationSample) + Send + Sync + 'static,
    {
        self.display = Some(Arc::new(observer));
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> StatsSnapshot {
        let s = &self.stats;
        StatsSnapshot {
            ticks: s.ticks.load(Ordering::Relaxed),
            sensor_misses: self.source.misses(),
            encoded: s.encoded.load(Ordering::Relaxed),
            encode_failures: s.encode_failures.load(Ordering::Relaxed),
            send_attempts: s.send_attempts.load(Ordering::Relaxed),
            send_failures: s.send_failures.load(Ordering::Relaxed),
            bytes_sent: s.bytes_sent.load(Ordering::Relaxed),
        }
    }

    /// Idle → Streaming: open the transport channel, then start sampling.
    ///
    /// Calling `start` while already streaming is a no-op.
    ///
    /// # Errors
    ///
    /// * [`PoseError::Setup`] if the transport cannot be opened.
    /// * [`PoseError::InvalidConfig`] for a zero sampling interval or when
    ///   called outside a Tokio runtime.
    ///
    /// On error the pipeline stays `Idle` and holds no open channel.
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    pub async fn start(&mut self) -> Result<(), PoseError> {
        if self.state == PipelineState::Streaming {
            debug!("start ignored: already streaming");
            return Ok(());
        }

        let endpoint = &self.config.endpoint;
        let channel = self.transport.open(endpoint).await.map_err(|e| match e {
            PoseError::Setup { .. } => e,
            other => PoseError::Setup {
                endpoint: endpoint.to_string(),
                details: other.to_string(),
            },
        })?;
        let channel = Arc::new(channel);

        let dispatcher = TickDispatcher {
            channel: Arc::clone(&channel),
            stats: Arc::clone(&self.stats),
            display: self.display.clone(),
        };
        if let Err(e) = self
            .source
            .start(self.config.sample_interval, move |raw| dispatcher.on_reading(raw))
        {
            channel.close();
            return Err(e);
        }

        self.channel = Some(channel);
        self.state = PipelineState::Streaming;
        info!(interval = ?self.config.sample_interval, "telemetry pipeline streaming");
        Ok(())
    }

    /// Streaming → Idle: halt sampling, then close the channel.
    ///
    /// Returns as soon as the sampling task has exited; sends already in
    /// flight are not awaited.  No-op when idle.
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    pub async fn stop(&mut self) {
        if self.state == PipelineState::Idle {
            return;
        }
        self.source.stop().await;
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
        self.state = PipelineState::Idle;
        info!(stats = ?self.stats(), "telemetry pipeline stopped");
    }
}

impl<S: AttitudeSensor, T: TelemetryTransport> Drop for TelemetryPipeline<S, T> {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
