//! `posecast-runtime` – The streaming engine.
//!
//! # Modules
//!
//! - [`pipeline`] – [`TelemetryPipeline`][pipeline::TelemetryPipeline]:
//!   the Idle/Streaming state machine that samples the attitude sensor on a
//!   fixed interval, transforms and encodes every reading, and dispatches
//!   one fire-and-forget datagram per tick.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter (`OTEL_EXPORTER_OTLP_ENDPOINT`).

pub mod pipeline;
pub mod telemetry;

pub use pipeline::{
    DEFAULT_HOST, DEFAULT_PORT, DisplayObserver, PipelineConfig, PipelineState, StatsSnapshot,
    TelemetryPipeline,
};
pub use telemetry::{TracerProviderGuard, init_tracing};
