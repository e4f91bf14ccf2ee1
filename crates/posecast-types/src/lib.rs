use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One attitude reading as reported by the motion sensor: radians, in the
/// sensor's native axis conventions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawAttitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl RawAttitude {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }
}

/// Device orientation in degrees, in the sign convention expected by the
/// remote consumer.  Produced once per sampling tick and never retained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct OrientationSample {
    /// Heading around the vertical axis (degrees).
    pub yaw: f64,
    /// Nose up / nose down (degrees).
    pub pitch: f64,
    /// Tilt around the forward axis (degrees, consumer handedness).
    pub roll: f64,
}

impl OrientationSample {
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }

    /// `true` when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite() && self.roll.is_finite()
    }
}

/// One encoded sample, ready to be handed to the transport as a single
/// datagram.  Moved into the send, so it is consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryPacket(Vec<u8>);

impl TelemetryPacket {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Remote listener address.  Fixed for the lifetime of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// IP literal or resolvable host name of the listener.
    pub host: String,
    pub port: u16,
}

impl EndpointConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Error type shared by every posecast crate.
///
/// Only [`PoseError::Setup`] and [`PoseError::InvalidConfig`] ever leave the
/// pipeline; the remaining variants are absorbed per tick.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    #[error("Transport setup failed for {endpoint}: {details}")]
    Setup { endpoint: String, details: String },

    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Send to {endpoint} failed: {details}")]
    Send { endpoint: String, details: String },

    #[error("Telemetry channel closed")]
    ChannelClosed,

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Orientation source already running")]
    AlreadyRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_serialization_uses_wire_keys() {
        let sample = OrientationSample::new(1.0, 2.0, 3.0);
        let json = serde_json::to_value(sample).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["yaw"], 1.0);
        assert_eq!(obj["pitch"], 2.0);
        assert_eq!(obj["roll"], 3.0);
    }

    #[test]
    fn sample_is_finite_detects_nan_and_infinity() {
        assert!(OrientationSample::new(0.0, -90.0, 180.0).is_finite());
        assert!(!OrientationSample::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!OrientationSample::new(0.0, f64::INFINITY, 0.0).is_finite());
        assert!(!OrientationSample::new(0.0, 0.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn endpoint_display_formats_host_and_port() {
        assert_eq!(
            EndpointConfig::new("192.168.31.188", 45678).to_string(),
            "192.168.31.188:45678"
        );
        assert_eq!(EndpointConfig::new("::1", 9000).to_string(), "[::1]:9000");
    }

    #[test]
    fn packet_exposes_its_bytes() {
        let packet = TelemetryPacket::new(b"{}".to_vec());
        assert_eq!(packet.len(), 2);
        assert!(!packet.is_empty());
        assert_eq!(packet.as_bytes(), b"{}");
        assert_eq!(packet.into_bytes(), b"{}".to_vec());
    }

    #[test]
    fn pose_error_display() {
        let err = PoseError::Setup {
            endpoint: "10.0.0.1:45678".to_string(),
            details: "no route".to_string(),
        };
        assert!(err.to_string().contains("10.0.0.1:45678"));
        assert!(err.to_string().contains("setup failed"));

        let err = PoseError::Encode("yaw is NaN".to_string());
        assert!(err.to_string().contains("yaw is NaN"));
    }
}
