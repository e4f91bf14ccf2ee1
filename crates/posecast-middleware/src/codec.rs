//! Telemetry wire codec.
//!
//! Each datagram carries one sample as UTF-8 JSON with a fixed key order and
//! exactly two decimals per value:
//!
//! ```text
//! {"yaw":57.30,"pitch":-11.46,"roll":-28.65}
//! ```
//!
//! No sequence numbers or timestamps: every packet stands alone.

use posecast_types::{OrientationSample, PoseError, TelemetryPacket};
use serde_json::Value;

/// Serializes [`OrientationSample`]s into [`TelemetryPacket`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryEncoder;

impl TelemetryEncoder {
    /// Encode `sample` into its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Encode`] if any component is NaN or infinite;
    /// the caller skips transmission for that tick.
    pub fn encode(sample: &OrientationSample) -> Result<TelemetryPacket, PoseError> {
        for (axis, value) in [
            ("yaw", sample.yaw),
            ("pitch", sample.pitch),
            ("roll", sample.roll),
        ] {
            if !value.is_finite() {
                return Err(PoseError::Encode(format!("{axis} is not finite ({value})")));
            }
        }
        let text = format!(
            "{{\"yaw\":{:.2},\"pitch\":{:.2},\"roll\":{:.2}}}",
            sample.yaw, sample.pitch, sample.roll
        );
        Ok(TelemetryPacket::new(text.into_bytes()))
    }
}

/// Decode a received datagram.
///
/// Missing keys read as `0.0`, so older or partial senders still produce a
/// usable pose.  Keys present with a non-numeric value are rejected.
///
/// # Errors
///
/// Returns [`PoseError::Decode`] when the payload is not a JSON object or a
/// present key is not a number.
pub fn decode_packet(bytes: &[u8]) -> Result<OrientationSample, PoseError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| PoseError::Decode(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| PoseError::Decode("payload is not a JSON object".to_string()))?;

    let field = |key: &str| -> Result<f64, PoseError> {
        match obj.get(key) {
            None => Ok(0.0),
            Some(v) => v
                .as_f64()
                .ok_or_else(|| PoseError::Decode(format!("`{key}` is not a number: {v}"))),
        }
    };

    Ok(OrientationSample {
        yaw: field("yaw")?,
        pitch: field("pitch")?,
        roll: field("roll")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(packet: &TelemetryPacket) -> &str {
        std::str::from_utf8(packet.as_bytes()).unwrap()
    }

    #[test]
    fn encodes_reference_sample_exactly() {
        let sample = OrientationSample::new(57.295_779_5, -11.459_155_9, -28.647_889_8);
        let packet = TelemetryEncoder::encode(&sample).unwrap();
        assert_eq!(text(&packet), r#"{"yaw":57.30,"pitch":-11.46,"roll":-28.65}"#);
    }

    #[test]
    fn always_two_decimals() {
        let packet = TelemetryEncoder::encode(&OrientationSample::new(0.0, 90.0, -180.0)).unwrap();
        assert_eq!(text(&packet), r#"{"yaw":0.00,"pitch":90.00,"roll":-180.00}"#);
    }

    #[test]
    fn no_thousands_separator_or_exponent() {
        let packet = TelemetryEncoder::encode(&OrientationSample::new(12345.678, 1e-7, 0.0)).unwrap();
        assert_eq!(text(&packet), r#"{"yaw":12345.68,"pitch":0.00,"roll":0.00}"#);
    }

    #[test]
    fn encoding_is_deterministic() {
        let sample = OrientationSample::new(1.234_5, -6.789, 179.999);
        let a = TelemetryEncoder::encode(&sample).unwrap();
        let b = TelemetryEncoder::encode(&sample).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn payload_parses_as_json_with_exactly_three_keys() {
        let sample = OrientationSample::new(-45.678, 12.0, 3.333);
        let packet = TelemetryEncoder::encode(&sample).unwrap();
        let value: Value = serde_json::from_slice(packet.as_bytes()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        for (key, original) in [("yaw", sample.yaw), ("pitch", sample.pitch), ("roll", sample.roll)] {
            let parsed = obj[key].as_f64().unwrap();
            assert!((parsed - original).abs() <= 0.005 + 1e-9, "{key}: {parsed} vs {original}");
        }
    }

    #[test]
    fn non_finite_sample_is_an_encode_error() {
        for sample in [
            OrientationSample::new(f64::NAN, 0.0, 0.0),
            OrientationSample::new(0.0, f64::INFINITY, 0.0),
            OrientationSample::new(0.0, 0.0, f64::NEG_INFINITY),
        ] {
            assert!(matches!(
                TelemetryEncoder::encode(&sample),
                Err(PoseError::Encode(_))
            ));
        }
    }

    #[test]
    fn decode_reads_encoded_payload() {
        let decoded = decode_packet(br#"{"yaw":57.30,"pitch":-11.46,"roll":-28.65}"#).unwrap();
        assert_eq!(decoded, OrientationSample::new(57.30, -11.46, -28.65));
    }

    #[test]
    fn decode_defaults_missing_keys_to_zero() {
        let decoded = decode_packet(br#"{"yaw":10.5}"#).unwrap();
        assert_eq!(decoded, OrientationSample::new(10.5, 0.0, 0.0));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_packet(b"not json"), Err(PoseError::Decode(_))));
        assert!(matches!(decode_packet(b"[1,2,3]"), Err(PoseError::Decode(_))));
        assert!(matches!(
            decode_packet(br#"{"yaw":"north"}"#),
            Err(PoseError::Decode(_))
        ));
    }
}
