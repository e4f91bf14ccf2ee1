//! Raw sensor attitude to wire orientation.
//!
//! ```text
//! yaw   =  raw_yaw   · 180/π
//! pitch =  raw_pitch · 180/π
//! roll  = −raw_roll  · 180/π
//! ```
//!
//! Roll is negated to match the receiver's handedness.  The transform is
//! stateless: it has no notion of a user "reset" reference, so the emitted
//! values are always absolute.
//!
//! # Example
//!
//! ```rust
//! use posecast_perception::SampleTransform;
//! use posecast_types::RawAttitude;
//!
//! let sample = SampleTransform::apply(RawAttitude::new(0.5, -0.2, 1.0));
//! assert!((sample.roll + 28.6479).abs() < 1e-3);
//! ```

use posecast_types::{OrientationSample, RawAttitude};

/// Stateless converter from [`RawAttitude`] to [`OrientationSample`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleTransform;

impl SampleTransform {
    /// Convert one reading.  Never fails; non-finite input stays non-finite
    /// and is caught by the encoder.
    pub fn apply(raw: RawAttitude) -> OrientationSample {
        OrientationSample {
            yaw: raw.yaw.to_degrees(),
            pitch: raw.pitch.to_degrees(),
            roll: -raw.roll.to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    #[test]
    fn reference_reading_converts_to_degrees() {
        let s = SampleTransform::apply(RawAttitude::new(0.5, -0.2, 1.0));
        assert!((s.yaw - 57.295_779_513).abs() < 1e-6);
        assert!((s.pitch - (-11.459_155_903)).abs() < 1e-6);
        assert!((s.roll - (-28.647_889_757)).abs() < 1e-6);
    }

    #[test]
    fn roll_is_inverted_yaw_and_pitch_are_not() {
        for &v in &[-3.0, -1.0, -0.25, 0.0, 0.25, 1.0, 3.0] {
            let s = SampleTransform::apply(RawAttitude::new(v, v, v));
            let deg = v * 180.0 / PI;
            assert!((s.roll + deg).abs() < EPS, "roll for {v}");
            assert!((s.pitch - deg).abs() < EPS, "pitch for {v}");
            assert!((s.yaw - deg).abs() < EPS, "yaw for {v}");
        }
    }

    #[test]
    fn half_turn_maps_to_180_degrees() {
        let s = SampleTransform::apply(RawAttitude::new(-PI, 0.0, PI));
        assert!((s.yaw - 180.0).abs() < EPS);
        assert!((s.roll - 180.0).abs() < EPS);
    }

    #[test]
    fn transform_is_deterministic() {
        let raw = RawAttitude::new(0.123, -0.456, 0.789);
        assert_eq!(SampleTransform::apply(raw), SampleTransform::apply(raw));
    }

    #[test]
    fn non_finite_input_passes_through() {
        let s = SampleTransform::apply(RawAttitude::new(f64::NAN, 0.0, 0.0));
        assert!(s.roll.is_nan());
        assert!(!s.is_finite());
    }
}
