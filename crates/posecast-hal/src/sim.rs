//! Simulated attitude sensors for running the pipeline without a phone IMU.
//!
//! [`SimAttitudeSensor`] produces smooth, bounded head motion derived from
//! elapsed time.  [`ScriptedAttitudeSensor`] replays a fixed list of readings
//! (with optional gaps) and is the workhorse of the pipeline tests.
//! [`UnavailableAttitudeSensor`] models a device with no motion hardware.
//!
//! # Example
//!
//! ```rust
//! use posecast_hal::{AttitudeSensor, ScriptedAttitudeSensor};
//! use posecast_types::RawAttitude;
//!
//! let mut sensor = ScriptedAttitudeSensor::new(vec![RawAttitude::new(0.5, -0.2, 1.0)]);
//! assert!(sensor.read_attitude().is_ok());
//! assert!(sensor.read_attitude().is_err());
//! ```

use std::collections::VecDeque;
use std::f64::consts::{FRAC_PI_4, FRAC_PI_6, PI};
use std::time::Instant;

use posecast_types::{PoseError, RawAttitude};

use crate::attitude::AttitudeSensor;

// ────────────────────────────────────────────────────────────────────────────
// Sinusoidal sensor
// ────────────────────────────────────────────────────────────────────────────

/// A simulated sensor sweeping yaw, pitch and roll on independent sine waves.
///
/// Yaw sweeps ±90°, pitch ±30°, roll ±45°, so every value stays inside
/// (−180°, 180°].  Always available.
pub struct SimAttitudeSensor {
    id: String,
    started: Instant,
}

impl SimAttitudeSensor {
    /// Create a simulated sensor whose motion starts now.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            started: Instant::now(),
        }
    }

    /// Attitude of the simulated head `t` seconds after start.
    pub fn attitude_at(t: f64) -> RawAttitude {
        RawAttitude {
            yaw: (PI / 2.0) * (t * 0.25 * 2.0 * PI).sin(),
            pitch: FRAC_PI_6 * (t * 0.4 * 2.0 * PI).sin(),
            roll: FRAC_PI_4 * (t * 0.15 * 2.0 * PI).cos(),
        }
    }
}

impl Default for SimAttitudeSensor {
    fn default() -> Self {
        Self::new("sim_device_motion")
    }
}

impl AttitudeSensor for SimAttitudeSensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_attitude(&mut self) -> Result<RawAttitude, PoseError> {
        Ok(Self::attitude_at(self.started.elapsed().as_secs_f64()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted sensor
// ────────────────────────────────────────────────────────────────────────────

/// Replays a fixed sequence of readings, one per call.
///
/// A `None` entry is a tick with no reading.  Once the script is exhausted
/// the sensor reports itself unavailable, unless built with
/// [`repeating`][Self::repeating].
pub struct ScriptedAttitudeSensor {
    id: String,
    script: Vec<Option<RawAttitude>>,
    pending: VecDeque<Option<RawAttitude>>,
    repeat: bool,
    reads: u64,
}

impl ScriptedAttitudeSensor {
    /// Script made only of available readings.
    pub fn new(readings: Vec<RawAttitude>) -> Self {
        Self::with_gaps(readings.into_iter().map(Some).collect())
    }

    /// Script where `None` entries are ticks without a reading.
    pub fn with_gaps(script: Vec<Option<RawAttitude>>) -> Self {
        Self {
            id: "scripted_device_motion".to_string(),
            pending: script.iter().copied().collect(),
            script,
            repeat: false,
            reads: 0,
        }
    }

    /// Restart the script from the beginning once it runs out.
    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Number of times the sensor has been polled.
    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl AttitudeSensor for ScriptedAttitudeSensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_attitude(&mut self) -> Result<RawAttitude, PoseError> {
        self.reads += 1;
        if self.pending.is_empty() && self.repeat {
            self.pending.extend(self.script.iter().copied());
        }
        match self.pending.pop_front() {
            Some(Some(reading)) => Ok(reading),
            Some(None) => Err(PoseError::SensorUnavailable(format!(
                "{}: no reading this tick",
                self.id
            ))),
            None => Err(PoseError::SensorUnavailable(format!(
                "{}: script exhausted",
                self.id
            ))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Missing hardware
// ────────────────────────────────────────────────────────────────────────────

/// A device without motion hardware.  Every read fails.
#[derive(Default)]
pub struct UnavailableAttitudeSensor;

impl AttitudeSensor for UnavailableAttitudeSensor {
    fn id(&self) -> &str {
        "unavailable"
    }

    fn read_attitude(&mut self) -> Result<RawAttitude, PoseError> {
        Err(PoseError::SensorUnavailable(
            "device motion is not available".to_string(),
        ))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_sensor_stays_within_half_turn() {
        for i in 0..600 {
            let a = SimAttitudeSensor::attitude_at(i as f64 / 60.0);
            for v in [a.yaw, a.pitch, a.roll] {
                assert!(v.abs() <= PI / 2.0 + 1e-9, "value out of range: {v}");
            }
        }
    }

    #[test]
    fn sim_sensor_always_reads() {
        let mut sensor = SimAttitudeSensor::default();
        assert_eq!(sensor.id(), "sim_device_motion");
        assert!(sensor.read_attitude().is_ok());
    }

    #[test]
    fn scripted_sensor_replays_in_order_then_runs_dry() {
        let mut sensor = ScriptedAttitudeSensor::new(vec![
            RawAttitude::new(0.1, 0.0, 0.0),
            RawAttitude::new(0.2, 0.0, 0.0),
        ]);
        assert_eq!(sensor.read_attitude().unwrap().roll, 0.1);
        assert_eq!(sensor.read_attitude().unwrap().roll, 0.2);
        assert!(matches!(
            sensor.read_attitude(),
            Err(PoseError::SensorUnavailable(_))
        ));
        assert_eq!(sensor.reads(), 3);
    }

    #[test]
    fn scripted_sensor_reports_gaps() {
        let mut sensor =
            ScriptedAttitudeSensor::with_gaps(vec![None, Some(RawAttitude::new(0.0, 0.3, 0.0))]);
        assert!(sensor.read_attitude().is_err());
        assert_eq!(sensor.read_attitude().unwrap().pitch, 0.3);
    }

    #[test]
    fn repeating_script_wraps_around() {
        let mut sensor = ScriptedAttitudeSensor::new(vec![
            RawAttitude::new(1.0, 0.0, 0.0),
            RawAttitude::new(2.0, 0.0, 0.0),
        ])
        .repeating();
        let rolls: Vec<f64> = (0..5)
            .map(|_| sensor.read_attitude().unwrap().roll)
            .collect();
        assert_eq!(rolls, vec![1.0, 2.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn unavailable_sensor_never_reads() {
        let mut sensor = UnavailableAttitudeSensor;
        for _ in 0..3 {
            assert!(sensor.read_attitude().is_err());
        }
    }
}
