//! Generic `AttitudeSensor` trait for inertial motion hardware.

use posecast_types::{PoseError, RawAttitude};

/// A device that reports its absolute attitude relative to a fixed
/// reference frame.
///
/// Drivers are polled once per sampling tick by
/// [`OrientationSource`][crate::source::OrientationSource].
pub trait AttitudeSensor: Send + 'static {
    /// Stable identifier for this sensor, e.g. `"device_motion"`.
    fn id(&self) -> &str;

    /// Return the current attitude.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::SensorUnavailable`] when the sensor has no reading
    /// for this tick.  Callers treat that as a skipped tick, never as a fault.
    fn read_attitude(&mut self) -> Result<RawAttitude, PoseError>;
}

impl<S: AttitudeSensor + ?Sized> AttitudeSensor for Box<S> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn read_attitude(&mut self) -> Result<RawAttitude, PoseError> {
        (**self).read_attitude()
    }
}
