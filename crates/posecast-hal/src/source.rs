//! [`OrientationSource`] – periodic attitude sampler.
//!
//! Owns an [`AttitudeSensor`] and, while started, polls it from a dedicated
//! Tokio task driven by [`tokio::time::interval`].  Every successful reading
//! is handed to the caller's callback; ticks where the sensor has nothing to
//! report are skipped silently.
//!
//! Late ticks are skipped rather than replayed
//! ([`MissedTickBehavior::Skip`]), so a stalled runtime never produces a
//! burst of stale readings.
//!
//! The sampling task owns the sensor while it runs and hands it back when it
//! finishes, so a stopped source can be started again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use posecast_types::{PoseError, RawAttitude};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, trace};

use crate::attitude::AttitudeSensor;

/// Nominal device-motion update interval (60 Hz).
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_nanos(16_666_667);

struct Running<S> {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<S>,
}

/// Periodic sampler over an [`AttitudeSensor`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use posecast_hal::{OrientationSource, SimAttitudeSensor};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut source = OrientationSource::new(SimAttitudeSensor::default());
/// source
///     .start(Duration::from_millis(16), |reading| println!("{reading:?}"))
///     .expect("start");
/// source.stop().await;
/// # }
/// ```
pub struct OrientationSource<S: AttitudeSensor> {
    sensor: Option<S>,
    running: Option<Running<S>>,
    misses: Arc<AtomicU64>,
}

impl<S: AttitudeSensor> OrientationSource<S> {
    pub fn new(sensor: S) -> Self {
        Self {
            sensor: Some(sensor),
            running: None,
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// `true` between a successful [`start`][Self::start] and the matching
    /// [`stop`][Self::stop].
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Number of ticks on which the sensor had no reading.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// The idle sensor.  `None` while sampling.
    pub fn sensor(&self) -> Option<&S> {
        self.sensor.as_ref()
    }

    /// Begin polling the sensor every `interval`, passing each reading to
    /// `on_reading` on the sampling task.
    ///
    /// `on_reading` runs on the timing path and must not block.  Must be
    /// called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// * [`PoseError::AlreadyRunning`] if the source is already sampling.
    /// * [`PoseError::InvalidConfig`] for a zero interval or when no Tokio
    ///   runtime is available.
    /// * [`PoseError::SensorUnavailable`] if a previous sampling task panicked
    ///   and took the sensor with it.
    pub fn start<F>(&mut self, interval: Duration, mut on_reading: F) -> Result<(), PoseError>
    where
        F: FnMut(RawAttitude) + Send + 'static,
    {
        if self.running.is_some() {
            return Err(PoseError::AlreadyRunning);
        }
        if interval.is_zero() {
            return Err(PoseError::InvalidConfig(
                "sampling interval must be greater than zero".to_string(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PoseError::InvalidConfig(format!("no Tokio runtime: {e}")))?;
        let mut sensor = self.sensor.take().ok_or_else(|| {
            PoseError::SensorUnavailable("sensor was lost by a failed sampling task".to_string())
        })?;

        let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();
        let misses = Arc::clone(&self.misses);
        debug!(sensor = sensor.id(), ?interval, "orientation source starting");

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => match sensor.read_attitude() {
                        Ok(reading) => on_reading(reading),
                        Err(e) => {
                            misses.fetch_add(1, Ordering::Relaxed);
                            trace!(error = %e, "no attitude this tick");
                        }
                    },
                }
            }
            sensor
        });

        self.running = Some(Running { shutdown, task });
        Ok(())
    }

    /// Halt sampling.
    ///
    /// Waits only for the sampling task to leave its loop; once this returns
    /// the callback will not be invoked again.  No-op when idle.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.shutdown.send(());
        match running.task.await {
            Ok(sensor) => {
                debug!(sensor = sensor.id(), "orientation source stopped");
                self.sensor = Some(sensor);
            }
            Err(e) => error!(error = %e, "sampling task ended abnormally; sensor lost"),
        }
    }
}

impl<S: AttitudeSensor> Drop for OrientationSource<S> {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ScriptedAttitudeSensor, SimAttitudeSensor, UnavailableAttitudeSensor};
    use std::sync::Mutex;

    fn collector() -> (Arc<Mutex<Vec<RawAttitude>>>, impl FnMut(RawAttitude) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |r| sink.lock().unwrap().push(r))
    }

    #[tokio::test]
    async fn delivers_readings_in_order() {
        let script: Vec<RawAttitude> = (0..5).map(|i| RawAttitude::new(i as f64, 0.0, 0.0)).collect();
        let mut source = OrientationSource::new(ScriptedAttitudeSensor::new(script));
        let (seen, cb) = collector();

        source.start(Duration::from_millis(2), cb).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        source.stop().await;

        let rolls: Vec<f64> = seen.lock().unwrap().iter().map(|r| r.roll).collect();
        assert_eq!(rolls, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(source.misses() > 0, "exhausted script must count as misses");
    }

    #[tokio::test]
    async fn unavailable_sensor_delivers_nothing() {
        let mut source = OrientationSource::new(UnavailableAttitudeSensor);
        let (seen, cb) = collector();

        source.start(Duration::from_millis(2), cb).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        source.stop().await;

        assert!(seen.lock().unwrap().is_empty());
        assert!(source.misses() > 0);
    }

    #[tokio::test]
    async fn no_reading_after_stop_returns() {
        let mut source = OrientationSource::new(SimAttitudeSensor::default());
        let (seen, cb) = collector();

        source.start(Duration::from_millis(1), cb).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        source.stop().await;

        let at_stop = seen.lock().unwrap().len();
        assert!(at_stop > 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(seen.lock().unwrap().len(), at_stop);
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let mut source = OrientationSource::new(SimAttitudeSensor::default());
        source.start(Duration::from_millis(5), |_| {}).unwrap();
        assert_eq!(
            source.start(Duration::from_millis(5), |_| {}),
            Err(PoseError::AlreadyRunning)
        );
        source.stop().await;
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let mut source = OrientationSource::new(SimAttitudeSensor::default());
        assert!(matches!(
            source.start(Duration::ZERO, |_| {}),
            Err(PoseError::InvalidConfig(_))
        ));
        assert!(!source.is_running());
    }

    #[tokio::test]
    async fn source_can_restart_after_stop() {
        let mut source = OrientationSource::new(
            ScriptedAttitudeSensor::new(vec![RawAttitude::default()]).repeating(),
        );
        source.start(Duration::from_millis(2), |_| {}).unwrap();
        source.stop().await;
        assert!(source.sensor().is_some(), "sensor must be handed back");

        let (seen, cb) = collector();
        source.start(Duration::from_millis(2), cb).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        source.stop().await;
        assert!(!seen.lock().unwrap().is_empty());
    }

    #[test]
    fn start_outside_runtime_is_a_config_error() {
        let mut source = OrientationSource::new(SimAttitudeSensor::default());
        assert!(matches!(
            source.start(Duration::from_millis(5), |_| {}),
            Err(PoseError::InvalidConfig(_))
        ));
        assert!(source.sensor().is_some());
    }

    #[tokio::test]
    async fn stop_when_idle_is_noop() {
        let mut source = OrientationSource::new(SimAttitudeSensor::default());
        source.stop().await;
        assert!(!source.is_running());
    }
}
