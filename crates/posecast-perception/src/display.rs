//! Presentation formatting for the display collaborator.

use posecast_types::OrientationSample;

/// One-line rendering of a sample, two decimals and a degree sign per axis.
///
/// ```rust
/// use posecast_perception::format_display;
/// use posecast_types::OrientationSample;
///
/// let line = format_display(&OrientationSample::new(57.2958, -11.4592, -28.6479));
/// assert_eq!(line, "Yaw: 57.30°, Pitch: -11.46°, Roll: -28.65°");
/// ```
pub fn format_display(sample: &OrientationSample) -> String {
    format!(
        "Yaw: {:.2}°, Pitch: {:.2}°, Roll: {:.2}°",
        sample.yaw, sample.pitch, sample.roll
    )
}
