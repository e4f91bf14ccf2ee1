//! `posecast-perception` – Pure math on attitude readings.
//!
//! - [`transform`] – [`SampleTransform`][transform::SampleTransform]:
//!   radians to degrees plus the roll sign flip the remote consumer expects.
//! - [`display`] – human-readable formatting of a sample for console or UI
//!   presentation.

pub mod display;
pub mod transform;

pub use display::format_display;
pub use transform::SampleTransform;
