//! `posecast-hal` – Motion sensor abstraction.
//!
//! # Modules
//!
//! - [`attitude`] – the [`AttitudeSensor`] trait every motion-sensor driver
//!   implements.
//! - [`sim`] – simulated sensors for headless runs and tests.
//! - [`source`] – [`OrientationSource`], the periodic sampler that polls a
//!   sensor on a fixed interval and hands each reading to a callback.

pub mod attitude;
pub mod sim;
pub mod source;

pub use attitude::AttitudeSensor;
pub use sim::{ScriptedAttitudeSensor, SimAttitudeSensor, UnavailableAttitudeSensor};
pub use source::OrientationSource;
