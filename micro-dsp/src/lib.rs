#![no_std]

//! Signal conditioning for a microphone-driven level meter.
//!
//! Raw ADC batches are reduced to an RMS magnitude ([`rms`]), a silent
//! window of those readings becomes a noise floor ([`NoiseFloorEstimator`]),
//! and the [`EnvelopeTracker`] turns each new reading into a stable level
//! in `0.0..=1.0`.

pub mod calibration;
pub mod envelope;
pub mod loudness;

pub use calibration::{CalibrationResult, NoiseFloorEstimator};
pub use envelope::{EnvelopeState, EnvelopeTracker, LevelScale, ResponsePolicy};
pub use loudness::{db_from_rms, rms, DbScale};
