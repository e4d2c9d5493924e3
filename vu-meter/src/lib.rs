#![no_std]

//! Sound-reactive LED level meter.
//!
//! [`VuMeter`] owns the microphone, the LED strip and the optional reset
//! button and threshold knob, and runs the fixed-period loop: sample,
//! track the envelope, flash zones, draw the bar. Hardware is reached only
//! through the traits in [`peripherals`], so the same loop runs on the
//! ESP32 firmware and against the mocks in the tests.

extern crate alloc;

pub mod calibrator;
pub mod config;
pub mod error;
pub mod meter;
pub mod peripherals;
pub mod sampler;

pub use config::{CalibrationSettings, ThresholdMapping, VuConfig, Wiring};
pub use error::{ConfigError, VuError};
pub use meter::{CycleReport, VuMeter};
pub use peripherals::{Clock, LedStrip, Peripherals, SampleSource, Shutdown, ThresholdKnob, Unwired};
pub use sampler::{Sampler, MAX_SAMPLES};

pub use micro_dsp::{CalibrationResult, DbScale, LevelScale, ResponsePolicy};
pub use micro_viz::{Zone, ZoneBoundaries};
