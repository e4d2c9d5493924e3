use micro_dsp::{DbScale, LevelScale, ResponsePolicy};
use micro_viz::{Zone, ZoneBoundaries};

use crate::error::ConfigError;
use crate::sampler::MAX_SAMPLES;

/// Board pin numbers. The meter never touches pins itself; the firmware
/// uses these when it claims its peripherals and logs them at boot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wiring {
    pub mic_pin: u8,
    pub led_pin: u8,
    pub button_pin: Option<u8>,
    pub knob_pin: Option<u8>,
}

impl Default for Wiring {
    fn default() -> Self {
        Self {
            mic_pin: 1,
            led_pin: 38,
            button_pin: None,
            knob_pin: None,
        }
    }
}

/// Startup noise-floor measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSettings {
    /// Length of the quiet window. Zero still takes a single reading.
    pub duration_ms: u32,
    /// Pause between readings inside the window.
    pub interval_ms: u32,
    /// Samples per reading.
    pub batch_size: usize,
    /// Multiplies the measured mean to get the noise floor.
    pub noise_margin: f32,
    /// Multiplies the noise floor to seed the auto-ranging ceiling.
    pub ceiling_multiplier: f32,
}

/// Maps the knob position onto an RMS threshold: `base + position·range`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdMapping {
    pub base: f32,
    pub range: f32,
}

impl ThresholdMapping {
    pub fn threshold(&self, position: f32) -> f32 {
        let position = if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, 1.0)
        };
        self.base + position * self.range
    }
}

/// Every tunable of the meter, fixed before the loop starts.
#[derive(Debug, Clone, PartialEq)]
pub struct VuConfig {
    pub wiring: Wiring,
    pub num_leds: usize,
    /// ADC samples per loudness reading.
    pub sample_count: usize,
    /// Period of the control loop.
    pub cycle_delay_ms: u32,
    pub response: ResponsePolicy,
    pub scale: LevelScale,
    pub calibration: Option<CalibrationSettings>,
    /// Skip the whole cycle when the reading is at or below the noise floor.
    pub noise_gate: bool,
    pub knob: Option<ThresholdMapping>,
    /// Pause after a reset press before the button is read again.
    pub debounce_ms: u32,
    pub zones: Option<ZoneBoundaries>,
    /// Paint the strip solid red when the bar is full.
    pub overload_red: bool,
    /// Hold time per colour of the boot-time strip test, if any.
    pub self_test_step_ms: Option<u32>,
}

impl Default for VuConfig {
    fn default() -> Self {
        Self::peak_hold()
    }
}

impl VuConfig {
    /// Smoothed level shown through a peak that holds for 0.8 s, on an
    /// auto-ranging scale seeded at three times the noise floor.
    pub fn peak_hold() -> Self {
        Self {
            wiring: Wiring::default(),
            num_leds: 39,
            sample_count: 300,
            cycle_delay_ms: 50,
            response: ResponsePolicy::ExponentialPeakHold {
                alpha: 0.2,
                hold_ms: 800,
                peak_decay: 0.995,
            },
            scale: LevelScale::AutoRange { decay: 0.9995 },
            calibration: Some(CalibrationSettings {
                duration_ms: 2000,
                interval_ms: 50,
                batch_size: 80,
                noise_margin: 1.0,
                ceiling_multiplier: 3.0,
            }),
            noise_gate: false,
            knob: None,
            debounce_ms: 300,
            zones: None,
            overload_red: false,
            self_test_step_ms: None,
        }
    }

    /// Creeps up at 0.02 per frame and drops at 0.15, refreshing every
    /// 10 ms. Calibration is a single quick reading.
    pub fn slow_attack_fast_decay() -> Self {
        Self {
            sample_count: 150,
            cycle_delay_ms: 10,
            response: ResponsePolicy::FixedRiseFall {
                rise_rate: 0.02,
                fall_rate: Some(0.15),
            },
            scale: LevelScale::AutoRange { decay: 0.999 },
            calibration: Some(CalibrationSettings {
                duration_ms: 0,
                interval_ms: 0,
                batch_size: 200,
                noise_margin: 1.0,
                ceiling_multiplier: 3.0,
            }),
            ..Self::peak_hold()
        }
    }

    /// The mirror image: jumps up at 0.15 per frame, sinks at 0.02.
    pub fn fast_attack_slow_decay() -> Self {
        Self {
            response: ResponsePolicy::FixedRiseFall {
                rise_rate: 0.15,
                fall_rate: Some(0.02),
            },
            ..Self::slow_attack_fast_decay()
        }
    }

    /// Rises toward the reading on a 30..80 dB window and never falls;
    /// quiet cycles below the noise floor are skipped.
    pub fn no_decay() -> Self {
        Self {
            num_leds: 40,
            sample_count: 300,
            cycle_delay_ms: 20,
            response: ResponsePolicy::ProportionalRiseOnly { attack_speed: 0.08 },
            scale: LevelScale::Decibel {
                db: DbScale::FULL_SCALE_OFFSET,
                min_db: 30.0,
                max_db: 80.0,
            },
            calibration: Some(CalibrationSettings {
                duration_ms: 3000,
                interval_ms: 50,
                batch_size: 300,
                noise_margin: 1.05,
                ceiling_multiplier: 3.0,
            }),
            noise_gate: true,
            ..Self::peak_hold()
        }
    }

    /// [`no_decay`](Self::no_decay) plus one-shot flashes at 33%, 66% and
    /// 95%, and a solid red strip when the bar is full.
    pub fn zone_flashes() -> Self {
        Self {
            num_leds: 39,
            zones: Some(ZoneBoundaries::traffic_light()),
            overload_red: true,
            ..Self::no_decay()
        }
    }

    /// Rise-only meter above a threshold set by a potentiometer, cleared
    /// with a push button. No calibration.
    pub fn threshold_knob() -> Self {
        Self {
            wiring: Wiring {
                button_pin: Some(15),
                knob_pin: Some(2),
                ..Wiring::default()
            },
            sample_count: 150,
            cycle_delay_ms: 10,
            response: ResponsePolicy::ThresholdGatedRise {
                attack_speed: 0.08,
                span: 15_000.0,
            },
            calibration: None,
            knob: Some(ThresholdMapping {
                base: 1000.0,
                range: 30_000.0,
            }),
            ..Self::peak_hold()
        }
    }

    /// Replaces the zones, checking that their thresholds increase.
    pub fn with_zones(mut self, zones: &[Zone]) -> Result<Self, ConfigError> {
        self.zones = Some(ZoneBoundaries::new(zones)?);
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_leds == 0 {
            return Err(ConfigError::NoLeds);
        }
        sample_count(self.sample_count)?;

        match self.response {
            ResponsePolicy::ExponentialPeakHold {
                alpha, peak_decay, ..
            } => {
                fraction("alpha", alpha)?;
                fraction("peak_decay", peak_decay)?;
            }
            ResponsePolicy::FixedRiseFall {
                rise_rate,
                fall_rate,
            } => {
                fraction("rise_rate", rise_rate)?;
                if let Some(fall_rate) = fall_rate {
                    fraction("fall_rate", fall_rate)?;
                }
            }
            ResponsePolicy::ProportionalRiseOnly { attack_speed } => {
                fraction("attack_speed", attack_speed)?;
            }
            ResponsePolicy::ThresholdGatedRise { attack_speed, span } => {
                fraction("attack_speed", attack_speed)?;
                positive("span", span)?;
            }
        }

        match self.scale {
            LevelScale::AutoRange { decay } => fraction("range_decay", decay)?,
            LevelScale::Decibel { min_db, max_db, .. } => {
                if !(max_db > min_db) {
                    return Err(ConfigError::EmptyDbWindow { min_db, max_db });
                }
            }
        }

        if let Some(calibration) = &self.calibration {
            sample_count(calibration.batch_size)?;
            positive("noise_margin", calibration.noise_margin)?;
            positive("ceiling_multiplier", calibration.ceiling_multiplier)?;
            if calibration.duration_ms > 0 && calibration.interval_ms == 0 {
                return Err(ConfigError::NotPositive {
                    field: "calibration_interval_ms",
                    value: 0.0,
                });
            }
        }

        if let Some(knob) = &self.knob {
            if !(knob.range >= 0.0) {
                return Err(ConfigError::NotPositive {
                    field: "knob_range",
                    value: knob.range,
                });
            }
        }
        Ok(())
    }
}

fn sample_count(count: usize) -> Result<(), ConfigError> {
    if count == 0 || count > MAX_SAMPLES {
        return Err(ConfigError::SampleCount {
            count,
            max: MAX_SAMPLES,
        });
    }
    Ok(())
}

fn fraction(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::NotAFraction { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}
