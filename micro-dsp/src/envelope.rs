use crate::calibration::CalibrationResult;
use crate::loudness::DbScale;

/// How the displayed level follows the normalized reading.
///
/// Every variant runs through the same [`EnvelopeTracker`]; they only differ
/// in the rise step, the fall step and how the reading is normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum ResponsePolicy {
    /// `smoothed = alpha·norm + (1 - alpha)·smoothed`, displayed through a
    /// peak that holds for `hold_ms` and then decays by `peak_decay` per
    /// cycle, never below `smoothed`.
    ExponentialPeakHold {
        alpha: f32,
        hold_ms: u32,
        peak_decay: f32,
    },
    /// Moves toward the reading by at most `rise_rate` up or `fall_rate`
    /// down per cycle. `fall_rate: None` never falls until reset.
    FixedRiseFall { rise_rate: f32, fall_rate: Option<f32> },
    /// Closes `attack_speed` of the gap when the reading is higher, holds
    /// otherwise.
    ProportionalRiseOnly { attack_speed: f32 },
    /// Same rise as [`ResponsePolicy::ProportionalRiseOnly`], but the
    /// reading is normalized as `(rms - threshold) / span` against a live
    /// threshold set with [`EnvelopeTracker::set_threshold`]. The configured
    /// [`LevelScale`] is not consulted.
    ThresholdGatedRise { attack_speed: f32, span: f32 },
}

/// Maps an RMS reading onto `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum LevelScale {
    /// Between the noise floor and a ceiling that jumps up to any louder
    /// reading and otherwise shrinks by `decay` each cycle.
    AutoRange { decay: f32 },
    /// Between two fixed points of a decibel scale.
    Decibel {
        db: DbScale,
        min_db: f32,
        max_db: f32,
    },
}

/// Everything the tracker carries from one cycle to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub struct EnvelopeState {
    /// Level handed to the display, always within `0.0..=1.0`.
    pub level: f32,
    /// Exponentially smoothed level (peak-hold policy only).
    pub smoothed: f32,
    /// Held peak (peak-hold policy only).
    pub peak: f32,
    /// Clock reading when `peak` last rose.
    pub peak_at_ms: u64,
    /// Auto-ranging ceiling, never below `noise_floor`.
    pub observed_max: f32,
    pub noise_floor: f32,
    /// Live threshold for [`ResponsePolicy::ThresholdGatedRise`].
    pub threshold: f32,
}

impl EnvelopeState {
    const fn new() -> Self {
        Self {
            level: 0.0,
            smoothed: 0.0,
            peak: 0.0,
            peak_at_ms: 0,
            observed_max: 0.0,
            noise_floor: 0.0,
            threshold: 0.0,
        }
    }
}

/// Turns a stream of RMS readings into a display level.
///
/// Call [`calibrate`](Self::calibrate) once with the startup measurement,
/// then [`update`](Self::update) once per cycle. The tracker itself does not
/// skip quiet readings; callers that gate on the noise floor check
/// [`is_below_floor`](Self::is_below_floor) first and leave the tracker
/// untouched for that cycle.
#[derive(Debug, Clone)]
pub struct EnvelopeTracker {
    policy: ResponsePolicy,
    scale: LevelScale,
    state: EnvelopeState,
}

impl EnvelopeTracker {
    pub fn new(policy: ResponsePolicy, scale: LevelScale) -> Self {
        Self {
            policy,
            scale,
            state: EnvelopeState::new(),
        }
    }

    /// Installs the noise floor and seeds the auto-ranging ceiling.
    pub fn calibrate(&mut self, calibration: CalibrationResult) {
        let floor = calibration.noise_floor.max(0.0);
        self.state.noise_floor = floor;
        self.state.observed_max = calibration.initial_ceiling.max(floor);
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.state.threshold = threshold;
    }

    pub fn is_below_floor(&self, reading: f32) -> bool {
        reading <= self.state.noise_floor
    }

    pub fn level(&self) -> f32 {
        self.state.level
    }

    pub fn state(&self) -> &EnvelopeState {
        &self.state
    }

    /// Drops the level and any held peak to zero. The noise floor, the
    /// auto-ranging ceiling and the threshold are kept.
    pub fn reset(&mut self, now_ms: u64) {
        self.state.level = 0.0;
        self.state.smoothed = 0.0;
        self.state.peak = 0.0;
        self.state.peak_at_ms = now_ms;
    }

    /// Feeds one reading taken at `now_ms` and returns the new level.
    pub fn update(&mut self, reading: f32, now_ms: u64) -> f32 {
        let norm = self.normalize(reading);

        let level = match self.policy {
            ResponsePolicy::ExponentialPeakHold {
                alpha,
                hold_ms,
                peak_decay,
            } => self.peak_hold(norm, now_ms, alpha, hold_ms, peak_decay),
            ResponsePolicy::FixedRiseFall {
                rise_rate,
                fall_rate,
            } => rise_fall(self.state.level, norm, rise_rate, fall_rate),
            ResponsePolicy::ProportionalRiseOnly { attack_speed }
            | ResponsePolicy::ThresholdGatedRise { attack_speed, .. } => {
                proportional_rise(self.state.level, norm, attack_speed)
            }
        };

        self.state.level = clamp_unit(level);
        self.state.level
    }

    /// Where `reading` sits on the current scale, in `0.0..=1.0`. Read-only:
    /// the auto-ranging ceiling only moves through [`update`](Self::update).
    pub fn fraction(&self, reading: f32) -> f32 {
        if let ResponsePolicy::ThresholdGatedRise { span, .. } = self.policy {
            let threshold = self.state.threshold;
            return span_fraction(reading, threshold, threshold + span);
        }

        match self.scale {
            LevelScale::AutoRange { .. } => {
                span_fraction(reading, self.state.noise_floor, self.state.observed_max)
            }
            LevelScale::Decibel { db, min_db, max_db } => {
                span_fraction(db.convert(reading), min_db, max_db)
            }
        }
    }

    fn normalize(&mut self, reading: f32) -> f32 {
        let gated = matches!(self.policy, ResponsePolicy::ThresholdGatedRise { .. });
        if let (LevelScale::AutoRange { decay }, false) = (self.scale, gated) {
            self.track_range(reading, decay);
        }
        self.fraction(reading)
    }

    fn track_range(&mut self, reading: f32, decay: f32) {
        let state = &mut self.state;
        if reading > state.observed_max {
            state.observed_max = reading;
        } else {
            state.observed_max = (state.observed_max * decay)
                .max(reading)
                .max(state.noise_floor);
        }
    }

    fn peak_hold(&mut self, norm: f32, now_ms: u64, alpha: f32, hold_ms: u32, decay: f32) -> f32 {
        let state = &mut self.state;
        state.smoothed = clamp_unit(alpha * norm + (1.0 - alpha) * state.smoothed);

        if state.smoothed > state.peak {
            state.peak = state.smoothed;
            state.peak_at_ms = now_ms;
        } else if now_ms.saturating_sub(state.peak_at_ms) > hold_ms as u64 {
            state.peak = (state.peak * decay).max(state.smoothed);
        }
        state.peak
    }
}

fn rise_fall(level: f32, norm: f32, rise_rate: f32, fall_rate: Option<f32>) -> f32 {
    if norm > level {
        (level + rise_rate).min(norm)
    } else {
        match fall_rate {
            Some(fall_rate) => (level - fall_rate).max(norm),
            None => level,
        }
    }
}

fn proportional_rise(level: f32, norm: f32, attack_speed: f32) -> f32 {
    if norm > level {
        (level + (norm - level) * attack_speed).min(norm)
    } else {
        level
    }
}

/// Where `value` sits between `floor` and `ceiling`, clamped to `0.0..=1.0`.
/// An empty or inverted range yields `0.0`.
fn span_fraction(value: f32, floor: f32, ceiling: f32) -> f32 {
    if !(ceiling > floor) {
        return 0.0;
    }
    clamp_unit((value - floor) / (ceiling - floor))
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn auto_range(policy: ResponsePolicy, floor: f32, ceiling: f32) -> EnvelopeTracker {
        let mut tracker = EnvelopeTracker::new(policy, LevelScale::AutoRange { decay: 0.999 });
        tracker.calibrate(CalibrationResult {
            noise_floor: floor,
            initial_ceiling: ceiling,
        });
        tracker
    }

    #[test]
    fn test_normalize_midpoint() {
        // Decay of 1.0 keeps the ceiling fixed at 4000.
        let mut tracker = EnvelopeTracker::new(
            ResponsePolicy::FixedRiseFall {
                rise_rate: 1.0,
                fall_rate: Some(1.0),
            },
            LevelScale::AutoRange { decay: 1.0 },
        );
        tracker.calibrate(CalibrationResult {
            noise_floor: 1000.0,
            initial_ceiling: 4000.0,
        });
        assert_abs_diff_eq!(tracker.normalize(2500.0), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(tracker.update(2500.0, 0), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_range_normalizes_to_zero() {
        let mut tracker = auto_range(
            ResponsePolicy::ProportionalRiseOnly { attack_speed: 1.0 },
            0.0,
            0.0,
        );
        assert_eq!(tracker.normalize(0.0), 0.0);

        let mut window = EnvelopeTracker::new(
            ResponsePolicy::ProportionalRiseOnly { attack_speed: 1.0 },
            LevelScale::Decibel {
                db: DbScale::RELATIVE,
                min_db: 80.0,
                max_db: 30.0,
            },
        );
        assert_eq!(window.normalize(10_000.0), 0.0);
    }

    #[test]
    fn test_ceiling_jumps_up_then_decays_toward_reading() {
        let mut tracker = auto_range(
            ResponsePolicy::ProportionalRiseOnly { attack_speed: 0.5 },
            100.0,
            300.0,
        );
        tracker.normalize(1000.0);
        assert_eq!(tracker.state().observed_max, 1000.0);

        tracker.normalize(200.0);
        assert_abs_diff_eq!(tracker.state().observed_max, 999.0, epsilon = 1e-3);

        // Never below the reading of the same cycle.
        tracker.normalize(998.9);
        assert!(tracker.state().observed_max >= 998.9);
    }

    #[test]
    fn test_fraction_leaves_ceiling_alone() {
        let mut tracker = auto_range(
            ResponsePolicy::ProportionalRiseOnly { attack_speed: 1.0 },
            0.0,
            1000.0,
        );
        for _ in 0..100 {
            assert_abs_diff_eq!(tracker.fraction(250.0), 0.25, epsilon = 1e-6);
        }
        assert_eq!(tracker.state().observed_max, 1000.0);

        // A louder reading only raises the ceiling once it is fed in.
        assert_eq!(tracker.fraction(2000.0), 1.0);
        assert_eq!(tracker.state().observed_max, 1000.0);
        tracker.update(2000.0, 0);
        assert_eq!(tracker.state().observed_max, 2000.0);
        assert_abs_diff_eq!(tracker.fraction(500.0), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_ceiling_never_below_noise_floor() {
        let mut tracker = EnvelopeTracker::new(
            ResponsePolicy::ProportionalRiseOnly { attack_speed: 0.5 },
            LevelScale::AutoRange { decay: 0.5 },
        );
        tracker.calibrate(CalibrationResult {
            noise_floor: 100.0,
            initial_ceiling: 300.0,
        });
        for _ in 0..50 {
            tracker.normalize(0.0);
        }
        assert_eq!(tracker.state().observed_max, 100.0);
    }

    #[test]
    fn test_fixed_rise_fall_is_rate_limited() {
        let mut tracker = auto_range(
            ResponsePolicy::FixedRiseFall {
                rise_rate: 0.02,
                fall_rate: Some(0.15),
            },
            0.0,
            1000.0,
        );
        let readings = [1000.0, 1000.0, 0.0, 600.0, 20.0, 1000.0, 0.0, 0.0];
        let mut previous = tracker.level();
        for (cycle, &reading) in readings.iter().enumerate() {
            let level = tracker.update(reading, cycle as u64 * 10);
            assert!(
                (level - previous).abs() <= 0.15 + 1e-6,
                "cycle {} moved from {} to {}",
                cycle,
                previous,
                level
            );
            previous = level;
        }
    }

    #[test]
    fn test_fixed_rise_stops_at_reading() {
        let mut tracker = auto_range(
            ResponsePolicy::FixedRiseFall {
                rise_rate: 0.5,
                fall_rate: Some(0.5),
            },
            0.0,
            1000.0,
        );
        // The ceiling decays to 999 before normalizing.
        assert_abs_diff_eq!(tracker.update(100.0, 0), 100.0 / 999.0, epsilon = 1e-5);
    }

    #[test]
    fn test_no_decay_mode_is_monotonic() {
        let mut tracker = auto_range(
            ResponsePolicy::FixedRiseFall {
                rise_rate: 0.1,
                fall_rate: None,
            },
            0.0,
            1000.0,
        );
        let mut previous = 0.0;
        for (cycle, reading) in [500.0, 900.0, 0.0, 0.0, 300.0, 1000.0].into_iter().enumerate() {
            let level = tracker.update(reading, cycle as u64);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn test_proportional_rise_only_holds_and_resets() {
        let mut tracker = EnvelopeTracker::new(
            ResponsePolicy::ProportionalRiseOnly { attack_speed: 0.08 },
            LevelScale::Decibel {
                db: DbScale::FULL_SCALE_OFFSET,
                min_db: 30.0,
                max_db: 80.0,
            },
        );
        let loud = 32768.0 * 0.1; // -20 dB + 90 = 70 dB -> norm 0.8
        let first = tracker.update(loud, 0);
        assert_abs_diff_eq!(first, 0.8 * 0.08, epsilon = 1e-4);

        let mut previous = first;
        for cycle in 1..100 {
            let reading = if cycle % 3 == 0 { 0.0 } else { loud };
            let level = tracker.update(reading, cycle);
            assert!(level >= previous);
            assert!(level <= 0.8 + 1e-4);
            previous = level;
        }

        tracker.reset(100);
        assert_eq!(tracker.level(), 0.0);
    }

    #[test]
    fn test_silence_sits_at_bottom_of_db_window() {
        let mut tracker = EnvelopeTracker::new(
            ResponsePolicy::ProportionalRiseOnly { attack_speed: 1.0 },
            LevelScale::Decibel {
                db: DbScale::FULL_SCALE_OFFSET,
                min_db: 30.0,
                max_db: 80.0,
            },
        );
        assert_eq!(tracker.normalize(0.0), 0.0);
        assert_eq!(tracker.update(0.0, 0), 0.0);
    }

    #[test]
    fn test_threshold_gated_rise_uses_live_threshold() {
        let mut tracker = EnvelopeTracker::new(
            ResponsePolicy::ThresholdGatedRise {
                attack_speed: 1.0,
                span: 15_000.0,
            },
            LevelScale::AutoRange { decay: 0.999 },
        );
        tracker.set_threshold(1000.0);
        assert_abs_diff_eq!(tracker.update(8500.0, 0), 0.5, epsilon = 1e-4);

        // Raising the threshold above the reading yields no further rise.
        tracker.set_threshold(31_000.0);
        assert_abs_diff_eq!(tracker.update(8500.0, 10), 0.5, epsilon = 1e-4);
        assert_eq!(tracker.normalize(8500.0), 0.0);
    }

    #[test]
    fn test_peak_holds_then_decays_to_smoothed() {
        let mut tracker = auto_range(
            ResponsePolicy::ExponentialPeakHold {
                alpha: 0.5,
                hold_ms: 800,
                peak_decay: 0.9,
            },
            0.0,
            1000.0,
        );
        tracker.update(1000.0, 0);
        let peak = tracker.update(1000.0, 50);
        assert_abs_diff_eq!(peak, 0.75, epsilon = 1e-4);

        // Within the hold window the peak stays put while the signal drops.
        let held = tracker.update(0.0, 800);
        assert_abs_diff_eq!(held, 0.75, epsilon = 1e-4);

        // Past it, the peak decays but never below the smoothed value.
        let decayed = tracker.update(0.0, 900);
        assert_abs_diff_eq!(decayed, 0.675, epsilon = 1e-4);
        assert!(decayed >= tracker.state().smoothed);

        for cycle in 0..200 {
            tracker.update(0.0, 1000 + cycle * 50);
            assert!(tracker.level() >= tracker.state().smoothed);
        }
        assert!(tracker.level() < 0.01);
    }

    #[test]
    fn test_levels_stay_in_unit_range() {
        let mut tracker = auto_range(
            ResponsePolicy::ExponentialPeakHold {
                alpha: 1.0,
                hold_ms: 0,
                peak_decay: 0.995,
            },
            10.0,
            20.0,
        );
        for (cycle, reading) in [f32::NAN, -5.0, 1e9, 0.0, 15.0].into_iter().enumerate() {
            let level = tracker.update(reading, cycle as u64);
            assert!((0.0..=1.0).contains(&level));
        }
    }
}
