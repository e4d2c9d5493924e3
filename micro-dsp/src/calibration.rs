/// Noise floor and seed ceiling measured once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub struct CalibrationResult {
    pub noise_floor: f32,
    pub initial_ceiling: f32,
}

impl CalibrationResult {
    /// A result for setups that skip calibration entirely.
    pub const UNCALIBRATED: CalibrationResult = CalibrationResult {
        noise_floor: 0.0,
        initial_ceiling: 0.0,
    };
}

/// Running mean of RMS readings taken while the room is assumed quiet.
#[derive(Debug, Default, Clone)]
pub struct NoiseFloorEstimator {
    sum: f32,
    count: u32,
}

impl NoiseFloorEstimator {
    pub const fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    pub fn push(&mut self, reading: f32) {
        self.sum += reading.max(0.0);
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Mean of every reading pushed so far, `0.0` if there were none.
    pub fn mean(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f32
        }
    }

    /// Scales the mean by `noise_margin` to get the floor, then seeds the
    /// ceiling at `floor * ceiling_multiplier`.
    pub fn finish(&self, noise_margin: f32, ceiling_multiplier: f32) -> CalibrationResult {
        let noise_floor = self.mean() * noise_margin;
        CalibrationResult {
            noise_floor,
            initial_ceiling: noise_floor * ceiling_multiplier,
        }
    }
}
