/// Keeps `log10` away from zero for silent input.
const DB_EPSILON: f32 = 1e-9;

/// Population RMS deviation of a batch of raw ADC readings from its own mean.
///
/// The mean is subtracted first so a microphone's DC bias does not count as
/// loudness. The variance is formed in exact integer arithmetic as
/// `(n·Σx² − (Σx)²) / n²`, so the result is exactly `0.0` for an empty batch
/// or one where every reading is identical, whatever its length.
pub fn rms(samples: &[u16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as u128;
    let (sum, sum_of_squares) = samples.iter().fold((0u128, 0u128), |(sum, squares), &s| {
        let s = s as u128;
        (sum + s, squares + s * s)
    });

    // Never negative: Σx² · n ≥ (Σx)².
    let spread = n * sum_of_squares - sum * sum;
    if spread == 0 {
        return 0.0;
    }
    let n = n as f64;
    libm::sqrt(spread as f64 / (n * n)) as f32
}

/// Reference and offset for turning an RMS magnitude into a decibel-like value.
///
/// Neither scale is calibrated against sound pressure; the results are
/// relative loudness units that only make sense against a tuned
/// `min_db..max_db` display window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub struct DbScale {
    pub reference: f32,
    pub offset: f32,
}

impl DbScale {
    /// `20·log10(rms)`, useful for comparing readings against each other.
    pub const RELATIVE: DbScale = DbScale {
        reference: 1.0,
        offset: 0.0,
    };

    /// Readings relative to half of the 16-bit range, shifted by +90 so
    /// ordinary room noise lands somewhere in 30..80.
    pub const FULL_SCALE_OFFSET: DbScale = DbScale {
        reference: 32768.0,
        offset: 90.0,
    };

    pub fn convert(&self, rms: f32) -> f32 {
        db_from_rms(rms, self.reference, self.offset)
    }
}

/// `20·log10(rms / reference + ε) + offset`.
pub fn db_from_rms(rms: f32, reference: f32, offset: f32) -> f32 {
    let ratio = if reference > 0.0 {
        rms.max(0.0) / reference
    } else {
        0.0
    };
    20.0 * libm::log10f(ratio + DB_EPSILON) + offset
}
