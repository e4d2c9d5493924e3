#[cfg(feature = "logging")]
use defmt::info;
use embedded_hal_async::delay::DelayNs;
use micro_dsp::{CalibrationResult, NoiseFloorEstimator};

use crate::config::CalibrationSettings;
use crate::error::VuError;
use crate::peripherals::{Clock, SampleSource};
use crate::sampler::Sampler;

/// Averages loudness readings over a quiet window to find the noise floor.
///
/// The room has to be silent while this runs; nothing here can tell a
/// quiet room from a loud one. At least one reading is always taken, even
/// for a zero-length window.
pub async fn calibrate<S, C, D>(
    sampler: &mut Sampler<S>,
    clock: &C,
    delay: &mut D,
    settings: &CalibrationSettings,
) -> Result<CalibrationResult, VuError>
where
    S: SampleSource,
    C: Clock,
    D: DelayNs,
{
    #[cfg(feature = "logging")]
    info!(
        "Calibrating noise floor for {} ms, stay quiet",
        settings.duration_ms
    );

    let started = clock.now_ms();
    let window = settings.duration_ms as u64;
    let mut estimator = NoiseFloorEstimator::new();

    loop {
        estimator.push(sampler.measure_loudness(settings.batch_size)?);
        if clock.now_ms().saturating_sub(started) >= window {
            break;
        }
        delay.delay_ms(settings.interval_ms).await;
        if clock.now_ms().saturating_sub(started) >= window {
            break;
        }
    }

    let result = estimator.finish(settings.noise_margin, settings.ceiling_multiplier);

    #[cfg(feature = "logging")]
    info!(
        "Calibration done from {} readings: noise floor {}, ceiling {}",
        estimator.count(),
        result.noise_floor,
        result.initial_ceiling
    );

    Ok(result)
}
