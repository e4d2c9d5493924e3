use alloc::vec;

#[cfg(feature = "logging")]
use defmt::{info, trace, warn};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use micro_dsp::{CalibrationResult, EnvelopeTracker};
use micro_viz::{BarGraph, DisplayFrame, Flash, ZoneTracker, BLUE, GREEN, OFF, RED, WHITE, YELLOW};

use crate::calibrator::calibrate;
use crate::config::VuConfig;
use crate::error::VuError;
use crate::peripherals::{write_frame, Clock, LedStrip, Peripherals, SampleSource, Shutdown, ThresholdKnob};
use crate::sampler::Sampler;

/// Colours shown by [`VuMeter::self_test`], in order.
const SELF_TEST_COLORS: [Rgb888; 6] = [GREEN, YELLOW, RED, BLUE, WHITE, OFF];

/// What one pass of the control loop did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// The reset button was pressed at the start of the cycle.
    pub reset: bool,
    /// The reading was at or below the noise floor and nothing else ran.
    pub gated: bool,
    /// Level after the cycle.
    pub level: f32,
    pub flash: Option<Flash>,
}

/// The meter and everything it owns.
///
/// Single-threaded: one cycle reads the inputs, samples, updates the
/// envelope, optionally flashes a zone and then commits a complete frame.
/// The only suspension points are the delays.
pub struct VuMeter<S, L, B, K, C, D> {
    config: VuConfig,
    sampler: Sampler<S>,
    strip: L,
    button: Option<B>,
    knob: Option<K>,
    clock: C,
    delay: D,
    tracker: EnvelopeTracker,
    bar: BarGraph,
    zones: Option<ZoneTracker>,
    frame: DisplayFrame,
}

impl<S, L, B, K, C, D> VuMeter<S, L, B, K, C, D>
where
    S: SampleSource,
    L: LedStrip,
    B: InputPin,
    K: ThresholdKnob,
    C: Clock,
    D: DelayNs,
{
    pub fn new(
        config: VuConfig,
        peripherals: Peripherals<S, L, B, K>,
        clock: C,
        delay: D,
    ) -> Result<Self, VuError> {
        config.validate()?;

        let mut tracker = EnvelopeTracker::new(config.response, config.scale);
        if let Some(mapping) = config.knob {
            tracker.set_threshold(mapping.base);
        }
        let bar = BarGraph::new(config.num_leds).with_overload_red(config.overload_red);
        let zones = config.zones.clone().map(ZoneTracker::new);
        let frame = vec![OFF; config.num_leds];

        Ok(Self {
            sampler: Sampler::new(peripherals.mic),
            strip: peripherals.strip,
            button: peripherals.button,
            knob: peripherals.knob,
            clock,
            delay,
            tracker,
            bar,
            zones,
            frame,
            config,
        })
    }

    pub fn config(&self) -> &VuConfig {
        &self.config
    }

    pub fn tracker(&self) -> &EnvelopeTracker {
        &self.tracker
    }

    pub fn zones(&self) -> Option<&ZoneTracker> {
        self.zones.as_ref()
    }

    pub fn level(&self) -> f32 {
        self.tracker.level()
    }

    pub fn strip(&self) -> &L {
        &self.strip
    }

    /// Runs the configured calibration, or installs an uncalibrated floor
    /// of zero when there is none.
    pub async fn calibrate(&mut self) -> Result<CalibrationResult, VuError> {
        let result = match &self.config.calibration {
            Some(settings) => calibrate(&mut self.sampler, &self.clock, &mut self.delay, settings).await?,
            None => CalibrationResult::UNCALIBRATED,
        };
        self.apply_calibration(result);
        Ok(result)
    }

    pub fn apply_calibration(&mut self, calibration: CalibrationResult) {
        self.tracker.calibrate(calibration);
    }

    /// Steps the whole strip through a fixed colour sequence, ending dark.
    pub async fn self_test(&mut self, step_ms: u32) -> Result<(), VuError> {
        for color in SELF_TEST_COLORS {
            self.show_solid(color)?;
            self.delay.delay_ms(step_ms).await;
        }
        Ok(())
    }

    /// Clears the level, the held peak and the flashed zones.
    pub fn reset(&mut self) {
        self.tracker.reset(self.clock.now_ms());
        if let Some(zones) = self.zones.as_mut() {
            zones.reset();
        }
    }

    /// Turns every LED off and commits.
    pub fn blank(&mut self) -> Result<(), VuError> {
        self.show_solid(OFF)
    }

    /// One pass of the control loop, without the trailing period delay.
    pub async fn cycle(&mut self) -> Result<CycleReport, VuError> {
        let mut report = CycleReport {
            reset: false,
            gated: false,
            level: self.tracker.level(),
            flash: None,
        };

        if self.reset_requested()? {
            #[cfg(feature = "logging")]
            info!("Reset requested");
            self.reset();
            self.blank()?;
            self.delay.delay_ms(self.config.debounce_ms).await;
            report.reset = true;
            report.level = self.tracker.level();
        }

        let reading = self.sampler.measure_loudness(self.config.sample_count)?;

        if let (Some(knob), Some(mapping)) = (self.knob.as_mut(), self.config.knob) {
            let position = knob.read_normalized().map_err(|_| VuError::Knob)?;
            self.tracker.set_threshold(mapping.threshold(position));
        }

        if self.config.noise_gate && self.tracker.is_below_floor(reading) {
            #[cfg(feature = "logging")]
            trace!("Reading {} below noise floor, cycle skipped", reading);
            report.gated = true;
            return Ok(report);
        }

        let level = self.tracker.update(reading, self.clock.now_ms());
        report.level = level;

        let flash = self.zones.as_mut().and_then(|zones| zones.check(level));
        if let Some(flash) = flash {
            self.show_solid(flash.color)?;
            self.delay.delay_ms(flash.duration_ms).await;
            report.flash = Some(flash);
        }

        self.bar.render_into(level, &mut self.frame);
        write_frame(&mut self.strip, &self.frame).map_err(|_| VuError::Strip)?;
        Ok(report)
    }

    /// Self-test (if configured), calibration, then cycles every
    /// `cycle_delay_ms` until `shutdown` is requested.
    ///
    /// The strip is blanked on the way out whether the loop stopped on
    /// request or on a device fault; a fault is still returned.
    pub async fn run<X: Shutdown>(&mut self, shutdown: X) -> Result<(), VuError> {
        let result = self.run_until(&shutdown).await;

        #[cfg(feature = "logging")]
        if let Err(e) = &result {
            warn!("Stopping on {}", e);
        }
        let blanked = self.blank();

        #[cfg(feature = "logging")]
        info!("Meter stopped, strip blanked");
        result.and(blanked)
    }

    async fn run_until<X: Shutdown>(&mut self, shutdown: &X) -> Result<(), VuError> {
        if let Some(step_ms) = self.config.self_test_step_ms {
            self.self_test(step_ms).await?;
        }
        self.calibrate().await?;

        let period = self.config.cycle_delay_ms as u64;
        while !shutdown.requested() {
            let started = self.clock.now_ms();
            self.cycle().await?;
            let elapsed = self.clock.now_ms().saturating_sub(started);
            let remaining = period.saturating_sub(elapsed);
            if remaining > 0 {
                self.delay.delay_ms(remaining as u32).await;
            }
        }
        Ok(())
    }

    fn reset_requested(&mut self) -> Result<bool, VuError> {
        match self.button.as_mut() {
            Some(button) => button.is_low().map_err(|_| VuError::Button),
            None => Ok(false),
        }
    }

    fn show_solid(&mut self, color: Rgb888) -> Result<(), VuError> {
        self.frame.fill(color);
        write_frame(&mut self.strip, &self.frame).map_err(|_| VuError::Strip)
    }
}
