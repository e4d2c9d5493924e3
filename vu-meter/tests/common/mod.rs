use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;
use micro_viz::OFF;
use vu_meter::{Clock, LedStrip, SampleSource, Shutdown, ThresholdKnob};

pub const MIC_BIAS: u16 = 32_768;

/// Milliseconds shared between [`FakeClock`] and [`FakeDelay`], so time
/// only moves when the meter sleeps.
#[derive(Clone, Default)]
pub struct FakeClock(pub Rc<Cell<u64>>);

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

#[derive(Clone)]
pub struct FakeDelay {
    pub now: Rc<Cell<u64>>,
    pub delays: Rc<RefCell<Vec<u32>>>,
}

impl FakeDelay {
    pub fn new(clock: &FakeClock) -> Self {
        Self {
            now: clock.0.clone(),
            delays: Rc::default(),
        }
    }

    pub fn recorded(&self) -> Vec<u32> {
        self.delays.borrow().clone()
    }
}

impl DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.now.set(self.now.get() + ns as u64 / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.delays.borrow_mut().push(ms);
        self.now.set(self.now.get() + ms as u64);
    }
}

/// Alternates `bias + amplitude` and `bias - amplitude`, so any even batch
/// has an RMS of exactly `amplitude`.
#[derive(Clone, Default)]
pub struct SquareMic {
    pub amplitude: Rc<Cell<u16>>,
    pub reads: Rc<Cell<usize>>,
    pub fail_after: Option<usize>,
}

impl SquareMic {
    pub fn new(amplitude: u16) -> Self {
        let mic = Self::default();
        mic.amplitude.set(amplitude);
        mic
    }

    pub fn failing_after(mut self, reads: usize) -> Self {
        self.fail_after = Some(reads);
        self
    }
}

#[derive(Debug, PartialEq)]
pub struct AdcFault;

impl SampleSource for SquareMic {
    type Error = AdcFault;

    fn read_sample(&mut self) -> Result<u16, AdcFault> {
        let count = self.reads.get();
        if self.fail_after.is_some_and(|limit| count >= limit) {
            return Err(AdcFault);
        }
        self.reads.set(count + 1);
        let amplitude = self.amplitude.get();
        Ok(if count % 2 == 0 {
            MIC_BIAS + amplitude
        } else {
            MIC_BIAS - amplitude
        })
    }
}

/// Keeps every committed frame; pixels set without a flush are invisible.
#[derive(Clone, Default)]
pub struct RecordingStrip {
    pending: Rc<RefCell<Vec<Rgb888>>>,
    pub frames: Rc<RefCell<Vec<Vec<Rgb888>>>>,
    pub fail: Rc<Cell<bool>>,
}

#[derive(Debug, PartialEq)]
pub struct StripFault;

impl RecordingStrip {
    pub fn frames(&self) -> Vec<Vec<Rgb888>> {
        self.frames.borrow().clone()
    }

    pub fn last_frame(&self) -> Option<Vec<Rgb888>> {
        self.frames.borrow().last().cloned()
    }
}

impl LedStrip for RecordingStrip {
    type Error = StripFault;

    fn set_pixel(&mut self, index: usize, color: Rgb888) -> Result<(), StripFault> {
        if self.fail.get() {
            return Err(StripFault);
        }
        let mut pending = self.pending.borrow_mut();
        if pending.len() <= index {
            pending.resize(index + 1, OFF);
        }
        pending[index] = color;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StripFault> {
        if self.fail.get() {
            return Err(StripFault);
        }
        let frame = self.pending.borrow().clone();
        self.frames.borrow_mut().push(frame);
        Ok(())
    }
}

/// Active low, like the real wiring: pressed reads low.
#[derive(Clone, Default)]
pub struct ScriptedButton(pub Rc<Cell<bool>>);

impl ErrorType for ScriptedButton {
    type Error = Infallible;
}

impl InputPin for ScriptedButton {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }
}

#[derive(Clone, Default)]
pub struct FakeKnob(pub Rc<Cell<f32>>);

impl ThresholdKnob for FakeKnob {
    type Error = Infallible;

    fn read_normalized(&mut self) -> Result<f32, Infallible> {
        Ok(self.0.get())
    }
}

/// Lets the loop run `cycles` times, then asks it to stop.
pub struct StopAfter {
    cycles: usize,
    checks: Cell<usize>,
}

impl StopAfter {
    pub fn new(cycles: usize) -> Self {
        Self {
            cycles,
            checks: Cell::new(0),
        }
    }
}

impl Shutdown for StopAfter {
    fn requested(&self) -> bool {
        let checks = self.checks.get();
        self.checks.set(checks + 1);
        checks >= self.cycles
    }
}

pub fn all(frame: &[Rgb888], color: Rgb888) -> bool {
    frame.iter().all(|&pixel| pixel == color)
}
