use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_hal::digital::{ErrorType, InputPin};

/// Raw microphone readings, scaled to the full `u16` range.
pub trait SampleSource {
    type Error;
    fn read_sample(&mut self) -> Result<u16, Self::Error>;
}

/// An addressable strip with a pixel buffer. Nothing is visible until
/// [`flush`](LedStrip::flush) commits the whole buffer.
pub trait LedStrip {
    type Error;
    fn set_pixel(&mut self, index: usize, color: Rgb888) -> Result<(), Self::Error>;
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// A potentiometer read as a position in `0.0..=1.0`.
pub trait ThresholdKnob {
    type Error;
    fn read_normalized(&mut self) -> Result<f32, Self::Error>;
}

/// Monotonic milliseconds since some fixed point.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Checked once per cycle; the loop stops and blanks the strip once set.
pub trait Shutdown {
    fn requested(&self) -> bool;
}

impl Shutdown for AtomicBool {
    fn requested(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: Shutdown + ?Sized> Shutdown for &T {
    fn requested(&self) -> bool {
        (**self).requested()
    }
}

/// Stands in for an optional input that is not connected: a button that is
/// never pressed and a knob resting at zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unwired;

impl ErrorType for Unwired {
    type Error = Infallible;
}

impl InputPin for Unwired {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

impl ThresholdKnob for Unwired {
    type Error = Infallible;

    fn read_normalized(&mut self) -> Result<f32, Self::Error> {
        Ok(0.0)
    }
}

/// The hardware a [`VuMeter`](crate::VuMeter) drives.
///
/// The reset button is active low (pressed pulls the pin to ground).
pub struct Peripherals<S, L, B = Unwired, K = Unwired> {
    pub mic: S,
    pub strip: L,
    pub button: Option<B>,
    pub knob: Option<K>,
}

impl<S, L> Peripherals<S, L, Unwired, Unwired> {
    pub fn new(mic: S, strip: L) -> Self {
        Self {
            mic,
            strip,
            button: None,
            knob: None,
        }
    }
}

impl<S, L, B, K> Peripherals<S, L, B, K> {
    pub fn with_button<B2: InputPin>(self, button: B2) -> Peripherals<S, L, B2, K> {
        Peripherals {
            mic: self.mic,
            strip: self.strip,
            button: Some(button),
            knob: self.knob,
        }
    }

    pub fn with_knob<K2: ThresholdKnob>(self, knob: K2) -> Peripherals<S, L, B, K2> {
        Peripherals {
            mic: self.mic,
            strip: self.strip,
            button: self.button,
            knob: Some(knob),
        }
    }
}

pub(crate) fn write_frame<L: LedStrip>(strip: &mut L, frame: &[Rgb888]) -> Result<(), L::Error> {
    for (index, &color) in frame.iter().enumerate() {
        strip.set_pixel(index, color)?;
    }
    strip.flush()
}
