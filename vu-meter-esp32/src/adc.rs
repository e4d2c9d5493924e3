// src/adc.rs
use core::cell::RefCell;

use esp_hal::{
    analog::adc::{Adc, AdcCalScheme, AdcChannel, AdcPin},
    peripherals::ADC1,
    Blocking,
};
use vu_meter::{SampleSource, ThresholdKnob};

use crate::config::{ADC_BITS, ADC_MAX};

/// ADC1 is shared by the microphone and the knob; the meter only ever
/// reads one of them at a time.
pub type SharedAdc = RefCell<Adc<'static, ADC1, Blocking>>;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub struct AdcError;

fn read_raw<PIN, CS>(adc: &SharedAdc, pin: &mut AdcPin<PIN, ADC1, CS>) -> Result<u16, AdcError>
where
    PIN: AdcChannel,
    CS: AdcCalScheme<ADC1>,
{
    let mut adc = adc.try_borrow_mut().map_err(|_| AdcError)?;
    loop {
        match adc.read_oneshot(pin) {
            Ok(value) => return Ok(value),
            Err(nb::Error::WouldBlock) => continue,
            Err(nb::Error::Other(_)) => return Err(AdcError),
        }
    }
}

/// Electret microphone on a 12-bit channel, rescaled to the full `u16`
/// range so the bias sits near 32768.
pub struct AdcMic<PIN> {
    adc: &'static SharedAdc,
    pin: AdcPin<PIN, ADC1>,
}

impl<PIN: AdcChannel> AdcMic<PIN> {
    pub fn new(adc: &'static SharedAdc, pin: AdcPin<PIN, ADC1>) -> Self {
        Self { adc, pin }
    }
}

impl<PIN: AdcChannel> SampleSource for AdcMic<PIN> {
    type Error = AdcError;

    fn read_sample(&mut self) -> Result<u16, AdcError> {
        let raw = read_raw(self.adc, &mut self.pin)?;
        Ok(raw.min(ADC_MAX) << (16 - ADC_BITS))
    }
}

/// Potentiometer wiper between 3.3 V and ground.
pub struct AdcKnob<PIN> {
    adc: &'static SharedAdc,
    pin: AdcPin<PIN, ADC1>,
}

impl<PIN: AdcChannel> AdcKnob<PIN> {
    pub fn new(adc: &'static SharedAdc, pin: AdcPin<PIN, ADC1>) -> Self {
        Self { adc, pin }
    }
}

impl<PIN: AdcChannel> ThresholdKnob for AdcKnob<PIN> {
    type Error = AdcError;

    fn read_normalized(&mut self) -> Result<f32, AdcError> {
        let raw = read_raw(self.adc, &mut self.pin)?;
        Ok(raw.min(ADC_MAX) as f32 / ADC_MAX as f32)
    }
}
