#![no_std]

pub mod adc;
pub mod config;
pub mod ws2812;

use core::sync::atomic::AtomicBool;

use embassy_time::Instant;
use vu_meter::Clock;

/// Set by the BOOT button; the meter blanks the strip and returns.
pub static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Milliseconds since the embassy time driver started.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
