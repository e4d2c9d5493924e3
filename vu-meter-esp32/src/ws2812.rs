// src/ws2812.rs
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_hal::spi::SpiBus;
use smart_leds::{brightness, RGB8};
use vu_meter::LedStrip;

use crate::config::NUM_LEDS;

/// Each WS2812 bit is sent as four SPI bits: `1110` for one, `1000` for zero.
const ONE: u8 = 0b1110;
const ZERO: u8 = 0b1000;
const BYTES_PER_LED: usize = 12;

/// Low time after a frame, long enough for the slower WS2812 revisions.
pub const RESET_BYTES: usize = 120;
pub const BUFFER_SIZE: usize = BYTES_PER_LED * NUM_LEDS + RESET_BYTES;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum StripError {
    OutOfRange,
    Spi,
}

/// WS2812 strip clocked out of the SPI MOSI pin. `set_pixel` only touches
/// the pixel buffer; `flush` encodes and sends the whole strip at once.
pub struct Ws2812Spi<SPI> {
    spi: SPI,
    pixels: [RGB8; NUM_LEDS],
    buffer: &'static mut [u8; BUFFER_SIZE],
    level: u8,
}

impl<SPI: SpiBus<u8>> Ws2812Spi<SPI> {
    pub fn new(spi: SPI, buffer: &'static mut [u8; BUFFER_SIZE], level: u8) -> Self {
        Self {
            spi,
            pixels: [RGB8::default(); NUM_LEDS],
            buffer,
            level,
        }
    }

    fn encode(&mut self) {
        let (data, reset) = self.buffer.split_at_mut(BYTES_PER_LED * NUM_LEDS);
        let pixels = brightness(self.pixels.iter().copied(), self.level);
        for (pixel, chunk) in pixels.zip(data.chunks_exact_mut(BYTES_PER_LED)) {
            // Wire order is green, red, blue.
            for (byte, out) in [pixel.g, pixel.r, pixel.b].into_iter().zip(chunk.chunks_exact_mut(4)) {
                for (pair, slot) in out.iter_mut().enumerate() {
                    let high = byte & (0x80 >> (pair * 2)) != 0;
                    let low = byte & (0x40 >> (pair * 2)) != 0;
                    *slot = (if high { ONE } else { ZERO }) << 4 | if low { ONE } else { ZERO };
                }
            }
        }
        reset.fill(0);
    }
}

impl<SPI: SpiBus<u8>> LedStrip for Ws2812Spi<SPI> {
    type Error = StripError;

    fn set_pixel(&mut self, index: usize, color: Rgb888) -> Result<(), StripError> {
        let pixel = self.pixels.get_mut(index).ok_or(StripError::OutOfRange)?;
        *pixel = RGB8::new(color.r(), color.g(), color.b());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StripError> {
        self.encode();
        self.spi.write(&self.buffer[..]).map_err(|_| StripError::Spi)?;
        self.spi.flush().map_err(|_| StripError::Spi)
    }
}
