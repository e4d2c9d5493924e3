use alloc::vec::Vec;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

/// One colour per LED, index 0 at the bottom of the bar.
pub type DisplayFrame = Vec<Rgb888>;

pub const OFF: Rgb888 = Rgb888::BLACK;
pub const GREEN: Rgb888 = Rgb888::new(0, 255, 0);
pub const YELLOW: Rgb888 = Rgb888::new(255, 255, 0);
pub const RED: Rgb888 = Rgb888::new(255, 0, 0);
pub const BLUE: Rgb888 = Rgb888::new(0, 0, 255);
pub const WHITE: Rgb888 = Rgb888::new(255, 255, 255);
