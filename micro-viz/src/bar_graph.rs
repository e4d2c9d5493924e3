use alloc::vec;

use embedded_graphics::pixelcolor::Rgb888;

#[cfg(feature = "logging")]
use defmt::trace;

use crate::color_strategy::*;
use crate::types::*;

/// A single vertical bar of LEDs lit from index 0 upward.
pub struct BarGraph<C: ColorStrategy = LevelGradient> {
    num_leds: usize,
    overload_red: bool,
    colors: C,
}

impl BarGraph<LevelGradient> {
    pub fn new(num_leds: usize) -> Self {
        Self::with_colors(num_leds, LevelGradient)
    }
}

impl<C: ColorStrategy> BarGraph<C> {
    pub fn with_colors(num_leds: usize, colors: C) -> Self {
        Self {
            num_leds,
            overload_red: false,
            colors,
        }
    }

    /// Paint the whole strip red once every LED would be lit.
    pub fn with_overload_red(mut self, overload_red: bool) -> Self {
        self.overload_red = overload_red;
        self
    }

    pub fn num_leds(&self) -> usize {
        self.num_leds
    }

    /// Number of LEDs lit for `level`, rounded half up: `⌊level·N + 0.5⌋`.
    pub fn lit_count(&self, level: f32) -> usize {
        let level = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        };
        ((level * self.num_leds as f32 + 0.5) as usize).min(self.num_leds)
    }

    /// Renders `level` into `frame`, which must hold at least `num_leds`
    /// entries; anything past that is left alone.
    pub fn render_into(&self, level: f32, frame: &mut [Rgb888]) {
        let lit = self.lit_count(level);
        let len = self.num_leds.min(frame.len());
        let frame = &mut frame[..len];

        if self.overload_red && lit >= self.num_leds {
            #[cfg(feature = "logging")]
            trace!("Bar overloaded at level {}", level);
            frame.fill(RED);
            return;
        }

        for (i, pixel) in frame.iter_mut().enumerate() {
            *pixel = if i < lit {
                self.colors.get_color(&ColorContext {
                    element_index: i,
                    num_elements: self.num_leds,
                })
            } else {
                OFF
            };
        }
    }

    pub fn render(&self, level: f32) -> DisplayFrame {
        let mut frame = vec![OFF; self.num_leds];
        self.render_into(level, &mut frame);
        frame
    }
}
