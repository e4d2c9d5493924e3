use embedded_graphics::pixelcolor::Rgb888;

pub struct ColorContext {
    pub element_index: usize,
    pub num_elements: usize,
}

impl ColorContext {
    /// Position of this element along the strip, `0.0` at the first LED and
    /// `1.0` at the last.
    pub fn position(&self) -> f32 {
        if self.num_elements <= 1 {
            return 0.0;
        }
        self.element_index as f32 / (self.num_elements - 1) as f32
    }
}

pub trait ColorStrategy {
    fn get_color(&self, context: &ColorContext) -> Rgb888;
}

/// Green at 0.0, yellow at 0.5, red at 1.0, linear in between.
///
/// Inputs outside `0.0..=1.0` are clamped, NaN is treated as 0.0.
pub fn color_for_fraction(fraction: f32) -> Rgb888 {
    let f = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    if f <= 0.5 {
        let t = f / 0.5;
        Rgb888::new((255.0 * t) as u8, 255, 0)
    } else {
        let t = (f - 0.5) / 0.5;
        Rgb888::new(255, (255.0 * (1.0 - t)) as u8, 0)
    }
}

/// Colours each LED by where it sits on the strip, so the bottom of the bar
/// is always greener than the top whatever the current level.
pub struct LevelGradient;
impl ColorStrategy for LevelGradient {
    fn get_color(&self, context: &ColorContext) -> Rgb888 {
        color_for_fraction(context.position())
    }
}
