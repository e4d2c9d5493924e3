use micro_viz::ZoneError;

/// Faults that stop the meter. Device errors carry no detail: the meter
/// cannot do anything useful without its sensor or its strip, so the only
/// reaction is to stop and report which one failed.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum VuError {
    #[error("microphone ADC read failed")]
    Adc,
    #[error("LED strip write failed")]
    Strip,
    #[error("reset button read failed")]
    Button,
    #[error("threshold knob read failed")]
    Knob,
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum ConfigError {
    #[error("the strip needs at least one LED")]
    NoLeds,
    #[error("sample count {count} is outside 1..={max}")]
    SampleCount { count: usize, max: usize },
    #[error("{field} = {value} is outside 0.0 < x <= 1.0")]
    NotAFraction { field: &'static str, value: f32 },
    #[error("{field} = {value} must be positive")]
    NotPositive { field: &'static str, value: f32 },
    #[error("decibel window {min_db}..{max_db} is empty")]
    EmptyDbWindow { min_db: f32, max_db: f32 },
    #[error(transparent)]
    Zones(#[from] ZoneError),
}
