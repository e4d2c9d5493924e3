use embedded_graphics::pixelcolor::Rgb888;
use heapless::Vec;

#[cfg(feature = "logging")]
use defmt::info;

use crate::types::*;

pub const MAX_ZONES: usize = 8;

/// A level threshold that flashes the whole strip when crossed upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub threshold: f32,
    pub color: Rgb888,
    pub flash_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "logging", derive(defmt::Format))]
pub enum ZoneError {
    #[error("zone thresholds must be strictly increasing (zone {index})")]
    NotIncreasing { index: usize },
    #[error("zone threshold must lie within 0.0..=1.0 (zone {index})")]
    OutOfRange { index: usize },
    #[error("too many zones, at most 8 are supported")]
    TooMany,
}

/// Zones ordered by strictly increasing threshold. Zone `i` in this list is
/// reported as zone index `i + 1`; index 0 means "below every zone".
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneBoundaries {
    zones: Vec<Zone, MAX_ZONES>,
}

impl ZoneBoundaries {
    pub fn new(zones: &[Zone]) -> Result<Self, ZoneError> {
        let mut checked: Vec<Zone, MAX_ZONES> = Vec::new();
        for (index, zone) in zones.iter().enumerate() {
            if !(0.0..=1.0).contains(&zone.threshold) {
                return Err(ZoneError::OutOfRange { index });
            }
            if let Some(previous) = checked.last() {
                if zone.threshold <= previous.threshold {
                    return Err(ZoneError::NotIncreasing { index });
                }
            }
            checked.push(*zone).map_err(|_| ZoneError::TooMany)?;
        }
        Ok(Self { zones: checked })
    }

    /// Green at 33%, yellow at 66%, a longer red flash at 95%.
    pub fn traffic_light() -> Self {
        let mut zones = Vec::new();
        for zone in [
            Zone {
                threshold: 0.33,
                color: GREEN,
                flash_ms: 200,
            },
            Zone {
                threshold: 0.66,
                color: YELLOW,
                flash_ms: 200,
            },
            Zone {
                threshold: 0.95,
                color: RED,
                flash_ms: 300,
            },
        ] {
            // Three zones always fit.
            let _ = zones.push(zone);
        }
        Self { zones }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// A full-strip flash to show before the next bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flash {
    pub zone_index: usize,
    pub color: Rgb888,
    pub duration_ms: u32,
}

/// Remembers the highest zone already flashed during the current climb.
///
/// Each zone fires at most once until [`reset`](Self::reset); when one cycle
/// jumps past several zones only the highest one fires.
#[derive(Debug, Clone)]
pub struct ZoneTracker {
    boundaries: ZoneBoundaries,
    last_zone: usize,
}

impl ZoneTracker {
    pub fn new(boundaries: ZoneBoundaries) -> Self {
        Self {
            boundaries,
            last_zone: 0,
        }
    }

    pub fn last_zone(&self) -> usize {
        self.last_zone
    }

    pub fn reset(&mut self) {
        self.last_zone = 0;
    }

    /// Checks `level` against the zones from the top down and returns the
    /// flash for the highest newly reached zone, if any.
    pub fn check(&mut self, level: f32) -> Option<Flash> {
        let (position, zone) = self
            .boundaries
            .zones()
            .iter()
            .enumerate()
            .rev()
            .find(|(_, zone)| level >= zone.threshold)?;

        let zone_index = position + 1;
        if zone_index <= self.last_zone {
            return None;
        }
        self.last_zone = zone_index;

        #[cfg(feature = "logging")]
        info!("Zone {} reached at level {}", zone_index, level);
        #[cfg(feature = "std")]
        std::println!("Zone {} reached at level {:.3}", zone_index, level);

        Some(Flash {
            zone_index,
            color: zone.color,
            duration_ms: zone.flash_ms,
        })
    }
}
