#![no_std]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod bar_graph;
pub mod color_strategy;
pub mod types;
pub mod zones;

pub use bar_graph::BarGraph;
pub use color_strategy::{color_for_fraction, ColorContext, ColorStrategy, LevelGradient};
pub use types::*;
pub use zones::{Flash, Zone, ZoneBoundaries, ZoneError, ZoneTracker, MAX_ZONES};
