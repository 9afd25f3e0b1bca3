//! Configuration module for peristaltic-stepper.
//!
//! Provides board descriptions (tick rate, link pacing, driver-chip settings)
//! loaded from TOML files (with `std` feature) or built from presets.

mod board;
mod driver;
#[cfg(feature = "std")]
mod loader;
mod timing;
pub mod units;
mod validation;

pub use board::{BoardConfig, LinkConfig, LinkTiming, ProtocolConfig, TimingConfig};
pub use driver::{DriverConfig, Freewheel};
pub use timing::TimingConstraints;
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Microseconds, MicrostepExponent, Ticks};
