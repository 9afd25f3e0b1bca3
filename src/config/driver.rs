//! Driver-chip configuration.

use serde::Deserialize;

use super::units::MicrostepExponent;

/// Coil behaviour at standstill with zero hold current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Freewheel {
    /// Normal operation.
    Normal,
    /// Coils open, motor spins freely.
    Freewheel,
    /// Coils shorted through the low-side drivers (passive braking).
    #[default]
    ShortLowSide,
    /// Coils shorted through the high-side drivers.
    ShortHighSide,
}

impl Freewheel {
    /// Two-bit `freewheel` field value in PWMCONF.
    pub const fn bits(self) -> u32 {
        match self {
            Freewheel::Normal => 0,
            Freewheel::Freewheel => 1,
            Freewheel::ShortLowSide => 2,
            Freewheel::ShortHighSide => 3,
        }
    }
}

/// Settings written to every driver chip at boot.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    /// Run current scale (0-31).
    #[serde(default = "default_run_current")]
    pub run_current: u8,

    /// Hold current scale (0-31).
    #[serde(default)]
    pub hold_current: u8,

    /// Run-to-hold current ramp delay (0-15).
    #[serde(default = "default_hold_delay")]
    pub hold_delay: u8,

    /// Standstill time before power-down (0-255, ~21 ms units).
    #[serde(default = "default_power_down_delay")]
    pub power_down_delay: u8,

    /// Standstill coil mode.
    #[serde(default)]
    pub freewheel: Freewheel,

    /// Use SpreadCycle instead of StealthChop.
    #[serde(default)]
    pub spread_cycle: bool,

    /// Resolution every channel boots with.
    #[serde(default)]
    pub initial_microstep_exponent: MicrostepExponent,
}

fn default_run_current() -> u8 {
    31
}

fn default_hold_delay() -> u8 {
    1
}

fn default_power_down_delay() -> u8 {
    255
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            run_current: default_run_current(),
            hold_current: 0,
            hold_delay: default_hold_delay(),
            power_down_delay: default_power_down_delay(),
            freewheel: Freewheel::default(),
            spread_cycle: false,
            initial_microstep_exponent: MicrostepExponent::FULL,
        }
    }
}
