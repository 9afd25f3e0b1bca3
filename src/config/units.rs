//! Unit types for timing and microstepping.
//!
//! Provides type-safe representations of timer ticks, microseconds and
//! microstep exponents so that a microsecond constant is never compared
//! against a raw tick count.

use core::ops::{Add, Sub};

use serde::Deserialize;

use crate::error::ConfigError;

/// Microseconds in one minute.
const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// A point in time or a duration measured in hardware timer ticks.
///
/// The tick counter is a free-running 32-bit counter, so all arithmetic is
/// wrapping. Elapsed time is always computed as `now - earlier`, which stays
/// correct across a single counter overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Ticks(pub u32);

impl Ticks {
    /// Create a new Ticks value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Ticks elapsed since `earlier`, modulo 2^32.
    #[inline]
    pub const fn since(self, earlier: Ticks) -> Ticks {
        Ticks(self.0.wrapping_sub(earlier.0))
    }
}

impl Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Ticks {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

/// Duration in microseconds.
///
/// Used in configuration, converted to [`Ticks`] once with the board's
/// sub-microsecond divider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Microseconds(pub u32);

impl Microseconds {
    /// Create a new Microseconds value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Convert to ticks for a timer running `sub_us_divider` ticks per microsecond.
    ///
    /// Saturates at `u32::MAX` ticks.
    #[inline]
    pub const fn to_ticks(self, sub_us_divider: u32) -> Ticks {
        Ticks(self.0.saturating_mul(sub_us_divider))
    }
}

/// Microstep resolution as a power-of-two exponent.
///
/// Resolution is `1 / 2^e` of a full step; `e` ranges from 0 (full step) to
/// 8 (1/256 step). Validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MicrostepExponent(u8);

impl MicrostepExponent {
    /// Full step (no microstepping).
    pub const FULL: Self = Self(0);
    /// 1/16 step.
    pub const SIXTEENTH: Self = Self(4);
    /// 1/256 step (maximum resolution).
    pub const MAX: Self = Self(8);

    /// Create a new exponent with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMicrostepExponent` if `value > 8`.
    pub fn new(value: u8) -> Result<Self, ConfigError> {
        if value <= Self::MAX.0 {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidMicrostepExponent(value))
        }
    }

    /// Get the raw exponent.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Microsteps per full step (`2^e`).
    #[inline]
    pub const fn microsteps(self) -> u16 {
        1 << self.0
    }
}

impl TryFrom<u8> for MicrostepExponent {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for MicrostepExponent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = u8::deserialize(deserializer)?;
        MicrostepExponent::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}

/// Step interval (ticks between rising edges) giving `rpm` revolutions per
/// minute for a motor with `steps_per_revolution` steps (microsteps and
/// gearing included).
///
/// Returns `None` if the speed is not positive or the interval does not fit
/// a 32-bit tick count.
pub fn rpm_to_step_interval(rpm: f32, steps_per_revolution: f32, sub_us_divider: u32) -> Option<Ticks> {
    if rpm.is_nan() || rpm <= 0.0 || steps_per_revolution.is_nan() || steps_per_revolution <= 0.0 {
        return None;
    }
    let ticks_per_minute = MICROS_PER_MINUTE * sub_us_divider as f64;
    let interval = libm::round(ticks_per_minute / (rpm as f64 * steps_per_revolution as f64));
    if interval < 1.0 || interval > u32::MAX as f64 {
        return None;
    }
    Some(Ticks(interval as u32))
}

/// Inverse of [`rpm_to_step_interval`].
pub fn step_interval_to_rpm(interval: Ticks, steps_per_revolution: f32, sub_us_divider: u32) -> f32 {
    if interval.0 == 0 || steps_per_revolution.is_nan() || steps_per_revolution <= 0.0 {
        return 0.0;
    }
    let ticks_per_minute = MICROS_PER_MINUTE * sub_us_divider as f64;
    (ticks_per_minute / (interval.0 as f64 * steps_per_revolution as f64)) as f32
}
