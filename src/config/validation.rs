//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::{BoardConfig, DriverConfig, TimingConstraints};

/// Largest value of a 5-bit current scale.
const MAX_CURRENT: u8 = 31;

/// Largest value of the 4-bit hold delay.
const MAX_HOLD_DELAY: u8 = 15;

/// Validate a board configuration.
///
/// Checks:
/// - The tick divider is non-zero
/// - Pulse width and interbyte timeout are at least one tick
/// - The boot step interval leaves room for a full pulse
/// - Driver currents and delays fit their register fields
pub fn validate_config(config: &BoardConfig) -> Result<()> {
    if config.timing.sub_us_divider == 0 {
        return Err(Error::Config(ConfigError::InvalidDivider(0)));
    }

    let timing = TimingConstraints::from_config(config);

    if timing.min_pulse_width.value() == 0 {
        return Err(Error::Config(ConfigError::InvalidPulseWidth(0)));
    }

    if timing.interbyte_timeout.value() == 0 {
        return Err(Error::Config(ConfigError::InvalidTimeout(0)));
    }

    if timing.default_step_interval < timing.min_pulse_width {
        return Err(Error::Config(ConfigError::StepIntervalTooShort {
            interval: timing.default_step_interval.value(),
            min_pulse_width: timing.min_pulse_width.value(),
        }));
    }

    if let Some(ref driver) = config.driver {
        validate_driver(driver)?;
    }

    Ok(())
}

fn validate_driver(config: &DriverConfig) -> Result<()> {
    if config.run_current > MAX_CURRENT {
        return Err(Error::Config(ConfigError::InvalidCurrent {
            field: "run_current",
            value: config.run_current,
        }));
    }

    if config.hold_current > MAX_CURRENT {
        return Err(Error::Config(ConfigError::InvalidCurrent {
            field: "hold_current",
            value: config.hold_current,
        }));
    }

    if config.hold_delay > MAX_HOLD_DELAY {
        return Err(Error::Config(ConfigError::InvalidHoldDelay(config.hold_delay)));
    }

    Ok(())
}
