//! Builder pattern for MotorChannel.

use embedded_hal::digital::OutputPin;

use crate::config::units::Ticks;
use crate::config::{BoardConfig, TimingConstraints};
use crate::error::{ConfigError, Error, Result};

use super::channel::MotorChannel;
use super::ChannelId;

/// Default ticks between rising edges.
const DEFAULT_STEP_INTERVAL: Ticks = Ticks(4000);

/// Builder for creating MotorChannel instances.
pub struct MotorChannelBuilder<STEP, DIR, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
{
    id: ChannelId,
    step_pin: Option<STEP>,
    dir_pin: Option<DIR>,
    enable_pin: Option<EN>,
    step_interval: Ticks,
}

impl<STEP, DIR, EN> MotorChannelBuilder<STEP, DIR, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
{
    /// Create a new builder for channel `id`.
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            step_pin: None,
            dir_pin: None,
            enable_pin: None,
            step_interval: DEFAULT_STEP_INTERVAL,
        }
    }

    /// Set the STEP pin.
    pub fn step_pin(mut self, pin: STEP) -> Self {
        self.step_pin = Some(pin);
        self
    }

    /// Set the DIR pin.
    pub fn dir_pin(mut self, pin: DIR) -> Self {
        self.dir_pin = Some(pin);
        self
    }

    /// Set the active-low ENABLE pin.
    pub fn enable_pin(mut self, pin: EN) -> Self {
        self.enable_pin = Some(pin);
        self
    }

    /// Set the boot step interval in ticks.
    pub fn step_interval(mut self, interval: Ticks) -> Self {
        self.step_interval = interval;
        self
    }

    /// Take the boot step interval from a board configuration.
    pub fn from_config(self, config: &BoardConfig) -> Self {
        let timing = TimingConstraints::from_config(config);
        self.step_interval(timing.default_step_interval)
    }

    /// Build the MotorChannel.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin is missing.
    pub fn build(self) -> Result<MotorChannel<STEP, DIR, EN>> {
        let step_pin = self
            .step_pin
            .ok_or(Error::Config(ConfigError::MissingField("step_pin")))?;
        let dir_pin = self
            .dir_pin
            .ok_or(Error::Config(ConfigError::MissingField("dir_pin")))?;
        let enable_pin = self
            .enable_pin
            .ok_or(Error::Config(ConfigError::MissingField("enable_pin")))?;

        Ok(MotorChannel::new(self.id, step_pin, dir_pin, enable_pin, self.step_interval))
    }
}
