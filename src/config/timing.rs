//! Timing constants derived from board configuration.

use super::board::{BoardConfig, LinkTiming};
use super::units::Ticks;

/// Derived tick-domain parameters computed from board configuration.
///
/// These are computed once at initialization and used by the step loop and
/// the transport session, which never see microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConstraints {
    /// Timer ticks per microsecond.
    pub sub_us_divider: u32,

    /// Minimum step pulse high time.
    pub min_pulse_width: Ticks,

    /// Partial-request timeout.
    pub interbyte_timeout: Ticks,

    /// Boot step interval.
    pub default_step_interval: Ticks,

    /// USB post-response quiet time.
    pub usb_intermessage_delay: Ticks,

    /// UART post-response quiet time.
    pub uart_intermessage_delay: Ticks,
}

impl TimingConstraints {
    /// Compute tick constants from board configuration.
    pub fn from_config(config: &BoardConfig) -> Self {
        let div = config.timing.sub_us_divider;
        let link = |l: &LinkTiming| l.intermessage_delay.to_ticks(div);

        Self {
            sub_us_divider: div,
            min_pulse_width: config.timing.min_pulse_width.to_ticks(div),
            interbyte_timeout: config.timing.interbyte_timeout.to_ticks(div),
            default_step_interval: config.timing.default_step_interval,
            usb_intermessage_delay: link(&config.links.usb),
            uart_intermessage_delay: link(&config.links.uart),
        }
    }
}
