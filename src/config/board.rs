//! Board configuration - root configuration structure.

use heapless::String;
use serde::Deserialize;

use super::driver::DriverConfig;
use super::units::{Microseconds, Ticks};

/// Root configuration structure from TOML.
///
/// One `BoardConfig` describes one hardware target: how fast its tick counter
/// runs, how its two serial links are paced and whether a UART-configurable
/// driver chip sits behind each motor output.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// Human-readable board name (max 32 chars).
    #[serde(default = "default_name")]
    pub name: String<32>,

    /// Tick-counter and step timing.
    pub timing: TimingConfig,

    /// Per-link pacing.
    #[serde(default)]
    pub links: LinkConfig,

    /// Wire-protocol options.
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Driver-chip settings. Absent on boards without a driver register path.
    #[serde(default)]
    pub driver: Option<DriverConfig>,
}

fn default_name() -> String<32> {
    String::try_from("custom").unwrap_or_default()
}

/// Tick-counter and step timing.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Timer ticks per microsecond. Reported to the host by opcode 68.
    pub sub_us_divider: u32,

    /// Minimum high time of a step pulse.
    #[serde(rename = "min_pulse_width_us", default = "default_min_pulse_width")]
    pub min_pulse_width: Microseconds,

    /// A partial request is dropped after this long without a byte.
    #[serde(rename = "interbyte_timeout_us", default = "default_interbyte_timeout")]
    pub interbyte_timeout: Microseconds,

    /// Step interval every channel boots with, in ticks.
    #[serde(default = "default_step_interval")]
    pub default_step_interval: Ticks,
}

fn default_min_pulse_width() -> Microseconds {
    Microseconds(3)
}

fn default_interbyte_timeout() -> Microseconds {
    Microseconds(500_000)
}

fn default_step_interval() -> Ticks {
    Ticks(4000)
}

/// Pacing for one serial link.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LinkTiming {
    /// Minimum quiet time after a response before the link counts as flushed.
    #[serde(rename = "intermessage_delay_us", default)]
    pub intermessage_delay: Microseconds,
}

/// Pacing for both serial links.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LinkConfig {
    /// USB CDC link.
    #[serde(default)]
    pub usb: LinkTiming,

    /// Hardware UART link.
    #[serde(default)]
    pub uart: LinkTiming,
}

/// Wire-protocol options.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProtocolConfig {
    /// Zero the payload bytes a response does not set instead of resending
    /// whatever the previous response left there.
    #[serde(default)]
    pub scrub_response_payload: bool,

    /// Queue the boot signal frame (252) once at start-up.
    #[serde(default)]
    pub signal_on_boot: bool,
}

impl BoardConfig {
    /// STM32G0B1 board with four TMC2209 drivers on a shared UART.
    ///
    /// 16 ticks per microsecond; USB responses need a 1.3 ms gap for the
    /// host's polling interval.
    pub fn stm32g0_tmc2209() -> Self {
        Self {
            name: String::try_from("stm32g0-tmc2209").unwrap_or_default(),
            timing: TimingConfig {
                sub_us_divider: 16,
                min_pulse_width: default_min_pulse_width(),
                interbyte_timeout: default_interbyte_timeout(),
                default_step_interval: default_step_interval(),
            },
            links: LinkConfig {
                usb: LinkTiming {
                    intermessage_delay: Microseconds(1300),
                },
                uart: LinkTiming {
                    intermessage_delay: Microseconds(0),
                },
            },
            protocol: ProtocolConfig::default(),
            driver: Some(DriverConfig::default()),
        }
    }

    /// RP2350 board with pin-strapped drivers and a 1 MHz tick.
    pub fn rp2350() -> Self {
        Self {
            name: String::try_from("rp2350").unwrap_or_default(),
            timing: TimingConfig {
                sub_us_divider: 1,
                min_pulse_width: default_min_pulse_width(),
                interbyte_timeout: default_interbyte_timeout(),
                default_step_interval: default_step_interval(),
            },
            links: LinkConfig {
                usb: LinkTiming {
                    intermessage_delay: Microseconds(1024),
                },
                uart: LinkTiming {
                    intermessage_delay: Microseconds(0),
                },
            },
            protocol: ProtocolConfig::default(),
            driver: None,
        }
    }

    /// Whether the board can change microstep resolution at runtime.
    #[inline]
    pub fn has_driver_chip(&self) -> bool {
        self.driver.is_some()
    }
}
