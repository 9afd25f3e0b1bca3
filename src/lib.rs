//! # peristaltic-stepper
//!
//! Control core for a four-channel peristaltic pump stepper driver board.
//!
//! ## Features
//!
//! - **Framed host protocol**: fixed 6-byte frames with an XOR checksum and a
//!   69-entry opcode table
//! - **Non-blocking step generation**: each channel is a tick-driven state
//!   machine over embedded-hal 1.0 `OutputPin`s
//! - **Driver chips**: TMC2209 register writes over a single-wire UART with
//!   CRC-8 framing
//! - **Dual host link**: UART by default, USB CDC whenever it is connected
//! - **Configuration-driven**: board timing and driver defaults from TOML
//! - **no_std compatible**: the core builds without the standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use peristaltic_stepper::{BoardConfig, ChannelId, MotorChannelBuilder, PumpController, Scheduler, Ticks, UartRegisterBus};
//!
//! let config = BoardConfig::stm32g0_tmc2209();
//!
//! let m0 = MotorChannelBuilder::new(ChannelId::M0)
//!     .step_pin(step0)
//!     .dir_pin(dir0)
//!     .enable_pin(en0)
//!     .from_config(&config)
//!     .build()?;
//! // ... m1, m2, m3 likewise
//!
//! let controller = PumpController::new(&config, [m0, m1, m2, m3], Some(UartRegisterBus::new(driver_uart)))?;
//! let mut scheduler = Scheduler::new(&config, controller, host_uart, usb_cdc);
//! scheduler.boot()?;
//! scheduler.run(|| Ticks(timer.counter()))?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[macro_use]
mod logging;

// Core modules
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod motor;
pub mod protocol;
pub mod scheduler;
pub mod transport;

// Re-exports for ergonomic API
pub use config::{validate_config, BoardConfig, DriverConfig, TimingConstraints};
pub use controller::PumpController;
pub use driver::{DriverChip, NoRegisterBus, RegisterBus, UartRegisterBus};
pub use error::{Error, Result};
pub use motor::{ChannelId, ChannelPhase, MotorChannel, MotorChannelBuilder, TickEvent};
pub use protocol::{Command, Frame, Response, Signal};
pub use scheduler::Scheduler;
pub use transport::{Link, PollOutcome, Transport, TransportSession};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Microseconds, MicrostepExponent, Ticks};
