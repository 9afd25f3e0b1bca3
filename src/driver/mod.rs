//! Stepper-driver chip register protocol.
//!
//! CRC-8 framed write datagrams over a single-wire UART, a typed register
//! map, and the per-chip shadow that serves read-back.

mod bus;
mod chip;
pub mod crc;
pub mod datagram;
pub mod registers;

pub use bus::{NoRegisterBus, RegisterBus, UartRegisterBus};
pub use chip::DriverChip;
pub use datagram::Datagram;
pub use registers::{ChopConf, DriverShadow, GConf, GStat, IholdIrun, PwmConf, Register};
