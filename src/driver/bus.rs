//! Register bus seam.

use core::convert::Infallible;
use core::fmt::Debug;

use super::datagram::Datagram;
use super::registers::Register;

/// Write-only access to the driver chips' configuration registers.
pub trait RegisterBus {
    /// Bus error type.
    type Error: Debug;

    /// Write `value` to `register` on chip `address`.
    fn write_register(&mut self, address: u8, register: Register, value: u32) -> Result<(), Self::Error>;
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    type Error = T::Error;

    fn write_register(&mut self, address: u8, register: Register, value: u32) -> Result<(), Self::Error> {
        T::write_register(self, address, register, value)
    }
}

/// Register bus over a half-duplex UART shared by all chips.
///
/// Datagrams are written with `write_all` and flushed before returning.
/// The chips do not acknowledge writes.
pub struct UartRegisterBus<W> {
    uart: W,
}

impl<W> UartRegisterBus<W>
where
    W: embedded_io::Write,
{
    /// Wrap a UART.
    pub fn new(uart: W) -> Self {
        Self { uart }
    }

    /// Give back the UART.
    pub fn release(self) -> W {
        self.uart
    }
}

impl<W> RegisterBus for UartRegisterBus<W>
where
    W: embedded_io::Write,
{
    type Error = W::Error;

    fn write_register(&mut self, address: u8, register: Register, value: u32) -> Result<(), Self::Error> {
        let datagram = Datagram::write(address, register, value);
        self.uart.write_all(datagram.as_bytes())?;
        self.uart.flush()
    }
}

/// Bus for boards whose drivers are strapped by pins. Cannot be constructed.
#[derive(Debug)]
pub enum NoRegisterBus {}

impl RegisterBus for NoRegisterBus {
    type Error = Infallible;

    fn write_register(&mut self, _address: u8, _register: Register, _value: u32) -> Result<(), Self::Error> {
        match *self {}
    }
}
