//! Serial transport seam.
//!
//! A board has two links to the host, a hardware UART and a USB CDC port.
//! Interrupt handlers own the receive ring and the transmit-complete latch;
//! the control loop only sees them through [`Transport`].

pub(crate) mod session;

pub use session::{LinkPacing, PollOutcome, TransportSession};

/// One serial link to the host.
pub trait Transport {
    /// Number of received bytes waiting.
    fn bytes_available(&self) -> usize;

    /// Take the oldest received byte.
    fn read_byte(&mut self) -> Option<u8>;

    /// Whether the link can accept outgoing bytes now.
    fn write_ready(&self) -> bool;

    /// Queue outgoing bytes, returning how many were accepted.
    fn write_bytes(&mut self, bytes: &[u8]) -> usize;

    /// Whether everything queued so far has left the wire.
    fn write_complete(&self) -> bool;

    /// Whether the alternate link (USB) is up and should be used instead of
    /// the primary UART. Only consulted on the USB transport.
    fn is_alternate_transport_active(&self) -> bool {
        false
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn bytes_available(&self) -> usize {
        T::bytes_available(self)
    }

    fn read_byte(&mut self) -> Option<u8> {
        T::read_byte(self)
    }

    fn write_ready(&self) -> bool {
        T::write_ready(self)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        T::write_bytes(self, bytes)
    }

    fn write_complete(&self) -> bool {
        T::write_complete(self)
    }

    fn is_alternate_transport_active(&self) -> bool {
        T::is_alternate_transport_active(self)
    }
}

/// Which link the session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Link {
    /// Hardware UART.
    #[default]
    Uart,
    /// USB CDC.
    Usb,
}
