//! Register write datagram.
//!
//! ```text
//! [0x05, address, register | 0x80, value (big-endian, 4 bytes), crc8]
//! ```

use super::crc::crc8;
use super::registers::Register;

/// Sync nibble plus reserved bits that open every datagram.
pub const SYNC: u8 = 0x05;

/// Set on the register byte of a write access.
pub const WRITE_BIT: u8 = 0x80;

/// Length of a write datagram.
pub const DATAGRAM_LEN: usize = 8;

/// One encoded register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Datagram([u8; DATAGRAM_LEN]);

impl Datagram {
    /// Encode a write of `value` to `register` on chip `address`.
    pub fn write(address: u8, register: Register, value: u32) -> Self {
        let mut bytes = [0u8; DATAGRAM_LEN];
        bytes[0] = SYNC;
        bytes[1] = address;
        bytes[2] = register.address() | WRITE_BIT;
        bytes[3..7].copy_from_slice(&value.to_be_bytes());
        bytes[7] = crc8(&bytes[..7]);
        Self(bytes)
    }

    /// Wrap raw bytes without checking them.
    #[inline]
    pub const fn from_bytes(bytes: [u8; DATAGRAM_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; DATAGRAM_LEN] {
        &self.0
    }

    /// Chip address.
    #[inline]
    pub const fn address(&self) -> u8 {
        self.0[1]
    }

    /// Register address with the write bit stripped.
    #[inline]
    pub const fn register_address(&self) -> u8 {
        self.0[2] & !WRITE_BIT
    }

    /// Register, if the address is known.
    pub fn register(&self) -> Option<Register> {
        Register::from_address(self.register_address())
    }

    /// Written value.
    #[inline]
    pub fn value(&self) -> u32 {
        u32::from_be_bytes([self.0[3], self.0[4], self.0[5], self.0[6]])
    }

    /// Carried CRC byte.
    #[inline]
    pub const fn crc(&self) -> u8 {
        self.0[7]
    }

    /// Sync byte, write bit and CRC all check out.
    pub fn is_valid(&self) -> bool {
        self.0[0] == SYNC && self.0[2] & WRITE_BIT != 0 && crc8(&self.0[..7]) == self.crc()
    }
}
