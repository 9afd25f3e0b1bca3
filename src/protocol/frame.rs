//! Six-byte frame codec.
//!
//! Every message in either direction is exactly [`FRAME_LEN`] bytes:
//!
//! ```text
//! [opcode, p0, p1, p2, p3, checksum]
//! ```
//!
//! where `checksum` is the XOR of the first five bytes. Word payloads are
//! little-endian `u32` in `p0..p3`; byte payloads live in `p0`.

use crate::error::ProtocolError;
use crate::motor::ChannelId;

/// Length of every frame on the wire.
pub const FRAME_LEN: usize = 6;

/// Number of payload bytes between opcode and checksum.
pub const PAYLOAD_LEN: usize = 4;

/// Index of the checksum byte.
const CHECKSUM_INDEX: usize = FRAME_LEN - 1;

/// XOR of the bytes covered by the checksum (the first five).
///
/// Shorter input is folded as-is; bytes past index 4 are ignored.
#[inline]
pub fn compute_checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .take(CHECKSUM_INDEX)
        .fold(0u8, |acc, b| acc ^ b)
}

/// One complete frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Wrap raw received bytes without checking them.
    #[inline]
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a frame with a correct checksum.
    pub fn new(opcode: u8, payload: [u8; PAYLOAD_LEN]) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = opcode;
        bytes[1..CHECKSUM_INDEX].copy_from_slice(&payload);
        bytes[CHECKSUM_INDEX] = compute_checksum(&bytes);
        Self(bytes)
    }

    /// Build a frame carrying a single byte argument.
    pub fn with_byte(opcode: u8, value: u8) -> Self {
        Self::new(opcode, [value, 0, 0, 0])
    }

    /// Build a frame carrying a little-endian word argument.
    pub fn with_word(opcode: u8, value: u32) -> Self {
        Self::new(opcode, value.to_le_bytes())
    }

    /// Raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Opcode byte.
    #[inline]
    pub const fn opcode(&self) -> u8 {
        self.0[0]
    }

    /// Payload bytes.
    #[inline]
    pub fn payload(&self) -> [u8; PAYLOAD_LEN] {
        [self.0[1], self.0[2], self.0[3], self.0[4]]
    }

    /// First payload byte.
    #[inline]
    pub const fn byte_arg(&self) -> u8 {
        self.0[1]
    }

    /// First payload byte as a boolean (any non-zero value is true).
    #[inline]
    pub const fn bool_arg(&self) -> bool {
        self.0[1] != 0
    }

    /// Payload as a little-endian `u32`.
    #[inline]
    pub fn word_arg(&self) -> u32 {
        u32::from_le_bytes(self.payload())
    }

    /// Checksum byte as carried.
    #[inline]
    pub const fn checksum(&self) -> u8 {
        self.0[CHECKSUM_INDEX]
    }

    /// Whether the carried checksum matches the first five bytes.
    #[inline]
    pub fn is_valid(&self) -> bool {
        compute_checksum(&self.0) == self.checksum()
    }

    /// Check the carried checksum.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::ChecksumMismatch` with both values.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let expected = compute_checksum(&self.0);
        if expected == self.checksum() {
            Ok(())
        } else {
            Err(ProtocolError::ChecksumMismatch {
                expected,
                found: self.checksum(),
            })
        }
    }
}

/// Response-only frame codes.
///
/// These opcodes are never dispatch targets: they are sent by the controller
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    /// A finite move on the given channel finished (200 + channel).
    MotionComplete(ChannelId),
    /// Controller start-up (252 in bytes 0..5).
    Boot,
    /// Set command applied (253).
    Acknowledge,
    /// Unknown or unsupported command (254).
    InvalidCommand,
    /// Request checksum mismatch (255).
    ChecksumError,
}

impl Signal {
    /// Base code of the motion-complete range.
    pub const MOTION_COMPLETE_BASE: u8 = 200;
    /// Boot signal code.
    pub const BOOT: u8 = 252;
    /// Acknowledge code.
    pub const ACKNOWLEDGE: u8 = 253;
    /// Invalid-command code.
    pub const INVALID_COMMAND: u8 = 254;
    /// Checksum-error code.
    pub const CHECKSUM_ERROR: u8 = 255;

    /// Wire code.
    pub const fn code(self) -> u8 {
        match self {
            Signal::MotionComplete(channel) => Self::MOTION_COMPLETE_BASE + channel.index() as u8,
            Signal::Boot => Self::BOOT,
            Signal::Acknowledge => Self::ACKNOWLEDGE,
            Signal::InvalidCommand => Self::INVALID_COMMAND,
            Signal::ChecksumError => Self::CHECKSUM_ERROR,
        }
    }

    /// Parse a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            200..=203 => ChannelId::from_index(code - Self::MOTION_COMPLETE_BASE).map(Signal::MotionComplete),
            Self::BOOT => Some(Signal::Boot),
            Self::ACKNOWLEDGE => Some(Signal::Acknowledge),
            Self::INVALID_COMMAND => Some(Signal::InvalidCommand),
            Self::CHECKSUM_ERROR => Some(Signal::ChecksumError),
            _ => None,
        }
    }
}

/// A response before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Get result in payload byte 0.
    Byte {
        /// Request opcode echoed back.
        opcode: u8,
        /// Value.
        value: u8,
    },
    /// Get result as a little-endian word.
    Word {
        /// Request opcode echoed back.
        opcode: u8,
        /// Value.
        value: u32,
    },
    /// Signal frame.
    Signal(Signal),
}

impl From<Signal> for Response {
    fn from(signal: Signal) -> Self {
        Response::Signal(signal)
    }
}

/// Outgoing frame storage.
///
/// A response only writes the bytes it defines; with `scrub` off the
/// remaining payload bytes keep whatever the previous response left there and
/// are still covered by the checksum.
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    bytes: [u8; FRAME_LEN],
    scrub: bool,
}

impl ResponseBuffer {
    /// Create an all-zero buffer.
    pub const fn new(scrub: bool) -> Self {
        Self {
            bytes: [0; FRAME_LEN],
            scrub,
        }
    }

    /// Encode `response` over the buffer and return the frame to send.
    ///
    /// Last writer wins: any previous content is overwritten.
    pub fn encode(&mut self, response: Response) -> &[u8; FRAME_LEN] {
        if self.scrub {
            self.bytes = [0; FRAME_LEN];
        }

        match response {
            Response::Byte { opcode, value } => {
                self.bytes[0] = opcode;
                self.bytes[1] = value;
            }
            Response::Word { opcode, value } => {
                self.bytes[0] = opcode;
                self.bytes[1..CHECKSUM_INDEX].copy_from_slice(&value.to_le_bytes());
            }
            Response::Signal(Signal::Boot) => {
                self.bytes[..CHECKSUM_INDEX].fill(Signal::BOOT);
            }
            Response::Signal(signal) => {
                self.bytes[0] = signal.code();
            }
        }

        self.bytes[CHECKSUM_INDEX] = compute_checksum(&self.bytes);
        &self.bytes
    }

    /// Current frame content.
    #[inline]
    pub fn bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new(false)
    }
}
