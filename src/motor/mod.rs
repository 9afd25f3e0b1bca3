//! Motor module for peristaltic-stepper.
//!
//! Provides the per-channel step-pulse state machine, generic over
//! embedded-hal 1.0 output pins.

mod builder;
mod channel;
pub mod state;

pub use builder::MotorChannelBuilder;
pub use channel::{MotorChannel, TickEvent};
pub use state::ChannelPhase;

/// Number of motor channels on a board.
pub const CHANNEL_COUNT: usize = 4;

/// One of the four motor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelId {
    /// Motor 0.
    M0,
    /// Motor 1.
    M1,
    /// Motor 2.
    M2,
    /// Motor 3.
    M3,
}

impl ChannelId {
    /// All channels in index order.
    pub const ALL: [ChannelId; CHANNEL_COUNT] = [ChannelId::M0, ChannelId::M1, ChannelId::M2, ChannelId::M3];

    /// Zero-based index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Channel for a zero-based index.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(ChannelId::M0),
            1 => Some(ChannelId::M1),
            2 => Some(ChannelId::M2),
            3 => Some(ChannelId::M3),
            _ => None,
        }
    }
}

impl TryFrom<u8> for ChannelId {
    type Error = crate::error::MotorError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::from_index(index).ok_or(crate::error::MotorError::InvalidChannel(index))
    }
}
