//! Opcode table.
//!
//! The host addresses everything by opcode, so the table order is part of the
//! wire protocol:
//!
//! | Opcodes | Command |
//! |---|---|
//! | `14*m + 2*k` | get register `k` of motor `m` |
//! | `14*m + 2*k + 1` | set register `k` of motor `m` |
//! | `56 + m` | variable microstep support of motor `m` |
//! | `60 + 2*m` | get microstep exponent of motor `m` |
//! | `61 + 2*m` | set microstep exponent of motor `m` |
//! | `68` | sub-microsecond divider |
//!
//! with `k` in [`ChannelRegister`] order.

use crate::error::ProtocolError;
use crate::motor::ChannelId;

/// Number of valid opcodes.
pub const OPCODE_COUNT: usize = 69;

/// Highest valid opcode.
pub const MAX_OPCODE: u8 = (OPCODE_COUNT - 1) as u8;

/// Per-channel registers reachable by get/set pairs, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelRegister {
    /// Stepping enabled (bool).
    Running,
    /// Steps left in the current move (u32).
    Steps,
    /// Step count of the last move request (u32).
    TargetSteps,
    /// Ticks between rising edges (u32).
    StepInterval,
    /// Count steps down and stop at zero (bool).
    FiniteMode,
    /// Direction output level (bool).
    Direction,
    /// Logical driver enable (bool).
    Enabled,
}

impl ChannelRegister {
    /// All registers in wire order.
    pub const ALL: [ChannelRegister; 7] = [
        ChannelRegister::Running,
        ChannelRegister::Steps,
        ChannelRegister::TargetSteps,
        ChannelRegister::StepInterval,
        ChannelRegister::FiniteMode,
        ChannelRegister::Direction,
        ChannelRegister::Enabled,
    ];

    /// Opcodes used per channel (one get and one set per register).
    pub const OPCODES_PER_CHANNEL: u8 = 2 * Self::ALL.len() as u8;

    /// Whether the register travels as a word rather than a byte.
    pub const fn is_word(self) -> bool {
        matches!(
            self,
            ChannelRegister::Steps | ChannelRegister::TargetSteps | ChannelRegister::StepInterval
        )
    }
}

/// A decoded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Read a channel register.
    Get {
        /// Target channel.
        channel: ChannelId,
        /// Register.
        register: ChannelRegister,
    },
    /// Write a channel register.
    Set {
        /// Target channel.
        channel: ChannelId,
        /// Register.
        register: ChannelRegister,
    },
    /// Whether the channel's resolution can change at runtime.
    MicrostepSupport(ChannelId),
    /// Read the microstep exponent.
    GetMicrostepExponent(ChannelId),
    /// Write the microstep exponent.
    SetMicrostepExponent(ChannelId),
    /// Timer ticks per microsecond.
    SubMicrosecondDivider,
}

const SUPPORT_BASE: u8 = 4 * ChannelRegister::OPCODES_PER_CHANNEL;
const EXPONENT_BASE: u8 = SUPPORT_BASE + 4;
const DIVIDER_OPCODE: u8 = EXPONENT_BASE + 8;

const fn channel(index: u8) -> ChannelId {
    match index {
        0 => ChannelId::M0,
        1 => ChannelId::M1,
        2 => ChannelId::M2,
        _ => ChannelId::M3,
    }
}

const fn build_table() -> [Command; OPCODE_COUNT] {
    let mut table = [Command::SubMicrosecondDivider; OPCODE_COUNT];

    let mut m = 0u8;
    while m < 4 {
        let mut k = 0usize;
        while k < ChannelRegister::ALL.len() {
            let base = (m * ChannelRegister::OPCODES_PER_CHANNEL) as usize + 2 * k;
            let register = ChannelRegister::ALL[k];
            table[base] = Command::Get {
                channel: channel(m),
                register,
            };
            table[base + 1] = Command::Set {
                channel: channel(m),
                register,
            };
            k += 1;
        }

        table[(SUPPORT_BASE + m) as usize] = Command::MicrostepSupport(channel(m));
        table[(EXPONENT_BASE + 2 * m) as usize] = Command::GetMicrostepExponent(channel(m));
        table[(EXPONENT_BASE + 2 * m + 1) as usize] = Command::SetMicrostepExponent(channel(m));
        m += 1;
    }

    table[DIVIDER_OPCODE as usize] = Command::SubMicrosecondDivider;
    table
}

/// Every command indexed by its opcode.
pub const COMMAND_TABLE: [Command; OPCODE_COUNT] = build_table();

impl Command {
    /// Look up an opcode.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::UnknownOpcode` for opcodes past the table,
    /// including the response-only signal codes.
    pub fn decode(opcode: u8) -> Result<Self, ProtocolError> {
        COMMAND_TABLE
            .get(opcode as usize)
            .copied()
            .ok_or(ProtocolError::UnknownOpcode(opcode))
    }

    /// Opcode of this command.
    pub fn opcode(self) -> u8 {
        let register_index = |register: ChannelRegister| {
            ChannelRegister::ALL
                .iter()
                .position(|r| *r == register)
                .unwrap_or(0) as u8
        };
        let channel_base = |channel: ChannelId| channel.index() as u8 * ChannelRegister::OPCODES_PER_CHANNEL;

        match self {
            Command::Get { channel, register } => channel_base(channel) + 2 * register_index(register),
            Command::Set { channel, register } => channel_base(channel) + 2 * register_index(register) + 1,
            Command::MicrostepSupport(channel) => SUPPORT_BASE + channel.index() as u8,
            Command::GetMicrostepExponent(channel) => EXPONENT_BASE + 2 * channel.index() as u8,
            Command::SetMicrostepExponent(channel) => EXPONENT_BASE + 2 * channel.index() as u8 + 1,
            Command::SubMicrosecondDivider => DIVIDER_OPCODE,
        }
    }
}
