//! Host wire protocol.
//!
//! Fixed six-byte frames with an XOR checksum, and the opcode table that maps
//! them to commands.

pub mod frame;
pub mod opcode;

pub use frame::{compute_checksum, Frame, Response, ResponseBuffer, Signal, FRAME_LEN, PAYLOAD_LEN};
pub use opcode::{ChannelRegister, Command, COMMAND_TABLE, MAX_OPCODE, OPCODE_COUNT};
