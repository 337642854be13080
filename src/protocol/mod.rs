//! Protocol module for the device wire format.
//!
//! A command is one opcode byte followed by a fixed argument list:
//!
//! - `INT8`: one byte (handles, layer order)
//! - `INT16`: two bytes, high byte first
//! - `STRING`: bytes up to a `0x00` terminator
//!
//! Responses are either a single byte or a list of handle bytes closed by
//! `0xFF`. Commands with no response write nothing.

mod codec;
mod command;
mod opcode;

pub use codec::{
    read_int16, read_int8, read_string, write_int16, write_string, ByteSource, Response,
    LIST_TERMINATOR, STRING_TERMINATOR,
};
pub use command::Command;
pub use opcode::{ArgKind, Opcode};

/// Sent once by the host when the link opens.
pub const INIT_BYTE: u8 = 0xFF;
