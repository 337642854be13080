//! Argument decoding and response encoding.
//!
//! Decoding pulls one byte at a time from a [`ByteSource`]. Sources block
//! until a byte arrives, so an argument is never returned half-read.

use crate::error::{HostError, Result};
use crate::registry::Handle;

/// Terminates every list response.
pub const LIST_TERMINATOR: u8 = 0xFF;

/// Terminates every string argument.
pub const STRING_TERMINATOR: u8 = 0x00;

/// A blocking supplier of link bytes.
pub trait ByteSource {
    /// Return the next byte, waiting as long as necessary.
    fn next_byte(&mut self) -> Result<u8>;
}

/// Slices serve as finite sources; running out means the link stopped.
impl ByteSource for &[u8] {
    fn next_byte(&mut self) -> Result<u8> {
        let (&first, rest) = self.split_first().ok_or(HostError::Stopped)?;
        *self = rest;
        Ok(first)
    }
}

/// Read one `INT8`.
pub fn read_int8<S: ByteSource + ?Sized>(source: &mut S) -> Result<u8> {
    source.next_byte()
}

/// Read one `INT16`.
///
/// The device sends the high byte first. The bytes are reversed into
/// little-endian order and folded from the least significant up.
pub fn read_int16<S: ByteSource + ?Sized>(source: &mut S) -> Result<u16> {
    let mut bytes = [source.next_byte()?, source.next_byte()?];
    bytes.reverse();
    Ok(bytes
        .iter()
        .enumerate()
        .fold(0u16, |value, (i, &byte)| value | (u16::from(byte) << (8 * i))))
}

/// Read one NUL-terminated `STRING`.
pub fn read_string<S: ByteSource + ?Sized>(source: &mut S) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    loop {
        match source.next_byte()? {
            STRING_TERMINATOR => return Ok(bytes),
            byte => bytes.push(byte),
        }
    }
}

/// Append an `INT16`, high byte first.
#[inline]
pub fn write_int16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Append a NUL-terminated `STRING`.
///
/// Bytes after an embedded NUL would be read as the next argument, so the
/// string is cut there.
#[inline]
pub fn write_string(out: &mut Vec<u8>, value: &[u8]) {
    let end = value
        .iter()
        .position(|&b| b == STRING_TERMINATOR)
        .unwrap_or(value.len());
    out.extend_from_slice(&value[..end]);
    out.push(STRING_TERMINATOR);
}

/// What a command sends back to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Nothing is written.
    Silent,
    /// A single byte, e.g. a new handle or `HANDLE_ERROR`.
    Byte(u8),
    /// One byte per handle, then [`LIST_TERMINATOR`].
    List(Vec<Handle>),
}

impl Response {
    /// Append the wire form of this response.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::Silent => {}
            Self::Byte(byte) => out.push(*byte),
            Self::List(handles) => {
                out.extend(handles.iter().map(|h| h.raw()));
                out.push(LIST_TERMINATOR);
            }
        }
    }

    /// The wire form of this response.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}
