#![doc = include_str!("../README.md")]

use thiserror::Error;

pub mod ata;
pub mod commands;
pub mod density;
pub mod device;
pub mod features;
pub mod mode;
pub mod sense;
pub mod transport;

pub use commands::{CommandBlock, Direction};
pub use device::{CommandFailed, ScsiDevice};
pub use sense::{SenseBuffer, SenseInfo};
pub use transport::{Completion, Transport, TransportError};

/// Errors raised while decoding a fixed-layout response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer is shorter than the structure requires.
    #[error("{structure} needs {needed} bytes but only {actual} were returned")]
    TruncatedResponse {
        structure: &'static str,
        needed: usize,
        actual: usize,
    },
}

pub(crate) fn ensure_len(
    structure: &'static str,
    buf: &[u8],
    needed: usize,
) -> Result<(), DecodeError> {
    if buf.len() < needed {
        return Err(DecodeError::TruncatedResponse {
            structure,
            needed,
            actual: buf.len(),
        });
    }
    Ok(())
}

pub(crate) fn be16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

pub(crate) fn be24(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([0, buf[offset], buf[offset + 1], buf[offset + 2]])
}

pub(crate) fn be32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

pub(crate) fn be64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_be_bytes(bytes)
}

/// Space-padded ASCII field to a display string. Returns `None` when nothing is left.
pub fn ascii_field(field: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(field);
    let text = text.trim_matches(|c: char| c == ' ' || c == '\0');
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
