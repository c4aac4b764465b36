//! Errors raised while turning a checksum-valid frame into a typed record.

use thiserror::Error;

/// Payload decoding failure.
///
/// The reader never propagates these to its caller: the offending frame is
/// counted as bad, its bytes are logged and scanning continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload ended before a field the decoder requires
    #[error("payload too short for {field}: need {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    /// Device address byte not present in the address registry
    #[error("unknown device address 0x{0:02X}")]
    UnknownAddress(u8),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
