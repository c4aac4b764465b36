//! # Buffered Frame Decoder
//!
//! Decodes a frame that is already fully in memory. The streaming path lives
//! in [`super::reader`]; both share the [`RawFrame`] pipeline.

use super::protocol::*;
use crate::error::{CrsfReaderError, Result};

/// Split a complete frame buffer into its wire fields
///
/// # Arguments
///
/// * `frame` - Complete frame bytes (sync, length, type, payload, crc)
///
/// # Errors
///
/// Returns error if:
/// - Frame is too short
/// - Sync byte is incorrect
/// - Length byte exceeds the CRSF bound or the buffer
pub fn parse_raw_frame(frame: &[u8]) -> Result<RawFrame> {
    // Minimum frame size: sync(1) + length(1) + type(1) + crc(1) = 4 bytes
    if frame.len() < 4 {
        return Err(CrsfReaderError::CrsfProtocol("Frame too short".to_string()));
    }

    if frame[0] != CRSF_SYNC_BYTE {
        return Err(CrsfReaderError::CrsfProtocol(format!(
            "Invalid sync byte: 0x{:02X}",
            frame[0]
        )));
    }

    let length = frame[1];
    if length > CRSF_MAX_FRAME_LENGTH {
        return Err(CrsfReaderError::CrsfProtocol(format!(
            "Frame length {} exceeds maximum {}",
            length, CRSF_MAX_FRAME_LENGTH
        )));
    }

    // sync(1) + length(1) + type(1) + payload + crc(1)
    let payload_len = payload_len(length);
    let expected = 4 + payload_len;
    if frame.len() < expected {
        return Err(CrsfReaderError::CrsfProtocol(format!(
            "Frame too short: expected {} bytes, got {}",
            expected,
            frame.len()
        )));
    }

    Ok(RawFrame {
        address: frame[0],
        length,
        frame_type: frame[2],
        payload: frame[3..3 + payload_len].to_vec(),
        checksum: frame[3 + payload_len],
    })
}

/// Decode a complete CRSF frame
///
/// # Arguments
///
/// * `frame` - Complete frame bytes (sync, length, type, payload, crc)
///
/// # Returns
///
/// * `Result<Frame>` - Decoded frame, or error if invalid
///
/// # Errors
///
/// Returns error if the frame cannot be parsed, the CRC check fails, the
/// frame is the degenerate all-zero frame, or its payload does not decode.
pub fn decode_frame(frame: &[u8]) -> Result<Frame> {
    let checked = parse_raw_frame(frame)?.verify().map_err(|rejection| match rejection {
        Rejection::ChecksumMismatch(checksum) => CrsfReaderError::CrsfProtocol(format!(
            "CRC mismatch: expected 0x{:02X}, got 0x{:02X}",
            checksum.computed, checksum.received
        )),
        Rejection::ZeroFrame => CrsfReaderError::CrsfProtocol("Zero frame".to_string()),
    })?;

    Ok(checked.decode()?)
}
