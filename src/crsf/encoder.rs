//! # CRSF Frame Encoder
//!
//! Builds wire frames with a correct checksum. Used to produce fixtures and
//! synthetic replay captures; nothing in the reader transmits.

use bytes::{BufMut, BytesMut};

use super::crc::crc8_dvb_s2;
use super::protocol::{CRSF_MAX_FRAME_SIZE, CRSF_SYNC_BYTE};
use crate::error::{CrsfReaderError, Result};

/// Maximum payload size: 64 - sync(1) - length(1) - type(1) - crc(1)
pub const CRSF_MAX_PAYLOAD_SIZE: usize = CRSF_MAX_FRAME_SIZE - 4;

/// Encode a complete CRSF frame
///
/// # Arguments
///
/// * `address` - First byte of the frame (normally [`CRSF_SYNC_BYTE`])
/// * `frame_type` - Frame type byte
/// * `payload` - Payload data (max 60 bytes)
///
/// # Returns
///
/// * `Result<Vec<u8>>` - Address + Length + Type + Payload + CRC
///
/// # Errors
///
/// Returns error if payload exceeds [`CRSF_MAX_PAYLOAD_SIZE`]
///
/// # Examples
///
/// ```
/// use crsf_reader::crsf::encoder::encode_frame;
///
/// let frame = encode_frame(0xC8, 0x1E, &[0x00, 0x64, 0xFF, 0x38, 0x03, 0xE8])?;
/// assert_eq!(frame.len(), 10);
/// assert_eq!(frame[9], 0x6F);
/// # Ok::<(), crsf_reader::error::CrsfReaderError>(())
/// ```
pub fn encode_frame(address: u8, frame_type: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > CRSF_MAX_PAYLOAD_SIZE {
        return Err(CrsfReaderError::CrsfProtocol(format!(
            "Payload size {} exceeds maximum {}",
            payload.len(),
            CRSF_MAX_PAYLOAD_SIZE
        )));
    }

    let mut frame = BytesMut::with_capacity(4 + payload.len());
    frame.put_u8(address);
    frame.put_u8((payload.len() + 2) as u8); // type + payload + crc
    frame.put_u8(frame_type);
    frame.put_slice(payload);

    // CRC covers Type + Payload
    let crc = crc8_dvb_s2(&frame[2..]);
    frame.put_u8(crc);

    Ok(frame.to_vec())
}

/// Encode a frame addressed with the sync byte, the form every frame on a
/// CRSF UART takes
pub fn encode_sync_frame(frame_type: u8, payload: &[u8]) -> Result<Vec<u8>> {
    encode_frame(CRSF_SYNC_BYTE, frame_type, payload)
}
