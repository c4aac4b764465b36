//! # CRSF Protocol Constants and Frame Model
//!
//! A frame moves through three immutable stages:
//!
//! ```text
//! RawFrame ──verify()──▶ CheckedFrame ──decode()──▶ Frame
//!  (bytes off the wire)   (checksum matched)         (typed payload)
//! ```
//!
//! Each stage consumes the previous one, so a half-decoded frame cannot be
//! observed.

use std::fmt;

use serde::Serialize;

use super::crc::crc8_dvb_s2;
use super::error::Result;
use super::payload::{decode_payload, Payload};
use super::registry::{DeviceAddress, FrameType};

/// CRSF frame sync byte (always 0xC8)
pub const CRSF_SYNC_BYTE: u8 = 0xC8;

/// Maximum CRSF frame size on the wire, sync and length bytes included
pub const CRSF_MAX_FRAME_SIZE: usize = 64;

/// Largest accepted length byte: 64 - sync(1) - length(1) = 62
pub const CRSF_MAX_FRAME_LENGTH: u8 = (CRSF_MAX_FRAME_SIZE - 2) as u8;

/// Smallest meaningful length byte: type(1) + crc(1)
pub const CRSF_MIN_FRAME_LENGTH: u8 = 2;

/// Number of payload bytes implied by a length byte
///
/// The length byte counts type + payload + crc. Length bytes below 2 (the
/// degenerate zero frame) carry no payload.
pub fn payload_len(length: u8) -> usize {
    (length as usize).saturating_sub(2)
}

/// Frame as read off the wire, before any validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// First byte of the frame (the sync byte doubles as the sender address)
    pub address: u8,

    /// Declared length: type + payload + crc
    pub length: u8,

    /// Frame type byte
    pub frame_type: u8,

    /// Payload bytes, exactly `length - 2` of them
    pub payload: Vec<u8>,

    /// Checksum byte as received
    pub checksum: u8,
}

/// Why a checksum-stage frame was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Received and computed checksums differ
    ChecksumMismatch(Checksum),

    /// All-zero frame produced by stream desync
    ZeroFrame,
}

/// Received and computed frame checksums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checksum {
    pub received: u8,
    pub computed: u8,
}

impl Checksum {
    /// Whether the frame can be trusted
    pub fn is_ok(&self) -> bool {
        self.received == self.computed
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            f.write_str("OK")
        } else {
            write!(f, "ERROR (0x{:02X} != 0x{:02X})", self.received, self.computed)
        }
    }
}

impl RawFrame {
    /// Compute the checksum over type + payload
    pub fn computed_checksum(&self) -> u8 {
        let mut data = Vec::with_capacity(1 + self.payload.len());
        data.push(self.frame_type);
        data.extend_from_slice(&self.payload);
        crc8_dvb_s2(&data)
    }

    /// Frame bytes exactly as they appeared on the wire
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + self.payload.len());
        bytes.push(self.address);
        bytes.push(self.length);
        bytes.push(self.frame_type);
        bytes.extend_from_slice(&self.payload);
        bytes.push(self.checksum);
        bytes
    }

    /// Check the frame checksum and reject desync artifacts
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] if:
    /// - The received checksum does not match the computed one
    /// - The frame is the degenerate all-zero frame (length, type and
    ///   computed checksum all zero)
    pub fn verify(self) -> std::result::Result<CheckedFrame, Rejection> {
        let checksum = Checksum {
            received: self.checksum,
            computed: self.computed_checksum(),
        };

        if !checksum.is_ok() {
            return Err(Rejection::ChecksumMismatch(checksum));
        }

        if self.length == 0 && self.frame_type == 0 && checksum.computed == 0 {
            return Err(Rejection::ZeroFrame);
        }

        Ok(CheckedFrame {
            raw: self,
            checksum,
        })
    }
}

/// Frame whose checksum matched, awaiting payload decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedFrame {
    raw: RawFrame,
    checksum: Checksum,
}

impl CheckedFrame {
    /// The underlying wire frame
    pub fn raw(&self) -> &RawFrame {
        &self.raw
    }

    /// Resolve identifiers and decode the payload
    ///
    /// # Errors
    ///
    /// Returns error if the sender address is not registered, or the payload
    /// decoder for this frame type fails (short payload, unknown embedded
    /// address).
    pub fn decode(self) -> Result<Frame> {
        let address = DeviceAddress::try_from(self.raw.address)?;
        let frame_type = FrameType::from_code(self.raw.frame_type);
        let payload = decode_payload(frame_type, &self.raw.payload)?;

        Ok(Frame {
            address,
            length: self.raw.length,
            frame_type,
            payload_raw: self.raw.payload,
            checksum: self.checksum,
            payload,
        })
    }
}

/// Fully decoded CRSF frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Sender address
    pub address: DeviceAddress,

    /// Declared length: type + payload + crc
    pub length: u8,

    /// Frame type
    pub frame_type: FrameType,

    /// Payload bytes between the type and checksum bytes
    pub payload_raw: Vec<u8>,

    /// Frame checksum (always matching for decoded frames)
    pub checksum: Checksum,

    /// Typed payload, or `Payload::Raw` for types without a decoder
    pub payload: Payload,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Data size: {}; Data type: {}; Payload: {}; CRC: {};",
            self.length, self.frame_type, self.payload, self.checksum
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::error::DecodeError;

    fn raw(frame_type: u8, payload: Vec<u8>) -> RawFrame {
        let mut frame = RawFrame {
            address: CRSF_SYNC_BYTE,
            length: (payload.len() + 2) as u8,
            frame_type,
            payload,
            checksum: 0,
        };
        frame.checksum = frame.computed_checksum();
        frame
    }

    #[test]
    fn test_frame_constants() {
        assert_eq!(CRSF_SYNC_BYTE, 0xC8);
        assert_eq!(CRSF_MAX_FRAME_LENGTH, 62);
        assert_eq!(payload_len(0x18), 22);
        assert_eq!(payload_len(0), 0);
        assert_eq!(payload_len(1), 0);
    }

    #[test]
    fn test_verify_accepts_matching_checksum() {
        let frame = raw(0x1E, vec![0x00, 0x64, 0xFF, 0x38, 0x03, 0xE8]);
        assert_eq!(frame.checksum, 0x6F);

        let checked = frame.clone().verify().unwrap();
        assert_eq!(checked.raw(), &frame);
    }

    #[test]
    fn test_verify_rejects_corrupt_payload() {
        let mut frame = raw(0x1E, vec![0x00, 0x64, 0xFF, 0x38, 0x03, 0xE8]);
        frame.payload[2] ^= 0x01;

        match frame.verify() {
            Err(Rejection::ChecksumMismatch(checksum)) => {
                assert_eq!(checksum.received, 0x6F);
                assert_ne!(checksum.computed, 0x6F);
            }
            other => panic!("Expected checksum mismatch, got: {:?}", other),
        }
    }

    #[test]
    fn test_verify_rejects_zero_frame() {
        let frame = RawFrame {
            address: CRSF_SYNC_BYTE,
            length: 0,
            frame_type: 0,
            payload: Vec::new(),
            checksum: 0,
        };
        assert_eq!(frame.verify(), Err(Rejection::ZeroFrame));
    }

    #[test]
    fn test_decode_unknown_type_keeps_raw_bytes() {
        let frame = raw(0x55, vec![1, 2, 3]).verify().unwrap().decode().unwrap();

        assert_eq!(frame.address, DeviceAddress::FlightController);
        assert_eq!(frame.frame_type, FrameType::Unknown(0x55));
        assert_eq!(frame.payload, Payload::Raw(vec![1, 2, 3]));
        assert_eq!(frame.payload_raw, vec![1, 2, 3]);
        assert!(frame.checksum.is_ok());
    }

    #[test]
    fn test_decode_unknown_address_fails() {
        let mut frame = raw(0x55, vec![1, 2, 3]);
        frame.address = 0x42;

        let result = frame.verify().unwrap().decode();
        assert_eq!(result, Err(DecodeError::UnknownAddress(0x42)));
    }

    #[test]
    fn test_to_bytes_layout() {
        let frame = raw(0x1E, vec![0x00, 0x64, 0xFF, 0x38, 0x03, 0xE8]);
        assert_eq!(
            frame.to_bytes(),
            vec![0xC8, 0x08, 0x1E, 0x00, 0x64, 0xFF, 0x38, 0x03, 0xE8, 0x6F]
        );
    }

    #[test]
    fn test_checksum_display() {
        let ok = Checksum { received: 0x10, computed: 0x10 };
        let bad = Checksum { received: 0x10, computed: 0x11 };
        assert_eq!(ok.to_string(), "OK");
        assert_eq!(bad.to_string(), "ERROR (0x10 != 0x11)");
    }
}
