//! # CRSF Protocol Module
//!
//! Implementation of the Crossfire (CRSF) protocol as spoken by ExpressLRS and
//! TBS equipment.
//!
//! This module handles:
//! - CRC8-DVB-S2 frame checksums and the command frame inner checksum
//! - Frame synchronization over a byte stream (see [`reader`])
//! - Raw frame verification and typed payload decoding
//! - Device address, frame type and other identifier registries

pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod payload;
pub mod protocol;
pub mod reader;
pub mod registry;
