//! # CRC8 Implementations
//!
//! Table-driven CRC-8 checksums used by CRSF.
//!
//! - **Frame checksum**: CRC-8-DVB-S2, polynomial 0xD5, covering the type byte
//!   through the end of the payload.
//! - **Command checksum**: CRC-8 polynomial 0xBA, carried as the last byte of a
//!   command (0x32) payload, independent of the frame checksum.
//!
//! **Initial Value**: 0x00 for both.

/// CRC-8-DVB-S2 polynomial
const CRC8_POLY_D5: u8 = 0xD5;

/// Polynomial of the checksum nested inside command frames
const CRC8_POLY_BA: u8 = 0xBA;

/// Precomputed frame checksum lookup table
const CRC8_TABLE_D5: [u8; 256] = generate_crc8_table(CRC8_POLY_D5);

/// Precomputed command checksum lookup table
const CRC8_TABLE_BA: [u8; 256] = generate_crc8_table(CRC8_POLY_BA);

/// Generate a CRC8 lookup table at compile time
const fn generate_crc8_table(poly: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ poly;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

fn crc8_with_table(table: &[u8; 256], data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        crc = table[(crc ^ byte) as usize];
    }

    crc
}

/// Calculate the CRSF frame checksum (CRC8-DVB-S2)
///
/// # Arguments
///
/// * `data` - Type byte followed by the payload (no sync, length or CRC byte)
///
/// # Returns
///
/// * `u8` - Calculated CRC8 checksum
///
/// # Examples
///
/// ```
/// use crsf_reader::crsf::crc::crc8_dvb_s2;
///
/// // Type byte of an all-zero frame hashes to zero
/// assert_eq!(crc8_dvb_s2(&[0x00]), 0x00);
/// assert_eq!(crc8_dvb_s2(&[0x01]), 0xD5);
/// ```
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    crc8_with_table(&CRC8_TABLE_D5, data)
}

/// Calculate the checksum carried inside command (0x32) payloads
///
/// # Arguments
///
/// * `frame_type` - The frame type byte (0x32 for commands)
/// * `body` - Command payload from the destination byte through the last
///   command data byte, excluding the trailing command checksum
///
/// # Returns
///
/// * `u8` - Calculated CRC8 (polynomial 0xBA)
pub fn command_crc8(frame_type: u8, body: &[u8]) -> u8 {
    let crc = CRC8_TABLE_BA[frame_type as usize];
    body.iter()
        .fold(crc, |crc, &byte| CRC8_TABLE_BA[(crc ^ byte) as usize])
}

/// Bit-by-bit CRC8 (slow, for verifying the lookup tables)
#[cfg(test)]
fn crc8_slow(poly: u8, data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        crc ^= byte;

        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ poly;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
