//! # Telemetry Module
//!
//! Destinations for decoded frames.
//!
//! This module handles:
//! - The [`FrameSink`] seam the run loop writes to
//! - Console output, one line per frame or the extended field view
//! - JSONL capture with file rotation (see [`logger`])

pub mod logger;

use serde_json::Value;
use tracing::info;

use crate::crsf::protocol::Frame;
use crate::error::Result;

pub use logger::JsonlLogger;

/// Consumer of decoded frames
#[cfg_attr(test, mockall::automock)]
pub trait FrameSink {
    /// Handle one decoded frame
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Logs frames through `tracing`
#[derive(Debug, Default)]
pub struct ConsoleSink {
    extended_view: bool,
}

impl ConsoleSink {
    pub fn new(extended_view: bool) -> Self {
        Self { extended_view }
    }
}

impl FrameSink for ConsoleSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if self.extended_view {
            info!("==========New frame===========");
            for line in extended_lines(frame) {
                info!("{}", line);
            }
        } else {
            info!("{}", frame);
        }
        Ok(())
    }
}

/// Field-per-line rendering of a frame
///
/// ```text
/// raw: [200, 8, 30, ...]
/// address: FLIGHT_CONTROLLER
/// size: 8
/// type: ATTITUDE
/// payload:
///   pitch: 0.1
///   ...
/// crc: OK
/// ```
pub fn extended_lines(frame: &Frame) -> Vec<String> {
    let mut raw = vec![frame.address.code(), frame.length, frame.frame_type.code()];
    raw.extend_from_slice(&frame.payload_raw);
    raw.push(frame.checksum.received);

    let mut lines = vec![
        format!("raw: {:?}", raw),
        format!("address: {}", frame.address),
        format!("size: {}", frame.length),
        format!("type: {}", frame.frame_type),
        "payload:".to_string(),
    ];

    lines.push(format!("  raw: {:?}", frame.payload_raw));
    match serde_json::to_value(&frame.payload) {
        // Externally tagged: {"Variant": {...fields}}
        Ok(Value::Object(tagged)) => {
            for (_, body) in tagged {
                match body {
                    Value::Object(fields) => {
                        for (name, value) in fields {
                            lines.push(format!("  {}: {}", name, value));
                        }
                    }
                    other => lines.push(format!("  value: {}", other)),
                }
            }
        }
        _ => lines.push(format!("  decoded: {}", frame.payload)),
    }

    lines.push(format!("crc: {}", frame.checksum));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::decoder::decode_frame;
    use crate::crsf::encoder::encode_sync_frame;

    #[test]
    fn test_extended_lines_attitude() {
        let frame = decode_frame(&[0xC8, 0x08, 0x1E, 0x00, 0x64, 0xFF, 0x38, 0x03, 0xE8, 0x6F])
            .unwrap();

        let lines = extended_lines(&frame);
        assert_eq!(lines[0], "raw: [200, 8, 30, 0, 100, 255, 56, 3, 232, 111]");
        assert_eq!(lines[1], "address: FLIGHT_CONTROLLER");
        assert_eq!(lines[2], "size: 8");
        assert_eq!(lines[3], "type: ATTITUDE");
        assert_eq!(lines[4], "payload:");
        assert!(lines.iter().any(|l| l.starts_with("  pitch: ")));
        assert!(lines.iter().any(|l| l.starts_with("  yaw: ")));
        assert_eq!(lines.last().unwrap(), "crc: OK");
    }

    #[test]
    fn test_extended_lines_raw_payload() {
        let frame = decode_frame(&encode_sync_frame(0x38, &[1, 2]).unwrap()).unwrap();

        let lines = extended_lines(&frame);
        assert_eq!(lines[3], "type: UNKNOWN_0x38");
        assert!(lines.contains(&"  raw: [1, 2]".to_string()));
        assert!(lines.contains(&"  value: [1,2]".to_string()));
    }

    #[test]
    fn test_console_sink_accepts_frames() {
        let frame = decode_frame(&encode_sync_frame(0x21, b"ACRO\0").unwrap()).unwrap();

        let mut compact = ConsoleSink::new(false);
        let mut extended = ConsoleSink::new(true);
        assert!(compact.write_frame(&frame).is_ok());
        assert!(extended.write_frame(&frame).is_ok());
        assert!(compact.flush().is_ok());
    }
}
