//! # Serial Byte Source
//!
//! Live CRSF capture from a UART (ELRS/TBS module, flight controller pass-through
//! or a USB-serial tap on the receiver line).
//!
//! Opens the port 8N1 without flow control. Read timeouts and reconnection are
//! left to the caller: a silent port blocks the reader until bytes arrive.

use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use super::StreamSource;
use crate::error::{CrsfReaderError, Result};

/// CRSF baud rate for ELRS (420,000 baud)
pub const CRSF_BAUD_RATE: u32 = 420_000;

/// Device paths tried when no port is configured (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC devices (most common for ELRS)
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Serial port wrapped as a byte source
pub type SerialSource = StreamSource<SerialStream>;

/// Open the first serial port that can be opened
///
/// # Arguments
///
/// * `paths` - Device paths to try (e.g., &["/dev/ttyACM0"])
/// * `baud_rate` - Line speed
///
/// # Returns
///
/// * `Result<(SerialSource, String)>` - Opened source and the path that worked
///
/// # Errors
///
/// Returns [`CrsfReaderError::SerialPortNotFound`] if none of the paths open
pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<(SerialSource, String)> {
    for path in paths {
        debug!("Trying to open serial port: {}", path);

        match open_port(path, baud_rate) {
            Ok(port) => {
                info!("Opened serial port {} at {} baud", path, baud_rate);
                return Ok((StreamSource::new(port), path.to_string()));
            }
            Err(e) => {
                warn!("Failed to open {}: {}", path, e);
                continue;
            }
        }
    }

    Err(CrsfReaderError::SerialPortNotFound(paths.join(", ")))
}

/// Open a serial port by path, or auto-detect when `path` is empty
///
/// # Errors
///
/// Returns error if the port (or every default port) fails to open
pub fn open_serial(path: &str, baud_rate: u32) -> Result<(SerialSource, String)> {
    if path.is_empty() {
        open_with_paths(DEFAULT_DEVICE_PATHS, baud_rate)
    } else {
        open_with_paths(&[path], baud_rate)
    }
}

/// Open a specific serial port with CRSF settings
fn open_port(path: &str, baud_rate: u32) -> Result<SerialStream> {
    let port = tokio_serial::new(path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| CrsfReaderError::Serial(format!("Failed to open {}: {}", path, e)))?;

    Ok(port)
}
