//! # Error Types
//!
//! Custom error types for CRSF Reader using `thiserror`.

use thiserror::Error;

use crate::crsf::error::DecodeError;

/// Main error type for CRSF Reader
#[derive(Debug, Error)]
pub enum CrsfReaderError {
    /// CRSF framing errors
    #[error("CRSF protocol error: {0}")]
    CrsfProtocol(String),

    /// Payload or identifier decoding errors
    #[error("CRSF decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// No serial device could be opened
    #[error("Serial port not found (tried: {0})")]
    SerialPortNotFound(String),

    /// Unparseable frame type in an allow/deny list
    #[error("Invalid frame filter: {0}")]
    Filter(String),

    /// JSONL telemetry serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),
}

/// Result type alias for CRSF Reader
pub type Result<T> = std::result::Result<T, CrsfReaderError>;
