//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration. Command-line flags are applied on top by the binary,
//! which validates again afterwards.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::crsf::protocol::{CRSF_MAX_FRAME_LENGTH, CRSF_MIN_FRAME_LENGTH};
use crate::error::{CrsfReaderError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub decoder: DecoderConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Where bytes come from
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Replay a capture file
    #[default]
    File,

    /// Read a live serial port
    Serial,
}

/// Byte source configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// File path, or serial device (empty = auto-detect for serial)
    #[serde(default)]
    pub path: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Optional raw-byte capture file
    #[serde(default)]
    pub raw_log: Option<String>,
}

/// Frame synchronizer configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DecoderConfig {
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: u16,
}

/// Console output configuration
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub extended_view: bool,

    /// Frame types to show (empty = all)
    #[serde(default)]
    pub show_types: Vec<String>,

    /// Frame types to hide
    #[serde(default)]
    pub skip_types: Vec<String>,
}

/// JSONL capture configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

// Default value functions
fn default_baud_rate() -> u32 { 420_000 }
fn default_max_frame_length() -> u16 { CRSF_MAX_FRAME_LENGTH as u16 }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10_000 }
fn default_max_files_to_keep() -> usize { 10 }

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            path: String::new(),
            baud_rate: default_baud_rate(),
            raw_log: None,
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_frame_length: default_max_frame_length(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> CrsfReaderError {
    CrsfReaderError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crsf_reader::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating, for callers that apply
    /// overrides first
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Serial may auto-detect, a replay needs a file
        if self.source.kind == SourceKind::File && self.source.path.is_empty() {
            return Err(invalid("source path cannot be empty for file sources"));
        }

        if self.source.baud_rate == 0 {
            return Err(invalid("baud_rate must be greater than 0"));
        }

        if matches!(&self.source.raw_log, Some(path) if path.is_empty()) {
            return Err(invalid("raw_log path cannot be empty"));
        }

        let min = u16::from(CRSF_MIN_FRAME_LENGTH);
        if self.decoder.max_frame_length < min || self.decoder.max_frame_length > 255 {
            return Err(invalid(format!(
                "max_frame_length must be between {} and 255",
                min
            )));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        Ok(())
    }

    /// Validated frame length bound as the reader takes it
    pub fn max_frame_length(&self) -> u8 {
        u8::try_from(self.decoder.max_frame_length).unwrap_or(u8::MAX)
    }
}
