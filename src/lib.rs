//! # CRSF Reader Library
//!
//! Decode CRSF (Crossfire) frames from serial captures or a live UART.
//!
//! This library provides frame synchronization over an arbitrary byte source,
//! checksum verification, typed payload decoding for the telemetry and
//! configuration frame types, and the sinks the `crsf-reader` binary writes
//! decoded frames to.

pub mod config;
pub mod error;
pub mod crsf;
pub mod runner;
pub mod source;
pub mod telemetry;
