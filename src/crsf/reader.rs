//! # Frame Reader
//!
//! Pulls bytes from a [`ByteSource`], finds frame boundaries and yields
//! decoded frames.
//!
//! Per frame attempt:
//! 1. Seek the sync byte, counting every other byte as skipped
//! 2. Read the length byte; lengths above the bound are dropped without
//!    reading further, and a dropped length byte equal to the sync byte
//!    starts the next attempt
//! 3. Read type, `length - 2` payload bytes and the checksum
//! 4. Verify the checksum and drop zero frames
//! 5. Decode the payload
//!
//! Corrupt or undecodable frames are counted and logged, never returned as
//! errors. Only I/O failures of the byte source end a scan with an error.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use tracing::{debug, error, warn};

use super::payload::Payload;
use super::protocol::*;
use crate::error::Result;
use crate::source::ByteSource;

/// Running counters for one stream
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReaderStats {
    /// Non-sync bytes seen while seeking
    pub bytes_skipped: u64,

    /// Every byte delivered by the source
    pub bytes_total: u64,

    /// Frames dropped as oversize, incomplete, corrupt or undecodable
    pub frames_bad: u64,

    /// Frames handed to the caller
    pub frames_decoded: u64,

    /// Sync bytes seen (frame attempts)
    pub frames_total: u64,

    /// Frames whose checksum did not match
    pub checksum_wrong: u64,

    /// Frames whose checksum matched (zero frames excluded)
    pub checksum_ok: u64,
}

impl fmt::Display for ReaderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bytes skipped: {}", self.bytes_skipped)?;
        writeln!(f, "Bytes total: {}", self.bytes_total)?;
        writeln!(f, "Frames bad: {}", self.frames_bad)?;
        writeln!(f, "Frames decoded: {}", self.frames_decoded)?;
        writeln!(f, "Frames total: {}", self.frames_total)?;
        writeln!(f, "CRC wrong: {}", self.checksum_wrong)?;
        write!(f, "CRC ok: {}", self.checksum_ok)
    }
}

/// Outcome of reading the bytes after a sync byte
enum BodyRead {
    Complete(RawFrame),
    Oversize(u8),
    Incomplete,
}

/// Streaming CRSF frame reader
pub struct FrameReader<S> {
    source: S,
    stats: ReaderStats,
    max_frame_length: u8,
    finished: bool,
    // Rejected length byte that was itself a sync byte
    pending_sync: bool,
}

/// Result of [`FrameReader::next_frame_or_stop`]
#[derive(Debug)]
pub enum ReadOutcome {
    /// Next valid frame
    Frame(Frame),

    /// Source exhausted
    EndOfStream,

    /// Stop signal resolved while seeking the next frame
    Stopped,
}

impl<S: ByteSource> FrameReader<S> {
    /// Create a reader accepting frames up to [`CRSF_MAX_FRAME_LENGTH`]
    pub fn new(source: S) -> Self {
        Self {
            source,
            stats: ReaderStats::default(),
            max_frame_length: CRSF_MAX_FRAME_LENGTH,
            finished: false,
            pending_sync: false,
        }
    }

    /// Override the largest accepted length byte
    pub fn with_max_frame_length(mut self, max_frame_length: u8) -> Self {
        self.max_frame_length = max_frame_length;
        self
    }

    /// Counters so far
    pub fn stats(&self) -> &ReaderStats {
        &self.stats
    }

    /// Whether the source has reached end-of-stream
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Flush the source's side outputs (raw capture)
    ///
    /// # Errors
    ///
    /// Returns error if the flush fails
    pub async fn finish(&mut self) -> Result<()> {
        self.source.finish().await?;
        Ok(())
    }

    /// Give back the byte source
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Read exactly `n` bytes, or `None` if the stream ends first
    async fn read_exact(&mut self, n: usize) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; n];
        let read = self.source.read_full(&mut buf).await?;
        self.stats.bytes_total += read as u64;

        if read < n {
            self.finished = true;
            return Ok(None);
        }
        Ok(Some(buf))
    }

    async fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.read_exact(1).await?.map(|b| b[0]))
    }

    /// Read the next decoded frame
    ///
    /// # Returns
    ///
    /// * `Ok(Some(frame))` - Next valid frame
    /// * `Ok(None)` - End of stream
    ///
    /// # Errors
    ///
    /// Returns error only if the byte source fails
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        let never = std::future::pending::<()>();
        tokio::pin!(never);

        match self.next_frame_or_stop(never).await? {
            ReadOutcome::Frame(frame) => Ok(Some(frame)),
            ReadOutcome::EndOfStream | ReadOutcome::Stopped => Ok(None),
        }
    }

    /// Read the next decoded frame unless `stop` resolves first
    ///
    /// `stop` is only polled while seeking a sync byte. Once a frame has
    /// started, its body is read to the end (or to end-of-stream), so the
    /// counters never hold a half-read frame. The source's `read_full` must
    /// not lose bytes when dropped before completing.
    ///
    /// # Errors
    ///
    /// Returns error only if the byte source fails
    pub async fn next_frame_or_stop<F>(&mut self, mut stop: Pin<&mut F>) -> Result<ReadOutcome>
    where
        F: Future<Output = ()>,
    {
        while !self.finished {
            let byte = if std::mem::take(&mut self.pending_sync) {
                CRSF_SYNC_BYTE
            } else {
                let read = tokio::select! {
                    biased;
                    _ = stop.as_mut() => return Ok(ReadOutcome::Stopped),
                    read = self.read_byte() => read?,
                };
                let Some(byte) = read else {
                    break;
                };
                byte
            };

            if byte != CRSF_SYNC_BYTE {
                self.stats.bytes_skipped += 1;
                continue;
            }

            self.stats.frames_total += 1;
            debug!("{} - Reading frame", self.stats.frames_total);

            match self.read_body(byte).await? {
                BodyRead::Complete(raw) => {
                    if let Some(frame) = self.process(raw) {
                        return Ok(ReadOutcome::Frame(frame));
                    }
                }
                BodyRead::Oversize(length) => {
                    self.stats.frames_bad += 1;
                    warn!(
                        "{} - Frame length {} exceeds maximum {}, resyncing",
                        self.stats.frames_total, length, self.max_frame_length
                    );
                    // A stray sync byte right before a real frame
                    self.pending_sync = length == CRSF_SYNC_BYTE;
                }
                BodyRead::Incomplete => {
                    self.stats.frames_bad += 1;
                    warn!("{} - Stream ended mid-frame", self.stats.frames_total);
                }
            }
        }

        Ok(ReadOutcome::EndOfStream)
    }

    async fn read_body(&mut self, address: u8) -> Result<BodyRead> {
        let Some(length) = self.read_byte().await? else {
            return Ok(BodyRead::Incomplete);
        };

        if length > self.max_frame_length {
            return Ok(BodyRead::Oversize(length));
        }

        // type + payload + crc
        let Some(body) = self.read_exact(payload_len(length) + 2).await? else {
            return Ok(BodyRead::Incomplete);
        };

        let crc_index = body.len() - 1;
        Ok(BodyRead::Complete(RawFrame {
            address,
            length,
            frame_type: body[0],
            payload: body[1..crc_index].to_vec(),
            checksum: body[crc_index],
        }))
    }

    fn process(&mut self, raw: RawFrame) -> Option<Frame> {
        let checked = match raw.verify() {
            Ok(checked) => checked,
            Err(Rejection::ChecksumMismatch(checksum)) => {
                self.stats.frames_bad += 1;
                self.stats.checksum_wrong += 1;
                warn!(
                    "{} - Wrong CRC: 0x{:02X} != 0x{:02X}",
                    self.stats.frames_total, checksum.received, checksum.computed
                );
                return None;
            }
            Err(Rejection::ZeroFrame) => {
                debug!("{} - Zero frame", self.stats.frames_total);
                return None;
            }
        };

        self.stats.checksum_ok += 1;
        debug!("{} - crc ok", self.stats.frames_total);

        let wire = checked.raw().to_bytes();
        match checked.decode() {
            Ok(frame) => {
                self.stats.frames_decoded += 1;
                if let Payload::Command(command) = &frame.payload {
                    if !command.checksum_ok() {
                        warn!(
                            "{} - Command CRC mismatch: 0x{:02X} != 0x{:02X}",
                            self.stats.frames_total,
                            command.checksum_received,
                            command.checksum_computed
                        );
                    }
                }
                Some(frame)
            }
            Err(e) => {
                self.stats.frames_bad += 1;
                error!(
                    "{} - Failed to decode frame: {}; raw: {}",
                    self.stats.frames_total,
                    e,
                    hex(&wire)
                );
                None
            }
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
