//! JSONL frame capture with rotation.
//!
//! Each decoded frame becomes one JSON object per line. A new file is started
//! every `max_records_per_file` records, and only the newest
//! `max_files_to_keep` files are kept.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::FrameSink;
use crate::crsf::protocol::Frame;
use crate::error::Result;

const FILE_PREFIX: &str = "frames_";
const FILE_EXTENSION: &str = "jsonl";

#[derive(Serialize)]
struct FrameRecord<'a> {
    timestamp: String,
    #[serde(flatten)]
    frame: &'a Frame,
}

/// Rotating JSONL writer for decoded frames
pub struct JsonlLogger {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    files_opened: u64,
}

impl JsonlLogger {
    /// Create a logger writing into `log_dir` (created if missing)
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new<P: AsRef<Path>>(
        log_dir: P,
        max_records_per_file: usize,
        max_files_to_keep: usize,
    ) -> Result<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        fs::create_dir_all(&log_dir)?;
        info!("Logging decoded frames to {}", log_dir.display());

        Ok(Self {
            log_dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            files_opened: 0,
        })
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX, timestamp, self.files_opened, FILE_EXTENSION
        );
        let path = self.log_dir.join(name);
        debug!("Opening frame log {}", path.display());

        self.writer = Some(BufWriter::new(File::create(&path)?));
        self.records_in_file = 0;
        self.files_opened += 1;

        self.prune()
    }

    /// Delete the oldest log files beyond the retention limit
    fn prune(&self) -> Result<()> {
        let mut files = log_files(&self.log_dir)?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            debug!("Removing old frame log {}", path.display());
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Frame log files in `dir`
pub fn log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(FILE_PREFIX))
            && path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION);
        if is_log {
            files.push(path);
        }
    }
    Ok(files)
}

impl FrameSink for JsonlLogger {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let record = FrameRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            frame,
        };

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, &record)?;
            writer.write_all(b"\n")?;
        }
        self.records_in_file += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for JsonlLogger {
    fn drop(&mut self) {
        let _ = FrameSink::flush(self);
    }
}
