//! # Run Loop
//!
//! Pumps frames from a [`FrameReader`] through a [`FrameFilter`] into the
//! configured sinks until the stream ends, the source fails or shutdown is
//! requested.

use std::future::Future;

use tracing::{debug, info};

use crate::crsf::reader::{FrameReader, ReadOutcome, ReaderStats};
use crate::crsf::registry::FrameType;
use crate::error::{CrsfReaderError, Result};
use crate::source::ByteSource;
use crate::telemetry::FrameSink;

/// Frame-type allow/deny lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameFilter {
    show: Vec<FrameType>,
    skip: Vec<FrameType>,
}

impl FrameFilter {
    pub fn new(show: Vec<FrameType>, skip: Vec<FrameType>) -> Self {
        Self { show, skip }
    }

    /// Build a filter from frame type names or codes (`"ATTITUDE"`, `"0x34"`)
    ///
    /// # Errors
    ///
    /// Returns [`CrsfReaderError::Filter`] for a name that does not parse
    pub fn from_names<S: AsRef<str>>(show: &[S], skip: &[S]) -> Result<Self> {
        Ok(Self::new(parse_types(show)?, parse_types(skip)?))
    }

    /// A frame passes when `show` is empty or lists its type, and `skip` does not
    pub fn allows(&self, frame_type: FrameType) -> bool {
        (self.show.is_empty() || self.show.contains(&frame_type))
            && !self.skip.contains(&frame_type)
    }
}

fn parse_types<S: AsRef<str>>(names: &[S]) -> Result<Vec<FrameType>> {
    names
        .iter()
        .map(|name| name.as_ref().parse().map_err(CrsfReaderError::Filter))
        .collect()
}

/// Read frames until end-of-stream, a source failure or `shutdown` resolves
///
/// Shutdown takes effect between frames: a frame already started is read to
/// its end first. Sinks are flushed and the source finished in every case.
///
/// # Returns
///
/// * `Result<ReaderStats>` - Counters at the point the loop stopped
///
/// # Errors
///
/// Returns error if the byte source fails or a sink cannot write
pub async fn run<S, F>(
    reader: &mut FrameReader<S>,
    filter: &FrameFilter,
    sinks: &mut [Box<dyn FrameSink>],
    shutdown: F,
) -> Result<ReaderStats>
where
    S: ByteSource,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let outcome = loop {
        match reader.next_frame_or_stop(shutdown.as_mut()).await {
            Ok(ReadOutcome::Frame(frame)) => {
                if !filter.allows(frame.frame_type) {
                    debug!("Filtered out {} frame", frame.frame_type);
                    continue;
                }
                if let Err(e) = sinks.iter_mut().try_for_each(|sink| sink.write_frame(&frame)) {
                    break Err(e);
                }
            }
            Ok(ReadOutcome::EndOfStream) => {
                info!("End of stream");
                break Ok(());
            }
            Ok(ReadOutcome::Stopped) => {
                info!("Shutdown requested, stopping reader");
                break Ok(());
            }
            Err(e) => break Err(e),
        }
    };

    let finished = reader.finish().await;
    let flushed = sinks.iter_mut().try_for_each(|sink| sink.flush());

    outcome.and(finished).and(flushed)?;
    Ok(*reader.stats())
}
