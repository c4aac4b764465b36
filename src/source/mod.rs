//! # Byte Sources
//!
//! Where the reader gets its bytes from.
//!
//! This module handles:
//! - The [`ByteSource`] contract: fill a buffer, or return short at end-of-stream
//! - Replaying capture files
//! - Live serial ports (see [`serial`])
//! - Teeing every byte read into a raw capture file

pub mod serial;

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use crate::error::Result;

/// Trait for blocking-style byte reads
#[async_trait]
pub trait ByteSource: Send {
    /// Fill `buf` completely
    ///
    /// Returns the number of bytes read. Anything less than `buf.len()` means
    /// the stream has ended; callers must not retry.
    ///
    /// Must be cancel safe: bytes pulled from the underlying stream by a
    /// future that is dropped early are returned by the next call.
    async fn read_full(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Flush anything the source buffers on the side (raw capture files)
    async fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ByteSource for Box<dyn ByteSource> {
    async fn read_full(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_full(buf).await
    }

    async fn finish(&mut self) -> io::Result<()> {
        (**self).finish().await
    }
}

/// Adapter turning any tokio reader into a [`ByteSource`]
///
/// Bytes are collected in an internal buffer and only handed out once a
/// request can be satisfied (or the stream ends), which keeps `read_full`
/// cancel safe.
#[derive(Debug)]
pub struct StreamSource<R> {
    inner: R,
    pending: BytesMut,
}

impl<R> StreamSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: BytesMut::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[async_trait]
impl<R> ByteSource for StreamSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read_full(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pending.len() < buf.len() {
            self.pending.reserve(buf.len() - self.pending.len());

            match self.inner.read_buf(&mut self.pending).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending.split_to(n));
        Ok(n)
    }
}

/// Open a capture file for replay
///
/// # Errors
///
/// Returns error if the file cannot be opened
pub async fn open_file<P: AsRef<Path>>(path: P) -> Result<StreamSource<File>> {
    let file = File::open(path.as_ref()).await?;
    info!("Replaying capture file {}", path.as_ref().display());
    Ok(StreamSource::new(file))
}

/// Passive raw capture: every byte delivered by the inner source is also
/// appended to a file
///
/// The capture is written without awaiting, so a dropped read never leaves
/// bytes delivered but not logged.
pub struct TeeSource<S> {
    inner: S,
    log: BufWriter<fs::File>,
}

impl<S: ByteSource> TeeSource<S> {
    /// Wrap `inner`, creating (or truncating) the capture file at `path`
    ///
    /// # Errors
    ///
    /// Returns error if the capture file cannot be created
    pub fn create<P: AsRef<Path>>(inner: S, path: P) -> Result<Self> {
        let file = fs::File::create(path.as_ref())?;
        info!("Capturing raw bytes to {}", path.as_ref().display());
        Ok(Self {
            inner,
            log: BufWriter::new(file),
        })
    }
}

#[async_trait]
impl<S: ByteSource> ByteSource for TeeSource<S> {
    async fn read_full(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read_full(buf).await?;
        self.log.write_all(&buf[..n])?;
        Ok(n)
    }

    async fn finish(&mut self) -> io::Result<()> {
        self.log.flush()?;
        debug!("Raw capture flushed");
        self.inner.finish().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_stream_source_joins_partial_reads() {
        let mock = Builder::new().read(&[1, 2]).read(&[3]).read(&[4, 5]).build();
        let mut source = StreamSource::new(mock);

        let mut buf = [0u8; 5];
        assert_eq!(source.read_full(&mut buf).await.unwrap(), 5);
        assert_eq!(buf, [1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_stream_source_short_read_at_eof() {
        let mut source = StreamSource::new(Cursor::new(vec![7u8, 8]));

        let mut buf = [0u8; 4];
        assert_eq!(source.read_full(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], &[7, 8]);
        assert_eq!(source.read_full(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stream_source_propagates_errors() {
        let mock = Builder::new()
            .read(&[1])
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
            .build();
        let mut source = StreamSource::new(mock);

        let mut buf = [0u8; 4];
        let err = source.read_full(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_stream_source_keeps_bytes_of_dropped_read() {
        let mock = Builder::new()
            .read(&[1, 2])
            .wait(Duration::from_millis(100))
            .read(&[3, 4])
            .build();
        let mut source = StreamSource::new(mock);

        let mut buf = [0u8; 3];
        let dropped = tokio::time::timeout(Duration::from_millis(20), source.read_full(&mut buf)).await;
        assert!(dropped.is_err());

        // The two bytes read before the timeout are not lost
        assert_eq!(source.read_full(&mut buf).await.unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);

        let mut rest = [0u8; 1];
        assert_eq!(source.read_full(&mut rest).await.unwrap(), 1);
        assert_eq!(rest, [4]);
        assert_eq!(source.read_full(&mut rest).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_file_missing() {
        let result = open_file("/nonexistent/capture.bin").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_tee_source_captures_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("raw.bin");

        let inner = StreamSource::new(Cursor::new(vec![0xC8, 0x04, 0x1E, 0xAA]));
        let mut tee = TeeSource::create(inner, &log_path).unwrap();

        let mut buf = [0u8; 3];
        assert_eq!(tee.read_full(&mut buf).await.unwrap(), 3);
        assert_eq!(tee.read_full(&mut buf).await.unwrap(), 1);
        tee.finish().await.unwrap();

        let captured = std::fs::read(&log_path).unwrap();
        assert_eq!(captured, vec![0xC8, 0x04, 0x1E, 0xAA]);
    }

    #[tokio::test]
    async fn test_boxed_source() {
        let mut source: Box<dyn ByteSource> =
            Box::new(StreamSource::new(Cursor::new(vec![1u8, 2, 3])));

        let mut buf = [0u8; 3];
        assert_eq!(source.read_full(&mut buf).await.unwrap(), 3);
        source.finish().await.unwrap();
    }
}
