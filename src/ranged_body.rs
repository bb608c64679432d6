//! A bounded byte range of a file, streamed as a request body.
//!
//! Every read opens the file again and seeks to the range start, so any number
//! of ranges over the same file can be produced one after the other without
//! sharing a cursor.

use std::io::SeekFrom;
use std::path::PathBuf;

use reqwest::Body;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, Take};
use tokio_util::io::ReaderStream;

use crate::error::{Result, UploadError};

#[derive(Debug, Clone)]
pub struct RangedBody {
    path: PathBuf,
    start: u64,
    content_length: u64,
    content_type: String,
}

impl RangedBody {
    /// Builds a range over a file whose length is already known.
    ///
    /// The content length is clamped so that the range never runs past the end
    /// of the file: `min(range_len, file_len - start)`.
    pub fn new(
        path: impl Into<PathBuf>,
        file_len: u64,
        start: u64,
        range_len: u64,
        content_type: &str,
    ) -> Self {
        Self {
            path: path.into(),
            start,
            content_length: range_len.min(file_len.saturating_sub(start)),
            content_type: content_type.to_string(),
        }
    }

    /// Same as [`RangedBody::new`], reading the file length from disk.
    pub async fn open(
        path: impl Into<PathBuf>,
        start: u64,
        range_len: u64,
        content_type: &str,
    ) -> Result<Self> {
        let path = path.into();
        let file_len = tokio::fs::metadata(&path)
            .await
            .map_err(|e| UploadError::io(&path, e))?
            .len();
        Ok(Self::new(path, file_len, start, range_len, content_type))
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    async fn reader(&self) -> Result<Take<File>> {
        let mut file = File::open(&self.path)
            .await
            .map_err(|e| UploadError::io(&self.path, e))?;
        file.seek(SeekFrom::Start(self.start))
            .await
            .map_err(|e| UploadError::io(&self.path, e))?;
        // A file shorter than expected ends the range early without an error.
        Ok(file.take(self.content_length))
    }

    /// Copies the range into `sink`, returning the number of bytes written.
    pub async fn write_to<W>(&self, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut reader = self.reader().await?;
        tokio::io::copy(&mut reader, sink)
            .await
            .map_err(|e| UploadError::io(&self.path, e))
    }

    /// Turns the range into a streaming request body.
    pub async fn into_body(self) -> Result<Body> {
        let reader = self.reader().await?;
        Ok(Body::wrap_stream(ReaderStream::new(reader)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use tempfile::NamedTempFile;

    fn numbered_file(len: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let content: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        file.write_all(&content).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_range_past_end_is_clamped() {
        let file = numbered_file(500);

        let body = RangedBody::open(file.path(), 200, 1000, "application/octet-stream")
            .await
            .unwrap();
        assert_eq!(body.content_length(), 300);

        let mut sink = Vec::new();
        let written = body.write_to(&mut sink).await.unwrap();

        let expected: Vec<u8> = (200..500).map(|i| (i % 251) as u8).collect();
        assert_eq!(written, 300);
        assert_eq!(sink, expected);
    }

    #[tokio::test]
    async fn test_inner_range_is_copied_exactly() {
        let file = numbered_file(2500);

        let body = RangedBody::open(file.path(), 1000, 1000, "application/octet-stream")
            .await
            .unwrap();
        let mut sink = Vec::new();
        body.write_to(&mut sink).await.unwrap();

        let expected: Vec<u8> = (1000..2000).map(|i| (i % 251) as u8).collect();
        assert_eq!(sink, expected);
    }

    #[tokio::test]
    async fn test_repeated_reads_do_not_share_position() {
        let file = numbered_file(100);
        let body = RangedBody::new(file.path(), 100, 10, 20, "application/octet-stream");

        let mut first = Vec::new();
        let mut second = Vec::new();
        body.write_to(&mut first).await.unwrap();
        body.write_to(&mut second).await.unwrap();

        assert_eq!(first.len(), 20);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_short_file_stops_silently() {
        // Declared length is larger than what is actually on disk.
        let file = numbered_file(50);
        let body = RangedBody::new(file.path(), 100, 0, 100, "application/octet-stream");
        assert_eq!(body.content_length(), 100);

        let mut sink = Vec::new();
        let written = body.write_to(&mut sink).await.unwrap();
        assert_eq!(written, 50);
    }

    #[test]
    fn test_start_past_end_is_empty() {
        let body = RangedBody::new("unused", 500, 800, 100, "application/octet-stream");
        assert_eq!(body.content_length(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = RangedBody::open("/definitely/not/here.apk", 0, 10, "application/octet-stream")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Io { .. }));
    }
}
