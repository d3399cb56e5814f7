//! Streaming response bodies to disk.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use super::compression::StreamDecoder;
use super::error::ClientError;

/// A file written by a completed download. Owned by the caller; the client
/// never touches it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    path: PathBuf,
    filename: String,
    bytes_written: u64,
}

impl DownloadedFile {
    pub(crate) fn new(path: PathBuf, filename: String, bytes_written: u64) -> Self {
        Self {
            path,
            filename,
            bytes_written,
        }
    }

    /// Where the file was written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name reported by the server (`Content-Disposition`) or taken from the
    /// URL, sanitized.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Decoded size on disk.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Consumes the descriptor, returning its path.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Moves the file to `target`, copying across filesystems when a rename
    /// is not possible.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when neither rename nor copy succeeds.
    pub async fn move_to(self, target: impl AsRef<Path>) -> Result<Self, ClientError> {
        let target = target.as_ref().to_path_buf();
        if let Err(rename_error) = fs::rename(&self.path, &target).await {
            debug!(
                from = %self.path.display(),
                to = %target.display(),
                error = %rename_error,
                "rename failed, falling back to copy"
            );
            fs::copy(&self.path, &target)
                .await
                .map_err(|e| ClientError::io(&target, e))?;
            fs::remove_file(&self.path)
                .await
                .map_err(|e| ClientError::io(&self.path, e))?;
        }
        Ok(Self {
            path: target,
            ..self
        })
    }
}

/// File path for a download: inside `destination` when it is an existing
/// directory, `destination` itself otherwise.
pub(crate) async fn destination_path(destination: &Path, filename: &str) -> PathBuf {
    match fs::metadata(destination).await {
        Ok(metadata) if metadata.is_dir() => destination.join(filename),
        _ => destination.to_path_buf(),
    }
}

/// Streams `response` into a new file at `file_path`, decoding chunk by chunk.
///
/// A partially written file is removed when anything fails after it was
/// created. A path this call could not create is never removed.
pub(crate) async fn stream_to_file(
    response: reqwest::Response,
    decoder: StreamDecoder,
    url: &str,
    file_path: &Path,
) -> Result<u64, ClientError> {
    let file = File::create(file_path)
        .await
        .map_err(|e| ClientError::io(file_path, e))?;
    let result = write_body(response, decoder, url, file, file_path).await;
    if result.is_err()
        && let Err(cleanup_error) = fs::remove_file(file_path).await
        && cleanup_error.kind() != std::io::ErrorKind::NotFound
    {
        warn!(
            path = %file_path.display(),
            error = %cleanup_error,
            "failed to remove partial download"
        );
    }
    result
}

async fn write_body(
    response: reqwest::Response,
    mut decoder: StreamDecoder,
    url: &str,
    file: File,
    file_path: &Path,
) -> Result<u64, ClientError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| ClientError::transport(url, e))?;
        let decoded = decoder
            .feed(&chunk)
            .map_err(|e| ClientError::decompress(url, e))?;
        writer
            .write_all(decoded)
            .await
            .map_err(|e| ClientError::io(file_path, e))?;
        bytes_written += decoded.len() as u64;
    }

    let tail = decoder
        .finish()
        .map_err(|e| ClientError::decompress(url, e))?;
    writer
        .write_all(&tail)
        .await
        .map_err(|e| ClientError::io(file_path, e))?;
    bytes_written += tail.len() as u64;

    writer
        .flush()
        .await
        .map_err(|e| ClientError::io(file_path, e))?;

    Ok(bytes_written)
}
