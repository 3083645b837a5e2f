//! Upload validation and size-capped persistence.
//!
//! Uploads are validated on name and declared MIME type before any bytes are
//! read, then streamed to `{uploads_dir}/{video_id}{ext}` in fixed-size
//! chunks. Once the running total would pass the ceiling nothing more is
//! written, the rest of the body is drained, and the partial file is
//! removed.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::error::CoreError;

/// Accepted file extensions (lowercase, with leading dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".avi", ".mkv", ".webm"];

/// Accepted declared content types. An absent content type is also accepted.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-matroska",
    "video/webm",
];

/// Default upload ceiling (200 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 200 * 1024 * 1024;

/// Read/write chunk size (1 MiB).
pub const UPLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// A video persisted by [`UploadStore::save`].
#[derive(Debug, Clone)]
pub struct StoredVideo {
    /// 32-character lowercase hex id.
    pub id: String,
    /// Lowercase extension with leading dot, e.g. `.mp4`.
    pub extension: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Validate an upload's file name and declared content type.
///
/// Returns the normalized (lowercase, dotted) extension.
pub fn validate_upload(
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Result<String, CoreError> {
    let file_name = file_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| CoreError::Validation("Missing file name.".into()))?;

    let extension = file_extension(file_name)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| CoreError::Validation("Unsupported file extension.".into()))?;

    if let Some(content_type) = content_type.filter(|c| !c.is_empty()) {
        if !ALLOWED_MIME_TYPES.contains(&content_type) {
            return Err(CoreError::Validation("Unsupported content type.".into()));
        }
    }

    Ok(extension)
}

/// Lowercase extension with leading dot, or `None` when the name has none.
fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

/// Writes uploaded videos into the uploads directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    uploads_dir: PathBuf,
    max_bytes: u64,
    chunk_size: usize,
}

impl UploadStore {
    pub fn new(uploads_dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            max_bytes,
            chunk_size: UPLOAD_CHUNK_SIZE,
        }
    }

    /// Override the read chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Stream `body` to a new file under a freshly generated id.
    ///
    /// `extension` must come from [`validate_upload`]. Fails with
    /// [`CoreError::PayloadTooLarge`] once the body exceeds the ceiling; in
    /// that case, and on any read or write error, no file is left behind.
    pub async fn save<R>(&self, extension: &str, body: R) -> Result<StoredVideo, CoreError>
    where
        R: AsyncRead + Unpin,
    {
        let id = Uuid::new_v4().simple().to_string();
        let path = self.uploads_dir.join(format!("{id}{extension}"));

        match self.write_capped(&path, body).await {
            Ok(size_bytes) => {
                tracing::info!(video_id = %id, size_bytes, "Upload stored");
                Ok(StoredVideo {
                    id,
                    extension: extension.to_string(),
                    path,
                    size_bytes,
                })
            }
            Err(err) => {
                remove_file_logged(&path).await;
                Err(err)
            }
        }
    }

    /// Delete a stored upload; a file that is already gone is not an error.
    pub async fn remove(&self, video: &StoredVideo) {
        remove_file_logged(&video.path).await;
    }

    /// Returns the number of bytes written.
    async fn write_capped<R>(&self, path: &Path, mut body: R) -> Result<u64, CoreError>
    where
        R: AsyncRead + Unpin,
    {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to create upload file: {e}")))?;

        let mut buf = vec![0u8; self.chunk_size];
        let mut received: u64 = 0;
        let mut oversize = false;

        loop {
            let n = read_chunk(&mut body, &mut buf)
                .await
                .map_err(|e| CoreError::Validation(format!("Failed to read upload body: {e}")))?;
            if n == 0 {
                break;
            }
            received += n as u64;

            // Keep draining after the ceiling is hit so the client sees a
            // response instead of a reset connection.
            if oversize {
                continue;
            }
            if received > self.max_bytes {
                oversize = true;
                continue;
            }

            file.write_all(&buf[..n])
                .await
                .map_err(|e| CoreError::Internal(format!("Failed to write upload file: {e}")))?;
        }

        file.flush()
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to write upload file: {e}")))?;

        if oversize {
            tracing::warn!(
                received,
                limit_bytes = self.max_bytes,
                "Upload rejected, size limit exceeded"
            );
            return Err(CoreError::PayloadTooLarge {
                limit_bytes: self.max_bytes,
            });
        }

        Ok(received)
    }
}

/// Fill `buf` from `reader` until it is full or the stream ends.
async fn read_chunk<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

async fn remove_file_logged(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed upload file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove upload file"),
    }
}
