//! On-disk layout for uploads and extracted frames.
//!
//! ```text
//! {root}/uploads/{video_id}{ext}
//! {root}/frames/{video_id}/000001.jpg
//! ```

use std::path::{Path, PathBuf};

/// Directory holding original uploads.
pub const UPLOADS_SUBDIR: &str = "uploads";

/// Directory holding per-video frame directories.
pub const FRAMES_SUBDIR: &str = "frames";

/// Filesystem roots shared by the upload store, extractor and catalog.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub uploads_dir: PathBuf,
    pub frames_dir: PathBuf,
}

impl StorageLayout {
    /// Standard layout under a single storage root.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            uploads_dir: root.join(UPLOADS_SUBDIR),
            frames_dir: root.join(FRAMES_SUBDIR),
        }
    }

    /// Create both directories if they do not exist yet.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        tokio::fs::create_dir_all(&self.frames_dir).await?;
        Ok(())
    }

    pub fn upload_path(&self, video_id: &str, extension: &str) -> PathBuf {
        self.uploads_dir.join(format!("{video_id}{extension}"))
    }

    pub fn frame_dir(&self, video_id: &str) -> PathBuf {
        self.frames_dir.join(video_id)
    }
}

/// Whether `video_id` is safe to use as a single path component.
///
/// Ids we issue are 32 lowercase hex characters; this accepts the wider
/// `[A-Za-z0-9_-]+` set so that foreign ids never escape the storage roots.
pub fn is_valid_video_id(video_id: &str) -> bool {
    !video_id.is_empty()
        && video_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
