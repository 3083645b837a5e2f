//! Upload-to-frames orchestration.
//!
//! [`VideoProcessor`] ties together the upload store, ffmpeg and the frame
//! catalog. A failed extraction rolls back both the upload and the partial
//! frame directory, so a video either has a complete frame set or leaves no
//! trace on disk.

use std::io;
use std::path::Path;

use serde::Serialize;
use tokio::io::AsyncRead;

use crate::catalog::list_frame_files;
use crate::error::CoreError;
use crate::ffmpeg::Ffmpeg;
use crate::storage::StorageLayout;
use crate::upload::{StoredVideo, UploadStore};

/// Outcome of a successful upload + extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub video_id: String,
    pub frame_count: usize,
    /// Nominal frame rate; `0.0` when it could not be determined.
    pub fps: f64,
    pub message: String,
}

impl ExtractionResult {
    fn new(video_id: String, frame_count: usize, fps: f64) -> Self {
        let message = if fps == 0.0 {
            "ok (fps unavailable)"
        } else {
            "ok"
        };
        Self {
            video_id,
            frame_count,
            fps,
            message: message.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct VideoProcessor {
    layout: StorageLayout,
    store: UploadStore,
    ffmpeg: Ffmpeg,
}

impl VideoProcessor {
    pub fn new(layout: StorageLayout, max_upload_bytes: u64, ffmpeg: Ffmpeg) -> Self {
        let store = UploadStore::new(layout.uploads_dir.clone(), max_upload_bytes);
        Self {
            layout,
            store,
            ffmpeg,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Fail with [`CoreError::ToolUnavailable`] if ffmpeg cannot be spawned.
    ///
    /// Called before any bytes are persisted.
    pub async fn ensure_tools(&self) -> Result<(), CoreError> {
        self.ffmpeg.ensure_available().await.map_err(CoreError::from)
    }

    /// Persist `body` and extract its frames.
    ///
    /// `extension` must already be validated. Runs the ffmpeg preflight,
    /// stores the upload, then hands off to [`extract`](Self::extract).
    pub async fn ingest<R>(&self, extension: &str, body: R) -> Result<ExtractionResult, CoreError>
    where
        R: AsyncRead + Unpin,
    {
        self.ensure_tools().await?;
        let video = self.store.save(extension, body).await?;
        self.extract(&video).await
    }

    /// Extract all frames of a stored upload and report count and fps.
    ///
    /// On failure the upload and `{frames_dir}/{id}` are removed before the
    /// error is returned.
    pub async fn extract(&self, video: &StoredVideo) -> Result<ExtractionResult, CoreError> {
        let frame_dir = self.layout.frame_dir(&video.id);

        let frame_count = match self.extract_and_count(video, &frame_dir).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(video_id = %video.id, error = %err, "Extraction failed, rolling back");
                self.rollback(video, &frame_dir).await;
                return Err(err);
            }
        };

        let fps = self.ffmpeg.read_frame_rate(&video.path).await;

        tracing::info!(video_id = %video.id, frame_count, fps, "Frames extracted");
        Ok(ExtractionResult::new(video.id.clone(), frame_count, fps))
    }

    async fn extract_and_count(
        &self,
        video: &StoredVideo,
        frame_dir: &Path,
    ) -> Result<usize, CoreError> {
        self.ffmpeg.extract_frames(&video.path, frame_dir).await?;
        Ok(list_frame_files(frame_dir).await?.len())
    }

    async fn rollback(&self, video: &StoredVideo, frame_dir: &Path) {
        match tokio::fs::remove_dir_all(frame_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %frame_dir.display(),
                error = %e,
                "Failed to remove frame directory"
            ),
        }
        self.store.remove(video).await;
    }
}
