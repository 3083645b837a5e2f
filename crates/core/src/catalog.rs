//! Paginated listing of extracted frames.

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::CoreError;
use crate::ffmpeg::FRAME_EXTENSION;
use crate::storage::is_valid_video_id;

/// Default page size for frame listings.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 200;

/// One extracted frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameEntry {
    /// 1-based sequence number, taken from the file stem.
    pub index: u64,
    /// File name inside the video's frame directory, e.g. `000042.jpg`.
    pub file_name: String,
}

/// A window of a video's frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePage {
    pub total_frames: usize,
    pub frames: Vec<FrameEntry>,
}

/// Slice bounds for 1-based `page` of `page_size` items out of `total`.
///
/// Pages past the end produce an empty range. `page` 0 is treated as 1.
pub fn paginate(total: usize, page: u32, page_size: u32) -> Range<usize> {
    let page_size = page_size as usize;
    let start = (page.max(1) as usize - 1)
        .saturating_mul(page_size)
        .min(total);
    let end = start.saturating_add(page_size).min(total);
    start..end
}

/// Read-only view over `{frames_dir}/{video_id}/`.
#[derive(Debug, Clone)]
pub struct FrameCatalog {
    frames_dir: PathBuf,
}

impl FrameCatalog {
    pub fn new(frames_dir: impl Into<PathBuf>) -> Self {
        Self {
            frames_dir: frames_dir.into(),
        }
    }

    /// All frame file names for `video_id`, sorted.
    ///
    /// Fails with [`CoreError::NotFound`] when the video has no frame
    /// directory.
    pub async fn list(&self, video_id: &str) -> Result<Vec<String>, CoreError> {
        let dir = self.video_dir(video_id).await?;
        let mut names = list_frame_files(&dir).await?;
        names.sort();
        Ok(names)
    }

    /// Return page `page` (1-based) of `video_id`'s frames.
    pub async fn page(
        &self,
        video_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<FramePage, CoreError> {
        let names = self.list(video_id).await?;
        let total_frames = names.len();
        let window = paginate(total_frames, page, page_size);
        let start = window.start;

        let frames = names[window]
            .iter()
            .enumerate()
            .map(|(offset, name)| FrameEntry {
                index: frame_index(name).unwrap_or((start + offset + 1) as u64),
                file_name: name.clone(),
            })
            .collect();

        Ok(FramePage {
            total_frames,
            frames,
        })
    }

    async fn video_dir(&self, video_id: &str) -> Result<PathBuf, CoreError> {
        let not_found = || CoreError::NotFound {
            entity: "Video",
            id: video_id.to_string(),
        };

        if !is_valid_video_id(video_id) {
            return Err(not_found());
        }
        let dir = self.frames_dir.join(video_id);
        let is_dir = tokio::fs::metadata(&dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(not_found());
        }
        Ok(dir)
    }
}

/// Names of `*.jpg` files directly inside `dir`, unsorted.
pub async fn list_frame_files(dir: &Path) -> Result<Vec<String>, CoreError> {
    let io_err = |e: std::io::Error| {
        CoreError::Internal(format!("Failed to read frame directory {}: {e}", dir.display()))
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(FRAME_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Parse the numeric stem of `000042.jpg` into `42`.
fn frame_index(file_name: &str) -> Option<u64> {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse().ok())
}
