//! Handlers for the `/videos` resource.
//!
//! Upload runs validation, the ffmpeg preflight, size-capped storage and
//! frame extraction in one request. Listing pages over the extracted JPEGs.

use std::io;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use framegrab_core::catalog::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use framegrab_core::error::CoreError;
use framegrab_core::extraction::ExtractionResult;
use framegrab_core::upload;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::io::StreamReader;

use crate::error::{AppError, AppResult};
use crate::router::frame_url;
use crate::state::AppState;

/// Multipart field carrying the video.
const FILE_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// `?page=&page_size=` for frame listings.
#[derive(Debug, Deserialize)]
pub struct FramePageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl FramePageParams {
    /// Apply defaults and range checks: `page >= 1`, `1 <= page_size <= 200`.
    pub fn resolve(&self) -> Result<(u32, u32), CoreError> {
        let page = self.page.unwrap_or(1);
        let page = u32::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| CoreError::Validation(format!("page must be >= 1, got {page}")))?;

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE as i64);
        let page_size = u32::try_from(page_size)
            .ok()
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
                ))
            })?;

        Ok((page, page_size))
    }
}

#[derive(Debug, Serialize)]
pub struct FrameItem {
    pub index: u64,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct FrameListResponse {
    pub video_id: String,
    pub page: u32,
    pub page_size: u32,
    pub total_frames: usize,
    pub frames: Vec<FrameItem>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/videos
///
/// Accepts a multipart form with a required `file` field. The body is
/// streamed to disk, every frame is extracted with ffmpeg and the frame
/// count and nominal fps are returned. Other fields are ignored.
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ExtractionResult>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let extension = upload::validate_upload(field.file_name(), field.content_type())?;
        tracing::debug!(
            file_name = field.file_name().unwrap_or_default(),
            %extension,
            "Receiving upload"
        );

        let body = StreamReader::new(Box::pin(field.map_err(io::Error::other)));
        let result = state.processor.ingest(&extension, body).await?;
        return Ok(Json(result));
    }

    Err(AppError::BadRequest(format!(
        "Missing required '{FILE_FIELD}' field"
    )))
}

/// GET /api/videos/{video_id}/frames
///
/// Returns one page of the video's frames in sequence order, with URLs
/// under the static frame route.
pub async fn list_frames(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    query: Result<Query<FramePageParams>, QueryRejection>,
) -> AppResult<Json<FrameListResponse>> {
    let Query(params) = query.map_err(|e| CoreError::Validation(e.body_text()))?;
    let (page, page_size) = params.resolve()?;

    let result = state.catalog.page(&video_id, page, page_size).await?;

    let frames = result
        .frames
        .into_iter()
        .map(|frame| FrameItem {
            index: frame.index,
            url: frame_url(&video_id, &frame.file_name),
        })
        .collect();

    Ok(Json(FrameListResponse {
        video_id,
        page,
        page_size,
        total_frames: result.total_frames,
        frames,
    }))
}
