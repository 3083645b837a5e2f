//! Route definitions for video upload and frame listing.
//!
//! ```text
//! POST /videos                          upload_video
//! GET  /videos/{video_id}/frames        list_frames
//! ```

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::video;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/videos",
            // The upload store enforces its own ceiling while streaming.
            post(video::upload_video).layer(DefaultBodyLimit::disable()),
        )
        .route("/videos/{video_id}/frames", get(video::list_frames))
}
