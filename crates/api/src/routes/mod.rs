pub mod health;
pub mod video;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /videos                                          upload + extract (POST)
/// /videos/{video_id}/frames                        paginated frame listing (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(video::router())
}
