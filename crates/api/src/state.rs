use std::sync::Arc;

use framegrab_core::catalog::FrameCatalog;
use framegrab_core::extraction::VideoProcessor;
use framegrab_core::ffmpeg::Ffmpeg;
use framegrab_core::tool::ToolRunner;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Upload, extraction and rollback pipeline.
    pub processor: Arc<VideoProcessor>,
    /// Read-only frame listings.
    pub catalog: Arc<FrameCatalog>,
}

impl AppState {
    /// Wire the domain components from `config`, spawning tools via `runner`.
    pub fn new(config: ServerConfig, runner: Arc<dyn ToolRunner>) -> Self {
        let layout = config.storage_layout();
        let ffmpeg = Ffmpeg::with_binaries(runner, &config.ffmpeg_bin, &config.ffprobe_bin);
        let catalog = FrameCatalog::new(layout.frames_dir.clone());
        let processor = VideoProcessor::new(layout, config.max_upload_bytes, ffmpeg);

        Self {
            config: Arc::new(config),
            processor: Arc::new(processor),
            catalog: Arc::new(catalog),
        }
    }
}
