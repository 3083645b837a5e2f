use std::path::PathBuf;

use framegrab_core::ffmpeg::{DEFAULT_FFMPEG_BIN, DEFAULT_FFPROBE_BIN};
use framegrab_core::storage::StorageLayout;
use framegrab_core::upload::DEFAULT_MAX_UPLOAD_BYTES;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    /// A single `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// Root holding `uploads/` and `frames/` (default: `storage`).
    pub storage_dir: PathBuf,
    /// Upload size ceiling in bytes (default: 200 MiB).
    pub max_upload_bytes: u64,
    /// ffmpeg program name or path.
    pub ffmpeg_bin: String,
    /// ffprobe program name or path.
    pub ffprobe_bin: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default     |
    /// |--------------------|-------------|
    /// | `HOST`             | `0.0.0.0`   |
    /// | `PORT`             | `8000`      |
    /// | `CORS_ORIGINS`     | `*`         |
    /// | `STORAGE_DIR`      | `storage`   |
    /// | `MAX_UPLOAD_BYTES` | `209715200` |
    /// | `FFMPEG_BIN`       | `ffmpeg`    |
    /// | `FFPROBE_BIN`      | `ffprobe`   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_dir = std::env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("storage"));

        let max_upload_bytes: u64 = std::env::var("MAX_UPLOAD_BYTES")
            .map(|v| v.parse().expect("MAX_UPLOAD_BYTES must be a valid u64"))
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let ffmpeg_bin = std::env::var("FFMPEG_BIN").unwrap_or_else(|_| DEFAULT_FFMPEG_BIN.into());
        let ffprobe_bin =
            std::env::var("FFPROBE_BIN").unwrap_or_else(|_| DEFAULT_FFPROBE_BIN.into());

        Self {
            host,
            port,
            cors_origins,
            storage_dir,
            max_upload_bytes,
            ffmpeg_bin,
            ffprobe_bin,
        }
    }

    pub fn storage_layout(&self) -> StorageLayout {
        StorageLayout::under(&self.storage_dir)
    }

    /// Whether CORS should allow any origin.
    pub fn cors_allows_any(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}
