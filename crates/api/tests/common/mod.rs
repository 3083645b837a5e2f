#![allow(dead_code)]

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use framegrab_api::config::ServerConfig;
use framegrab_api::router::build_app_router;
use framegrab_api::state::AppState;
use framegrab_core::storage::StorageLayout;
use framegrab_core::tool::{ToolError, ToolOutput, ToolRunner};

/// Multipart boundary used by [`post_upload`].
const BOUNDARY: &str = "framegrab-test-boundary";

/// Build a test `ServerConfig` rooted at `storage_dir`.
///
/// Uses a 64 KiB upload ceiling so oversize tests stay small.
pub fn test_config(storage_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        storage_dir: storage_dir.to_path_buf(),
        max_upload_bytes: 64 * 1024,
        ffmpeg_bin: "ffmpeg".to_string(),
        ffprobe_bin: "ffprobe".to_string(),
    }
}

/// Stand-in for the ffmpeg/ffprobe binaries.
#[derive(Debug, Clone)]
pub struct FakeTools {
    /// Frames written by a successful extraction.
    pub frames: usize,
    /// Make extraction exit non-zero after writing one frame.
    pub fail: bool,
    /// Make every spawn fail as if the binary were absent.
    pub missing: bool,
    /// ffprobe stdout.
    pub fps: &'static str,
}

impl Default for FakeTools {
    fn default() -> Self {
        Self {
            frames: 5,
            fail: false,
            missing: false,
            fps: "24000/1001",
        }
    }
}

#[async_trait]
impl ToolRunner for FakeTools {
    async fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput, ToolError> {
        if self.missing {
            return Err(ToolError::NotFound(program.to_string()));
        }
        let ok = |stdout: &str| ToolOutput {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        };
        match program {
            "ffmpeg" if args.len() == 1 => Ok(ok("ffmpeg version fake")),
            "ffmpeg" => {
                let pattern = PathBuf::from(args.last().expect("output pattern"));
                let dir = pattern.parent().expect("pattern dir");
                std::fs::write(dir.join("000001.jpg"), b"\xff\xd8\xff").expect("write frame");
                if self.fail {
                    return Ok(ToolOutput {
                        exit_code: 1,
                        stdout: String::new(),
                        stderr: "upload.mp4: Invalid data found when processing input".into(),
                    });
                }
                for i in 2..=self.frames {
                    std::fs::write(dir.join(format!("{i:06}.jpg")), b"\xff\xd8\xff")
                        .expect("write frame");
                }
                Ok(ok(""))
            }
            "ffprobe" => Ok(ok(self.fps)),
            other => panic!("unexpected program {other}"),
        }
    }
}

/// A router over an isolated temporary storage root.
pub struct TestApp {
    pub app: Router,
    pub layout: StorageLayout,
    _root: TempDir,
}

/// Build the full application router with all middleware layers, backed by
/// `tools` and a fresh temporary storage root.
pub async fn build_test_app(tools: FakeTools) -> TestApp {
    build_test_app_with(tools, |_| {}).await
}

/// [`build_test_app`] with `configure` applied to the test config first.
pub async fn build_test_app_with(
    tools: FakeTools,
    configure: impl FnOnce(&mut ServerConfig),
) -> TestApp {
    let root = tempfile::tempdir().expect("create temp dir");
    let mut config = test_config(root.path());
    configure(&mut config);
    let layout = config.storage_layout();
    layout.ensure_dirs().await.expect("ensure dirs");

    let state = AppState::new(config.clone(), Arc::new(tools));
    let app = build_app_router(state, &config);

    TestApp {
        app,
        layout,
        _root: root,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a single-file multipart form to `/api/videos`.
pub async fn post_upload(
    app: Router,
    file_name: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> Response<Body> {
    let mut disposition = r#"Content-Disposition: form-data; name="file""#.to_string();
    if let Some(name) = file_name {
        disposition.push_str(&format!(r#"; filename="{name}""#));
    }

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n{disposition}\r\n").as_bytes());
    if let Some(ct) = content_type {
        body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    post_multipart(app, body).await
}

/// POST a raw multipart body to `/api/videos`.
pub async fn post_multipart(app: Router, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri("/api/videos")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Sorted entry names of `dir`.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
