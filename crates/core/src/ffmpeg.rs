//! FFmpeg/FFprobe command wrappers.
//!
//! [`Ffmpeg`] builds the fixed argument templates for frame extraction and
//! frame-rate probing and interprets the results. Process spawning goes
//! through a [`ToolRunner`].

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use crate::error::CoreError;
use crate::tool::{ToolError, ToolOutput, ToolRunner};

/// Default ffmpeg program name, resolved through `PATH`.
pub const DEFAULT_FFMPEG_BIN: &str = "ffmpeg";

/// Default ffprobe program name, resolved through `PATH`.
pub const DEFAULT_FFPROBE_BIN: &str = "ffprobe";

/// Output filename pattern: 6-digit zero-padded sequence.
pub const FRAME_FILE_PATTERN: &str = "%06d.jpg";

/// Extension of extracted frame images (no leading dot).
pub const FRAME_EXTENSION: &str = "jpg";

/// `-q:v` value passed to ffmpeg for JPEG output.
const JPEG_QUALITY: &str = "2";

/// Error type for FFmpeg/FFprobe operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("{0} not found in PATH.")]
    NotFound(String),

    #[error("ffmpeg execution failed (exit code {exit_code}): {stderr}")]
    ExecutionFailed { exit_code: i32, stderr: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<ToolError> for FfmpegError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(program) => FfmpegError::NotFound(program),
            ToolError::Io(e) => FfmpegError::IoError(e),
        }
    }
}

impl From<FfmpegError> for CoreError {
    fn from(err: FfmpegError) -> Self {
        match err {
            FfmpegError::NotFound(program) => {
                CoreError::ToolUnavailable(format!("{program} not found in PATH."))
            }
            FfmpegError::ExecutionFailed { stderr, .. } => CoreError::ExtractionFailed(stderr),
            FfmpegError::IoError(e) => CoreError::Internal(e.to_string()),
        }
    }
}

/// Handle on the ffmpeg/ffprobe pair used by the service.
#[derive(Clone)]
pub struct Ffmpeg {
    runner: Arc<dyn ToolRunner>,
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl Ffmpeg {
    /// Use the default `ffmpeg` / `ffprobe` program names.
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self::with_binaries(runner, DEFAULT_FFMPEG_BIN, DEFAULT_FFPROBE_BIN)
    }

    pub fn with_binaries(
        runner: Arc<dyn ToolRunner>,
        ffmpeg_bin: impl Into<String>,
        ffprobe_bin: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    /// Check that the ffmpeg binary can be spawned at all.
    ///
    /// Runs `ffmpeg -version`; the exit status is ignored.
    pub async fn ensure_available(&self) -> Result<(), FfmpegError> {
        self.runner
            .run(&self.ffmpeg_bin, &[OsString::from("-version")])
            .await?;
        Ok(())
    }

    /// Decode every frame of `video_path` into `output_dir` as
    /// `000001.jpg`, `000002.jpg`, ...
    ///
    /// `output_dir` is created if missing. On failure the directory is left
    /// as-is; cleanup belongs to the caller.
    pub async fn extract_frames(
        &self,
        video_path: &Path,
        output_dir: &Path,
    ) -> Result<(), FfmpegError> {
        tokio::fs::create_dir_all(output_dir).await?;

        let output = self
            .runner
            .run(&self.ffmpeg_bin, &extract_args(video_path, output_dir))
            .await?;

        if !output.success() {
            return Err(FfmpegError::ExecutionFailed {
                exit_code: output.exit_code,
                stderr: diagnostic(&output),
            });
        }

        Ok(())
    }

    /// Query the nominal frame rate of the first video stream.
    ///
    /// Returns `None` on any failure: missing binary, spawn error, non-zero
    /// exit or unparseable output.
    pub async fn probe_frame_rate(&self, video_path: &Path) -> Option<f64> {
        let output = match self
            .runner
            .run(&self.ffprobe_bin, &probe_args(video_path))
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(error = %e, "ffprobe unavailable, skipping frame rate");
                return None;
            }
        };

        if !output.success() {
            tracing::debug!(
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "ffprobe failed, skipping frame rate"
            );
            return None;
        }

        parse_frame_rate(&output.stdout)
    }

    /// [`probe_frame_rate`](Self::probe_frame_rate) with `0.0` standing in
    /// for "unavailable".
    pub async fn read_frame_rate(&self, video_path: &Path) -> f64 {
        self.probe_frame_rate(video_path).await.unwrap_or(0.0)
    }
}

/// `ffmpeg -hide_banner -y -i <video> -q:v 2 -start_number 1 <dir>/%06d.jpg`
pub fn extract_args(video_path: &Path, output_dir: &Path) -> Vec<OsString> {
    vec![
        "-hide_banner".into(),
        "-y".into(),
        "-i".into(),
        video_path.as_os_str().to_owned(),
        "-q:v".into(),
        JPEG_QUALITY.into(),
        "-start_number".into(),
        "1".into(),
        output_dir.join(FRAME_FILE_PATTERN).into_os_string(),
    ]
}

/// ffprobe arguments printing only the first video stream's `r_frame_rate`.
pub fn probe_args(video_path: &Path) -> Vec<OsString> {
    vec![
        "-v".into(),
        "error".into(),
        "-select_streams".into(),
        "v:0".into(),
        "-show_entries".into(),
        "stream=r_frame_rate".into(),
        "-of".into(),
        "default=noprint_wrappers=1:nokey=1".into(),
        video_path.as_os_str().to_owned(),
    ]
}

/// Parse a frame rate printed by ffprobe.
///
/// Accepts a rational like `"24000/1001"` or a plain decimal like `"25"`.
/// Only the first line is considered. A zero denominator yields the
/// numerator; non-finite values yield `None`.
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let value = raw.lines().next()?.trim();
    if value.is_empty() {
        return None;
    }

    let fps = match value.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                num
            } else {
                num / den
            }
        }
        None => value.parse::<f64>().ok()?,
    };

    fps.is_finite().then_some(fps)
}

/// Best diagnostic text from a failed run: stderr, else stdout, else a
/// fixed message.
fn diagnostic(output: &ToolOutput) -> String {
    [output.stderr.trim(), output.stdout.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or("ffmpeg failed")
        .to_string()
}
