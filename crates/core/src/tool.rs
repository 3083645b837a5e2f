//! External tool invocation.
//!
//! Defines [`ToolRunner`], the seam between domain code and child processes,
//! along with [`ToolOutput`] and [`ToolError`]. [`SystemToolRunner`] is the
//! production implementation backed by [`tokio::process::Command`].

use std::ffi::OsString;
use std::io;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Complete stdout, lossily decoded.
    pub stdout: String,
    /// Complete stderr, lossily decoded.
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors raised before a process could produce an exit status.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The program binary could not be found.
    #[error("{0} not found in PATH")]
    NotFound(String),
    /// Any other spawn or wait failure.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

/// Runs an external program to completion and captures its output.
///
/// A non-zero exit is *not* an error at this level; callers inspect
/// [`ToolOutput::exit_code`] and decide what failure means for them.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput, ToolError>;
}

/// [`ToolRunner`] that spawns real child processes.
///
/// No timeout is applied: a hung tool hangs the awaiting request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolRunner;

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn run(&self, program: &str, args: &[OsString]) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ToolError::NotFound(program.to_string()),
                _ => ToolError::Io(e),
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(
            program,
            exit_code,
            duration_ms = start.elapsed().as_millis() as u64,
            "External tool finished"
        );

        Ok(ToolOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
