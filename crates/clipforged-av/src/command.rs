//! Builder for running an executable with an explicit argument vector.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::process::{self, Stream, ToolOutput};
use crate::{CommandResult, Result};

/// Default command timeout: 10 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// A builder for constructing and executing external tool invocations.
///
/// Arguments are handed to the process as-is; nothing is interpreted by a
/// shell. Standard output and standard error are read concurrently and merged
/// in arrival order.
///
/// # Example
///
/// ```no_run
/// use clipforged_av::ToolCommand;
///
/// # async fn example() {
/// let result = ToolCommand::new("ffmpeg")
///     .args(["-i", "in.mp4", "-ss", "00:00:01", "-to", "00:00:05"])
///     .args(["-c", "copy", "trimmed_in.mp4"])
///     .current_dir("uploads")
///     .execute()
///     .await;
/// assert!(result.success());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl ToolCommand {
    /// Create a new command for the given program name or path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            timeout: DEFAULT_TIMEOUT,
            cancel: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Run the process in `dir` instead of the current directory.
    pub fn current_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Kill the process early when `token` is cancelled.
    pub fn cancel_token(&mut self, token: CancellationToken) -> &mut Self {
        self.cancel = Some(token);
        self
    }

    /// The tool name used in logs and errors (file name of the program).
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// The argument vector, as it will be passed to the process.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Run the command and return its captured output.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Spawn`] if the executable cannot be launched.
    /// - [`crate::Error::Execution`] if it exits non-zero (carries the output).
    /// - [`crate::Error::Timeout`] if it outlives the timeout.
    /// - [`crate::Error::Cancelled`] if the cancel token fires first.
    pub async fn output(&self) -> Result<ToolOutput> {
        self.output_with_line_callback(|_, _| {}).await
    }

    /// Like [`ToolCommand::output`], invoking `on_line` for every line as it
    /// arrives on either stream.
    pub async fn output_with_line_callback(
        &self,
        on_line: impl FnMut(Stream, &str),
    ) -> Result<ToolOutput> {
        let tool = self.tool_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        tracing::info!(tool = %tool, args = ?self.args, "exec");

        process::supervise(cmd, &tool, self.timeout, self.cancel.as_ref(), on_line).await
    }

    /// Run the command and fold every outcome into a [`CommandResult`].
    pub async fn execute(&self) -> CommandResult {
        self.output().await.into()
    }
}
