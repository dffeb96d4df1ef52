//! Run a free-form command line through the platform shell.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use crate::command::DEFAULT_TIMEOUT;
use crate::process::{self, ToolOutput};
use crate::{CommandResult, Result};

#[cfg(unix)]
pub(crate) const SHELL: &str = "sh";
#[cfg(windows)]
pub(crate) const SHELL: &str = "cmd";

/// Build a command that hands `line` to the shell.
pub(crate) fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new(SHELL);
    #[cfg(unix)]
    cmd.arg("-c").arg(line);
    #[cfg(windows)]
    cmd.arg("/C").arg(line);
    cmd
}

/// A command line executed by the shell, with output merged and a hard
/// timeout.
///
/// Only use this with command lines that were validated first (see
/// [`crate::CommandLinePolicy`]); the shell interprets the whole string.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    line: String,
    working_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ShellCommand {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            working_dir: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn current_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Run the command line and return its captured output.
    pub async fn output(&self) -> Result<ToolOutput> {
        let mut cmd = shell_command(&self.line);
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        tracing::info!(command = %self.line, "shell");

        process::supervise(cmd, SHELL, self.timeout, None, |_, _| {}).await
    }

    /// Run the command line and fold every outcome into a [`CommandResult`].
    pub async fn execute(&self) -> CommandResult {
        self.output().await.into()
    }
}
