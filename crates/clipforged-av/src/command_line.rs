//! Allow-list for free-form command lines.
//!
//! Command lines handed to [`crate::ShellCommand`] are interpreted by the
//! shell, so only invocations of the two media tools are let through.

use crate::{Error, Result};

/// Which media tool a command line invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// The transcoding engine (`ffmpeg`).
    Engine,
    /// The inspection tool (`ffprobe`).
    Inspector,
}

/// A command line that passed [`CommandLinePolicy::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCommand {
    kind: ToolKind,
    line: String,
}

impl ValidatedCommand {
    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    /// The command line to hand to the shell.
    pub fn line(&self) -> &str {
        &self.line
    }
}

/// Decides which command lines may run and rewrites them for execution.
#[derive(Debug, Clone)]
pub struct CommandLinePolicy {
    ffmpeg: String,
    ffprobe: String,
    overwrite: bool,
}

impl Default for CommandLinePolicy {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl CommandLinePolicy {
    /// Allow the given engine and inspector programs (names or paths).
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            overwrite: true,
        }
    }

    /// Whether engine command lines get `-y` injected.
    pub fn overwrite(mut self, enabled: bool) -> Self {
        self.overwrite = enabled;
        self
    }

    /// Accept `raw` if its first word names one of the allowed tools.
    ///
    /// The first word may be the bare tool name (`ffmpeg`) or exactly the
    /// configured program; either way it is replaced by the configured
    /// program. Engine invocations get `-y` right after the program unless
    /// `-y` or `-n` is already among the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for empty input or any other program.
    pub fn validate(&self, raw: &str) -> Result<ValidatedCommand> {
        let trimmed = raw.trim();
        let (first, rest) = match trimmed.find(char::is_whitespace) {
            Some(idx) => trimmed.split_at(idx),
            None => (trimmed, ""),
        };

        if first.is_empty() {
            return Err(Error::validation("empty command"));
        }

        let kind = if first == "ffmpeg" || first == self.ffmpeg {
            ToolKind::Engine
        } else if first == "ffprobe" || first == self.ffprobe {
            ToolKind::Inspector
        } else {
            tracing::warn!(program = first, "rejected command line");
            return Err(Error::validation(format!(
                "Only ffmpeg and ffprobe commands are allowed, got '{first}'"
            )));
        };

        let program = match kind {
            ToolKind::Engine => &self.ffmpeg,
            ToolKind::Inspector => &self.ffprobe,
        };

        let mut line = quote_program(program);
        if kind == ToolKind::Engine && self.overwrite && !has_overwrite_flag(rest) {
            line.push_str(" -y");
        }
        line.push_str(rest);

        Ok(ValidatedCommand { kind, line })
    }
}

fn has_overwrite_flag(args: &str) -> bool {
    args.split_whitespace().any(|a| a == "-y" || a == "-n")
}

fn quote_program(program: &str) -> String {
    let plain = program
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '\\' | '.' | '_' | '-' | ':'));
    if plain {
        return program.to_string();
    }

    #[cfg(unix)]
    {
        format!("'{}'", program.replace('\'', r"'\''"))
    }
    #[cfg(not(unix))]
    {
        format!("\"{program}\"")
    }
}
