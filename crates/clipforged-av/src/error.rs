//! Error types for clipforged-av.

use std::time::Duration;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running or inspecting external tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input was rejected before any process was spawned.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required tool is not on PATH.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The executable could not be launched at all.
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully.
    #[error("{}", describe_exit(.code))]
    Execution {
        tool: String,
        code: Option<i32>,
        /// Whatever was captured before the process exited.
        output: String,
    },

    /// The process outlived its time bound and was killed.
    #[error("Command timed out")]
    Timeout { tool: String, after: Duration },

    /// The caller cancelled the invocation and the process was killed.
    #[error("Command cancelled")]
    Cancelled { tool: String },

    /// Tool output could not be interpreted.
    #[error("failed to parse {tool} output: {message}")]
    Parse { tool: String, message: String },

    /// A capture is running and the session refuses to supersede it.
    #[error("a capture is already running{}", describe_active(.output_file))]
    CaptureActive { output_file: Option<String> },

    /// An I/O error occurred while supervising a process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("Process exited with code {code}"),
        None => "Process terminated by signal".to_string(),
    }
}

fn describe_active(output_file: &Option<String>) -> String {
    output_file
        .as_deref()
        .map(|file| format!(" ({file})"))
        .unwrap_or_default()
}

impl Error {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a tool-not-found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound(tool.into())
    }

    /// Create a spawn error.
    pub fn spawn(tool: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            tool: tool.into(),
            source,
        }
    }

    /// Create a parse error.
    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Short label for the failure class, used in operation summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::ToolNotFound(_) => "tool_not_found",
            Error::Spawn { .. } => "spawn",
            Error::Execution { .. } => "execution",
            Error::Timeout { .. } => "timeout",
            Error::Cancelled { .. } => "cancelled",
            Error::Parse { .. } => "parse",
            Error::CaptureActive { .. } => "capture",
            Error::Io(_) => "io",
        }
    }
}
