//! The uniform outcome of one runner invocation.

use serde::Serialize;

use crate::process::ToolOutput;
use crate::{Error, Result};

/// Outcome of a single process invocation.
///
/// Fields are private so the `success => no error` invariant holds for every
/// instance: build one through [`CommandResult::ok`], [`CommandResult::failed`]
/// or the `From<Result<ToolOutput>>` conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    success: bool,
    output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CommandResult {
    /// A successful invocation with its combined output.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// A failed invocation with whatever output was captured.
    pub fn failed(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.into()),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// Stdout and stderr, concatenated in arrival order.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

impl From<Result<ToolOutput>> for CommandResult {
    fn from(result: Result<ToolOutput>) -> Self {
        match result {
            Ok(output) => CommandResult::ok(output.combined),
            Err(err) => {
                let message = err.to_string();
                match err {
                    Error::Execution { output, .. } => CommandResult::failed(output, message),
                    // Timeouts discard anything collected before the kill.
                    _ => CommandResult::failed("", message),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn ok_has_no_error() {
        let result = CommandResult::ok("frame=  10");
        assert!(result.success());
        assert_eq!(result.output(), "frame=  10");
        assert!(result.error().is_none());

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("error").is_none());
    }

    #[test]
    fn execution_failure_keeps_output() {
        let result: CommandResult = Err(Error::Execution {
            tool: "ffmpeg".into(),
            code: Some(1),
            output: "in.mp4: No such file or directory\n".into(),
        })
        .into();

        assert!(!result.success());
        assert_eq!(result.output(), "in.mp4: No such file or directory\n");
        assert_eq!(result.error(), Some("Process exited with code 1"));
    }

    #[test]
    fn timeout_discards_output() {
        let result: CommandResult = Err(Error::Timeout {
            tool: "sh".into(),
            after: Duration::from_secs(600),
        })
        .into();

        assert!(!result.success());
        assert_eq!(result.output(), "");
        assert_eq!(result.error(), Some("Command timed out"));
    }
}
