//! External tool detection.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::{Error, Result, ToolCommand};

/// How long a `-version` probe may take.
const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of the tool's version banner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Check a tool by running it with `version_arg`.
///
/// `program` may be a bare name (looked up on `PATH`) or a path.
pub async fn check_tool_with_arg(program: &str, version_arg: &str) -> ToolInfo {
    let result = ToolCommand::new(program)
        .arg(version_arg)
        .timeout(VERSION_TIMEOUT)
        .output()
        .await;

    match result {
        Ok(output) => ToolInfo {
            name: program.to_string(),
            available: true,
            version: output.combined.lines().next().map(str::to_string),
            path: resolve(program),
        },
        Err(e) => {
            tracing::debug!(program, error = %e, "tool check failed");
            ToolInfo {
                name: program.to_string(),
                available: false,
                version: None,
                path: None,
            }
        }
    }
}

/// Check the engine and inspector programs.
///
/// # Example
///
/// ```no_run
/// # async fn example() {
/// for info in clipforged_av::check_tools("ffmpeg", "ffprobe").await {
///     println!("{}: {:?}", info.name, info.version);
/// }
/// # }
/// ```
pub async fn check_tools(ffmpeg: &str, ffprobe: &str) -> Vec<ToolInfo> {
    let (engine, inspector) = tokio::join!(
        check_tool_with_arg(ffmpeg, "-version"),
        check_tool_with_arg(ffprobe, "-version"),
    );
    vec![engine, inspector]
}

/// Resolve `program` to an executable path.
///
/// # Errors
///
/// Returns [`Error::ToolNotFound`] if it is neither an existing path nor on
/// `PATH`.
pub fn require_tool(program: &str) -> Result<PathBuf> {
    resolve(program).ok_or_else(|| Error::tool_not_found(program))
}

fn resolve(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 && path.is_file() {
        return Some(path.to_path_buf());
    }
    which::which(program).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn missing_tool_is_unavailable() {
        let info = check_tool_with_arg("nonexistent_tool_12345", "-version").await;
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[test]
    fn require_missing_tool_fails() {
        assert_matches!(
            require_tool("nonexistent_tool_12345"),
            Err(Error::ToolNotFound(ref name)) if name == "nonexistent_tool_12345"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn present_tool_reports_version_line() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fakeff");
        std::fs::write(&script, "#!/bin/sh\necho \"fakeff version 6.1\"\necho extra\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let info = check_tool_with_arg(script.to_str().unwrap(), "-version").await;
        assert!(info.available);
        assert_eq!(info.version.as_deref(), Some("fakeff version 6.1"));
        assert_eq!(info.path.as_deref(), Some(script.as_path()));
    }
}
