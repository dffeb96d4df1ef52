//! # clipforged-av
//!
//! Process execution for the `ffmpeg` / `ffprobe` toolchain.
//!
//! - [`ToolCommand`] runs an executable with an explicit argument vector.
//! - [`ShellCommand`] runs a pre-validated command line through the shell.
//! - [`CaptureSession`] owns the single long-running background capture.
//! - [`parse_probe_output`] turns ffprobe's `key=value` dump into a
//!   [`ProbeResult`].
//! - [`CommandLinePolicy`] restricts free-form command lines to the media
//!   tools.
//!
//! Every invocation is bounded by a timeout ([`DEFAULT_TIMEOUT`] unless set)
//! and resolves to a [`CommandResult`].
//!
//! ## Example
//!
//! ```no_run
//! use clipforged_av::{parse_probe_output, probe_command};
//!
//! # async fn example() -> clipforged_av::Result<()> {
//! let output = probe_command("ffprobe", "movie.mkv").output().await?;
//! let info = parse_probe_output(&output.stdout);
//! println!("{} streams, {:?}s", info.streams.len(), info.duration());
//! # Ok(())
//! # }
//! ```

mod error;
mod process;
mod result;

pub mod capture;
pub mod command;
pub mod command_line;
pub mod probe;
pub mod shell;
pub mod template;
pub mod tools;

pub use capture::{CapturePolicy, CaptureSession, CaptureStatus, StopOutcome, StopStatus};
pub use command::{ToolCommand, DEFAULT_TIMEOUT};
pub use command_line::{CommandLinePolicy, ToolKind, ValidatedCommand};
pub use error::{Error, Result};
pub use probe::{parse_probe_output, probe_command, ProbeResult, ProbeSection};
pub use process::{Stream, ToolOutput};
pub use result::CommandResult;
pub use shell::ShellCommand;
pub use template::{BatchItem, BatchTemplate, TemplateContext};
pub use tools::{check_tool_with_arg, check_tools, require_tool, ToolInfo};
