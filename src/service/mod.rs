//! Operations service: every user-facing operation, returning the result
//! envelope.

mod batch;
mod capture;

use std::path::Path;

use clipforged_av::{
    parse_probe_output, probe_command, require_tool, CaptureSession, CommandLinePolicy,
    CommandResult, ProbeResult, ShellCommand, ToolCommand, ToolKind,
};
use clipforged_common::{OperationResult, UploadStore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;

/// Runs media operations against one working directory.
pub struct MediaService {
    config: Config,
    store: UploadStore,
    policy: CommandLinePolicy,
    capture: &'static CaptureSession,
    shutdown: CancellationToken,
}

impl MediaService {
    /// Build a service using the process-wide capture session.
    ///
    /// The first service created decides the global session's policy.
    pub fn new(config: Config) -> Self {
        if !CaptureSession::init_global(config.capture.on_active) {
            let current = CaptureSession::global().policy();
            if current != config.capture.on_active {
                warn!(?current, requested = ?config.capture.on_active, "capture session already initialised, keeping its policy");
            }
        }
        Self::with_capture_session(config, CaptureSession::global())
    }

    pub fn with_capture_session(config: Config, capture: &'static CaptureSession) -> Self {
        let store = UploadStore::new(&config.work_dir);
        let policy = CommandLinePolicy::new(&config.tools.ffmpeg, &config.tools.ffprobe)
            .overwrite(config.tools.overwrite);

        Self {
            config,
            store,
            policy,
            capture,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    /// Token that cancels every running and future argv invocation.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run a free-form ffmpeg/ffprobe command line in the working directory.
    pub async fn run_command(&self, line: &str) -> OperationResult {
        let validated = match self.policy.validate(line) {
            Ok(v) => v,
            Err(e) => return OperationResult::failed("Command rejected", e.to_string()),
        };
        let dir = match self.work_dir() {
            Ok(dir) => dir,
            Err(failed) => return failed,
        };

        let result = ShellCommand::new(validated.line())
            .current_dir(dir)
            .timeout(self.config.tools.timeout())
            .execute()
            .await;

        envelope(result, "Command executed successfully", "Command failed")
    }

    /// Run ffmpeg or ffprobe with an explicit argument vector.
    ///
    /// When `output_file` names a file in the working directory that exists
    /// after a successful run, it is reported as `outputFile`.
    pub async fn run_tool(
        &self,
        kind: ToolKind,
        args: Vec<String>,
        output_file: Option<&str>,
    ) -> OperationResult {
        if let Err(e) = require_tool(self.program(kind)) {
            return OperationResult::failed("Command failed", e.to_string());
        }
        let dir = match self.work_dir() {
            Ok(dir) => dir,
            Err(failed) => return failed,
        };

        let mut cmd = self.tool_command(kind);
        cmd.args(args).current_dir(dir);
        let result = cmd.execute().await;
        let produced = output_file.filter(|name| result.success() && dir.join(name).is_file());

        if let (Some(expected), None) = (output_file, produced) {
            if result.success() {
                warn!(expected, "tool succeeded without producing its output file");
            }
        }

        let envelope = envelope(result, "Command executed successfully", "Command failed");
        match produced {
            Some(name) => envelope.with_output_file(name),
            None => envelope,
        }
    }

    /// Inspect a file with ffprobe and return the parsed sections.
    ///
    /// Output without any format or stream section is reported as
    /// [`clipforged_av::Error::Parse`].
    pub async fn probe_info(&self, path: &Path) -> clipforged_av::Result<ProbeResult> {
        let ffprobe = self.program(ToolKind::Inspector);
        require_tool(ffprobe)?;

        let mut cmd = probe_command(ffprobe, &path.to_string_lossy());
        cmd.timeout(self.config.tools.timeout())
            .cancel_token(self.shutdown.child_token());
        let output = cmd.output().await?;

        let info = parse_probe_output(&output.stdout);
        if info.is_empty() {
            return Err(clipforged_av::Error::parse_error(
                ffprobe,
                "no format or stream information in output",
            ));
        }
        Ok(info)
    }

    /// [`MediaService::probe_info`] for a file in the working directory, with
    /// the parsed result as JSON in `output`.
    pub async fn probe(&self, file: &str) -> OperationResult {
        let path = match self.store.resolve(file) {
            Ok(path) => path,
            Err(e) => return OperationResult::failed("Probe failed", e.to_string()),
        };

        match self.probe_info(&path).await {
            Ok(info) => match serde_json::to_string_pretty(&info) {
                Ok(json) => OperationResult::ok(format!(
                    "Probed {file}: {} stream(s)",
                    info.streams.len()
                ))
                .with_output(json),
                Err(e) => OperationResult::failed("Probe failed", e.to_string()),
            },
            Err(e) => {
                let output = match &e {
                    clipforged_av::Error::Execution { output, .. } => output.clone(),
                    _ => String::new(),
                };
                OperationResult::failed("Probe failed", e.to_string()).with_output(output)
            }
        }
    }

    /// Store uploaded bytes under a sanitized name.
    pub fn upload(&self, original_name: &str, bytes: &[u8]) -> OperationResult {
        match self.store.save(original_name, bytes) {
            Ok(stored) => OperationResult::ok(format!("Uploaded {} bytes", stored.size))
                .with_output_file(stored.filename),
            Err(e) => OperationResult::failed("Upload failed", e.to_string()),
        }
    }

    /// Copy a local file into the working directory.
    pub fn upload_path(&self, source: &Path) -> OperationResult {
        match self.store.import(source) {
            Ok(stored) => OperationResult::ok(format!("Uploaded {} bytes", stored.size))
                .with_output_file(stored.filename),
            Err(e) => OperationResult::failed("Upload failed", e.to_string()),
        }
    }

    fn program(&self, kind: ToolKind) -> &str {
        match kind {
            ToolKind::Engine => &self.config.tools.ffmpeg,
            ToolKind::Inspector => &self.config.tools.ffprobe,
        }
    }

    fn tool_command(&self, kind: ToolKind) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program(kind));
        cmd.timeout(self.config.tools.timeout())
            .cancel_token(self.shutdown.child_token());
        cmd
    }

    fn work_dir(&self) -> Result<&Path, OperationResult> {
        self.store.ensure().map_err(|e| {
            OperationResult::failed("Working directory unavailable", e.to_string())
        })
    }
}

fn envelope(result: CommandResult, ok_message: &str, failed_message: &str) -> OperationResult {
    if result.success() {
        info!(message = ok_message, "operation succeeded");
        OperationResult::ok(ok_message).with_output(result.into_output())
    } else {
        let error = result.error().unwrap_or("unknown error").to_string();
        info!(message = failed_message, error = %error, "operation failed");
        OperationResult::failed(failed_message, error).with_output(result.into_output())
    }
}
