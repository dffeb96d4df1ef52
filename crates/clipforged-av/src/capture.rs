//! Long-running background capture.
//!
//! A [`CaptureSession`] owns at most one background process at a time. The
//! process runs through the shell, has no timeout, and lives until it is
//! stopped or superseded by the next [`CaptureSession::start`]. One
//! process-wide session is available through [`CaptureSession::global`].

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Child;
use tokio::sync::Mutex;

use crate::process;
use crate::shell::{shell_command, SHELL};
use crate::{Error, Result};

/// Time a capture gets to finalize its output after SIGTERM.
const STOP_GRACE: Duration = Duration::from_secs(5);

static GLOBAL: OnceLock<CaptureSession> = OnceLock::new();

/// What `start` does when a capture is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapturePolicy {
    /// Terminate the running capture and start the new one.
    #[default]
    Supersede,
    /// Refuse to start while a capture is running.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    Stopped,
    NotRunning,
}

/// Result of [`CaptureSession::stop`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopOutcome {
    pub status: StopStatus,
    /// Output file of the capture that was stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Snapshot of the session, see [`CaptureSession::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStatus {
    /// Whether the recorded capture process is still alive.
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    /// Whether the capture process has already exited on its own.
    pub exited: bool,
}

#[derive(Default)]
struct CaptureState {
    child: Option<Child>,
    output_file: Option<String>,
}

/// Holder of the single background capture process.
///
/// `start` and `stop` are serialized by one lock, so concurrent starts resolve
/// in lock order: each one cleanly terminates its predecessor.
pub struct CaptureSession {
    state: Mutex<CaptureState>,
    policy: CapturePolicy,
    grace: Duration,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::with_policy(CapturePolicy::default())
    }

    pub fn with_policy(policy: CapturePolicy) -> Self {
        Self {
            state: Mutex::new(CaptureState::default()),
            policy,
            grace: STOP_GRACE,
        }
    }

    /// The process-wide session, created with the default policy on first use.
    pub fn global() -> &'static CaptureSession {
        GLOBAL.get_or_init(CaptureSession::new)
    }

    /// Install the process-wide session with `policy`.
    ///
    /// Returns `false` if the global session already existed; its policy is
    /// left unchanged.
    pub fn init_global(policy: CapturePolicy) -> bool {
        GLOBAL.set(CaptureSession::with_policy(policy)).is_ok()
    }

    pub fn policy(&self) -> CapturePolicy {
        self.policy
    }

    /// Start `command` in the background, recording `output_file`.
    ///
    /// A running capture is terminated first and its output abandoned, unless
    /// the session uses [`CapturePolicy::Reject`]. Returns as soon as the
    /// process has been spawned.
    pub async fn start(
        &self,
        command: &str,
        output_file: &str,
        working_dir: Option<&Path>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;

        if let Some(mut previous) = state.child.take() {
            let still_running = matches!(previous.try_wait(), Ok(None));
            if still_running && self.policy == CapturePolicy::Reject {
                let output_file = state.output_file.clone();
                state.child = Some(previous);
                return Err(Error::CaptureActive { output_file });
            }

            tracing::info!(
                abandoned = ?state.output_file,
                "superseding running capture"
            );
            process::terminate(&mut previous, self.grace).await;
            state.output_file = None;
        }

        let mut cmd = shell_command(command);
        process::detach(&mut cmd, false);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| Error::spawn(SHELL, e))?;
        tracing::info!(pid = ?child.id(), output_file, command, "capture started");

        state.child = Some(child);
        state.output_file = Some(output_file.to_string());
        Ok(())
    }

    /// Stop the running capture, if any.
    ///
    /// Safe to call repeatedly: without a capture it reports
    /// [`StopStatus::NotRunning`].
    pub async fn stop(&self) -> StopOutcome {
        let mut state = self.state.lock().await;

        match state.child.take() {
            Some(mut child) => {
                process::terminate(&mut child, self.grace).await;
                let filename = state.output_file.take();
                tracing::info!(output_file = ?filename, "capture stopped");
                StopOutcome {
                    status: StopStatus::Stopped,
                    filename,
                }
            }
            None => {
                tracing::debug!("stop requested with no capture running");
                StopOutcome {
                    status: StopStatus::NotRunning,
                    filename: None,
                }
            }
        }
    }

    /// Report whether a capture is recorded and whether it is still alive.
    ///
    /// A capture that died on its own keeps its `output_file` and reports
    /// `exited` until it is stopped or superseded.
    pub async fn status(&self) -> CaptureStatus {
        let mut state = self.state.lock().await;
        let output_file = state.output_file.clone();

        match state.child.as_mut() {
            Some(child) => {
                let exited = !matches!(child.try_wait(), Ok(None));
                CaptureStatus {
                    running: !exited,
                    output_file,
                    exited,
                }
            }
            None => CaptureStatus {
                running: false,
                output_file: None,
                exited: false,
            },
        }
    }

    #[cfg(test)]
    fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}
