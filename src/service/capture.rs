use clipforged_av::{CaptureStatus, StopStatus};
use clipforged_common::OperationResult;

use super::MediaService;

impl MediaService {
    /// Start a background capture running `command` (an allow-listed
    /// ffmpeg command line) that writes `output_file`.
    ///
    /// A capture that is already running is superseded unless the session
    /// was configured to reject.
    pub async fn capture_start(&self, command: &str, output_file: &str) -> OperationResult {
        let validated = match self.policy.validate(command) {
            Ok(v) => v,
            Err(e) => return OperationResult::failed("Command rejected", e.to_string()),
        };
        let dir = match self.work_dir() {
            Ok(dir) => dir,
            Err(failed) => return failed,
        };

        match self
            .capture
            .start(validated.line(), output_file, Some(dir))
            .await
        {
            Ok(()) => OperationResult::ok("Capture started").with_output_file(output_file),
            Err(e) => OperationResult::failed("Capture not started", e.to_string()),
        }
    }

    pub async fn capture_stop(&self) -> OperationResult {
        let outcome = self.capture.stop().await;
        match (outcome.status, outcome.filename) {
            (StopStatus::Stopped, Some(file)) => {
                OperationResult::ok("Capture stopped").with_output_file(file)
            }
            (StopStatus::Stopped, None) => OperationResult::ok("Capture stopped"),
            (StopStatus::NotRunning, _) => OperationResult::ok("No capture running"),
        }
    }

    pub async fn capture_status(&self) -> CaptureStatus {
        self.capture.status().await
    }
}
