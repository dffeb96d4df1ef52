use clipforged_av::CapturePolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Directory uploads land in and commands run in.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub capture: CaptureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            tools: ToolsConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(clipforged_common::DEFAULT_WORK_DIR)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Transcoding engine, as a name on PATH or a path.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    /// Hard limit for every non-capture invocation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Inject `-y` into ffmpeg command lines.
    #[serde(default = "default_true")]
    pub overwrite: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            timeout_secs: default_timeout_secs(),
            overwrite: true,
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_timeout_secs() -> u64 {
    clipforged_av::DEFAULT_TIMEOUT.as_secs()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// What starting a capture does while another one runs.
    #[serde(default)]
    pub on_active: CapturePolicy,
}
