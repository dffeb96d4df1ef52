//! Shared test harness for integration tests.
//!
//! [`FakeTools`] writes stand-in `ffmpeg` / `ffprobe` shell scripts into a
//! temporary directory together with a working directory, so operations can
//! be exercised without a real media toolchain.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use clipforged::config::Config;
use clipforged::MediaService;
use clipforged_av::CaptureSession;
use tempfile::TempDir;

/// Echoes its arguments, fails on `FAIL`, hangs on `HANG`, runs forever on
/// `CAPTURE`, and otherwise creates its last argument when it looks like a
/// media file.
const FAKE_FFMPEG: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
    echo "ffmpeg version 6.1-fake"
    exit 0
fi
case "$*" in *CAPTURE*) exec sleep 30;; esac
echo "fake-ffmpeg $*"
echo "frame=1 fps=0.0 q=-1.0" 1>&2
case "$*" in *FAIL*) echo "Invalid data found when processing input" 1>&2; exit 1;; esac
case "$*" in *HANG*) sleep 30;; esac
last=""
for a in "$@"; do last="$a"; done
case "$last" in *.mp4|*.mkv|*.mov|*.webm) : > "$last";; esac
exit 0
"#;

/// Prints a fixed two-stream dump for any existing file.
const FAKE_FFPROBE: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
    echo "ffprobe version 6.1-fake"
    exit 0
fi
last=""
for a in "$@"; do last="$a"; done
if [ ! -f "$last" ]; then
    echo "$last: No such file or directory" 1>&2
    exit 1
fi
cat <<'OUT'
[STREAM]
index=0
codec_name=h264
codec_type=video
width=1280
height=720
[/STREAM]
[STREAM]
index=1
codec_name=aac
codec_type=audio
channels=2
[/STREAM]
[FORMAT]
format_name=mov,mp4,m4a,3gp,3g2,mj2
duration=12.300000
bit_rate=800000
[/FORMAT]
OUT
"#;

pub struct FakeTools {
    pub dir: TempDir,
    pub work_dir: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl FakeTools {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();

        let ffmpeg = write_script(&bin, "ffmpeg", FAKE_FFMPEG);
        let ffprobe = write_script(&bin, "ffprobe", FAKE_FFPROBE);
        let work_dir = dir.path().join("uploads");

        Self {
            dir,
            work_dir,
            ffmpeg,
            ffprobe,
        }
    }

    pub fn config(&self) -> Config {
        let mut config = Config {
            work_dir: self.work_dir.clone(),
            ..Config::default()
        };
        config.tools.ffmpeg = self.ffmpeg.display().to_string();
        config.tools.ffprobe = self.ffprobe.display().to_string();
        config
    }

    /// A service with its own capture session.
    pub fn service(&self) -> MediaService {
        self.service_with(self.config())
    }

    /// A service for `config` with its own capture session, using the
    /// configured capture policy.
    pub fn service_with(&self, config: Config) -> MediaService {
        let session: &'static CaptureSession = Box::leak(Box::new(CaptureSession::with_policy(
            config.capture.on_active,
        )));
        MediaService::with_capture_session(config, session)
    }

    /// Write the harness configuration as a TOML file and return its path.
    pub fn config_file(&self) -> PathBuf {
        let path = self.dir.path().join("clipforged.toml");
        std::fs::write(&path, toml_for(&self.config())).unwrap();
        path
    }

    /// Put a media file into the working directory.
    pub fn add_input(&self, name: &str) -> PathBuf {
        std::fs::create_dir_all(&self.work_dir).unwrap();
        let path = self.work_dir.join(name);
        std::fs::write(&path, b"not really media").unwrap();
        path
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn toml_for(config: &Config) -> String {
    format!(
        "work_dir = {:?}\n\n[tools]\nffmpeg = {:?}\nffprobe = {:?}\ntimeout_secs = {}\n",
        config.work_dir.display().to_string(),
        config.tools.ffmpeg,
        config.tools.ffprobe,
        config.tools.timeout_secs,
    )
}
