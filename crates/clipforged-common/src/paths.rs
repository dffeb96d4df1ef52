//! Path utilities for detecting media files by extension.

use std::path::Path;

const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv", "mpg", "mpeg",
];

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "aac", "m4a", "flac", "wav", "ogg", "opus"];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if a path has a video file extension.
///
/// ```
/// use std::path::Path;
/// use clipforged_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("movie.MKV")));
/// assert!(!is_video_file(Path::new("song.mp3")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

pub fn is_audio_file(path: &Path) -> bool {
    has_extension(path, AUDIO_EXTENSIONS)
}

pub fn is_image_file(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

/// Anything the engine is expected to accept as input.
pub fn is_media_file(path: &Path) -> bool {
    is_video_file(path) || is_audio_file(path) || is_image_file(path)
}
