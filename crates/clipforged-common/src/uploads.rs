//! The working directory that uploads land in and outputs are written to.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::{Error, Result};

/// Working directory used when none is configured.
pub const DEFAULT_WORK_DIR: &str = "./uploads";

/// Name given to uploads whose name sanitizes to nothing.
pub const FALLBACK_NAME: &str = "upload";

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9.\-]+").expect("constant regex pattern is valid"));
static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.\-]{2,}").expect("constant regex pattern is valid"));

/// Reduce `name` to a safe, lower-case file name.
///
/// Characters outside `[a-z0-9.-]` (after ASCII lower-casing) collapse into a
/// single `-`, runs of `.`/`-` shrink to one `.` (or `-` if the run has no
/// dot), and
/// separators at either end are dropped. The result never contains a path
/// separator and is stable under repeated sanitization.
///
/// ```
/// use clipforged_common::sanitize_filename;
///
/// assert_eq!(sanitize_filename("My Holiday Clip (1).MP4"), "my-holiday-clip-1.mp4");
/// assert_eq!(sanitize_filename("../../etc/passwd"), "etc-passwd");
/// assert_eq!(sanitize_filename("???"), "upload");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let lowered = name.to_ascii_lowercase();
    let replaced = DISALLOWED.replace_all(&lowered, "-");
    let collapsed = SEPARATOR_RUN.replace_all(&replaced, |caps: &regex::Captures<'_>| {
        if caps[0].contains('.') {
            "."
        } else {
            "-"
        }
    });
    let trimmed = collapsed.trim_matches(|c| c == '-' || c == '.');

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A file written by [`UploadStore::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// Sanitized name within the store.
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Flat directory holding uploaded inputs and produced outputs.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl Default for UploadStore {
    fn default() -> Self {
        Self::new(DEFAULT_WORK_DIR)
    }
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure(&self) -> Result<&Path> {
        if !self.root.is_dir() {
            std::fs::create_dir_all(&self.root)?;
            tracing::info!(dir = %self.root.display(), "created working directory");
        }
        Ok(&self.root)
    }

    /// Write `bytes` under the sanitized form of `original_name`.
    ///
    /// An existing file with the same sanitized name is replaced.
    pub fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile> {
        let filename = sanitize_filename(original_name);
        let path = self.ensure()?.join(&filename);

        std::fs::write(&path, bytes)?;
        tracing::info!(original = original_name, filename = %filename, size = bytes.len(), "stored upload");

        Ok(StoredFile {
            filename,
            path,
            size: bytes.len() as u64,
        })
    }

    /// Copy an existing file into the store.
    pub fn import(&self, source: &Path) -> Result<StoredFile> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::invalid_input(format!("{} has no file name", source.display())))?;
        let bytes = std::fs::read(source).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::not_found(source.display().to_string()),
            _ => Error::Io(e),
        })?;
        self.save(&name, &bytes)
    }

    /// Locate an input file.
    ///
    /// A bare file name is looked up in the store; anything containing a
    /// path separator is taken as given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.trim().is_empty() {
            return Err(Error::invalid_input("empty file name"));
        }

        let candidate = Path::new(name);
        let path = if candidate.components().count() == 1 && !candidate.is_absolute() {
            self.root.join(candidate)
        } else {
            candidate.to_path_buf()
        };

        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::not_found(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sanitize_examples() {
        let cases = [
            ("Clip.MP4", "clip.mp4"),
            ("my video final.mov", "my-video-final.mov"),
            ("a___b", "a-b"),
            ("Take (2).MOV", "take-2.mov"),
            ("weird..--name", "weird.name"),
            ("-.hidden.", "hidden"),
            ("été.mkv", "t.mkv"),
            ("/tmp/x.webm", "tmp-x.webm"),
            ("", FALLBACK_NAME),
            ("...", FALLBACK_NAME),
            ("日本語", FALLBACK_NAME),
        ];
        for (input, expected) in cases {
            assert_eq!(sanitize_filename(input), expected, "{input:?}");
        }
    }

    #[test]
    fn fallback_is_already_sanitized() {
        assert_eq!(sanitize_filename(FALLBACK_NAME), FALLBACK_NAME);
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(name in "\\PC{0,40}") {
            let once = sanitize_filename(&name);
            prop_assert_eq!(sanitize_filename(&once), once);
        }

        #[test]
        fn sanitize_output_is_restricted(name in "\\PC{0,40}") {
            let out = sanitize_filename(&name);
            prop_assert!(!out.is_empty());
            prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'));
            prop_assert!(!out.starts_with(['.', '-']));
            prop_assert!(!out.ends_with(['.', '-']));
        }
    }

    #[test]
    fn save_creates_dir_and_sanitizes() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let stored = store.save("Team Photo.PNG", b"abc").unwrap();
        assert_eq!(stored.filename, "team-photo.png");
        assert_eq!(stored.size, 3);
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"abc");
        assert_eq!(stored.path.parent().unwrap(), store.root());
    }

    #[test]
    fn import_copies_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Source File.mp4");
        std::fs::write(&source, b"data").unwrap();

        let store = UploadStore::new(dir.path().join("work"));
        let stored = store.import(&source).unwrap();
        assert_eq!(stored.filename, "source-file.mp4");
        assert!(matches!(
            store.import(&dir.path().join("missing.mp4")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn resolve_bare_names_in_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        std::fs::write(dir.path().join("in.mp4"), b"x").unwrap();

        assert_eq!(store.resolve("in.mp4").unwrap(), dir.path().join("in.mp4"));
        let absolute = dir.path().join("in.mp4");
        assert_eq!(store.resolve(absolute.to_str().unwrap()).unwrap(), absolute);
        assert!(matches!(store.resolve("nope.mp4"), Err(Error::NotFound(_))));
        assert!(matches!(store.resolve(" "), Err(Error::InvalidInput(_))));
    }
}
