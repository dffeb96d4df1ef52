//! Parsing of ffprobe's default (`key=value`) output.
//!
//! `ffprobe -show_format -show_streams` prints sections like:
//!
//! ```text
//! [STREAM]
//! index=0
//! codec_name=h264
//! [/STREAM]
//! [FORMAT]
//! duration=12.300000
//! [/FORMAT]
//! ```
//!
//! The parser is deliberately tolerant: unknown lines are skipped, a
//! truncated dump yields whatever was read so far, and nothing panics.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ToolCommand;

/// Line that opens the format section.
pub const FORMAT_MARKER: &str = "[FORMAT]";
/// Line that opens a new stream record.
pub const STREAM_MARKER: &str = "[STREAM]";

/// Keys and values of one section, in the order they were printed.
pub type ProbeSection = IndexMap<String, String>;

/// Structured ffprobe output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub format: ProbeSection,
    /// Stream records in the order their `[STREAM]` markers appeared.
    pub streams: Vec<ProbeSection>,
}

impl ProbeResult {
    /// Container duration in seconds, if reported.
    pub fn duration(&self) -> Option<f64> {
        self.format.get("duration")?.parse().ok()
    }

    /// Streams whose `codec_type` equals `codec_type` ("video", "audio", ...).
    pub fn streams_of_type<'a>(
        &'a self,
        codec_type: &'a str,
    ) -> impl Iterator<Item = &'a ProbeSection> + 'a {
        self.streams
            .iter()
            .filter(move |s| s.get("codec_type").map(String::as_str) == Some(codec_type))
    }

    /// True when the dump held no section at all.
    pub fn is_empty(&self) -> bool {
        self.format.is_empty() && self.streams.is_empty()
    }
}

/// Build the inspector invocation whose output [`parse_probe_output`] reads.
pub fn probe_command(ffprobe: &str, input: &str) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffprobe);
    cmd.args(["-v", "error", "-show_format", "-show_streams"])
        .arg(input);
    cmd
}

#[derive(Clone, Copy)]
enum Section {
    None,
    Format,
    Stream,
}

/// Parse ffprobe's line-oriented output.
///
/// `key=value` lines are split on the first `=` and stored in the section
/// opened by the most recent marker. Closing markers (`[/STREAM]`), blank
/// lines and anything else without `=` are ignored, as are `key=value` lines
/// that precede the first marker.
///
/// Never fails: malformed or truncated dumps produce a partial result, and
/// input without any marker produces an empty one (see
/// [`ProbeResult::is_empty`]).
pub fn parse_probe_output(raw: &str) -> ProbeResult {
    let mut result = ProbeResult::default();
    let mut current: Option<ProbeSection> = None;
    let mut section = Section::None;
    let mut saw_marker = false;

    for line in raw.lines() {
        if line == FORMAT_MARKER {
            section = Section::Format;
            saw_marker = true;
        } else if line == STREAM_MARKER {
            if let Some(stream) = current.take() {
                result.streams.push(stream);
            }
            current = Some(ProbeSection::new());
            section = Section::Stream;
            saw_marker = true;
        } else if let Some((key, value)) = line.split_once('=') {
            let target = match section {
                Section::Format => Some(&mut result.format),
                Section::Stream => current.as_mut(),
                Section::None => None,
            };
            match target {
                Some(map) => {
                    map.insert(key.to_string(), value.to_string());
                }
                None => tracing::trace!(line, "ignoring key=value outside a section"),
            }
        }
    }

    if let Some(stream) = current.take() {
        result.streams.push(stream);
    }

    if !saw_marker {
        tracing::debug!(bytes = raw.len(), "no [FORMAT] or [STREAM] section in probe output");
    }

    result
}
