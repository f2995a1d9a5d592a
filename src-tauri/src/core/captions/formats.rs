//! Subtitle File Formats
//!
//! Turns the text-bearing clips of a subtitle track into SRT (SubRip) or
//! WebVTT documents.
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! بِسْمِ ٱللَّهِ
//! In the name of Allah
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::project::ARABIC_TARGET;
use crate::core::timeline::Clip;
use crate::core::{CoreError, TimeMs, TimeRange};

// =============================================================================
// Format
// =============================================================================

/// Subtitle file format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubtitleFormat {
    #[default]
    Srt,
    Vtt,
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubtitleFormat::Srt => f.write_str("SRT"),
            SubtitleFormat::Vtt => f.write_str("VTT"),
        }
    }
}

impl FromStr for SubtitleFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "srt" => Ok(SubtitleFormat::Srt),
            "vtt" | "webvtt" => Ok(SubtitleFormat::Vtt),
            other => Err(CoreError::ValidationError(format!(
                "Unsupported subtitle format: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// Text Sources
// =============================================================================

/// Where a cue's text comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextSource {
    /// The clip's Arabic text
    Arabic,
    /// The clip's translation under this language/edition key
    Translation(String),
}

impl TextSource {
    /// `"arabic"` selects the Arabic text, anything else a translation key.
    pub fn from_target(target: &str) -> Self {
        if target == ARABIC_TARGET {
            TextSource::Arabic
        } else {
            TextSource::Translation(target.to_string())
        }
    }

    fn text_of<'a>(&self, clip: &'a Clip) -> Option<&'a str> {
        match self {
            TextSource::Arabic => clip.text(),
            TextSource::Translation(key) => clip.translation(key).map(|t| t.text.as_str()),
        }
    }
}

// =============================================================================
// Cues
// =============================================================================

/// One subtitle block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtitleCue {
    pub start_ms: TimeMs,
    pub end_ms: TimeMs,
    pub text: String,
}

/// Text of `clip` for the given sources, one line per source.
///
/// Returns `None` for silences and asset clips.
pub fn cue_text(clip: &Clip, sources: &[TextSource]) -> Option<String> {
    if clip.is_silence() || !clip.is_text_bearing() {
        return None;
    }

    let mut text = String::new();
    for source in sources {
        text.push_str(source.text_of(clip).unwrap_or_default());
        text.push('\n');
    }
    Some(text.trim().to_string())
}

/// Cue for `clip`, or `None` when it carries no text or lies outside `window`.
pub fn cue_for_clip(
    clip: &Clip,
    sources: &[TextSource],
    window: Option<TimeRange>,
) -> Option<SubtitleCue> {
    if let Some(window) = window {
        if clip.start_time() < window.start_ms || clip.end_time() > window.end_ms {
            return None;
        }
    }

    cue_text(clip, sources).map(|text| SubtitleCue {
        start_ms: clip.start_time(),
        end_ms: clip.end_time(),
        text,
    })
}

/// Cues for every text-bearing clip inside `window`, in ascending time order
pub fn collect_cues(
    clips: &[Clip],
    sources: &[TextSource],
    window: Option<TimeRange>,
) -> Vec<SubtitleCue> {
    let mut cues: Vec<SubtitleCue> = clips
        .iter()
        .filter_map(|clip| cue_for_clip(clip, sources, window))
        .collect();
    cues.sort_by_key(|cue| cue.start_ms);
    cues
}

// =============================================================================
// Rendering
// =============================================================================

/// Renders `cues` in `format`
pub fn generate_subtitle_file(cues: &[SubtitleCue], format: SubtitleFormat) -> String {
    match format {
        SubtitleFormat::Srt => export_srt(cues),
        SubtitleFormat::Vtt => export_vtt(cues),
    }
}

/// Exports cues to SRT format
pub fn export_srt(cues: &[SubtitleCue]) -> String {
    render(cues, SubtitleFormat::Srt)
}

/// Exports cues to WebVTT format
pub fn export_vtt(cues: &[SubtitleCue]) -> String {
    render(cues, SubtitleFormat::Vtt)
}

fn render(cues: &[SubtitleCue], format: SubtitleFormat) -> String {
    let mut output = String::from(file_header(format));
    for (index, cue) in cues.iter().enumerate() {
        if !output.is_empty() {
            output.push_str(BLOCK_SEPARATOR);
        }
        output.push_str(&format_block(index, cue, format));
    }
    output.trim().to_string()
}

/// Blank line between two blocks
pub(crate) const BLOCK_SEPARATOR: &str = "\n\n";

/// First line of the file, if the format has one
pub(crate) fn file_header(format: SubtitleFormat) -> &'static str {
    match format {
        SubtitleFormat::Srt => "",
        SubtitleFormat::Vtt => "WEBVTT",
    }
}

/// `"{n}\n{start} --> {end}\n{text}"` with a 1-based `n`
pub(crate) fn format_block(index: usize, cue: &SubtitleCue, format: SubtitleFormat) -> String {
    let (start, end) = match format {
        SubtitleFormat::Srt => (
            format_srt_timestamp(cue.start_ms),
            format_srt_timestamp(cue.end_ms),
        ),
        SubtitleFormat::Vtt => (
            format_vtt_timestamp(cue.start_ms),
            format_vtt_timestamp(cue.end_ms),
        ),
    };
    format!("{}\n{} --> {}\n{}", index + 1, start, end, cue.text)
}

/// Splits milliseconds into (hours, minutes, seconds, millis)
fn split_timestamp(ms: TimeMs) -> (i64, i64, i64, i64) {
    let total_ms = ms.max(0);
    let millis = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs % 3600) / 60;
    let hours = total_secs / 3600;
    (hours, mins, secs, millis)
}

/// Formats milliseconds as an SRT timestamp (00:00:00,000)
pub fn format_srt_timestamp(ms: TimeMs) -> String {
    let (hours, mins, secs, millis) = split_timestamp(ms);
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

/// Formats milliseconds as a VTT timestamp (00:00:00.000)
pub fn format_vtt_timestamp(ms: TimeMs) -> String {
    let (hours, mins, secs, millis) = split_timestamp(ms);
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
}

// =============================================================================
// Tests
// =============================================================================
