//! Captions Module
//!
//! Subtitle file export for the subtitle track.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Subtitle Export                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  formats.rs    - Clip → cue selection, SRT/VTT rendering        │
//! │  export.rs     - Cancellable file export, Exportation record    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use crate::core::captions::{collect_cues, export_srt, TextSource};
//!
//! let clips = project.timeline().subtitle_clips();
//! let cues = collect_cues(clips, &[TextSource::Arabic], None);
//! let srt = export_srt(&cues);
//! ```

mod export;
mod formats;

pub use export::{
    export_subtitle_file, CancelToken, ExportState, Exportation, SubtitleExportRequest,
    VideoDimensions,
};
pub use formats::{
    collect_cues, cue_for_clip, cue_text, export_srt, export_vtt, format_srt_timestamp,
    format_vtt_timestamp, generate_subtitle_file, SubtitleCue, SubtitleFormat, TextSource,
};
