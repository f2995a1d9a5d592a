//! Subtitle File Export
//!
//! Writes a subtitle file clip by clip into a temporary file, checking a
//! cancellation token between clips, and moves it into place only once every
//! block is written. Progress is reported through an [`Exportation`] record.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::formats::{cue_for_clip, file_header, format_block, BLOCK_SEPARATOR};
use super::{SubtitleFormat, TextSource};
use crate::core::fs::{atomic_replace, tmp_path_for};
use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};
use crate::core::timeline::Clip;
use crate::core::values::VerseRange;
use crate::core::{CoreError, CoreResult, Id, TimeMs, TimeRange};

// =============================================================================
// Export State
// =============================================================================

/// Stage of an export
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportState {
    #[serde(rename = "Waiting for Record")]
    WaitingForRecord,
    Recording,
    #[serde(rename = "Adding Audio")]
    AddingAudio,
    Exported,
    Error,
    Canceled,
    #[serde(rename = "Creating Video")]
    CreatingVideo,
    #[serde(rename = "Capturing Frames")]
    CapturingFrames,
    #[default]
    #[serde(rename = "Initializing...")]
    Initializing,
}

impl ExportState {
    /// Whether the export has not reached a final state yet
    pub fn is_on_going(&self) -> bool {
        !matches!(
            self,
            ExportState::Exported | ExportState::Error | ExportState::Canceled
        )
    }
}

/// Output frame size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

// =============================================================================
// Exportation
// =============================================================================

/// One export run and its progress
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exportation {
    pub export_id: Id,
    pub final_file_name: String,
    pub final_file_path: String,
    pub video_dimensions: VideoDimensions,
    pub video_start_time: TimeMs,
    pub video_end_time: TimeMs,
    pub video_length: TimeMs,
    pub verse_range: String,
    pub current_state: ExportState,
    pub percentage_progress: f64,
    pub current_treated_time: TimeMs,
    pub error_log: String,
}

impl Exportation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        export_id: Id,
        final_file_name: impl Into<String>,
        final_file_path: impl Into<String>,
        video_dimensions: VideoDimensions,
        video_start_time: TimeMs,
        video_end_time: TimeMs,
        verse_range: impl Into<String>,
        current_state: ExportState,
    ) -> Self {
        Self {
            export_id,
            final_file_name: final_file_name.into(),
            final_file_path: final_file_path.into(),
            video_dimensions,
            video_start_time,
            video_end_time,
            video_length: video_end_time - video_start_time,
            verse_range: verse_range.into(),
            current_state,
            percentage_progress: 0.0,
            current_treated_time: 0,
            error_log: String::new(),
        }
    }

    /// Record for a subtitle export of `clips` over `window` into `output`.
    ///
    /// Without a window the whole span of `clips` is used.
    pub fn for_subtitles(
        export_id: Id,
        output: &Path,
        window: Option<TimeRange>,
        clips: &[Clip],
    ) -> Self {
        let window = window.unwrap_or_else(|| {
            TimeRange::new(0, clips.last().map(Clip::end_time).unwrap_or(0))
        });
        let verse_range = VerseRange::get_verse_range(window, clips);
        let file_name = output
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        Self::new(
            export_id,
            file_name,
            output.to_string_lossy(),
            VideoDimensions::default(),
            window.start_ms,
            window.end_ms,
            verse_range.describe(),
            ExportState::Initializing,
        )
    }

    pub fn is_on_going(&self) -> bool {
        self.current_state.is_on_going()
    }

    fn fail(&mut self, error: &CoreError) {
        self.current_state = ExportState::Error;
        self.error_log = error.to_string();
    }
}

impl Serializable for Exportation {
    const TYPE_NAME: &'static str = "Exportation";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("exportId", &self.export_id)?
            .value("finalFileName", &self.final_file_name)?
            .value("finalFilePath", &self.final_file_path)?
            .value("videoDimensions", &self.video_dimensions)?
            .value("videoStartTime", &self.video_start_time)?
            .value("videoEndTime", &self.video_end_time)?
            .value("videoLength", &self.video_length)?
            .value("verseRange", &self.verse_range)?
            .value("currentState", &self.current_state)?
            .value("percentageProgress", &self.percentage_progress)?
            .value("currentTreatedTime", &self.current_treated_time)?
            .value("errorLog", &self.error_log)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        let video_start_time: TimeMs = fields.value_or_default("videoStartTime")?;
        let video_end_time: TimeMs = fields.value_or_default("videoEndTime")?;
        Ok(Self {
            export_id: fields.value("exportId")?,
            final_file_name: fields.value_or_default("finalFileName")?,
            final_file_path: fields.value_or_default("finalFilePath")?,
            video_dimensions: fields.value_or_default("videoDimensions")?,
            video_start_time,
            video_end_time,
            video_length: fields.value_or("videoLength", video_end_time - video_start_time)?,
            verse_range: fields.value_or_default("verseRange")?,
            current_state: fields.value_or_default("currentState")?,
            percentage_progress: fields.value_or_default("percentageProgress")?,
            current_treated_time: fields.value_or_default("currentTreatedTime")?,
            error_log: fields.value_or_default("errorLog")?,
        })
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Shared flag asking a running export to stop
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Export
// =============================================================================

/// What to export
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtitleExportRequest {
    pub format: SubtitleFormat,
    pub sources: Vec<TextSource>,
    pub window: Option<TimeRange>,
}

impl Default for SubtitleExportRequest {
    fn default() -> Self {
        Self {
            format: SubtitleFormat::Srt,
            sources: vec![TextSource::Arabic],
            window: None,
        }
    }
}

/// Writes the subtitle file for `clips` to `output`.
///
/// Returns the number of blocks written. On cancellation the temporary file
/// is removed, `exportation` moves to [`ExportState::Canceled`] and
/// [`CoreError::Cancelled`] is returned; `output` is left untouched.
pub async fn export_subtitle_file(
    clips: &[Clip],
    request: &SubtitleExportRequest,
    output: &Path,
    cancel: &CancelToken,
    exportation: &mut Exportation,
) -> CoreResult<usize> {
    let tmp = tmp_path_for(output);
    exportation.current_state = ExportState::Recording;
    info!(
        "Exporting {} subtitles to {}",
        request.format,
        output.display()
    );

    match write_blocks(clips, request, &tmp, cancel, exportation).await {
        Ok(count) => {
            let dest = output.to_path_buf();
            let src = tmp.clone();
            let moved = tokio::task::spawn_blocking(move || atomic_replace(&dest, &src))
                .await
                .map_err(|e| CoreError::ExportFailed(format!("Move task failed: {}", e)))
                .and_then(|result| result);
            if let Err(e) = moved {
                remove_tmp(&tmp).await;
                exportation.fail(&e);
                return Err(e);
            }

            exportation.current_state = ExportState::Exported;
            exportation.percentage_progress = 100.0;
            debug!("Wrote {} subtitle blocks", count);
            Ok(count)
        }
        Err(CoreError::Cancelled) => {
            remove_tmp(&tmp).await;
            exportation.current_state = ExportState::Canceled;
            info!("Subtitle export {} cancelled", exportation.export_id);
            Err(CoreError::Cancelled)
        }
        Err(e) => {
            remove_tmp(&tmp).await;
            warn!("Subtitle export failed: {}", e);
            exportation.fail(&e);
            Err(e)
        }
    }
}

async fn write_blocks(
    clips: &[Clip],
    request: &SubtitleExportRequest,
    tmp: &Path,
    cancel: &CancelToken,
    exportation: &mut Exportation,
) -> CoreResult<usize> {
    let mut file = tokio::fs::File::create(tmp).await?;
    let header = file_header(request.format);
    file.write_all(header.as_bytes()).await?;

    let mut started = !header.is_empty();
    let mut pending: Option<String> = None;
    let mut count = 0;
    let total = clips.len().max(1);

    for (index, clip) in clips.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        if let Some(cue) = cue_for_clip(clip, &request.sources, request.window) {
            if let Some(block) = pending.take() {
                file.write_all(block.as_bytes()).await?;
            }
            let mut block = String::new();
            if started {
                block.push_str(BLOCK_SEPARATOR);
            }
            block.push_str(&format_block(count, &cue, request.format));
            pending = Some(block);
            started = true;
            count += 1;
        }

        exportation.current_treated_time = clip.end_time();
        exportation.percentage_progress = ((index + 1) as f64 / total as f64) * 100.0;
    }

    if cancel.is_cancelled() {
        return Err(CoreError::Cancelled);
    }
    if let Some(block) = pending {
        file.write_all(block.trim_end().as_bytes()).await?;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(count)
}

async fn remove_tmp(tmp: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", tmp.display(), e);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::captions::{collect_cues, generate_subtitle_file};
    use crate::core::timeline::{ClipKind, SubtitleClip};
    use tempfile::TempDir;

    fn subtitle(start: TimeMs, end: TimeMs, verse: u32, text: &str) -> Clip {
        Clip::new(
            start,
            end,
            ClipKind::Subtitle(SubtitleClip {
                surah: 1,
                verse,
                text: text.to_string(),
                ..Default::default()
            }),
        )
        .unwrap()
    }

    fn clips() -> Vec<Clip> {
        vec![
            subtitle(0, 1000, 1, "first"),
            Clip::silence(1001, 1500).unwrap(),
            subtitle(1501, 3000, 2, "second"),
            subtitle(3001, 4000, 3, ""),
        ]
    }

    #[tokio::test]
    async fn test_file_matches_in_memory_render() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.vtt");
        let request = SubtitleExportRequest {
            format: SubtitleFormat::Vtt,
            ..Default::default()
        };
        let clips = clips();
        let mut record = Exportation::for_subtitles(1, &output, None, &clips);

        let count = export_subtitle_file(&clips, &request, &output, &CancelToken::new(), &mut record)
            .await
            .unwrap();

        assert_eq!(count, 3);
        let written = std::fs::read_to_string(&output).unwrap();
        let expected = generate_subtitle_file(
            &collect_cues(&clips, &request.sources, None),
            SubtitleFormat::Vtt,
        );
        assert_eq!(written, expected);
        assert_eq!(record.current_state, ExportState::Exported);
        assert_eq!(record.percentage_progress, 100.0);
        assert!(!record.is_on_going());
        assert!(!tmp_path_for(&output).exists());
    }

    #[tokio::test]
    async fn test_cancelled_export_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.srt");
        std::fs::write(&output, "previous").unwrap();
        let clips = clips();
        let mut record = Exportation::for_subtitles(2, &output, None, &clips);
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = export_subtitle_file(
            &clips,
            &SubtitleExportRequest::default(),
            &output,
            &cancel,
            &mut record,
        )
        .await;

        assert!(matches!(result, Err(CoreError::Cancelled)));
        assert_eq!(record.current_state, ExportState::Canceled);
        assert!(!tmp_path_for(&output).exists());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous");
    }

    #[tokio::test]
    async fn test_missing_directory_sets_error_state() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("missing").join("out.srt");
        let clips = clips();
        let mut record = Exportation::for_subtitles(3, &output, None, &clips);

        let result = export_subtitle_file(
            &clips,
            &SubtitleExportRequest::default(),
            &output,
            &CancelToken::new(),
            &mut record,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(record.current_state, ExportState::Error);
        assert!(!record.error_log.is_empty());
    }

    #[test]
    fn test_record_for_subtitles() {
        let clips = clips();
        let record =
            Exportation::for_subtitles(4, Path::new("/tmp/fatiha.srt"), None, &clips);

        assert_eq!(record.final_file_name, "fatiha.srt");
        assert_eq!(record.video_start_time, 0);
        assert_eq!(record.video_end_time, 4000);
        assert_eq!(record.video_length, 4000);
        assert!(record.verse_range.contains("1-3"));
        assert_eq!(record.current_state, ExportState::Initializing);
        assert!(record.is_on_going());
    }

    #[test]
    fn test_export_state_labels() {
        assert_eq!(
            serde_json::to_value(ExportState::Initializing).unwrap(),
            "Initializing..."
        );
        assert_eq!(
            serde_json::to_value(ExportState::WaitingForRecord).unwrap(),
            "Waiting for Record"
        );
        assert!(ExportState::CapturingFrames.is_on_going());
        assert!(!ExportState::Canceled.is_on_going());
    }
}
