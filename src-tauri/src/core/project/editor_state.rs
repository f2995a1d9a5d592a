//! Editor State
//!
//! UI state persisted with a project. [`TimelineState`] is the cursor read by
//! track operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};
use crate::core::timeline::{EditCursor, DEFAULT_ZOOM};
use crate::core::TimeMs;

/// Tab shown when a project opens
pub const DEFAULT_TAB: &str = "Video editor";

/// Collapsible section state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionState {
    pub extended: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimelineState {
    /// Pixels per second
    pub zoom: f64,
    pub cursor_position: TimeMs,
    pub show_cursor: bool,
    pub move_preview_to: TimeMs,
    pub scroll_x: f64,
    pub show_waveforms: bool,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            cursor_position: 0,
            show_cursor: true,
            move_preview_to: 0,
            scroll_x: 0.0,
            show_waveforms: false,
        }
    }
}

impl EditCursor for TimelineState {
    fn cursor_position(&self) -> TimeMs {
        self.cursor_position
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }
}

impl Serializable for TimelineState {
    const TYPE_NAME: &'static str = "TimelineState";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("zoom", &self.zoom)?
            .value("cursorPosition", &self.cursor_position)?
            .value("showCursor", &self.show_cursor)?
            .value("movePreviewTo", &self.move_preview_to)?
            .value("scrollX", &self.scroll_x)?
            .value("showWaveforms", &self.show_waveforms)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        let d = Self::default();
        Ok(Self {
            zoom: fields.value_or("zoom", d.zoom)?,
            cursor_position: fields.value_or("cursorPosition", d.cursor_position)?,
            show_cursor: fields.value_or("showCursor", d.show_cursor)?,
            move_preview_to: fields.value_or("movePreviewTo", d.move_preview_to)?,
            scroll_x: fields.value_or("scrollX", d.scroll_x)?,
            show_waveforms: fields.value_or("showWaveforms", d.show_waveforms)?,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VideoPreviewState {
    pub is_playing: bool,
}

impl Serializable for VideoPreviewState {
    const TYPE_NAME: &'static str = "VideoPreviewState";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("isPlaying", &self.is_playing)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        Ok(Self {
            is_playing: fields.value_or_default("isPlaying")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubtitlesEditorState {
    pub selected_surah: u32,
    pub selected_verse: u32,
    pub start_word_index: u32,
    pub end_word_index: u32,
    pub playback_speed: f64,
    pub show_word_translation: bool,
    pub show_word_transliteration: bool,
}

impl Default for SubtitlesEditorState {
    fn default() -> Self {
        Self {
            selected_surah: 1,
            selected_verse: 1,
            start_word_index: 0,
            end_word_index: 0,
            playback_speed: 1.0,
            show_word_translation: true,
            show_word_transliteration: false,
        }
    }
}

impl Serializable for SubtitlesEditorState {
    const TYPE_NAME: &'static str = "SubtitlesEditorState";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("selectedSurah", &self.selected_surah)?
            .value("selectedVerse", &self.selected_verse)?
            .value("startWordIndex", &self.start_word_index)?
            .value("endWordIndex", &self.end_word_index)?
            .value("playbackSpeed", &self.playback_speed)?
            .value("showWordTranslation", &self.show_word_translation)?
            .value("showWordTransliteration", &self.show_word_transliteration)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        let d = Self::default();
        Ok(Self {
            selected_surah: fields.value_or("selectedSurah", d.selected_surah)?,
            selected_verse: fields.value_or("selectedVerse", d.selected_verse)?,
            start_word_index: fields.value_or("startWordIndex", d.start_word_index)?,
            end_word_index: fields.value_or("endWordIndex", d.end_word_index)?,
            playback_speed: fields.value_or("playbackSpeed", d.playback_speed)?,
            show_word_translation: fields
                .value_or("showWordTranslation", d.show_word_translation)?,
            show_word_transliteration: fields
                .value_or("showWordTransliteration", d.show_word_transliteration)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectEditorState {
    pub current_tab: String,
    pub show_drop_screen: bool,
    pub sections: BTreeMap<String, SectionState>,
    pub timeline: TimelineState,
    pub video_preview: VideoPreviewState,
    pub subtitles_editor: SubtitlesEditorState,
    /// Height of the upper editor section, in percent
    pub upper_section_height: f64,
}

impl Default for ProjectEditorState {
    fn default() -> Self {
        Self {
            current_tab: DEFAULT_TAB.to_string(),
            show_drop_screen: false,
            sections: BTreeMap::new(),
            timeline: TimelineState::default(),
            video_preview: VideoPreviewState::default(),
            subtitles_editor: SubtitlesEditorState::default(),
            upper_section_height: 68.0,
        }
    }
}

impl Serializable for ProjectEditorState {
    const TYPE_NAME: &'static str = "ProjectEditorState";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("currentTab", &self.current_tab)?
            .value("showDropScreen", &self.show_drop_screen)?
            .value("sections", &self.sections)?
            .object("timeline", &self.timeline)?
            .object("videoPreview", &self.video_preview)?
            .object("subtitlesEditor", &self.subtitles_editor)?
            .value("upperSectionHeight", &self.upper_section_height)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        let d = Self::default();
        Ok(Self {
            current_tab: fields.value_or("currentTab", d.current_tab)?,
            show_drop_screen: fields.value_or_default("showDropScreen")?,
            sections: fields.value_or_default("sections")?,
            timeline: fields.object_or_else("timeline", TimelineState::default)?,
            video_preview: fields.object_or_else("videoPreview", VideoPreviewState::default)?,
            subtitles_editor: fields
                .object_or_else("subtitlesEditor", SubtitlesEditorState::default)?,
            upper_section_height: fields.value_or("upperSectionHeight", d.upper_section_height)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = ProjectEditorState::default();
        assert_eq!(state.timeline.zoom, 29.25);
        assert!(state.timeline.show_cursor);
        assert_eq!(state.subtitles_editor.selected_surah, 1);
        assert_eq!(state.subtitles_editor.playback_speed, 1.0);
        assert_eq!(state.upper_section_height, 68.0);
    }

    #[test]
    fn test_timeline_state_is_the_cursor() {
        let state = TimelineState {
            cursor_position: 4200,
            zoom: 50.0,
            ..TimelineState::default()
        };
        assert_eq!(state.cursor_position(), 4200);
        assert_eq!(EditCursor::zoom(&state), 50.0);
    }
}
