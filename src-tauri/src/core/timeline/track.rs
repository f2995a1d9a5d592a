//! Track Model
//!
//! An ordered, non-overlapping sequence of clips of one media kind. Every
//! operation here either applies completely or is refused without touching
//! the clip list.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    refuse, Clip, ClipKind, EditCursor, EditRejection, EditResult, PredefinedSubtitleClip,
    PredefinedSubtitleType, RemovalMode, SubtitleClip, TranslationSeed,
};
use crate::core::assets::{Asset, AssetType};
use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};
use crate::core::values::{Duration, Verse};
use crate::core::{
    AssetId, ClipId, TimeMs, CLIP_GAP_MS, DEFAULT_SILENCE_DURATION_MS, MIN_CLIP_DURATION_MS,
};

// =============================================================================
// Track Type
// =============================================================================

/// Media kind held by a track
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackType {
    Video,
    Audio,
    Subtitle,
    #[default]
    Unknown,
}

impl TrackType {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            TrackType::Video => "Video",
            TrackType::Audio => "Audio",
            TrackType::Subtitle => "Subtitles",
            TrackType::Unknown => "Unknown Track",
        }
    }

    /// Asset kind that may be dropped on a track of this type
    pub fn acceptable_asset_type(&self) -> AssetType {
        match self {
            TrackType::Video => AssetType::Video,
            TrackType::Audio => AssetType::Audio,
            _ => AssetType::Unknown,
        }
    }
}

/// Special subtitles a clip can be turned into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialSubtitle {
    Silence,
    Istiadhah,
    Basmala,
}

/// A broken track rule, found by [`Track::invariant_violations`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackViolation {
    pub clip_id: ClipId,
    pub message: String,
}

impl fmt::Display for TrackViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip {}: {}", self.clip_id, self.message)
    }
}

// =============================================================================
// Track
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Track {
    kind: TrackType,
    clips: Vec<Clip>,
    /// Target language of a subtitle track (`"arabic"` for the main track)
    pub language: Option<String>,
}

impl Track {
    pub fn new(kind: TrackType) -> Self {
        Self {
            kind,
            clips: Vec::new(),
            language: None,
        }
    }

    pub fn subtitle(language: impl Into<String>) -> Self {
        Self {
            kind: TrackType::Subtitle,
            clips: Vec::new(),
            language: Some(language.into()),
        }
    }

    pub fn kind(&self) -> TrackType {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn acceptable_asset_type(&self) -> AssetType {
        self.kind.acceptable_asset_type()
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id() == id)
    }

    /// Mutable access to a clip's payload. Times can only move through the
    /// track operations.
    pub fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id() == id)
    }

    pub fn index_of(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id() == id)
    }

    /// Largest end time, zero when empty
    pub fn duration(&self) -> Duration {
        Duration::new(self.clips.iter().map(Clip::end_time).max().unwrap_or(0))
    }

    pub fn last_clip(&self) -> Option<&Clip> {
        self.clips.last()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// First clip whose `[start, end]` contains the cursor
    pub fn clip_at(&self, cursor: &impl EditCursor) -> Option<&Clip> {
        let time = cursor.cursor_position();
        self.clips.iter().find(|c| c.contains_time(time))
    }

    /// Clip immediately before `id` in list order
    pub fn clip_before(&self, id: ClipId) -> Option<&Clip> {
        let index = self.index_of(id)?;
        index.checked_sub(1).and_then(|i| self.clips.get(i))
    }

    /// Clip immediately after `id` in list order
    pub fn clip_after(&self, id: ClipId) -> Option<&Clip> {
        let index = self.index_of(id)?;
        self.clips.get(index + 1)
    }

    /// Nearest subtitle strictly before list position `index`
    pub fn subtitle_before(&self, index: usize) -> Option<&SubtitleClip> {
        self.clips
            .get(..index.min(self.clips.len()))?
            .iter()
            .rev()
            .find_map(Clip::subtitle)
    }

    /// Nearest subtitle strictly after list position `index`
    pub fn subtitle_after(&self, index: usize) -> Option<&SubtitleClip> {
        self.clips.get(index + 1..)?.iter().find_map(Clip::subtitle)
    }

    /// Surah recited at the cursor.
    ///
    /// On a non-subtitle clip the nearest subtitle before, then after, is
    /// used. Outside any clip the last subtitle of the track answers.
    pub fn current_surah(&self, cursor: &impl EditCursor) -> Option<u32> {
        let time = cursor.cursor_position();
        match self.clips.iter().position(|c| c.contains_time(time)) {
            Some(index) => match self.clips[index].subtitle() {
                Some(subtitle) => Some(subtitle.surah),
                None => self
                    .subtitle_before(index)
                    .or_else(|| self.subtitle_after(index))
                    .map(|s| s.surah),
            },
            None => self.clips.iter().rev().find_map(Clip::subtitle).map(|s| s.surah),
        }
    }

    /// Subtitle or predefined subtitle shown at the cursor
    pub fn current_subtitle_to_display(&self, cursor: &impl EditCursor) -> Option<&Clip> {
        let time = cursor.cursor_position();
        self.clips
            .iter()
            .find(|c| c.is_text_bearing() && c.contains_time(time))
    }

    /// Clips referencing `asset_id`
    pub fn clips_with_asset(&self, asset_id: AssetId) -> impl Iterator<Item = &Clip> {
        self.clips
            .iter()
            .filter(move |c| c.asset_id() == Some(asset_id))
    }

    // =========================================================================
    // Appending
    // =========================================================================

    /// Appends a clip playing `asset`, 1 ms after the last clip.
    pub fn add_asset(&mut self, asset: &Asset) -> EditResult<ClipId> {
        let clip = match self.clips.last() {
            Some(_) if asset.asset_type == AssetType::Image => {
                return refuse(EditRejection::BackgroundImageConflict);
            }
            Some(last) => {
                let start = later(last.end_time(), CLIP_GAP_MS)?;
                Clip::asset(start, later(start, asset.duration.ms())?, asset.id)?
            }
            None => Clip::asset(0, asset.duration.ms(), asset.id)?,
        };
        Ok(self.push(clip))
    }

    /// Appends a subtitle for words `first..=last` of `verse`, ending at the
    /// cursor.
    pub fn add_subtitle(
        &mut self,
        verse: &Verse,
        first: u32,
        last: u32,
        surah: u32,
        seed: &impl TranslationSeed,
        cursor: &impl EditCursor,
    ) -> EditResult<ClipId> {
        self.require_kind(TrackType::Subtitle)?;
        let payload = subtitle_payload(verse, first, last, surah, seed)?;
        let (start, end) = self.append_window(cursor)?;
        let clip = Clip::new(start, end, ClipKind::Subtitle(payload))?;
        Ok(self.push(clip))
    }

    /// Adds a silence.
    ///
    /// Without a target the silence is appended up to the cursor. With one,
    /// a 500 ms silence is spliced right after the target's predecessor (or
    /// at 0) and the target's start is pushed past it.
    pub fn add_silence(
        &mut self,
        before: Option<ClipId>,
        cursor: &impl EditCursor,
    ) -> EditResult<ClipId> {
        self.require_kind(TrackType::Subtitle)?;

        let Some(target_id) = before else {
            let (start, end) = self.append_window(cursor)?;
            let clip = Clip::silence(start, end)?;
            return Ok(self.push(clip));
        };

        let Some(index) = self.index_of(target_id) else {
            return refuse(EditRejection::ClipNotFound(target_id));
        };

        let start = match index {
            0 => 0,
            i => later(self.clips[i - 1].end_time(), CLIP_GAP_MS)?,
        };
        let end = later(start, DEFAULT_SILENCE_DURATION_MS)?;
        let target_start = later(end, CLIP_GAP_MS)?;

        let target = &self.clips[index];
        let remaining = target.end_time() - target_start;
        if remaining < MIN_CLIP_DURATION_MS {
            return refuse(EditRejection::ClipTooShort {
                clip_id: target_id,
                duration_ms: remaining,
                min_ms: MIN_CLIP_DURATION_MS,
            });
        }

        let silence = Clip::silence(start, end)?;
        let id = silence.id();
        self.clips[index].set_start_time(target_start);
        self.clips.insert(index, silence);
        Ok(id)
    }

    /// Appends a predefined formula up to the cursor.
    pub fn add_predefined_subtitle(
        &mut self,
        predefined_type: PredefinedSubtitleType,
        cursor: &impl EditCursor,
    ) -> EditResult<ClipId> {
        self.require_kind(TrackType::Subtitle)?;
        let (start, end) = self.append_window(cursor)?;
        let clip = Clip::new(
            start,
            end,
            ClipKind::PredefinedSubtitle(PredefinedSubtitleClip::new(predefined_type)),
        )?;
        Ok(self.push(clip))
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Moves a clip's start, shrinking or growing the previous clip so that
    /// it ends 1 ms before.
    pub fn update_start_time(&mut self, id: ClipId, new_start: TimeMs) -> EditResult<()> {
        let Some(index) = self.index_of(id) else {
            return refuse(EditRejection::ClipNotFound(id));
        };
        if new_start < 0 {
            return refuse(EditRejection::InvalidTimeRange {
                start_ms: new_start,
                end_ms: self.clips[index].end_time(),
            });
        }

        let own = self.clips[index].end_time() - new_start;
        if own < MIN_CLIP_DURATION_MS {
            return refuse(EditRejection::ClipTooShort {
                clip_id: id,
                duration_ms: own,
                min_ms: MIN_CLIP_DURATION_MS,
            });
        }

        if let Some(prev) = index.checked_sub(1).map(|i| &self.clips[i]) {
            let prev_duration = new_start - CLIP_GAP_MS - prev.start_time();
            if prev_duration < MIN_CLIP_DURATION_MS {
                return refuse(EditRejection::NeighbourTooShort {
                    clip_id: prev.id(),
                    duration_ms: prev_duration,
                    min_ms: MIN_CLIP_DURATION_MS,
                });
            }
            self.clips[index - 1].set_end_time(new_start - CLIP_GAP_MS);
        }

        self.clips[index].set_start_time(new_start);
        Ok(())
    }

    /// Moves a clip's end, pushing or pulling the next clip's start to 1 ms
    /// after it.
    pub fn update_end_time(&mut self, id: ClipId, new_end: TimeMs) -> EditResult<()> {
        let Some(index) = self.index_of(id) else {
            return refuse(EditRejection::ClipNotFound(id));
        };
        if new_end < 0 {
            return refuse(EditRejection::InvalidTimeRange {
                start_ms: self.clips[index].start_time(),
                end_ms: new_end,
            });
        }

        let own = new_end - self.clips[index].start_time();
        if own < MIN_CLIP_DURATION_MS {
            return refuse(EditRejection::ClipTooShort {
                clip_id: id,
                duration_ms: own,
                min_ms: MIN_CLIP_DURATION_MS,
            });
        }

        if let Some(next) = self.clips.get(index + 1) {
            let next_start = later(new_end, CLIP_GAP_MS)?;
            let next_duration = next.end_time() - next_start;
            if next_duration < MIN_CLIP_DURATION_MS {
                return refuse(EditRejection::NeighbourTooShort {
                    clip_id: next.id(),
                    duration_ms: next_duration,
                    min_ms: MIN_CLIP_DURATION_MS,
                });
            }
            self.clips[index + 1].set_start_time(next_start);
        }

        self.clips[index].set_end_time(new_end);
        Ok(())
    }

    /// Removes a clip and closes the gap according to `mode`.
    pub fn remove_clip(&mut self, id: ClipId, mode: RemovalMode) -> EditResult<Clip> {
        let Some(index) = self.index_of(id) else {
            return refuse(EditRejection::ClipNotFound(id));
        };
        let removed = self.clips.remove(index);

        match mode {
            RemovalMode::Shift => self.repack_from(index),
            RemovalMode::Hold => {
                if let Some(next) = self.clips.get_mut(index) {
                    next.set_start_time(removed.start_time());
                }
            }
        }
        Ok(removed)
    }

    /// Removes every clip playing `asset_id`, shifting the rest.
    pub fn remove_clips_with_asset(&mut self, asset_id: AssetId) -> usize {
        let Some(first) = self
            .clips
            .iter()
            .position(|c| c.asset_id() == Some(asset_id))
        else {
            return 0;
        };
        let before = self.clips.len();
        self.clips.retain(|c| c.asset_id() != Some(asset_id));
        self.repack_from(first);
        before - self.clips.len()
    }

    pub fn remove_last_clip(&mut self) -> Option<Clip> {
        self.clips.pop()
    }

    /// Replaces a clip by a silence or formula spanning the same times. The
    /// replacement gets a new id.
    pub fn edit_subtitle_to_special(
        &mut self,
        id: ClipId,
        special: SpecialSubtitle,
    ) -> EditResult<ClipId> {
        let Some(index) = self.index_of(id) else {
            return refuse(EditRejection::ClipNotFound(id));
        };
        let current = &self.clips[index];
        let kind = match special {
            SpecialSubtitle::Silence => ClipKind::Silence,
            SpecialSubtitle::Istiadhah => ClipKind::PredefinedSubtitle(
                PredefinedSubtitleClip::new(PredefinedSubtitleType::Istiadhah),
            ),
            SpecialSubtitle::Basmala => ClipKind::PredefinedSubtitle(
                PredefinedSubtitleClip::new(PredefinedSubtitleType::Basmala),
            ),
        };
        let replacement = Clip::new(current.start_time(), current.end_time(), kind)?;
        let new_id = replacement.id();
        self.clips[index] = replacement;
        Ok(new_id)
    }

    /// Points a clip at new verse words.
    ///
    /// A subtitle is updated in place and keeps its id; any other clip is
    /// replaced by a new subtitle over the same times.
    pub fn edit_subtitle(
        &mut self,
        id: ClipId,
        verse: &Verse,
        first: u32,
        last: u32,
        surah: u32,
        seed: &impl TranslationSeed,
    ) -> EditResult<ClipId> {
        let Some(index) = self.index_of(id) else {
            return refuse(EditRejection::ClipNotFound(id));
        };
        let payload = subtitle_payload(verse, first, last, surah, seed)?;

        let clip = &mut self.clips[index];
        if let ClipKind::Subtitle(subtitle) = &mut clip.kind {
            *subtitle = payload;
            return Ok(id);
        }

        let replacement = Clip::new(
            clip.start_time(),
            clip.end_time(),
            ClipKind::Subtitle(payload),
        )?;
        let new_id = replacement.id();
        *clip = replacement;
        Ok(new_id)
    }

    // =========================================================================
    // Invariants
    // =========================================================================

    /// Ordering, overlap and duration problems, empty for a healthy track.
    pub fn invariant_violations(&self) -> Vec<TrackViolation> {
        let mut violations = Vec::new();
        for (i, clip) in self.clips.iter().enumerate() {
            if clip.start_time() < 0 || clip.end_time() < clip.start_time() {
                violations.push(TrackViolation {
                    clip_id: clip.id(),
                    message: format!(
                        "invalid times {}..{}",
                        clip.start_time(),
                        clip.end_time()
                    ),
                });
            }
            if let Some(prev) = i.checked_sub(1).map(|p| &self.clips[p]) {
                if clip.start_time() <= prev.end_time() {
                    violations.push(TrackViolation {
                        clip_id: clip.id(),
                        message: format!(
                            "starts at {} but clip {} ends at {}",
                            clip.start_time(),
                            prev.id(),
                            prev.end_time()
                        ),
                    });
                }
            }
        }
        violations
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn push(&mut self, clip: Clip) -> ClipId {
        let id = clip.id();
        self.clips.push(clip);
        id
    }

    fn require_kind(&self, expected: TrackType) -> EditResult<()> {
        if self.kind != expected {
            return refuse(EditRejection::WrongTrackKind {
                expected,
                found: self.kind,
            });
        }
        Ok(())
    }

    /// `(duration + 1, cursor)` for clips appended up to the cursor
    fn append_window(&self, cursor: &impl EditCursor) -> EditResult<(TimeMs, TimeMs)> {
        let start = later(self.duration().ms(), CLIP_GAP_MS)?;
        let end = cursor.cursor_position();
        if end <= start {
            return refuse(EditRejection::InvalidTimeRange {
                start_ms: start,
                end_ms: end,
            });
        }
        Ok((start, end))
    }

    /// Packs clips from `index` onward contiguously, keeping durations.
    fn repack_from(&mut self, index: usize) {
        for i in index..self.clips.len() {
            let start = match i {
                0 => 0,
                _ => self.clips[i - 1].end_time() + CLIP_GAP_MS,
            };
            self.clips[i].shift_to(start);
        }
    }
}

/// `time + by`, refused when it leaves the representable range.
fn later(time: TimeMs, by: TimeMs) -> EditResult<TimeMs> {
    match time.checked_add(by) {
        Some(sum) => Ok(sum),
        None => refuse(EditRejection::InvalidTimeRange {
            start_ms: time,
            end_ms: TimeMs::MAX,
        }),
    }
}

fn subtitle_payload(
    verse: &Verse,
    first: u32,
    last: u32,
    surah: u32,
    seed: &impl TranslationSeed,
) -> EditResult<SubtitleClip> {
    let invalid = || EditRejection::InvalidWordRange {
        verse: verse.id,
        first,
        last,
    };
    let Some(text) = verse.arabic_text_between(first, last) else {
        return refuse(invalid());
    };
    let wbw_translation = verse.word_by_word_between(first, last).unwrap_or_default();
    let is_full_verse = verse.is_full_verse(first, last);

    Ok(SubtitleClip {
        surah,
        verse: verse.id,
        start_word_index: first,
        end_word_index: last,
        text,
        wbw_translation,
        is_full_verse,
        is_last_words_of_verse: verse.is_last_words(last),
        translations: seed.seed_translations(surah, verse.id, is_full_verse),
    })
}

// =============================================================================
// Serialization
// =============================================================================

impl Serializable for Track {
    const TYPE_NAME: &'static str = "Track";

    fn type_tag(&self) -> &'static str {
        match self.kind {
            TrackType::Subtitle => "SubtitleTrack",
            TrackType::Video | TrackType::Audio => "AssetTrack",
            TrackType::Unknown => Self::TYPE_NAME,
        }
    }

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("type", &self.kind)?.list("clips", &self.clips)?;
        if let Some(language) = &self.language {
            out.value("language", language)?;
        }
        Ok(())
    }

    fn from_fields(variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        let fallback = match variant {
            "SubtitleTrack" => TrackType::Subtitle,
            _ => TrackType::Unknown,
        };
        Ok(Self {
            kind: fields.value_or("type", fallback)?,
            clips: fields.list("clips")?,
            language: fields.optional("language")?,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::values::Word;

    fn spans(track: &Track) -> Vec<(TimeMs, TimeMs)> {
        track
            .clips()
            .iter()
            .map(|c| (c.start_time(), c.end_time()))
            .collect()
    }

    fn track_with(spans: &[(TimeMs, TimeMs)]) -> Track {
        let mut track = Track::subtitle("arabic");
        for &(start, end) in spans {
            track.clips.push(Clip::silence(start, end).unwrap());
        }
        track
    }

    fn verse(id: u32, words: usize) -> Verse {
        Verse::new(
            id,
            (0..words)
                .map(|i| Word::new(format!("w{i}"), format!("t{i}"), format!("e{i}")))
                .collect(),
        )
    }

    fn asset(asset_type: AssetType, duration_ms: TimeMs) -> Asset {
        let mut asset = Asset::new(match asset_type {
            AssetType::Image => "/media/bg.png",
            _ => "/media/recitation.mp3",
        });
        asset.duration = Duration::new(duration_ms);
        asset
    }

    #[test]
    fn test_add_asset_places_clips_with_gap() {
        let mut track = Track::subtitle("arabic");
        track.add_asset(&asset(AssetType::Audio, 1000)).unwrap();
        track.add_asset(&asset(AssetType::Audio, 2000)).unwrap();
        assert_eq!(spans(&track), vec![(0, 1000), (1001, 3001)]);
    }

    #[test]
    fn test_add_image_to_non_empty_track_is_refused() {
        let mut track = Track::new(TrackType::Video);
        track.add_asset(&asset(AssetType::Image, 0)).unwrap();
        let err = track.add_asset(&asset(AssetType::Image, 0)).unwrap_err();
        assert_eq!(err, EditRejection::BackgroundImageConflict);
        assert_eq!(track.len(), 1);
    }

    #[test]
    fn test_add_subtitle_ends_at_cursor() {
        let mut track = Track::subtitle("arabic");
        let id = track
            .add_subtitle(&verse(1, 4), 0, 3, 1, &(), &2500_i64)
            .unwrap();

        let clip = track.clip(id).unwrap();
        assert_eq!((clip.start_time(), clip.end_time()), (1, 2500));
        let subtitle = clip.subtitle().unwrap();
        assert_eq!(subtitle.text, "w0 w1 w2 w3");
        assert_eq!(subtitle.wbw_translation, "e0 e1 e2 e3");
        assert!(subtitle.is_full_verse);
        assert!(subtitle.is_last_words_of_verse);
    }

    #[test]
    fn test_add_subtitle_refused_behind_track_end() {
        let mut track = track_with(&[(0, 3000)]);
        let before = track.clone();
        let err = track
            .add_subtitle(&verse(1, 4), 0, 1, 1, &(), &3001_i64)
            .unwrap_err();
        assert!(matches!(err, EditRejection::InvalidTimeRange { .. }));
        assert_eq!(track, before);
    }

    #[test]
    fn test_subtitle_operations_require_subtitle_track() {
        let mut track = Track::new(TrackType::Audio);
        let err = track.add_silence(None, &5000_i64).unwrap_err();
        assert_eq!(
            err,
            EditRejection::WrongTrackKind {
                expected: TrackType::Subtitle,
                found: TrackType::Audio
            }
        );
    }

    #[test]
    fn test_add_silence_before_target() {
        let mut track = track_with(&[(0, 999), (1000, 3000)]);
        let target = track.clips()[1].id();

        track.add_silence(Some(target), &0_i64).unwrap();

        assert_eq!(spans(&track), vec![(0, 999), (1000, 1500), (1501, 3000)]);
        assert!(track.clips()[1].is_silence());
        assert_eq!(track.clips()[2].id(), target);
        assert!(track.invariant_violations().is_empty());
    }

    #[test]
    fn test_add_silence_before_first_clip() {
        let mut track = track_with(&[(0, 2000)]);
        let target = track.clips()[0].id();
        track.add_silence(Some(target), &0_i64).unwrap();
        assert_eq!(spans(&track), vec![(0, 500), (501, 2000)]);
    }

    #[test]
    fn test_add_silence_refused_when_target_too_short() {
        let mut track = track_with(&[(0, 999), (1000, 1600)]);
        let before = track.clone();
        let target = track.clips()[1].id();

        let err = track.add_silence(Some(target), &0_i64).unwrap_err();
        assert!(matches!(err, EditRejection::ClipTooShort { duration_ms: 99, .. }));
        assert_eq!(track, before);
    }

    #[test]
    fn test_update_end_time_refused_when_next_collapses() {
        let mut track = track_with(&[(0, 999), (1000, 1999)]);
        let before = track.clone();
        let id = track.clips()[0].id();

        let err = track.update_end_time(id, 1999).unwrap_err();
        assert!(matches!(err, EditRejection::NeighbourTooShort { .. }));
        assert_eq!(track, before);
    }

    #[test]
    fn test_out_of_range_end_time_is_refused() {
        let mut track = track_with(&[(0, 999), (1000, 1999)]);
        let before = track.clone();
        let id = track.clips()[0].id();

        let err = track.update_end_time(id, TimeMs::MAX).unwrap_err();
        assert!(matches!(err, EditRejection::InvalidTimeRange { .. }));
        let err = track.update_end_time(id, TimeMs::MIN).unwrap_err();
        assert!(matches!(err, EditRejection::InvalidTimeRange { .. }));
        assert_eq!(track, before);
    }

    #[test]
    fn test_asset_too_long_to_append_is_refused() {
        let mut track = Track::new(TrackType::Audio);
        track.add_asset(&asset(AssetType::Audio, 1000)).unwrap();
        let before = track.clone();

        let err = track
            .add_asset(&asset(AssetType::Audio, TimeMs::MAX))
            .unwrap_err();
        assert!(matches!(err, EditRejection::InvalidTimeRange { .. }));
        assert_eq!(track, before);
    }

    #[test]
    fn test_update_end_time_moves_next_start() {
        let mut track = track_with(&[(0, 999), (1000, 1999)]);
        let id = track.clips()[0].id();
        track.update_end_time(id, 1500).unwrap();
        assert_eq!(spans(&track), vec![(0, 1500), (1501, 1999)]);
        assert_eq!(track.clips()[1].duration(), 498);
    }

    #[test]
    fn test_update_start_time_moves_previous_end() {
        let mut track = track_with(&[(0, 999), (1000, 1999)]);
        let id = track.clips()[1].id();
        track.update_start_time(id, 500).unwrap();
        assert_eq!(spans(&track), vec![(0, 499), (500, 1999)]);

        let err = track.update_start_time(id, 50).unwrap_err();
        assert!(matches!(err, EditRejection::NeighbourTooShort { .. }));
        let err = track.update_start_time(id, 1950).unwrap_err();
        assert!(matches!(err, EditRejection::ClipTooShort { .. }));
        assert_eq!(spans(&track), vec![(0, 499), (500, 1999)]);
    }

    #[test]
    fn test_remove_clip_shift_mode_packs_following_clips() {
        let mut track = track_with(&[(0, 999), (1000, 1999), (2000, 2999)]);
        let ids: Vec<_> = track.clips().iter().map(Clip::id).collect();

        track.remove_clip(ids[1], RemovalMode::Shift).unwrap();

        assert_eq!(spans(&track), vec![(0, 999), (1000, 1999)]);
        assert_eq!(track.clips()[1].id(), ids[2]);
        assert_eq!(track.clips()[1].duration(), 999);
    }

    #[test]
    fn test_remove_clip_hold_mode_extends_next_clip() {
        let mut track = track_with(&[(0, 999), (1000, 1999), (2000, 2999)]);
        let id = track.clips()[1].id();
        track.remove_clip(id, RemovalMode::Hold).unwrap();
        assert_eq!(spans(&track), vec![(0, 999), (1000, 2999)]);
    }

    #[test]
    fn test_remove_unknown_clip_is_refused() {
        let mut track = track_with(&[(0, 999)]);
        assert_eq!(
            track.remove_clip(42, RemovalMode::Shift).unwrap_err(),
            EditRejection::ClipNotFound(42)
        );
        assert_eq!(track.len(), 1);
    }

    #[test]
    fn test_neighbour_lookups() {
        let track = track_with(&[(0, 999), (1000, 1999), (2000, 2999)]);
        let ids: Vec<_> = track.clips().iter().map(Clip::id).collect();

        assert_eq!(track.clip_before(ids[0]), None);
        assert_eq!(track.clip_before(ids[1]).map(Clip::id), Some(ids[0]));
        assert_eq!(track.clip_after(ids[1]).map(Clip::id), Some(ids[2]));
        assert_eq!(track.clip_after(ids[2]), None);
        assert_eq!(track.clip_at(&1500_i64).map(Clip::id), Some(ids[1]));
        assert_eq!(track.clip_at(&5000_i64), None);
        assert_eq!(track.duration().ms(), 2999);
    }

    #[test]
    fn test_current_surah_uses_nearest_subtitle() {
        let mut track = Track::subtitle("arabic");
        track.add_subtitle(&verse(1, 2), 0, 1, 2, &(), &1000_i64).unwrap();
        track.add_silence(None, &2000_i64).unwrap();
        track.add_subtitle(&verse(1, 2), 0, 1, 3, &(), &3000_i64).unwrap();

        assert_eq!(track.current_surah(&500_i64), Some(2));
        assert_eq!(track.current_surah(&1500_i64), Some(2));
        assert_eq!(track.current_surah(&2500_i64), Some(3));
        assert_eq!(track.current_surah(&9000_i64), Some(3));
        assert_eq!(Track::subtitle("arabic").current_surah(&0_i64), None);
    }

    #[test]
    fn test_subtitle_before_and_after_by_index() {
        let mut track = Track::subtitle("arabic");
        track.add_subtitle(&verse(1, 2), 0, 1, 2, &(), &1000_i64).unwrap();
        track.add_silence(None, &2000_i64).unwrap();
        track.add_subtitle(&verse(2, 2), 0, 1, 2, &(), &3000_i64).unwrap();

        assert_eq!(track.subtitle_before(1).map(|s| s.verse), Some(1));
        assert_eq!(track.subtitle_after(1).map(|s| s.verse), Some(2));
        assert_eq!(track.subtitle_before(0), None);
        assert_eq!(track.subtitle_after(2), None);
    }

    #[test]
    fn test_edit_subtitle_to_special_replaces_clip() {
        let mut track = Track::subtitle("arabic");
        let id = track.add_subtitle(&verse(1, 2), 0, 1, 1, &(), &1000_i64).unwrap();

        let new_id = track
            .edit_subtitle_to_special(id, SpecialSubtitle::Basmala)
            .unwrap();

        assert_ne!(new_id, id);
        let clip = track.clip(new_id).unwrap();
        assert_eq!((clip.start_time(), clip.end_time()), (1, 1000));
        assert_eq!(
            clip.predefined().map(|p| p.predefined_type),
            Some(PredefinedSubtitleType::Basmala)
        );
    }

    #[test]
    fn test_edit_subtitle_in_place_and_from_silence() {
        let mut track = Track::subtitle("arabic");
        let id = track.add_subtitle(&verse(1, 3), 0, 0, 1, &(), &1000_i64).unwrap();
        let kept = track.edit_subtitle(id, &verse(2, 3), 1, 2, 1, &()).unwrap();
        assert_eq!(kept, id);
        assert_eq!(track.clip(id).and_then(Clip::subtitle).map(|s| s.verse), Some(2));

        let silence = track.add_silence(None, &2000_i64).unwrap();
        let replaced = track
            .edit_subtitle(silence, &verse(3, 3), 0, 2, 1, &())
            .unwrap();
        assert_ne!(replaced, silence);
        assert!(track.clip(replaced).unwrap().subtitle().unwrap().is_full_verse);
    }

    #[test]
    fn test_invalid_word_range_is_refused() {
        let mut track = Track::subtitle("arabic");
        let err = track
            .add_subtitle(&verse(1, 3), 5, 6, 1, &(), &1000_i64)
            .unwrap_err();
        assert!(matches!(err, EditRejection::InvalidWordRange { .. }));
        assert!(track.is_empty());
    }

    #[test]
    fn test_remove_clips_with_asset_shifts_remaining() {
        let mut track = Track::new(TrackType::Audio);
        let a = asset(AssetType::Audio, 1000);
        let b = asset(AssetType::Audio, 2000);
        track.add_asset(&a).unwrap();
        track.add_asset(&b).unwrap();

        assert_eq!(track.remove_clips_with_asset(a.id), 1);
        assert_eq!(spans(&track), vec![(0, 2000)]);
        assert_eq!(track.remove_clips_with_asset(a.id), 0);
    }

    #[test]
    fn test_invariant_violations_report_overlap() {
        let track = track_with(&[(0, 1000), (1000, 2000)]);
        let violations = track.invariant_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].clip_id, track.clips()[1].id());
    }
}
