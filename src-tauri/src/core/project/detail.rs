//! Project Detail
//!
//! Metadata shown in the project list: name, reciter, coverage and
//! translation progress.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::Edition;
use crate::core::ids::random_id;
use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};
use crate::core::timeline::{Clip, Timeline, TrackType};
use crate::core::values::{Duration, Status, TranslationKind, VerseRange};
use crate::core::{now_timestamp, CoreError, CoreResult, ProjectId, TimeRange};

pub const NAME_MAX_LENGTH: usize = 50;
pub const RECITER_MAX_LENGTH: usize = 35;
pub const DEFAULT_RECITER: &str = "not set";

/// Captioned percentages at or above this count as complete
const CAPTIONED_ROUND_UP_PERCENT: f64 = 97.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectDetail {
    pub id: ProjectId,
    pub name: String,
    pub reciter: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub verse_range: VerseRange,
    pub duration: Duration,
    pub percentage_captioned: u32,
    pub status: Status,
    /// Edition author → percentage translated
    pub translations: BTreeMap<String, u32>,
}

impl ProjectDetail {
    /// Creates the detail of a new project. An empty reciter becomes
    /// `not set`.
    pub fn new(name: &str, reciter: &str) -> CoreResult<Self> {
        let name = name.trim();
        let reciter = match reciter.trim() {
            "" => DEFAULT_RECITER,
            r => r,
        };

        if name.is_empty() {
            return Err(CoreError::ValidationError(
                "Project name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > NAME_MAX_LENGTH {
            return Err(CoreError::ValidationError(format!(
                "Project name exceeds {} characters",
                NAME_MAX_LENGTH
            )));
        }
        if reciter.chars().count() > RECITER_MAX_LENGTH {
            return Err(CoreError::ValidationError(format!(
                "Reciter name exceeds {} characters",
                RECITER_MAX_LENGTH
            )));
        }

        let now = now_timestamp();
        Ok(Self {
            id: random_id(),
            name: name.to_string(),
            reciter: reciter.to_string(),
            created_at: now,
            updated_at: now,
            verse_range: VerseRange::default(),
            duration: Duration::zero(),
            percentage_captioned: 0,
            status: Status::not_set(),
            translations: BTreeMap::new(),
        })
    }

    pub fn update_timestamp(&mut self) {
        self.updated_at = now_timestamp();
    }

    /// Refreshes duration, captioned percentage and verse range from the
    /// timeline.
    pub fn update_video_detail_attributes(&mut self, timeline: &Timeline) {
        let captioned = track_end(timeline, TrackType::Subtitle);
        let total = track_end(timeline, TrackType::Audio);

        self.duration = timeline.longest_track_duration();
        self.percentage_captioned = captioned_percentage(captioned, total);
        self.verse_range = VerseRange::get_verse_range(
            TimeRange::new(0, captioned),
            timeline.subtitle_clips(),
        );
    }

    /// Recomputes the share of reviewed translations for `edition`, stored
    /// under the edition's author.
    pub fn update_percentage_translated(&mut self, edition: &Edition, timeline: &Timeline) {
        let (total, completed) = timeline
            .subtitle_clips()
            .iter()
            .filter_map(|clip| verse_translation(clip, &edition.name))
            .fold((0u32, 0u32), |(total, completed), complete| {
                (total + 1, completed + u32::from(complete))
            });

        let percentage = if total > 0 { completed * 100 / total } else { 0 };
        self.translations.insert(edition.author.clone(), percentage);
    }

    /// Case, whitespace, hyphen and apostrophe insensitive search over the
    /// name, reciter and verse range.
    pub fn matches_search_query(&self, query: &str) -> bool {
        let haystack = format!("{} {} {}", self.name, self.reciter, self.verse_range);
        normalize_search(&haystack).contains(&normalize_search(query))
    }

    /// `"{name} ({reciter}) - {verses}"` for the verses inside `window`
    pub fn generate_export_file_name(&self, window: TimeRange, clips: &[Clip]) -> String {
        let verses = VerseRange::get_verse_range(window, clips);
        let reciter = if self.reciter.is_empty() {
            "- ".to_string()
        } else {
            format!("({}) - ", self.reciter)
        };
        format!("{} {}{}", self.name, reciter, verses.describe_for_export_file())
    }
}

fn track_end(timeline: &Timeline, kind: TrackType) -> i64 {
    timeline
        .first_track(kind)
        .map(|t| t.duration().ms())
        .unwrap_or(0)
}

fn captioned_percentage(captioned: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    let percentage = captioned as f64 / total as f64 * 100.0;
    if percentage >= CAPTIONED_ROUND_UP_PERCENT {
        100
    } else {
        percentage.floor() as u32
    }
}

/// Completion of a clip's verse translation for `edition`, if it has one
fn verse_translation(clip: &Clip, edition: &str) -> Option<bool> {
    let translation = clip.translation(edition)?;
    (translation.kind == TranslationKind::Verse).then(|| translation.is_status_complete())
}

fn normalize_search(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['-', '\''], "")
}

impl Serializable for ProjectDetail {
    const TYPE_NAME: &'static str = "ProjectDetail";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("id", &self.id)?
            .value("name", &self.name)?
            .value("reciter", &self.reciter)?
            .date("createdAt", &self.created_at)?
            .date("updatedAt", &self.updated_at)?
            .object("verseRange", &self.verse_range)?
            .object("duration", &self.duration)?
            .value("percentageCaptioned", &self.percentage_captioned)?
            .object("status", &self.status)?
            .value("translations", &self.translations)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        let created_at = fields.date("createdAt")?;
        Ok(Self {
            id: fields.value("id")?,
            name: fields.value("name")?,
            reciter: fields.value_or("reciter", DEFAULT_RECITER.to_string())?,
            created_at,
            updated_at: fields.date_or("updatedAt", created_at)?,
            verse_range: fields.object_or_else("verseRange", VerseRange::default)?,
            duration: fields.object_or_else("duration", Duration::zero)?,
            percentage_captioned: fields.value_or_default("percentageCaptioned")?,
            status: fields.object_or_else("status", Status::not_set)?,
            translations: fields.value_or_default("translations")?,
        })
    }
}
