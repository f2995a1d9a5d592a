//! Clip Model
//!
//! A clip is a time-bounded unit on a track. The kind-specific payload lives
//! in [`ClipKind`]; times are private so that only track operations can move
//! them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{refuse, EditResult, EditRejection};
use crate::core::ids::random_id;
use crate::core::serialization::{
    FieldReader, FieldWriter, SerdeError, SerdeResult, Serializable,
};
use crate::core::values::{verse_key, Translation};
use crate::core::{AssetId, ClipId, TimeMs, TimeRange};

// =============================================================================
// Payloads
// =============================================================================

/// Quran subtitle covering words `start_word_index..=end_word_index` of a verse
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubtitleClip {
    pub surah: u32,
    pub verse: u32,
    pub start_word_index: u32,
    pub end_word_index: u32,
    /// Arabic text
    pub text: String,
    /// Word-by-word translation
    pub wbw_translation: String,
    pub is_full_verse: bool,
    pub is_last_words_of_verse: bool,
    /// Language / edition key → translation
    pub translations: BTreeMap<String, Translation>,
}

/// Formula recited around the Quran text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredefinedSubtitleType {
    Basmala,
    Istiadhah,
    #[serde(rename = "Sadaqallahul Azim")]
    SadaqallahulAzim,
    Takbir,
    #[default]
    Other,
}

impl PredefinedSubtitleType {
    pub fn label(&self) -> &'static str {
        match self {
            PredefinedSubtitleType::Basmala => "Basmala",
            PredefinedSubtitleType::Istiadhah => "Istiadhah",
            PredefinedSubtitleType::SadaqallahulAzim => "Sadaqallahul Azim",
            PredefinedSubtitleType::Takbir => "Takbir",
            PredefinedSubtitleType::Other => "Other",
        }
    }

    /// Arabic text shown when the formula is inserted
    pub fn default_text(&self) -> &'static str {
        match self {
            PredefinedSubtitleType::Basmala => "بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ",
            PredefinedSubtitleType::Istiadhah => "أَعُوذُ بِٱللَّهِ مِنَ ٱلشَّيْطَٰنِ ٱلرَّجِيمِ",
            PredefinedSubtitleType::SadaqallahulAzim => "صَدَقَ ٱللَّهُ ٱلْعَظِيمُ",
            PredefinedSubtitleType::Takbir => "ٱللَّهُ أَكْبَرُ",
            PredefinedSubtitleType::Other => "",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PredefinedSubtitleClip {
    pub text: String,
    pub predefined_type: PredefinedSubtitleType,
    pub translations: BTreeMap<String, Translation>,
}

impl PredefinedSubtitleClip {
    pub fn new(predefined_type: PredefinedSubtitleType) -> Self {
        Self {
            text: predefined_type.default_text().to_string(),
            predefined_type,
            translations: BTreeMap::new(),
        }
    }
}

/// Media clip pointing at a project asset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetClip {
    pub asset_id: AssetId,
}

/// Kind-specific clip payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClipKind {
    Silence,
    Subtitle(SubtitleClip),
    PredefinedSubtitle(PredefinedSubtitleClip),
    Asset(AssetClip),
}

impl ClipKind {
    /// Discriminant stored in the legacy `type` field
    pub fn label(&self) -> &'static str {
        match self {
            ClipKind::Silence => "Silence",
            ClipKind::Subtitle(_) => "Subtitle",
            ClipKind::PredefinedSubtitle(_) => "Pre-defined Subtitle",
            ClipKind::Asset(_) => "Asset",
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            ClipKind::Silence => "SilenceClip",
            ClipKind::Subtitle(_) => "SubtitleClip",
            ClipKind::PredefinedSubtitle(_) => "PredefinedSubtitleClip",
            ClipKind::Asset(_) => "AssetClip",
        }
    }
}

// =============================================================================
// Clip
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clip {
    id: ClipId,
    start_time: TimeMs,
    end_time: TimeMs,
    duration: TimeMs,
    pub kind: ClipKind,
}

impl Clip {
    /// Creates a clip with a fresh id. Refuses negative or inverted times.
    pub fn new(start_time: TimeMs, end_time: TimeMs, kind: ClipKind) -> EditResult<Self> {
        if start_time < 0 || end_time < start_time {
            return refuse(EditRejection::InvalidTimeRange {
                start_ms: start_time,
                end_ms: end_time,
            });
        }
        Ok(Self {
            id: random_id(),
            start_time,
            end_time,
            duration: end_time - start_time,
            kind,
        })
    }

    pub fn silence(start_time: TimeMs, end_time: TimeMs) -> EditResult<Self> {
        Self::new(start_time, end_time, ClipKind::Silence)
    }

    pub fn asset(start_time: TimeMs, end_time: TimeMs, asset_id: AssetId) -> EditResult<Self> {
        Self::new(start_time, end_time, ClipKind::Asset(AssetClip { asset_id }))
    }

    pub fn id(&self) -> ClipId {
        self.id
    }

    pub fn start_time(&self) -> TimeMs {
        self.start_time
    }

    pub fn end_time(&self) -> TimeMs {
        self.end_time
    }

    /// Always `end_time - start_time`
    pub fn duration(&self) -> TimeMs {
        self.duration
    }

    pub fn range(&self) -> TimeRange {
        TimeRange {
            start_ms: self.start_time,
            end_ms: self.end_time,
        }
    }

    /// Whether `time` lies in `[start, end]`
    pub fn contains_time(&self, time: TimeMs) -> bool {
        time >= self.start_time && time <= self.end_time
    }

    /// On-screen width at `zoom` pixels per second
    pub fn width_px(&self, zoom: f64) -> f64 {
        (self.duration as f64 / 1000.0) * zoom
    }

    pub fn is_silence(&self) -> bool {
        matches!(self.kind, ClipKind::Silence)
    }

    pub fn subtitle(&self) -> Option<&SubtitleClip> {
        match &self.kind {
            ClipKind::Subtitle(subtitle) => Some(subtitle),
            _ => None,
        }
    }

    pub fn predefined(&self) -> Option<&PredefinedSubtitleClip> {
        match &self.kind {
            ClipKind::PredefinedSubtitle(predefined) => Some(predefined),
            _ => None,
        }
    }

    pub fn asset_id(&self) -> Option<AssetId> {
        match &self.kind {
            ClipKind::Asset(asset) => Some(asset.asset_id),
            _ => None,
        }
    }

    /// Subtitle or predefined subtitle
    pub fn is_text_bearing(&self) -> bool {
        matches!(
            self.kind,
            ClipKind::Subtitle(_) | ClipKind::PredefinedSubtitle(_)
        )
    }

    /// Arabic text of a subtitle or predefined subtitle
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ClipKind::Subtitle(subtitle) => Some(&subtitle.text),
            ClipKind::PredefinedSubtitle(predefined) => Some(&predefined.text),
            _ => None,
        }
    }

    pub fn translations(&self) -> Option<&BTreeMap<String, Translation>> {
        match &self.kind {
            ClipKind::Subtitle(subtitle) => Some(&subtitle.translations),
            ClipKind::PredefinedSubtitle(predefined) => Some(&predefined.translations),
            _ => None,
        }
    }

    pub fn translation(&self, key: &str) -> Option<&Translation> {
        self.translations().and_then(|t| t.get(key))
    }

    /// `"surah:verse"` for subtitles
    pub fn verse_key(&self) -> Option<String> {
        self.subtitle().map(|s| verse_key(s.surah, s.verse))
    }

    pub(crate) fn set_start_time(&mut self, start_time: TimeMs) {
        self.start_time = start_time;
        self.duration = self.end_time - self.start_time;
    }

    pub(crate) fn set_end_time(&mut self, end_time: TimeMs) {
        self.end_time = end_time;
        self.duration = self.end_time - self.start_time;
    }

    /// Moves the clip to `start_time`, keeping its duration.
    pub(crate) fn shift_to(&mut self, start_time: TimeMs) {
        self.start_time = start_time;
        self.end_time = start_time + self.duration;
    }
}

// =============================================================================
// Serialization
// =============================================================================

fn write_translations(
    out: &mut FieldWriter<'_>,
    translations: &BTreeMap<String, Translation>,
) -> SerdeResult<()> {
    out.map("translations", translations)?;
    Ok(())
}

impl Serializable for Clip {
    const TYPE_NAME: &'static str = "Clip";

    fn type_tag(&self) -> &'static str {
        self.kind.tag()
    }

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("id", &self.id)?
            .value("startTime", &self.start_time)?
            .value("endTime", &self.end_time)?
            .value("duration", &self.duration)?
            .value("type", self.kind.label())?;

        match &self.kind {
            ClipKind::Silence => {}
            ClipKind::Subtitle(subtitle) => {
                out.value("surah", &subtitle.surah)?
                    .value("verse", &subtitle.verse)?
                    .value("startWordIndex", &subtitle.start_word_index)?
                    .value("endWordIndex", &subtitle.end_word_index)?
                    .value("text", &subtitle.text)?
                    .value("wbwTranslation", &subtitle.wbw_translation)?
                    .value("isFullVerse", &subtitle.is_full_verse)?
                    .value("isLastWordsOfVerse", &subtitle.is_last_words_of_verse)?;
                write_translations(out, &subtitle.translations)?;
            }
            ClipKind::PredefinedSubtitle(predefined) => {
                out.value("text", &predefined.text)?
                    .value("predefinedSubtitleType", &predefined.predefined_type)?;
                write_translations(out, &predefined.translations)?;
            }
            ClipKind::Asset(asset) => {
                out.value("assetId", &asset.asset_id)?;
            }
        }
        Ok(())
    }

    fn from_fields(variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        let label = match variant {
            "SilenceClip" => "Silence".to_string(),
            "SubtitleClip" => "Subtitle".to_string(),
            "PredefinedSubtitleClip" => "Pre-defined Subtitle".to_string(),
            "AssetClip" => "Asset".to_string(),
            // Base constructors: the legacy discriminant decides.
            _ => fields.value::<String>("type")?,
        };

        let kind = match label.as_str() {
            "Silence" => ClipKind::Silence,
            "Subtitle" => ClipKind::Subtitle(SubtitleClip {
                surah: fields.value("surah")?,
                verse: fields.value("verse")?,
                start_word_index: fields.value_or_default("startWordIndex")?,
                end_word_index: fields.value_or_default("endWordIndex")?,
                text: fields.value_or_default("text")?,
                wbw_translation: fields.value_or_default("wbwTranslation")?,
                is_full_verse: fields.value_or_default("isFullVerse")?,
                is_last_words_of_verse: fields.value_or_default("isLastWordsOfVerse")?,
                translations: fields.map("translations")?,
            }),
            "Pre-defined Subtitle" => ClipKind::PredefinedSubtitle(PredefinedSubtitleClip {
                text: fields.value_or_default("text")?,
                predefined_type: fields.value_or_default("predefinedSubtitleType")?,
                translations: fields.map("translations")?,
            }),
            "Asset" => ClipKind::Asset(AssetClip {
                asset_id: fields.value("assetId")?,
            }),
            other => {
                return Err(SerdeError::invalid(
                    "type",
                    fields.path(),
                    format!("unknown clip type '{other}'"),
                ))
            }
        };

        let start_time: TimeMs = fields.value("startTime")?;
        let end_time: TimeMs = fields.value("endTime")?;
        if start_time < 0 || end_time < start_time {
            return Err(SerdeError::invalid(
                "endTime",
                fields.path(),
                format!("inverted or negative times {start_time}..{end_time}"),
            ));
        }

        let duration = end_time - start_time;
        if let Some(stored) = fields.optional::<TimeMs>("duration")? {
            if stored != duration {
                warn!(
                    "Clip at {} stored duration {} ms but spans {} ms, using the span",
                    fields.path(),
                    stored,
                    duration
                );
            }
        }

        Ok(Self {
            id: fields.optional("id")?.unwrap_or_else(random_id),
            start_time,
            end_time,
            duration,
            kind,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
