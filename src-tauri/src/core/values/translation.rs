//! Subtitle translations.

use serde::{Deserialize, Serialize};

use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};

/// Review state of a translation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TranslationStatus {
    /// Taken unchanged from the source edition
    #[default]
    #[serde(rename = "completed by default")]
    CompletedByDefault,
    #[serde(rename = "to translate")]
    ToTranslate,
    #[serde(rename = "translated")]
    Translated,
}

/// Which clip family a translation belongs to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TranslationKind {
    Plain,
    #[default]
    Verse,
    PredefinedSubtitle,
}

impl TranslationKind {
    pub fn tag(&self) -> &'static str {
        match self {
            TranslationKind::Plain => "Translation",
            TranslationKind::Verse => "VerseTranslation",
            TranslationKind::PredefinedSubtitle => "PredefinedSubtitleTranslation",
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "VerseTranslation" => TranslationKind::Verse,
            "PredefinedSubtitleTranslation" => TranslationKind::PredefinedSubtitle,
            _ => TranslationKind::Plain,
        }
    }
}

/// Translation of the words `[start_word_index, end_word_index]` of a subtitle
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Translation {
    pub kind: TranslationKind,
    pub start_word_index: u32,
    pub end_word_index: u32,
    pub text: String,
    pub status: TranslationStatus,
    /// Text written by hand instead of derived from the source edition
    pub is_brute_force: bool,
}

impl Translation {
    pub fn verse(
        start_word_index: u32,
        end_word_index: u32,
        text: impl Into<String>,
        status: TranslationStatus,
    ) -> Self {
        Self {
            kind: TranslationKind::Verse,
            start_word_index,
            end_word_index,
            text: text.into(),
            status,
            is_brute_force: false,
        }
    }

    pub fn predefined(text: impl Into<String>, status: TranslationStatus) -> Self {
        Self {
            kind: TranslationKind::PredefinedSubtitle,
            text: text.into(),
            status,
            ..Self::default()
        }
    }

    /// Whether the translation needs no further review
    pub fn is_status_complete(&self) -> bool {
        matches!(
            self.status,
            TranslationStatus::CompletedByDefault | TranslationStatus::Translated
        )
    }
}

impl Serializable for Translation {
    const TYPE_NAME: &'static str = "Translation";

    fn type_tag(&self) -> &'static str {
        self.kind.tag()
    }

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("startWordIndex", &self.start_word_index)?
            .value("endWordIndex", &self.end_word_index)?
            .value("text", &self.text)?
            .value("status", &self.status)?
            .value("isBruteForce", &self.is_brute_force)?;
        Ok(())
    }

    fn from_fields(variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        Ok(Self {
            kind: TranslationKind::from_tag(variant),
            start_word_index: fields.value_or_default("startWordIndex")?,
            end_word_index: fields.value_or_default("endWordIndex")?,
            text: fields.value_or_default("text")?,
            status: fields.value_or_default("status")?,
            is_brute_force: fields.value_or_default("isBruteForce")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_completion() {
        let mut translation = Translation::verse(
            0,
            3,
            "In the name of God",
            TranslationStatus::CompletedByDefault,
        );
        assert!(translation.is_status_complete());

        translation.status = TranslationStatus::ToTranslate;
        assert!(!translation.is_status_complete());

        translation.status = TranslationStatus::Translated;
        assert!(translation.is_status_complete());
    }

    #[test]
    fn test_status_uses_original_labels() {
        assert_eq!(
            serde_json::to_string(&TranslationStatus::CompletedByDefault).unwrap(),
            "\"completed by default\""
        );
        let status: TranslationStatus = serde_json::from_str("\"to translate\"").unwrap();
        assert_eq!(status, TranslationStatus::ToTranslate);
    }

    #[test]
    fn test_kind_tags() {
        let predefined = Translation::predefined("x", TranslationStatus::Translated);
        assert_eq!(predefined.type_tag(), "PredefinedSubtitleTranslation");
        assert_eq!(
            TranslationKind::from_tag("VerseTranslation"),
            TranslationKind::Verse
        );
        assert_eq!(TranslationKind::from_tag("Translation"), TranslationKind::Plain);
    }
}
