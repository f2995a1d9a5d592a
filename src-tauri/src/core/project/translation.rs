//! Project Translations
//!
//! Translation editions added to a project and the original verse texts they
//! provide. New subtitles are seeded from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};
use crate::core::timeline::TranslationSeed;
use crate::core::values::{verse_key, Translation, TranslationStatus};

/// A translation edition (one translator's work in one language)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Edition {
    pub key: String,
    /// Identifier used as translation key on clips
    pub name: String,
    pub author: String,
    pub language: String,
    /// `ltr` or `rtl`
    pub direction: String,
    pub source: String,
    pub comments: String,
    pub link: String,
    pub linkmin: String,
    #[serde(default = "default_true")]
    pub show_in_translations_editor: bool,
}

fn default_true() -> bool {
    true
}

impl Edition {
    pub fn new(
        name: impl Into<String>,
        author: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
            author: author.into(),
            language: language.into(),
            direction: "ltr".to_string(),
            show_in_translations_editor: true,
            ..Self::default()
        }
    }
}

impl Serializable for Edition {
    const TYPE_NAME: &'static str = "Edition";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("key", &self.key)?
            .value("name", &self.name)?
            .value("author", &self.author)?
            .value("language", &self.language)?
            .value("direction", &self.direction)?
            .value("source", &self.source)?
            .value("comments", &self.comments)?
            .value("link", &self.link)?
            .value("linkmin", &self.linkmin)?
            .value("showInTranslationsEditor", &self.show_in_translations_editor)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        Ok(Self {
            key: fields.value_or_default("key")?,
            name: fields.value("name")?,
            author: fields.value_or_default("author")?,
            language: fields.value_or_default("language")?,
            direction: fields.value_or("direction", "ltr".to_string())?,
            source: fields.value_or_default("source")?,
            comments: fields.value_or_default("comments")?,
            link: fields.value_or_default("link")?,
            linkmin: fields.value_or_default("linkmin")?,
            show_in_translations_editor: fields.value_or("showInTranslationsEditor", true)?,
        })
    }
}

/// Editions of a project and their downloaded verse texts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectTranslation {
    pub added_translations: Vec<Edition>,
    /// Edition name → verse key (`"surah:verse"`) → text
    pub quran_translations: BTreeMap<String, BTreeMap<String, String>>,
}

impl ProjectTranslation {
    /// Adds an edition with its verse texts, replacing one with the same name.
    pub fn add_edition(&mut self, edition: Edition, verses: BTreeMap<String, String>) {
        self.quran_translations.insert(edition.name.clone(), verses);
        self.added_translations.retain(|e| e.name != edition.name);
        self.added_translations.push(edition);
    }

    pub fn remove_edition(&mut self, name: &str) -> Option<Edition> {
        let index = self.added_translations.iter().position(|e| e.name == name)?;
        self.quran_translations.remove(name);
        Some(self.added_translations.remove(index))
    }

    pub fn edition(&self, name: &str) -> Option<&Edition> {
        self.added_translations.iter().find(|e| e.name == name)
    }

    /// Original text of a verse in an edition
    pub fn verse_text(&self, edition: &str, surah: u32, verse: u32) -> Option<&str> {
        self.quran_translations
            .get(edition)?
            .get(&verse_key(surah, verse))
            .map(String::as_str)
    }
}

impl TranslationSeed for ProjectTranslation {
    /// One translation per added edition that knows the verse. A partial
    /// verse still needs a translator's review.
    fn seed_translations(
        &self,
        surah: u32,
        verse: u32,
        is_full_verse: bool,
    ) -> BTreeMap<String, Translation> {
        let status = if is_full_verse {
            TranslationStatus::CompletedByDefault
        } else {
            TranslationStatus::ToTranslate
        };

        self.added_translations
            .iter()
            .filter_map(|edition| {
                let text = self.verse_text(&edition.name, surah, verse)?;
                Some((
                    edition.name.clone(),
                    Translation::verse(0, 0, text, status),
                ))
            })
            .collect()
    }
}

impl Serializable for ProjectTranslation {
    const TYPE_NAME: &'static str = "ProjectTranslation";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.list("addedTranslations", &self.added_translations)?
            .value("quranTranslations", &self.quran_translations)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        Ok(Self {
            added_translations: fields.list("addedTranslations")?,
            quran_translations: fields.value_or_default("quranTranslations")?,
        })
    }
}
