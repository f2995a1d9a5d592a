//! Verses handed to the subtitle editor, and surah names.

use serde::{Deserialize, Serialize};

/// One word of a verse
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Word {
    pub arabic: String,
    pub transliteration: String,
    /// Word-by-word translation
    pub translation: String,
}

impl Word {
    pub fn new(
        arabic: impl Into<String>,
        transliteration: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            arabic: arabic.into(),
            transliteration: transliteration.into(),
            translation: translation.into(),
        }
    }
}

/// A verse (ayah) with its words
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    pub id: u32,
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Verse {
    pub fn new(id: u32, words: Vec<Word>) -> Self {
        Self { id, words }
    }

    /// Arabic text of words `first..=last`, space separated.
    ///
    /// `last` past the end is clamped to the final word; `None` when the
    /// range is still empty afterwards.
    pub fn arabic_text_between(&self, first: u32, last: u32) -> Option<String> {
        self.join_words(first, last, |w| &w.arabic)
    }

    /// Word-by-word translation of words `first..=last`.
    pub fn word_by_word_between(&self, first: u32, last: u32) -> Option<String> {
        self.join_words(first, last, |w| &w.translation)
    }

    /// Whether `first..=last` covers every word
    pub fn is_full_verse(&self, first: u32, last: u32) -> bool {
        last >= first && self.words.len() == (last - first + 1) as usize
    }

    /// Whether `last` is the verse's final word
    pub fn is_last_words(&self, last: u32) -> bool {
        !self.words.is_empty() && last as usize + 1 == self.words.len()
    }

    fn join_words(
        &self,
        first: u32,
        last: u32,
        pick: impl Fn(&Word) -> &String,
    ) -> Option<String> {
        let max = self.words.len().checked_sub(1)?;
        let first = first as usize;
        let last = (last as usize).min(max);
        if first > last {
            return None;
        }
        Some(
            self.words[first..=last]
                .iter()
                .map(|w| pick(w).as_str())
                .collect::<Vec<_>>()
                .join(" "),
        )
    }
}

/// `"surah:verse"` key used by translation tables
pub fn verse_key(surah: u32, verse: u32) -> String {
    format!("{surah}:{verse}")
}

const SURAH_NAMES: [&str; 114] = [
    "Al-Fatihah", "Al-Baqarah", "Ali 'Imran", "An-Nisa", "Al-Ma'idah", "Al-An'am",
    "Al-A'raf", "Al-Anfal", "At-Tawbah", "Yunus", "Hud", "Yusuf", "Ar-Ra'd", "Ibrahim",
    "Al-Hijr", "An-Nahl", "Al-Isra", "Al-Kahf", "Maryam", "Taha", "Al-Anbya", "Al-Hajj",
    "Al-Mu'minun", "An-Nur", "Al-Furqan", "Ash-Shu'ara", "An-Naml", "Al-Qasas",
    "Al-'Ankabut", "Ar-Rum", "Luqman", "As-Sajdah", "Al-Ahzab", "Saba", "Fatir", "Ya-Sin",
    "As-Saffat", "Sad", "Az-Zumar", "Ghafir", "Fussilat", "Ash-Shuraa", "Az-Zukhruf",
    "Ad-Dukhan", "Al-Jathiyah", "Al-Ahqaf", "Muhammad", "Al-Fath", "Al-Hujurat", "Qaf",
    "Adh-Dhariyat", "At-Tur", "An-Najm", "Al-Qamar", "Ar-Rahman", "Al-Waqi'ah", "Al-Hadid",
    "Al-Mujadila", "Al-Hashr", "Al-Mumtahanah", "As-Saf", "Al-Jumu'ah", "Al-Munafiqun",
    "At-Taghabun", "At-Talaq", "At-Tahrim", "Al-Mulk", "Al-Qalam", "Al-Haqqah",
    "Al-Ma'arij", "Nuh", "Al-Jinn", "Al-Muzzammil", "Al-Muddaththir", "Al-Qiyamah",
    "Al-Insan", "Al-Mursalat", "An-Naba", "An-Nazi'at", "'Abasa", "At-Takwir",
    "Al-Infitar", "Al-Mutaffifin", "Al-Inshiqaq", "Al-Buruj", "At-Tariq", "Al-A'la",
    "Al-Ghashiyah", "Al-Fajr", "Al-Balad", "Ash-Shams", "Al-Layl", "Ad-Duhaa", "Ash-Sharh",
    "At-Tin", "Al-'Alaq", "Al-Qadr", "Al-Bayyinah", "Az-Zalzalah", "Al-'Adiyat",
    "Al-Qari'ah", "At-Takathur", "Al-'Asr", "Al-Humazah", "Al-Fil", "Quraysh", "Al-Ma'un",
    "Al-Kawthar", "Al-Kafirun", "An-Nasr", "Al-Masad", "Al-Ikhlas", "Al-Falaq", "An-Nas",
];

/// Transliterated name of surah `number` (1-based)
pub fn surah_name(number: u32) -> Option<&'static str> {
    let index = number.checked_sub(1)? as usize;
    SURAH_NAMES.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verse() -> Verse {
        Verse::new(
            1,
            vec![
                Word::new("بِسْمِ", "bis'mi", "In (the) name"),
                Word::new("ٱللَّهِ", "l-lahi", "(of) Allah"),
                Word::new("ٱلرَّحْمَٰنِ", "l-raḥmāni", "the Most Gracious"),
                Word::new("ٱلرَّحِيمِ", "l-raḥīmi", "the Most Merciful"),
            ],
        )
    }

    #[test]
    fn test_text_between_indexes() {
        let verse = verse();
        assert_eq!(verse.arabic_text_between(0, 1).as_deref(), Some("بِسْمِ ٱللَّهِ"));
        assert_eq!(
            verse.word_by_word_between(2, 3).as_deref(),
            Some("the Most Gracious the Most Merciful")
        );
    }

    #[test]
    fn test_last_index_is_clamped() {
        let verse = verse();
        assert_eq!(
            verse.word_by_word_between(3, 10).as_deref(),
            Some("the Most Merciful")
        );
        assert_eq!(verse.word_by_word_between(5, 10), None);
        assert_eq!(verse.word_by_word_between(2, 1), None);
        assert_eq!(Verse::new(2, Vec::new()).arabic_text_between(0, 0), None);
    }

    #[test]
    fn test_full_and_last_words() {
        let verse = verse();
        assert!(verse.is_full_verse(0, 3));
        assert!(!verse.is_full_verse(1, 3));
        assert!(verse.is_last_words(3));
        assert!(!verse.is_last_words(2));
    }

    #[test]
    fn test_surah_names() {
        assert_eq!(surah_name(1), Some("Al-Fatihah"));
        assert_eq!(surah_name(114), Some("An-Nas"));
        assert_eq!(surah_name(0), None);
        assert_eq!(surah_name(115), None);
    }
}
