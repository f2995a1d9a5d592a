//! Verse ranges covered by a time window.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::surah_name;
use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};
use crate::core::timeline::Clip;
use crate::core::{TimeRange, VERSE_RANGE_TOLERANCE_MS};

/// Contiguous verses of one surah
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersePart {
    pub surah: u32,
    pub verse_start: u32,
    pub verse_end: u32,
}

/// Verses covered per surah, sorted by surah
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerseRange {
    pub parts: Vec<VersePart>,
}

impl VerseRange {
    pub fn new(mut parts: Vec<VersePart>) -> Self {
        parts.sort_by_key(|p| p.surah);
        Self { parts }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Aggregates the verses of the subtitle clips inside `window`.
    ///
    /// A clip counts when `start >= window.start - 1000` and
    /// `end <= window.end + 1000`. Non-subtitle clips are ignored.
    pub fn get_verse_range<'a>(
        window: TimeRange,
        clips: impl IntoIterator<Item = &'a Clip>,
    ) -> Self {
        let bounds = window.widened(VERSE_RANGE_TOLERANCE_MS);
        let mut parts: Vec<VersePart> = Vec::new();

        for clip in clips {
            let Some(subtitle) = clip.subtitle() else {
                continue;
            };
            if clip.start_time() < bounds.start_ms || clip.end_time() > bounds.end_ms {
                continue;
            }

            match parts.iter_mut().find(|p| p.surah == subtitle.surah) {
                Some(part) => {
                    part.verse_start = part.verse_start.min(subtitle.verse);
                    part.verse_end = part.verse_end.max(subtitle.verse);
                }
                None => parts.push(VersePart {
                    surah: subtitle.surah,
                    verse_start: subtitle.verse,
                    verse_end: subtitle.verse,
                }),
            }
        }

        Self::new(parts)
    }

    /// `Surah Al-Fatihah: 1-7, Surah Al-Baqarah: 1`, or `none` when empty.
    pub fn describe(&self) -> String {
        if self.parts.is_empty() {
            return "none".to_string();
        }
        self.parts
            .iter()
            .map(|part| {
                let name = surah_name(part.surah)
                    .map(str::to_string)
                    .unwrap_or_else(|| part.surah.to_string());
                if part.verse_start == part.verse_end {
                    format!("Surah {}: {}", name, part.verse_start)
                } else {
                    format!("Surah {}: {}-{}", name, part.verse_start, part.verse_end)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Variant of [`describe`](Self::describe) safe for file names
    pub fn describe_for_export_file(&self) -> String {
        self.describe().replace(':', "").replace("Surah ", "")
    }
}

impl fmt::Display for VerseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl Serializable for VerseRange {
    const TYPE_NAME: &'static str = "VerseRange";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("parts", &self.parts)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        Ok(Self {
            parts: fields.value_or_default("parts")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeline::{Clip, ClipKind, SubtitleClip};

    fn subtitle(start: i64, end: i64, surah: u32, verse: u32) -> Clip {
        Clip::new(
            start,
            end,
            ClipKind::Subtitle(SubtitleClip {
                surah,
                verse,
                ..SubtitleClip::default()
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_window_tolerance_includes_neighbouring_clips() {
        let clips = vec![subtitle(4200, 6000, 2, 5), subtitle(6001, 9500, 2, 6)];
        let range = VerseRange::get_verse_range(TimeRange::new(5000, 10000), &clips);
        assert_eq!(
            range.parts,
            vec![VersePart {
                surah: 2,
                verse_start: 5,
                verse_end: 6
            }]
        );
    }

    #[test]
    fn test_clips_outside_window_are_skipped() {
        let clips = vec![subtitle(0, 2000, 1, 1), subtitle(3500, 4500, 1, 2)];
        let range = VerseRange::get_verse_range(TimeRange::new(5000, 10000), &clips);
        assert!(range.is_empty());
        assert_eq!(range.describe(), "none");
    }

    #[test]
    fn test_parts_sorted_by_surah_with_min_max() {
        let clips = vec![
            subtitle(0, 100, 3, 7),
            subtitle(101, 200, 1, 4),
            subtitle(201, 300, 3, 2),
            subtitle(301, 400, 1, 6),
        ];
        let range = VerseRange::get_verse_range(TimeRange::new(0, 400), &clips);
        assert_eq!(
            range.parts,
            vec![
                VersePart { surah: 1, verse_start: 4, verse_end: 6 },
                VersePart { surah: 3, verse_start: 2, verse_end: 7 },
            ]
        );
    }

    #[test]
    fn test_non_subtitle_clips_are_ignored() {
        let silence = Clip::new(0, 500, ClipKind::Silence).unwrap();
        let clips = vec![silence, subtitle(501, 900, 112, 1)];
        let range = VerseRange::get_verse_range(TimeRange::new(0, 900), &clips);
        assert_eq!(range.parts.len(), 1);
        assert_eq!(range.parts[0].surah, 112);
    }

    #[test]
    fn test_describe_and_export_variant() {
        let range = VerseRange::new(vec![
            VersePart { surah: 76, verse_start: 12, verse_end: 21 },
            VersePart { surah: 1, verse_start: 1, verse_end: 1 },
        ]);
        assert_eq!(range.describe(), "Surah Al-Fatihah: 1, Surah Al-Insan: 12-21");
        assert_eq!(range.describe_for_export_file(), "Al-Fatihah 1, Al-Insan 12-21");
    }
}
