//! Timeline Module
//!
//! Clips, tracks and the timeline, with the interval rules that keep a
//! track's clips ordered, non-overlapping and at least 100 ms long after any
//! shrinking edit.

mod clip;
mod models;
mod track;

pub use clip::*;
pub use models::*;
pub use track::*;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;

use crate::core::values::Translation;
use crate::core::{ClipId, TimeMs};

// =============================================================================
// Edit Cursor
// =============================================================================

/// Pixels per second used when no editor state is available
pub const DEFAULT_ZOOM: f64 = 29.25;

/// Where the user is positioned on the timeline.
///
/// Track operations that append "up to the cursor" read it through this trait.
pub trait EditCursor {
    fn cursor_position(&self) -> TimeMs;

    /// Pixels per second
    fn zoom(&self) -> f64 {
        DEFAULT_ZOOM
    }
}

impl EditCursor for TimeMs {
    fn cursor_position(&self) -> TimeMs {
        *self
    }
}

/// Supplies the initial translations of a new subtitle, keyed by edition.
pub trait TranslationSeed {
    fn seed_translations(
        &self,
        surah: u32,
        verse: u32,
        is_full_verse: bool,
    ) -> BTreeMap<String, Translation>;
}

/// No translations
impl TranslationSeed for () {
    fn seed_translations(&self, _: u32, _: u32, _: bool) -> BTreeMap<String, Translation> {
        BTreeMap::new()
    }
}

// =============================================================================
// Edit Results
// =============================================================================

/// How the clips after a removed clip react
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemovalMode {
    /// Every following clip is packed contiguously from the removal point.
    #[default]
    Shift,
    /// Only the next clip's start moves back to the removed clip's start.
    Hold,
}

/// Why an edit was refused. A refused edit never mutates the track.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditRejection {
    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),

    #[error("End time must be greater than start time ({start_ms} ms -> {end_ms} ms)")]
    InvalidTimeRange { start_ms: TimeMs, end_ms: TimeMs },

    #[error("Clip {clip_id} would last {duration_ms} ms, below the {min_ms} ms minimum")]
    ClipTooShort {
        clip_id: ClipId,
        duration_ms: TimeMs,
        min_ms: TimeMs,
    },

    #[error("Adjacent clip {clip_id} would last {duration_ms} ms, below the {min_ms} ms minimum")]
    NeighbourTooShort {
        clip_id: ClipId,
        duration_ms: TimeMs,
        min_ms: TimeMs,
    },

    #[error("A background image cannot be added to a track that already holds clips")]
    BackgroundImageConflict,

    #[error("Clip {0} is not a subtitle")]
    NotASubtitle(ClipId),

    #[error("Invalid word range {first}..={last} for verse {verse}")]
    InvalidWordRange { verse: u32, first: u32, last: u32 },

    #[error("Operation requires a {expected:?} track, found {found:?}")]
    WrongTrackKind {
        expected: TrackType,
        found: TrackType,
    },
}

/// Result of a track edit
pub type EditResult<T> = Result<T, EditRejection>;

/// Logs and returns a refusal.
pub(crate) fn refuse<T>(rejection: EditRejection) -> EditResult<T> {
    warn!("Edit refused: {}", rejection);
    Err(rejection)
}
