//! QuranCaption Core Type Definitions
//!
//! Defines fundamental types and editing constants used throughout the project.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// ID Types
// =============================================================================

/// Numeric identifier issued by [`crate::core::ids::random_id`]
pub type Id = u64;

/// Clip unique identifier
pub type ClipId = Id;

/// Asset unique identifier
pub type AssetId = Id;

/// Project unique identifier
pub type ProjectId = Id;

// =============================================================================
// Time Types
// =============================================================================

/// Time in milliseconds
pub type TimeMs = i64;

/// Shortest duration a clip may be left with by a shrinking edit
pub const MIN_CLIP_DURATION_MS: TimeMs = 100;

/// Offset between the end of a clip and the start of the next contiguous clip
pub const CLIP_GAP_MS: TimeMs = 1;

/// Length of a silence spliced in front of an existing clip
pub const DEFAULT_SILENCE_DURATION_MS: TimeMs = 500;

/// Tolerance applied to both bounds of a verse-range window
pub const VERSE_RANGE_TOLERANCE_MS: TimeMs = 1000;

/// Current time at the millisecond precision project files store
pub fn now_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

// =============================================================================
// Time Range
// =============================================================================

/// Closed time window `[start_ms, end_ms]`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_ms: TimeMs,
    pub end_ms: TimeMs,
}

impl TimeRange {
    pub fn new(start_ms: TimeMs, end_ms: TimeMs) -> Self {
        if start_ms > end_ms {
            warn!(
                "TimeRange created with start > end ({} > {}), swapping",
                start_ms, end_ms
            );
            return Self {
                start_ms: end_ms,
                end_ms: start_ms,
            };
        }
        Self { start_ms, end_ms }
    }

    /// Returns duration in milliseconds
    pub fn duration(&self) -> TimeMs {
        self.end_ms - self.start_ms
    }

    /// Checks if a given time is within range (both bounds inclusive)
    pub fn contains(&self, time: TimeMs) -> bool {
        time >= self.start_ms && time <= self.end_ms
    }

    /// Checks if two ranges overlap
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_ms <= other.end_ms && self.end_ms >= other.start_ms
    }

    /// Widens both bounds by `tolerance`
    pub fn widened(&self, tolerance: TimeMs) -> Self {
        Self {
            start_ms: self.start_ms - tolerance,
            end_ms: self.end_ms + tolerance,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
