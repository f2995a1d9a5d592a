//! Millisecond durations.

use std::fmt;

use tracing::warn;

use crate::core::serialization::{
    FieldReader, FieldWriter, SerdeError, SerdeResult, Serializable,
};
use crate::core::TimeMs;

/// Non-negative length of time in milliseconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    ms: TimeMs,
}

impl Duration {
    /// Creates a duration, clamping negative input to zero.
    pub fn new(ms: TimeMs) -> Self {
        if ms < 0 {
            warn!("Duration created with negative length ({} ms), clamping to 0", ms);
            return Self { ms: 0 };
        }
        Self { ms }
    }

    pub const fn zero() -> Self {
        Self { ms: 0 }
    }

    pub fn ms(&self) -> TimeMs {
        self.ms
    }

    /// Whole seconds, rounded down
    pub fn seconds(&self) -> i64 {
        self.ms / 1000
    }

    pub fn is_zero(&self) -> bool {
        self.ms == 0
    }

    /// Formats as `HH:MM:SS` when at least an hour long, `MM:SS` otherwise.
    ///
    /// With `hide_zero_minutes`, durations under a minute render as `SS`.
    pub fn formatted_time(&self, hide_zero_minutes: bool) -> String {
        let total_seconds = self.seconds();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
        } else if hide_zero_minutes && minutes == 0 {
            format!("{:02}", seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted_time(false))
    }
}

impl From<TimeMs> for Duration {
    fn from(ms: TimeMs) -> Self {
        Self::new(ms)
    }
}

impl Serializable for Duration {
    const TYPE_NAME: &'static str = "Duration";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("ms", &self.ms)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        let ms: TimeMs = fields.value_or("ms", 0)?;
        if ms < 0 {
            return Err(SerdeError::invalid(
                "ms",
                fields.path(),
                format!("negative duration {ms}"),
            ));
        }
        Ok(Self { ms })
    }
}
