//! Duration Probing
//!
//! Media durations are read outside the edit path. The session asks a
//! [`DurationProbe`] and applies the answer once it arrives.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::core::{CoreError, CoreResult, TimeMs};

/// Reads the playback duration of a media file.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration of the file at `path`, in milliseconds
    async fn duration_ms(&self, path: &str) -> CoreResult<TimeMs>;
}

// =============================================================================
// FFprobe
// =============================================================================

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
}

/// Probe backed by the `ffprobe` executable
#[derive(Clone, Debug)]
pub struct FfprobeDurationProbe {
    program: String,
}

impl Default for FfprobeDurationProbe {
    fn default() -> Self {
        Self {
            program: "ffprobe".to_string(),
        }
    }
}

impl FfprobeDurationProbe {
    /// Uses the executable at `program` instead of the one on `PATH`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Parses ffprobe JSON output into milliseconds
    fn parse_output(json: &str) -> CoreResult<TimeMs> {
        let output: FFprobeOutput = serde_json::from_str(json)
            .map_err(|e| CoreError::ProbeFailed(format!("Failed to parse ffprobe output: {}", e)))?;

        let seconds: f64 = output
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse().ok())
            .ok_or_else(|| CoreError::ProbeFailed("ffprobe reported no duration".to_string()))?;

        Ok((seconds * 1000.0).round() as TimeMs)
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn duration_ms(&self, path: &str) -> CoreResult<TimeMs> {
        if !Path::new(path).exists() {
            return Err(CoreError::FileNotFound(path.to_string()));
        }

        let output = Command::new(&self.program)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .await
            .map_err(|e| CoreError::ProbeFailed(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::ProbeFailed(format!("FFprobe failed: {}", stderr)));
        }

        let duration = Self::parse_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Probed {} -> {} ms", path, duration);
        Ok(duration)
    }
}

// =============================================================================
// Tests
// =============================================================================
