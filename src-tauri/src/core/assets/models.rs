//! Asset Model Definitions
//!
//! Media files imported into a project. The asset type is derived from the
//! file extension; durations are filled in later by a [`super::DurationProbe`].

use serde::{Deserialize, Serialize};

use crate::core::ids::random_id;
use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};
use crate::core::values::Duration;
use crate::core::AssetId;

/// Asset type enumeration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    Audio,
    Video,
    Image,
    #[default]
    Unknown,
}

impl AssetType {
    /// Maps a lowercase file extension to its asset type
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            "mp4" | "avi" | "mov" | "mkv" | "flv" | "webm" => AssetType::Video,
            "mp3" | "aac" | "ogg" | "flac" | "m4a" | "opus" | "wav" => AssetType::Audio,
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" => AssetType::Image,
            _ => AssetType::Unknown,
        }
    }

    /// Whether the media has a playback duration worth probing
    pub fn is_timed(&self) -> bool {
        matches!(self, AssetType::Audio | AssetType::Video)
    }
}

/// Main Asset structure
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub id: AssetId,
    pub file_name: String,
    /// Normalized path (forward slashes)
    pub file_path: String,
    pub asset_type: AssetType,
    pub duration: Duration,
    /// Cleared when the file cannot be found anymore
    pub exists: bool,
    pub from_youtube: bool,
    pub youtube_url: Option<String>,
}

impl Asset {
    /// Creates an asset for `file_path` with a fresh id and a zero duration.
    pub fn new(file_path: &str) -> Self {
        let file_path = normalize_file_path(file_path);
        let file_name = file_path.rsplit('/').next().unwrap_or_default().to_string();
        let asset_type = AssetType::from_extension(&extension_of(&file_name));

        Self {
            id: random_id(),
            file_name,
            file_path,
            asset_type,
            duration: Duration::zero(),
            exists: true,
            from_youtube: false,
            youtube_url: None,
        }
    }

    /// Creates an asset downloaded from `youtube_url`
    pub fn from_youtube(file_path: &str, youtube_url: impl Into<String>) -> Self {
        Self {
            from_youtube: true,
            youtube_url: Some(youtube_url.into()),
            ..Self::new(file_path)
        }
    }

    /// Lowercase extension, empty when the name has none
    pub fn extension(&self) -> String {
        extension_of(&self.file_name)
    }

    pub fn file_name_without_extension(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => &self.file_name,
        }
    }

    /// Directory holding the file.
    ///
    /// `.` without separators, `/` for files at the Unix root, `C:/` for
    /// files at a drive root and `//server/share` for UNC share roots.
    pub fn parent_directory(&self) -> String {
        let normalized = normalize_file_path(&self.file_path);
        let Some(last) = normalized.rfind('/') else {
            return ".".to_string();
        };

        if last == 0 {
            return "/".to_string();
        }
        if last == 2 && normalized.as_bytes().get(1) == Some(&b':') {
            return normalized[..3].to_string();
        }
        if normalized.starts_with("//") {
            let parts: Vec<&str> = normalized.split('/').collect();
            if parts.len() <= 4 {
                return parts.join("/");
            }
        }
        normalized[..last].to_string()
    }

    /// Points the asset at a new location and resets what depends on it.
    pub fn update_file_path(&mut self, file_path: &str) {
        self.file_path = normalize_file_path(file_path);
        self.exists = true;
        if self.asset_type.is_timed() {
            self.duration = Duration::zero();
        }
    }
}

/// Backslashes become `/`, repeated slashes collapse, a UNC prefix survives.
pub fn normalize_file_path(file_path: &str) -> String {
    let mut normalized = String::with_capacity(file_path.len());
    for c in file_path.chars() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }

    if file_path.starts_with("\\\\") || file_path.starts_with("//") {
        normalized.insert(0, '/');
    }
    normalized
}

fn extension_of(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

// =============================================================================
// Serialization
// =============================================================================

impl Serializable for Asset {
    const TYPE_NAME: &'static str = "Asset";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("id", &self.id)?
            .value("fileName", &self.file_name)?
            .value("filePath", &self.file_path)?
            .value("type", &self.asset_type)?
            .object("duration", &self.duration)?
            .value("exists", &self.exists)?
            .value("fromYoutube", &self.from_youtube)?;
        if let Some(url) = &self.youtube_url {
            out.value("youtubeUrl", url)?;
        }
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        Ok(Self {
            id: fields.value("id")?,
            file_name: fields.value_or_default("fileName")?,
            file_path: fields.value("filePath")?,
            asset_type: fields.value_or_default("type")?,
            duration: fields.object_or_else("duration", Duration::zero)?,
            exists: fields.value_or("exists", true)?,
            from_youtube: fields.value_or_default("fromYoutube")?,
            youtube_url: fields.optional("youtubeUrl")?,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
