//! Settings Persistence System
//!
//! Provides persistent application settings with:
//! - Atomic file writes (temp file + rename)
//! - A lock file shared with other processes (shared for reads, exclusive for writes)
//! - Defaults for every missing field
//! - Normalization of out-of-range values on load and save
//!
//! Storage location: {config_dir}/qurancaption/settings.json

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::captions::SubtitleFormat;
use crate::core::fs::atomic_write_json_pretty;
use crate::core::project::ARABIC_TARGET;
use crate::core::serialization::UnknownTagPolicy;
use crate::core::timeline::DEFAULT_ZOOM;
use crate::core::{CoreError, CoreResult};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file coordinating readers and writers across processes
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Application directory name under the platform config/data dirs
pub const APP_DIR_NAME: &str = "qurancaption";

/// Platform config directory for the application (`~/.config/qurancaption` on Linux)
pub fn default_app_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub general: GeneralSettings,

    #[serde(default)]
    pub editor: EditorSettings,

    #[serde(default)]
    pub export: ExportSettings,

    #[serde(default)]
    pub serialization: SerializationSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            general: GeneralSettings::default(),
            editor: EditorSettings::default(),
            export: ExportSettings::default(),
            serialization: SerializationSettings::default(),
        }
    }
}

impl AppSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected instead of rejected so an old or hand-edited
    /// file never prevents startup.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.general.recent_projects_limit = self.general.recent_projects_limit.clamp(1, 50);
        if self
            .general
            .projects_directory
            .as_deref()
            .is_some_and(|dir| dir.trim().is_empty())
        {
            self.general.projects_directory = None;
        }

        self.editor.default_timeline_zoom =
            clamp_f64(self.editor.default_timeline_zoom, 1.0, 500.0, DEFAULT_ZOOM);
        let language = self.editor.default_subtitle_language.trim().to_string();
        self.editor.default_subtitle_language = if language.is_empty() {
            default_subtitle_language()
        } else {
            language
        };

        self.export.default_targets = self
            .export
            .default_targets
            .iter()
            .map(|target| target.trim().to_string())
            .filter(|target| !target.is_empty())
            .collect();
        self.export.default_targets.dedup();
        if self.export.default_targets.is_empty() {
            self.export.default_targets = default_targets();
        }
    }

    /// Root of the project storage: the configured directory, else `app_dir`.
    ///
    /// Project files live under its `projects/` folder.
    pub fn storage_root(&self, app_dir: &Path) -> PathBuf {
        match &self.general.projects_directory {
            Some(dir) => PathBuf::from(dir),
            None => app_dir.to_path_buf(),
        }
    }
}

fn clamp_f64(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    /// Storage root for projects (defaults to the application directory)
    #[serde(default)]
    pub projects_directory: Option<String>,

    /// Recent projects limit
    #[serde(default = "default_recent_limit")]
    pub recent_projects_limit: u32,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            projects_directory: None,
            recent_projects_limit: default_recent_limit(),
        }
    }
}

fn default_recent_limit() -> u32 {
    10
}

/// Editor settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditorSettings {
    /// Timeline zoom of new projects, in pixels per second
    #[serde(default = "default_zoom")]
    pub default_timeline_zoom: f64,

    /// Target of the subtitle track created with a new project
    #[serde(default = "default_subtitle_language")]
    pub default_subtitle_language: String,

    /// Show audio waveforms in timeline
    #[serde(default)]
    pub show_waveforms: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_timeline_zoom: default_zoom(),
            default_subtitle_language: default_subtitle_language(),
            show_waveforms: false,
        }
    }
}

fn default_zoom() -> f64 {
    DEFAULT_ZOOM
}

fn default_subtitle_language() -> String {
    ARABIC_TARGET.to_string()
}

/// Subtitle export settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default)]
    pub default_subtitle_format: SubtitleFormat,

    /// Targets written into each block (`arabic` or translation keys)
    #[serde(default = "default_targets")]
    pub default_targets: Vec<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            default_subtitle_format: SubtitleFormat::Srt,
            default_targets: default_targets(),
        }
    }
}

fn default_targets() -> Vec<String> {
    vec![ARABIC_TARGET.to_string()]
}

/// Project file reading settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SerializationSettings {
    /// Handling of unknown `__type` tags while loading a project
    #[serde(default)]
    pub unknown_tag_policy: UnknownTagPolicy,

    /// Write indented project files
    #[serde(default = "default_true")]
    pub pretty_print: bool,
}

fn default_true() -> bool {
    true
}

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager with the given app directory
    pub fn new(app_dir: PathBuf) -> Self {
        Self {
            settings_path: app_dir.join(SETTINGS_FILE),
        }
    }

    /// Manager for the platform config directory
    pub fn from_default_location() -> CoreResult<Self> {
        default_app_dir()
            .map(Self::new)
            .ok_or_else(|| CoreError::Internal("No platform config directory".to_string()))
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Directory holding the settings file
    pub fn app_dir(&self) -> &Path {
        self.settings_path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn lock_path(&self) -> PathBuf {
        self.app_dir().join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        // The lock file lives next to the settings file.
        fs::create_dir_all(self.app_dir())?;

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Load settings from disk, returning defaults if the file is missing or unreadable
    pub fn load(&self) -> AppSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(AppSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings: AppSettings = serde_json::from_str(&content)?;
            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
                settings = self.migrate(settings);
            }
            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Save settings to disk using atomic write (temp file + rename)
    pub fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        let mut normalized = settings.clone();
        normalized.normalize();

        self.with_lock(true, || atomic_write_json_pretty(&self.settings_path, &normalized))?;

        info!("Settings saved to {}", self.settings_path.display());
        Ok(normalized)
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(())
        })?;
        Ok(AppSettings::default())
    }

    /// Migrate settings from older version
    fn migrate(&self, mut settings: AppSettings) -> AppSettings {
        settings.version = SETTINGS_VERSION;
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.general.recent_projects_limit, 10);
        assert_eq!(settings.editor.default_timeline_zoom, DEFAULT_ZOOM);
        assert_eq!(settings.editor.default_subtitle_language, "arabic");
        assert_eq!(settings.export.default_subtitle_format, SubtitleFormat::Srt);
        assert_eq!(
            settings.serialization.unknown_tag_policy,
            UnknownTagPolicy::Degrade
        );
    }

    #[test]
    fn test_settings_serialization() {
        let settings = AppSettings::default();
        let json = serde_json::to_value(&settings).unwrap();

        assert_eq!(json["export"]["defaultSubtitleFormat"], "SRT");
        assert_eq!(json["serialization"]["unknownTagPolicy"], "degrade");

        let back: AppSettings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path().to_path_buf());

        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path().join("nested"));

        let mut settings = AppSettings::default();
        settings.general.projects_directory = Some("/data/projects".to_string());
        settings.export.default_subtitle_format = SubtitleFormat::Vtt;
        settings.serialization.unknown_tag_policy = UnknownTagPolicy::FailFast;
        manager.save(&settings).unwrap();

        let loaded = manager.load();
        assert_eq!(loaded, settings);
        assert!(!temp_dir.path().join("nested/settings.json.tmp").exists());
    }

    #[test]
    fn test_reset_deletes_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path().to_path_buf());
        manager.save(&AppSettings::default()).unwrap();
        assert!(manager.settings_path().exists());

        let reset = manager.reset().unwrap();
        assert_eq!(reset, AppSettings::default());
        assert!(!manager.settings_path().exists());
    }

    #[test]
    fn test_invalid_json_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(SETTINGS_FILE), "{ not json").unwrap();
        let manager = SettingsManager::new(temp_dir.path().to_path_buf());

        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_partial_json_uses_defaults_for_missing() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(SETTINGS_FILE),
            r#"{"version": 0, "export": {"defaultSubtitleFormat": "VTT"}}"#,
        )
        .unwrap();
        let manager = SettingsManager::new(temp_dir.path().to_path_buf());

        let loaded = manager.load();
        assert_eq!(loaded.version, SETTINGS_VERSION);
        assert_eq!(loaded.export.default_subtitle_format, SubtitleFormat::Vtt);
        assert_eq!(loaded.export.default_targets, vec!["arabic".to_string()]);
        assert_eq!(loaded.general, GeneralSettings::default());
    }

    #[test]
    fn test_normalization_clamps_values() {
        let mut settings = AppSettings::default();
        settings.general.recent_projects_limit = 0;
        settings.general.projects_directory = Some("  ".to_string());
        settings.editor.default_timeline_zoom = f64::NAN;
        settings.editor.default_subtitle_language = " ".to_string();
        settings.export.default_targets = vec![" en ".to_string(), "".to_string()];

        settings.normalize();

        assert_eq!(settings.general.recent_projects_limit, 1);
        assert!(settings.general.projects_directory.is_none());
        assert_eq!(settings.editor.default_timeline_zoom, DEFAULT_ZOOM);
        assert_eq!(settings.editor.default_subtitle_language, "arabic");
        assert_eq!(settings.export.default_targets, vec!["en".to_string()]);
    }

    #[test]
    fn test_save_twice_overwrites_successfully() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path().to_path_buf());

        let mut settings = AppSettings::default();
        manager.save(&settings).unwrap();
        settings.general.recent_projects_limit = 20;
        manager.save(&settings).unwrap();

        assert_eq!(manager.load().general.recent_projects_limit, 20);
    }

    #[test]
    fn test_storage_root() {
        let mut settings = AppSettings::default();
        let app_dir = Path::new("/home/user/.config/qurancaption");
        assert_eq!(settings.storage_root(app_dir), app_dir.to_path_buf());

        settings.general.projects_directory = Some("/srv/captions".to_string());
        assert_eq!(
            settings.storage_root(app_dir),
            PathBuf::from("/srv/captions")
        );
    }

    #[test]
    fn test_concurrent_writers_leave_valid_file() {
        use std::thread;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();
        SettingsManager::new(dir.clone())
            .save(&AppSettings::default())
            .unwrap();

        // One manager per writer, as separate processes would have.
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let dir = dir.clone();
                thread::spawn(move || {
                    let manager = SettingsManager::new(dir);
                    for j in 0..5 {
                        let mut settings = AppSettings::default();
                        settings.general.recent_projects_limit = i * 10 + j;
                        manager.save(&settings).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("Thread should not panic");
        }

        let content = std::fs::read_to_string(temp_dir.path().join(SETTINGS_FILE)).unwrap();
        let on_disk: AppSettings = serde_json::from_str(&content).unwrap();
        assert!((1..=50).contains(&on_disk.general.recent_projects_limit));
        assert!(temp_dir.path().join(SETTINGS_LOCK_FILE).exists());
    }
}
