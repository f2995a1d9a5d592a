//! Filesystem utilities.
//!
//! Crash-tolerant writes for project files, settings and exported subtitles,
//! plus validation of the storage keys that become file paths.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Key Validation
// =============================================================================

/// Validates one component of a storage key.
///
/// Rejects empty components, `..`, path separators, drive letters and
/// control characters.
pub fn validate_path_id_component(id: &str, label: &str) -> CoreResult<()> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationError(format!(
            "{label} is empty or contains only whitespace"
        )));
    }
    if trimmed.contains("..")
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains(':')
    {
        return Err(CoreError::ValidationError(format!(
            "Invalid {label}: contains path traversal characters"
        )));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(CoreError::ValidationError(format!(
            "Invalid {label}: contains control characters"
        )));
    }
    Ok(())
}

/// Resolves a `/`-separated storage key below `root`.
pub fn resolve_key(root: &Path, key: &str) -> CoreResult<PathBuf> {
    let mut path = root.to_path_buf();
    for component in key.split('/') {
        validate_path_id_component(component, "storage key")?;
        path.push(component);
    }
    // Every component must stay a plain name.
    if path
        .strip_prefix(root)
        .map(|rel| rel.components().any(|c| !matches!(c, Component::Normal(_))))
        .unwrap_or(true)
    {
        return Err(CoreError::ValidationError(format!(
            "Invalid storage key: {key}"
        )));
    }
    Ok(path)
}

// =============================================================================
// Atomic Writes
// =============================================================================

/// Write bytes to `path` using an atomic replace pattern.
///
/// - Write to a sibling temporary file.
/// - Flush and sync the temp file.
/// - Swap into place by renaming.
/// - If the destination exists, it is first moved aside as a `.bak` file, then removed.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path_for(path);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    atomic_replace(path, &tmp_path)
}

/// Write a JSON file atomically with pretty formatting.
pub fn atomic_write_json_pretty<T: serde::Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write_bytes(path, &bytes)
}

/// Sibling `<name>.tmp` path used while a file is being written
pub fn tmp_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "tmp")
}

fn bak_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "bak")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| suffix.to_string());
    sibling.set_file_name(format!("{file_name}.{suffix}"));
    sibling
}

/// Moves a finished temporary file over `dest`.
pub fn atomic_replace(dest: &Path, src_tmp: &Path) -> CoreResult<()> {
    if !dest.exists() {
        std::fs::rename(src_tmp, dest)?;
        return Ok(());
    }

    // Rename-over-existing fails on some Windows filesystems.
    let bak = bak_path_for(dest);
    if bak.exists() {
        let _ = std::fs::remove_file(&bak);
    }

    std::fs::rename(dest, &bak)?;
    match std::fs::rename(src_tmp, dest) {
        Ok(()) => {
            let _ = std::fs::remove_file(&bak);
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::rename(&bak, dest);
            let _ = std::fs::remove_file(src_tmp);
            Err(CoreError::IoError(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_bytes_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects").join("1.json");

        atomic_write_bytes(&path, b"one").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one");

        atomic_write_bytes(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
        assert!(!tmp_path_for(&path).exists());
        assert!(!bak_path_for(&path).exists());
    }

    #[test]
    fn atomic_write_json_pretty_is_readable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        atomic_write_json_pretty(&path, &serde_json::json!({"version": 1})).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"version\": 1"));
    }

    #[test]
    fn test_tmp_path_for() {
        assert_eq!(
            tmp_path_for(Path::new("/p/captions.srt")),
            PathBuf::from("/p/captions.srt.tmp")
        );
    }

    #[test]
    fn test_validate_path_id_component() {
        assert!(validate_path_id_component("1719000000000123.json", "key").is_ok());
        assert!(validate_path_id_component("", "key").is_err());
        assert!(validate_path_id_component("..", "key").is_err());
        assert!(validate_path_id_component("a/b", "key").is_err());
        assert!(validate_path_id_component("a\\b", "key").is_err());
        assert!(validate_path_id_component("C:", "key").is_err());
        assert!(validate_path_id_component("a\0b", "key").is_err());
    }

    #[test]
    fn test_resolve_key() {
        let root = Path::new("/data");
        assert_eq!(
            resolve_key(root, "projects/42.json").unwrap(),
            PathBuf::from("/data/projects/42.json")
        );
        assert!(resolve_key(root, "projects/../secrets").is_err());
        assert!(resolve_key(root, "/etc/passwd").is_err());
        assert!(resolve_key(root, "projects//x").is_err());
    }
}
