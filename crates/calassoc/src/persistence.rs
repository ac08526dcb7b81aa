//! Persistence for calibration stores - load/save JSON cache files.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::NamedTempFile;

use crate::error::{CalError, Result};
use crate::store::CalibrationStore;

/// Conventional file name for a calibration cache.
pub const DEFAULT_CACHE_NAME: &str = "calibrations.json";

impl CalibrationStore {
    /// Load a store from `path` if given and present, otherwise start empty.
    ///
    /// A missing file is not an error since the cache is simply created on
    /// the first save, but a file that exists and is not a valid store is.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use calassoc::CalibrationStore;
    /// let store = CalibrationStore::init(Some("calibrations.json")).unwrap();
    /// println!("Files: {}", store.associations.len());
    /// ```
    pub fn init(path: Option<impl AsRef<Path>>) -> Result<Self> {
        match path {
            Some(path) if path.as_ref().exists() => Self::load(path),
            Some(path) => {
                tracing::debug!(
                    path = %path.as_ref().display(),
                    "calibration cache not found, starting empty"
                );
                Ok(Self::new())
            }
            None => Ok(Self::new()),
        }
    }

    /// Load a store from a JSON file, validating its shape.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CalError::io(path, e))?;
        let store = Self::from_json_str(&text, &path.display().to_string())?;
        tracing::debug!(
            path = %path.display(),
            files = store.associations.len(),
            groups = store.calibrations.len(),
            "loaded calibration cache"
        );
        Ok(store)
    }

    /// Save the store as a user-editable JSON file.
    ///
    /// Output is byte-identical for an unchanged store. The file is written
    /// next to its destination and renamed into place, so a failed save
    /// leaves any previous version intact.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_json_string()?;
        write_atomic(path, text.as_bytes())?;
        tracing::debug!(path = %path.display(), "saved calibration cache");
        Ok(())
    }

    /// Save, first moving any differing existing version into history.
    ///
    /// File structure after calling:
    /// ```text
    /// reduction/
    /// ├── calibrations.json                    # Current version
    /// └── calibrations.history/
    ///     └── 2026-01-30T10-00-00.000.json     # Previous version
    /// ```
    pub fn save_with_history(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_json_string()?;

        if path.exists() {
            let existing = fs::read(path).map_err(|e| CalError::io(path, e))?;
            if existing == text.as_bytes() {
                return Ok(());
            }
            archive(path)?;
        }

        write_atomic(path, text.as_bytes())
    }

    /// List saved versions of a cache file, newest first.
    pub fn list_history(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let history_dir = history_directory(path.as_ref());

        if !history_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(&history_dir)
            .map_err(|e| CalError::io(&history_dir, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();

        // Timestamped names sort chronologically
        entries.sort_by(|a, b| b.cmp(a));

        Ok(entries)
    }

    /// Load a saved version; index 0 is the most recent.
    pub fn load_history(path: impl AsRef<Path>, index: usize) -> Result<Self> {
        let history = Self::list_history(&path)?;

        let history_path = history.get(index).ok_or_else(|| {
            CalError::History(format!(
                "version {} not found (only {} versions available)",
                index,
                history.len()
            ))
        })?;

        Self::load(history_path)
    }
}

/// Copy the current file into its history directory.
fn archive(path: &Path) -> Result<PathBuf> {
    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
    archive_as(path, &timestamp)
}

fn archive_as(path: &Path, timestamp: &str) -> Result<PathBuf> {
    let history_dir = history_directory(path);
    fs::create_dir_all(&history_dir).map_err(|e| CalError::io(&history_dir, e))?;

    // '_' sorts after '.', so same-instant backups still list newest first
    let mut target = history_dir.join(format!("{}.json", timestamp));
    let mut n = 1;
    while target.exists() {
        target = history_dir.join(format!("{}_{:03}.json", timestamp, n));
        n += 1;
    }

    fs::copy(path, &target).map_err(|e| CalError::io(&target, e))?;
    tracing::info!(backup = %target.display(), "archived previous calibration cache");
    Ok(target)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| CalError::io(parent, e))?;
    }

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| CalError::io(parent, e))?;
    tmp.write_all(contents).map_err(|e| CalError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| CalError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| CalError::io(path, e.error))?;
    Ok(())
}

/// Get the history directory for a cache file.
pub fn history_directory(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = path.parent().unwrap_or(Path::new("."));

    parent.join(format!("{}.history", stem))
}

/// The conventional cache path inside a reduction directory.
///
/// ```
/// use calassoc::persistence::cache_path;
///
/// assert_eq!(cache_path("reduction").to_string_lossy(), "reduction/calibrations.json");
/// ```
pub fn cache_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(DEFAULT_CACHE_NAME)
}
