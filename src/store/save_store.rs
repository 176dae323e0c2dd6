//! Single-writer JSON persistence with crash-safe writes and rotating
//! backups.
//!
//! Writes stage the document into a temp file in the same directory, flush
//! and fsync it, then rename over the destination, so a crash mid-write
//! leaves the previously committed file intact. Before overwriting, the
//! existing file is copied into `backups/` with a timestamped name and old
//! backups beyond the retention count are pruned.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use super::document::{validate_document, SaveData};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("save file not found")]
    NotFound,
    #[error("invalid save document: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub struct SaveStore {
    path: PathBuf,
    backup_retention: usize,
    doc: Mutex<SaveData>,
}

impl SaveStore {
    /// Load the document (or defaults when missing/invalid) and keep it as
    /// the in-memory authority for subsequent updates. Never fails: a
    /// corrupt or unreadable file degrades to a fresh default state.
    pub fn open(path: PathBuf, backup_retention: usize) -> Self {
        let doc = match Self::read_document(&path) {
            Ok(doc) => doc,
            Err(StoreError::NotFound) => {
                info!(path = %path.display(), "no save file, starting fresh");
                SaveData::default()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "save file unusable, starting fresh");
                SaveData::default()
            }
        };
        Self {
            path,
            backup_retention,
            doc: Mutex::new(doc),
        }
    }

    /// Read and validate a document straight from disk.
    pub fn read_document(path: &Path) -> Result<SaveData, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound);
        }
        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Err(StoreError::NotFound);
        }
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|err| StoreError::Invalid(err.to_string()))?;
        validate_document(&value).map_err(StoreError::Invalid)?;
        serde_json::from_value(value).map_err(|err| StoreError::Invalid(err.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone of the in-memory document.
    pub fn document(&self) -> SaveData {
        self.doc.lock().clone()
    }

    pub fn with_document<R>(&self, f: impl FnOnce(&SaveData) -> R) -> R {
        f(&self.doc.lock())
    }

    /// Mutate the in-memory document and write it through to disk.
    ///
    /// The mutation always sticks in memory; the returned error only reports
    /// whether the disk write succeeded.
    pub fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut SaveData),
    {
        let mut doc = self.doc.lock();
        f(&mut doc);
        self.write(&doc)
    }

    /// Write the current in-memory document to disk (the forced save at
    /// shutdown).
    pub fn persist(&self) -> Result<(), StoreError> {
        let doc = self.doc.lock();
        self.write(&doc)
    }

    /// Atomic write with backup-before-overwrite.
    pub fn write(&self, doc: &SaveData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        if self.path.exists() {
            self.backup_existing();
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let result = (|| -> Result<(), StoreError> {
            let bytes = serde_json::to_vec_pretty(doc)?;
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            drop(file);
            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    /// Drop everything: defaults in memory, save file and backups removed.
    pub fn reset(&self) -> Result<(), StoreError> {
        let mut doc = self.doc.lock();
        *doc = SaveData::default();

        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        if let Some(parent) = self.path.parent() {
            let backup_dir = parent.join("backups");
            if backup_dir.exists() {
                fs::remove_dir_all(&backup_dir)?;
            }
        }
        info!("save data reset");
        Ok(())
    }

    /// Best effort: a failed backup must not block the save itself.
    fn backup_existing(&self) {
        let Some(parent) = self.path.parent() else {
            return;
        };
        let Some(file_name) = self.path.file_name().map(|n| n.to_string_lossy().into_owned())
        else {
            return;
        };

        let backup_dir = parent.join("backups");
        if let Err(err) = fs::create_dir_all(&backup_dir) {
            warn!(error = %err, "failed to create backup directory");
            return;
        }

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S%3f");
        let backup_path = backup_dir.join(format!("{stamp}_{file_name}"));
        if let Err(err) = fs::copy(&self.path, &backup_path) {
            warn!(error = %err, "failed to back up save file");
            return;
        }

        self.prune_backups(&backup_dir, &file_name);
    }

    fn prune_backups(&self, backup_dir: &Path, file_name: &str) {
        if self.backup_retention == 0 {
            return;
        }

        let suffix = format!("_{file_name}");
        let entries = match fs::read_dir(backup_dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "failed to list backup directory");
                return;
            }
        };

        let mut backups: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(&suffix))
            .collect();

        // Zero-padded timestamps sort lexicographically, newest first here.
        backups.sort_unstable_by(|a, b| b.cmp(a));
        for old in backups.iter().skip(self.backup_retention) {
            if let Err(err) = fs::remove_file(backup_dir.join(old)) {
                warn!(backup = %old, error = %err, "failed to prune old backup");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = SaveStore::read_document(&dir.path().join("save_data.json")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn test_read_empty_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save_data.json");
        fs::write(&path, "  \n").unwrap();
        assert!(matches!(
            SaveStore::read_document(&path).unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[test]
    fn test_read_malformed_json_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save_data.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SaveStore::read_document(&path).unwrap_err(),
            StoreError::Invalid(_)
        ));
    }

    #[test]
    fn test_open_with_corrupt_file_degrades_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save_data.json");
        fs::write(&path, "garbage").unwrap();
        let store = SaveStore::open(path, 3);
        assert_eq!(store.document(), SaveData::default());
    }

    #[test]
    fn test_update_writes_through_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save_data.json");

        let store = SaveStore::open(path.clone(), 3);
        store
            .update(|doc| doc.user.username = "rin".to_string())
            .unwrap();

        let reopened = SaveStore::open(path, 3);
        assert_eq!(reopened.document().user.username, "rin");
    }

    #[test]
    fn test_reset_removes_files_and_restores_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save_data.json");
        let store = SaveStore::open(path.clone(), 3);

        store.update(|doc| doc.user.total_study_time = 99).unwrap();
        store.update(|doc| doc.user.total_study_time = 100).unwrap();
        assert!(path.exists());

        store.reset().unwrap();
        assert!(!path.exists());
        assert!(!dir.path().join("backups").exists());
        assert_eq!(store.document(), SaveData::default());
    }
}
