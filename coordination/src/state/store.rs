//! JSON snapshot files for the notice store and error ledger
//!
//! Each document is written whole: serialized into a temp file next to the
//! target, then renamed over it. A reader never sees a half-written file.

use std::io::Write;
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

/// Error type for snapshot operations
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error in {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

/// Result type for snapshot operations
pub type StateResult<T> = Result<T, StateError>;

/// A JSON document of type `T` bound to a path
#[derive(Debug, Clone)]
pub struct SnapshotFile<T> {
    path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T> SnapshotFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _doc: PhantomData,
        }
    }

    /// Read the document; `Ok(None)` if the file does not exist
    pub fn load(&self) -> StateResult<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path).map_err(|source| StateError::Io {
            path: self.path.clone(),
            source,
        })?;
        let doc = serde_json::from_str(&json).map_err(|source| StateError::Serialization {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(doc))
    }

    /// Read the document, falling back to `T::default()` on any failure
    pub fn load_or_default(&self) -> T {
        match self.load() {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                debug!(path = %self.path.display(), "No snapshot yet, starting empty");
                T::default()
            }
            Err(e) => {
                warn!(error = %e, "Unreadable snapshot, starting empty");
                T::default()
            }
        }
    }

    /// Atomically replace the document on disk
    pub fn save(&self, doc: &T) -> StateResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|source| StateError::Io {
            path: dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(doc).map_err(|source| StateError::Serialization {
            path: self.path.clone(),
            source,
        })?;

        let io_err = |source| StateError::Io {
            path: self.path.clone(),
            source,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|source| StateError::Persist {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), bytes = json.len(), "Snapshot written");
        Ok(())
    }

    /// Save, logging instead of failing
    pub fn save_or_warn(&self, doc: &T) -> bool {
        match self.save(doc) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to write snapshot");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::{ErrorCategory, ErrorLedger, ErrorRecord};
    use crate::notice::{Notice, NoticeStore};

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let file: SnapshotFile<NoticeStore> = SnapshotFile::new(dir.path().join("cache.json"));
        assert!(file.load().unwrap().is_none());
        assert!(file.load_or_default().is_empty());
    }

    #[test]
    fn test_malformed_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.json");
        std::fs::write(&path, "{ not json").unwrap();
        let file: SnapshotFile<ErrorLedger> = SnapshotFile::new(&path);
        assert!(matches!(file.load(), Err(StateError::Serialization { .. })));
        assert!(file.load_or_default().is_clear());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let file: SnapshotFile<ErrorLedger> = SnapshotFile::new(dir.path().join("errors.json"));
        let mut ledger = ErrorLedger::new();
        ledger.current = ErrorRecord::first(ErrorCategory::Timeout, "deadline");
        file.save(&ledger).unwrap();
        assert_eq!(file.load().unwrap(), Some(ledger));
    }

    #[test]
    fn test_save_creates_parent_dirs_and_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state/cache.json");
        let file: SnapshotFile<NoticeStore> = SnapshotFile::new(&path);
        let mut store = NoticeStore::new();
        store.replace(vec![Notice::new("১", "ভর্তি বিজ্ঞপ্তি", "০১-০২-২০২৪", "")]);
        file.save(&store).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("ভর্তি বিজ্ঞপ্তি"));
        assert_eq!(file.load_or_default(), store);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let file: SnapshotFile<NoticeStore> = SnapshotFile::new(dir.path().join("cache.json"));
        let mut store = NoticeStore::new();
        store.replace(vec![Notice::new("1", "a", "d", "")]);
        file.save(&store).unwrap();
        store.replace(Vec::new());
        file.save(&store).unwrap();
        assert!(file.load_or_default().is_empty());
    }
}
