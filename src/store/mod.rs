//! Durable blob store for order/selection state.
//!
//! The engine treats persistence as a key-value blob store: one blob for the
//! ordered id sequence, one for the selected id set. Both are whole-file
//! overwrites on every mutation, never append logs.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::ItemId;
use crate::error::Transience;

/// Which persisted blob an operation touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blob {
    Order,
    Selected,
}

impl Blob {
    pub fn as_str(self) -> &'static str {
        match self {
            Blob::Order => "order",
            Blob::Selected => "selected",
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            Blob::Order => "order.json",
            Blob::Selected => "selected.json",
        }
    }
}

/// Persistence failures, with blob and path context.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistError {
    #[error("failed to create data dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {blob} blob at {path}: {source}")]
    Read {
        blob: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {blob} blob at {path}: {source}")]
    Write {
        blob: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{blob} blob at {path} is not valid JSON: {source}")]
    Decode {
        blob: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {blob} blob: {source}")]
    Encode {
        blob: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistError {
    /// IO failures may clear on retry; a blob that does not parse will not.
    pub fn transience(&self) -> Transience {
        match self {
            PersistError::CreateDir { .. }
            | PersistError::Read { .. }
            | PersistError::Write { .. } => Transience::Retryable,
            PersistError::Decode { .. } | PersistError::Encode { .. } => Transience::Permanent,
        }
    }
}

/// Durable blob store behind the engine.
///
/// `load_*` returns the persisted sequence, or empty when nothing was ever
/// saved. `save_*` must be atomic: a failed save leaves the previous blob as
/// the durable baseline.
pub trait StateStore: Send {
    fn load_order(&self) -> Result<Vec<ItemId>, PersistError>;
    fn save_order(&mut self, order: &[ItemId]) -> Result<(), PersistError>;
    fn load_selected(&self) -> Result<Vec<ItemId>, PersistError>;
    fn save_selected(&mut self, selected: &[ItemId]) -> Result<(), PersistError>;
}

/// JSON files under a data directory, overwritten via temp-file + rename so a
/// torn write never replaces a good blob.
#[derive(Debug)]
pub struct JsonStateStore {
    dir: PathBuf,
}

impl JsonStateStore {
    /// Open the store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| PersistError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn blob_path(&self, blob: Blob) -> PathBuf {
        self.dir.join(blob.file_name())
    }

    fn load(&self, blob: Blob) -> Result<Vec<ItemId>, PersistError> {
        let path = self.blob_path(blob);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PersistError::Read {
                    blob: blob.as_str(),
                    path,
                    source,
                });
            }
        };
        serde_json::from_slice(&contents).map_err(|source| PersistError::Decode {
            blob: blob.as_str(),
            path,
            source,
        })
    }

    fn save(&self, blob: Blob, ids: &[ItemId]) -> Result<(), PersistError> {
        let bytes = serde_json::to_vec(ids).map_err(|source| PersistError::Encode {
            blob: blob.as_str(),
            source,
        })?;
        let path = self.blob_path(blob);
        let tmp = self.dir.join(format!("{}.tmp", blob.file_name()));
        fs::write(&tmp, &bytes).map_err(|source| PersistError::Write {
            blob: blob.as_str(),
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| PersistError::Write {
            blob: blob.as_str(),
            path,
            source,
        })
    }
}

impl StateStore for JsonStateStore {
    fn load_order(&self) -> Result<Vec<ItemId>, PersistError> {
        self.load(Blob::Order)
    }

    fn save_order(&mut self, order: &[ItemId]) -> Result<(), PersistError> {
        self.save(Blob::Order, order)
    }

    fn load_selected(&self) -> Result<Vec<ItemId>, PersistError> {
        self.load(Blob::Selected)
    }

    fn save_selected(&mut self, selected: &[ItemId]) -> Result<(), PersistError> {
        self.save(Blob::Selected, selected)
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    order: Vec<ItemId>,
    selected: Vec<ItemId>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from pre-existing state, as if it had been persisted earlier.
    pub fn with_state(order: Vec<ItemId>, selected: Vec<ItemId>) -> Self {
        Self { order, selected }
    }
}

impl StateStore for MemoryStateStore {
    fn load_order(&self) -> Result<Vec<ItemId>, PersistError> {
        Ok(self.order.clone())
    }

    fn save_order(&mut self, order: &[ItemId]) -> Result<(), PersistError> {
        self.order = order.to_vec();
        Ok(())
    }

    fn load_selected(&self) -> Result<Vec<ItemId>, PersistError> {
        Ok(self.selected.clone())
    }

    fn save_selected(&mut self, selected: &[ItemId]) -> Result<(), PersistError> {
        self.selected = selected.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId::new).collect()
    }

    #[test]
    fn missing_blobs_load_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::open(dir.path().join("data")).unwrap();
        assert!(store.load_order().unwrap().is_empty());
        assert!(store.load_selected().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStateStore::open(dir.path()).unwrap();

        store.save_order(&ids(&[3, 1, 2])).unwrap();
        store.save_selected(&ids(&[2])).unwrap();

        assert_eq!(store.load_order().unwrap(), ids(&[3, 1, 2]));
        assert_eq!(store.load_selected().unwrap(), ids(&[2]));
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStateStore::open(dir.path()).unwrap();
        store.save_order(&ids(&[1])).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("order.json")]);
    }

    #[test]
    fn corrupt_blob_reports_decode_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::open(dir.path()).unwrap();
        std::fs::write(store.blob_path(Blob::Order), b"not json").unwrap();

        let err = store.load_order().unwrap_err();
        assert!(matches!(err, PersistError::Decode { blob: "order", .. }));
        assert_eq!(err.transience(), Transience::Permanent);
    }
}
