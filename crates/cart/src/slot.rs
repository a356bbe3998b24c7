//! Client-local key-value storage for cart snapshots.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

/// Errors reading from or writing to a [`CartSlot`].
#[derive(Debug, Error)]
pub enum SlotError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be used as a storage name.
    #[error("invalid slot key: {0:?}")]
    InvalidKey(String),

    /// Storage refused the operation (quota, private mode, ...).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A durable string-valued key-value store.
///
/// This is the shape of browser `localStorage`: string keys, string values,
/// missing keys are not an error.
pub trait CartSlot: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read. A missing key is
    /// `Ok(None)`.
    fn load(&self, key: &str) -> Result<Option<String>, SlotError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), SlotError>;
}

/// In-memory slot.
///
/// Clones share the same map, so a store reopened on a clone sees what the
/// previous store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value stored under `key`, for inspection.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Overwrite the raw value under `key`, bypassing the cart.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.into());
    }
}

impl CartSlot for MemorySlot {
    fn load(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SlotError> {
        self.set(key, value);
        Ok(())
    }
}

/// Slot backed by one JSON file per key in a directory.
///
/// Writes go to `<key>.json.tmp` and are renamed over `<key>.json`, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    /// Open (and create if needed) a slot directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SlotError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, SlotError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(SlotError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl CartSlot for FileSlot {
    fn load(&self, key: &str) -> Result<Option<String>, SlotError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SlotError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}
