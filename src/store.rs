//! Cart persistence
//!
//! An explicit, injected store the application calls at defined lifecycle
//! points: load once at startup, save after every mutation, clear at
//! checkout. The persisted state is one serialized blob, overwritten
//! wholesale on every save; there is no versioning or migration logic and
//! exactly one writer.

use std::{
    cell::RefCell,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::Totals;

/// Errors raised on a store load or save.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error reading or writing the snapshot file
    #[error("Failed to access cart snapshot: {0}")]
    Io(#[from] io::Error),

    /// Snapshot serialization error
    #[error("Failed to serialize cart snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// One persisted cart line: external product identifier plus quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    /// Product identifier
    pub id: String,

    /// Quantity held
    pub quantity: u32,
}

/// The wholesale persisted state: cart lines plus the derived totals at
/// save time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Persisted lines, in insertion order
    pub lines: Vec<LineSnapshot>,

    /// Derived totals at save time
    pub totals: Totals,
}

/// A persistence seam for cart snapshots.
///
/// Implementations hold exactly one snapshot; `save` replaces it wholesale.
pub trait CartStore {
    /// Load the stored snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the snapshot exists but cannot be read or
    /// parsed. A missing snapshot is `Ok(None)`, not an error.
    fn load(&self) -> Result<Option<CartSnapshot>, StoreError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the snapshot cannot be written.
    fn save(&self, snapshot: &CartSnapshot) -> Result<(), StoreError>;

    /// Discard the stored snapshot; no-op if none exists.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the snapshot exists but cannot be removed.
    fn clear(&self) -> Result<(), StoreError>;
}

/// File-backed store: one JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the given path. Nothing is touched on disk
    /// until the first `save`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    /// The path this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStore for JsonFileStore {
    fn load(&self) -> Result<Option<CartSnapshot>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let snapshot: CartSnapshot = serde_json::from_str(&contents)?;

        tracing::debug!(path = %self.path.display(), lines = snapshot.lines.len(), "loaded cart snapshot");

        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(snapshot)?;

        fs::write(&self.path, contents)?;

        tracing::debug!(path = %self.path.display(), lines = snapshot.lines.len(), "saved cart snapshot");

        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process store for tests and demos. Single-threaded, like everything
/// else in the cart's execution model.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: RefCell<Option<CartSnapshot>>,
}

impl MemoryStore {
    /// Create an empty in-process store.
    #[must_use]
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl CartStore for MemoryStore {
    fn load(&self) -> Result<Option<CartSnapshot>, StoreError> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<(), StoreError> {
        *self.slot.borrow_mut() = Some(snapshot.clone());

        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.borrow_mut() = None;

        Ok(())
    }
}
