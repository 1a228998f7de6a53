//! Persistence
//!
//! The engine performs no I/O of its own. Hosts that persist cart state
//! capture a [`CartSnapshot`] from the cart after a successful mutation and
//! hand it to a [`CartStorage`] collaborator — an explicit mutate-then-notify
//! sequence, never an implicit reactive subscription. Storage failures are
//! the collaborator's to report and must not propagate back through the
//! mutation API.
//!
//! Snapshots reference products by their stable catalog string keys and carry
//! the prices observed at capture time, so a restored cart prices exactly as
//! it did when saved.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors from loading or saving cart snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error reading or writing the snapshot file.
    #[error("failed to access snapshot file: {0}")]
    Io(#[from] io::Error),

    /// YAML serialisation or deserialisation error.
    #[error("failed to serialise snapshot: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A snapshot row references a product the catalog does not know.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Serialisable image of one cart row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    /// Stable string key of the product in the catalog.
    pub product: String,

    /// Unit price in minor units, as observed at capture time.
    pub unit_price_minor: i64,

    /// Pre-discount reference price in minor units, if any.
    pub original_unit_price_minor: Option<i64>,

    /// Units of this row.
    pub quantity: u32,

    /// Per-entry quantity cap.
    pub max_quantity: u32,

    /// Available inventory for this row.
    pub stock: u32,

    /// Selected size, if any.
    pub size: Option<String>,

    /// Selected colour, if any.
    pub color: Option<String>,
}

/// Serialisable image of one saved-for-later row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSnapshot {
    /// The parked row.
    pub entry: EntrySnapshot,

    /// Whether the product was in stock at capture time.
    pub in_stock: bool,
}

/// Full cart image handed to a storage collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Active cart rows.
    pub entries: Vec<EntrySnapshot>,

    /// Saved-for-later rows.
    pub saved: Vec<SavedSnapshot>,
}

/// External persistence collaborator for cart state.
///
/// Both operations are fire-and-forget from the engine's perspective: hosts
/// call [`CartStorage::save`] after a successful mutation, and a failed save
/// must be swallowed or reported out-of-band rather than surfaced through
/// the mutation API.
pub trait CartStorage {
    /// Load the most recently saved snapshot, if one exists.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if a snapshot exists but cannot be read or
    /// parsed. A missing snapshot is `Ok(None)`, not an error.
    fn load(&self) -> Result<Option<CartSnapshot>, StorageError>;

    /// Persist a snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the snapshot cannot be written.
    fn save(&self, snapshot: &CartSnapshot) -> Result<(), StorageError>;
}

/// File-backed storage writing snapshots as YAML.
#[derive(Debug)]
pub struct YamlCartStorage {
    path: PathBuf,
}

impl YamlCartStorage {
    /// Create a storage over the given snapshot file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for YamlCartStorage {
    fn load(&self) -> Result<Option<CartSnapshot>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(serde_norway::from_str(&contents)?))
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<(), StorageError> {
        let yaml = serde_norway::to_string(snapshot)?;

        fs::write(&self.path, yaml)?;

        Ok(())
    }
}
