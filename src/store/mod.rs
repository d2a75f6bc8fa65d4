//! Persistence adapter for slides and presentation groups.
//!
//! A [`Store`] is a keyed blob store with two collections. [`Library`] layers
//! the typed API on top: records are JSON documents keyed by their id and
//! stamped with a sequence number when first saved, so reads return them in
//! the order they were saved. Nothing here interprets record contents beyond
//! the selection flag and the source file name.

mod durable;
mod memory;

pub use self::durable::RedbStore;
pub use self::memory::MemoryStore;

use std::collections::{HashMap, HashSet};

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::Result;
use crate::model::{PresentationGroup, Slide};
use crate::types::GroupId;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure around the database file
    #[error("Library I/O error: {source}")]
    Io {
        /// The underlying IO error.
        #[from]
        source: std::io::Error,
    },

    /// Embedded database failure
    #[error("Library database error: {message}")]
    Database {
        /// What failed.
        message: String,
    },

    /// A record could not be encoded or decoded
    #[error("Invalid {collection} record: {source}")]
    Serialization {
        /// Collection the record belongs to.
        collection: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Another user of the store panicked while holding it
    #[error("Library is unusable after a previous failure")]
    Poisoned,
}

impl StoreError {
    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database { message: message.into() }
    }
}

/// The two record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Flat slide records.
    Slides,
    /// Presentation group records.
    Presentations,
}

impl Collection {
    /// Collection name as stored.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Slides => "slides",
            Self::Presentations => "presentations",
        }
    }
}

/// A keyed blob store.
pub trait Store {
    /// Insert or replace records by key.
    fn bulk_upsert(&self, collection: Collection, records: &[(String, Vec<u8>)]) -> StoreResult<()>;

    /// Every `(key, record)` of a collection, in key order.
    fn read_all(&self, collection: Collection) -> StoreResult<Vec<(String, Vec<u8>)>>;

    /// Remove records by key. Unknown keys are ignored.
    fn remove(&self, collection: Collection, keys: &[String]) -> StoreResult<()>;

    /// Remove every record of a collection.
    fn clear(&self, collection: Collection) -> StoreResult<()>;
}

/// Stored form of a record.
#[derive(Serialize, Deserialize)]
struct Entry<T> {
    sequence: u64,
    record: T,
}

/// Typed access to the stored slides and groups.
#[derive(Debug)]
pub struct Library<S: Store> {
    store: S,
}

impl Library<RedbStore> {
    /// Open (or create) the library database at `path`.
    pub fn open(path: &std::path::Path) -> Result<Self> {
        Ok(Self::new(RedbStore::open(path)?))
    }
}

impl<S: Store> Library<S> {
    /// Wrap a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Upsert slides by id. New slides go after everything already stored.
    pub fn save_slides(&self, slides: &[Slide]) -> Result<()> {
        let records: Vec<_> = slides.iter().map(|s| (s.id.to_string(), s)).collect();
        self.write(Collection::Slides, &records)?;
        debug!("Saved {} slides", records.len());
        Ok(())
    }

    /// Upsert groups by id. New groups go after everything already stored.
    pub fn save_groups(&self, groups: &[PresentationGroup]) -> Result<()> {
        let records: Vec<_> = groups.iter().map(|g| (g.id.to_string(), g)).collect();
        self.write(Collection::Presentations, &records)?;
        debug!("Saved {} groups", records.len());
        Ok(())
    }

    /// Save a freshly processed batch of groups. Stored groups made from the
    /// same source files are superseded and removed.
    pub fn replace_groups(&self, groups: &[PresentationGroup]) -> Result<usize> {
        let sources: HashSet<&str> = groups.iter().map(|g| g.source_file_name.as_str()).collect();
        let stale: Vec<String> = self
            .get_groups()?
            .into_iter()
            .filter(|g| sources.contains(g.source_file_name.as_str()))
            .map(|g| g.id.to_string())
            .collect();

        if !stale.is_empty() {
            self.store.remove(Collection::Presentations, &stale)?;
            debug!("Superseded {} stored groups", stale.len());
        }
        self.save_groups(groups)?;
        Ok(stale.len())
    }

    /// Every stored slide, in the order first saved.
    pub fn get_slides(&self) -> Result<Vec<Slide>> {
        self.read(Collection::Slides)
    }

    /// Every stored group, in the order first saved.
    pub fn get_groups(&self) -> Result<Vec<PresentationGroup>> {
        self.read(Collection::Presentations)
    }

    /// Empty both collections.
    pub fn clear_all(&self) -> Result<()> {
        self.store.clear(Collection::Slides)?;
        self.store.clear(Collection::Presentations)?;
        debug!("Cleared library");
        Ok(())
    }

    /// Set a group's selection flag. Returns `false` when no group has `id`.
    pub fn set_group_selected(&self, id: &GroupId, selected: bool) -> Result<bool> {
        let Some(mut group) = self.get_groups()?.into_iter().find(|g| &g.id == id) else {
            return Ok(false);
        };
        group.selected = selected;
        self.save_groups(std::slice::from_ref(&group))?;
        Ok(true)
    }

    /// Sequence numbers of the stored records, by key.
    fn sequences(&self, collection: Collection) -> StoreResult<HashMap<String, u64>> {
        self.store
            .read_all(collection)?
            .into_iter()
            .map(|(key, bytes)| -> StoreResult<(String, u64)> {
                let entry: Entry<IgnoredAny> = decode(collection, &bytes)?;
                Ok((key, entry.sequence))
            })
            .collect()
    }

    fn write<T: Serialize>(&self, collection: Collection, records: &[(String, &T)]) -> StoreResult<()> {
        let mut known = self.sequences(collection)?;
        let mut next = known.values().max().map_or(0, |last| last + 1);

        let mut encoded = Vec::with_capacity(records.len());
        for (key, record) in records {
            let sequence = *known.entry(key.clone()).or_insert_with(|| {
                next += 1;
                next - 1
            });
            let bytes = serde_json::to_vec(&Entry { sequence, record })
                .map_err(|source| StoreError::Serialization { collection: collection.name(), source })?;
            encoded.push((key.clone(), bytes));
        }
        self.store.bulk_upsert(collection, &encoded)
    }

    fn read<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let mut entries = self
            .store
            .read_all(collection)?
            .iter()
            .map(|(_, bytes)| decode::<Entry<T>>(collection, bytes))
            .collect::<StoreResult<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.sequence);
        Ok(entries.into_iter().map(|entry| entry.record).collect())
    }
}

fn decode<T: DeserializeOwned>(collection: Collection, bytes: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(bytes).map_err(|source| StoreError::Serialization { collection: collection.name(), source })
}
