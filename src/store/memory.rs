//! In-memory store for tests and hosts without a data directory.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use super::{Collection, Store, StoreError, StoreResult};

type Records = BTreeMap<String, Vec<u8>>;

/// Volatile [`Store`]; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Records>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut HashMap<Collection, Records>) -> T) -> StoreResult<T> {
        let mut guard = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut guard))
    }
}

impl Store for MemoryStore {
    fn bulk_upsert(&self, collection: Collection, records: &[(String, Vec<u8>)]) -> StoreResult<()> {
        self.with(|collections| {
            let table = collections.entry(collection).or_default();
            for (key, value) in records {
                table.insert(key.clone(), value.clone());
            }
        })
    }

    fn read_all(&self, collection: Collection) -> StoreResult<Vec<(String, Vec<u8>)>> {
        self.with(|collections| {
            collections
                .get(&collection)
                .map(|table| table.iter().map(|(key, value)| (key.clone(), value.clone())).collect())
                .unwrap_or_default()
        })
    }

    fn remove(&self, collection: Collection, keys: &[String]) -> StoreResult<()> {
        self.with(|collections| {
            if let Some(table) = collections.get_mut(&collection) {
                for key in keys {
                    table.remove(key);
                }
            }
        })
    }

    fn clear(&self, collection: Collection) -> StoreResult<()> {
        self.with(|collections| {
            collections.remove(&collection);
        })
    }
}
