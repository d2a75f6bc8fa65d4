//! File-backed store using redb.
//!
//! Each collection is one table of id → JSON bytes. Every call runs in its
//! own transaction, so a bulk upsert is applied entirely or not at all.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition, TableError};

use super::{Collection, Store, StoreError, StoreResult};

const SLIDES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("slides");
const PRESENTATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("presentations");

const fn table(collection: Collection) -> TableDefinition<'static, &'static str, &'static [u8]> {
    match collection {
        Collection::Slides => SLIDES_TABLE,
        Collection::Presentations => PRESENTATIONS_TABLE,
    }
}

/// ACID-durable [`Store`] in a single database file.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }
        let db = Database::create(path)
            .map_err(|e| StoreError::database(format!("failed to open {}: {e}", path.display())))?;
        Ok(Self { db })
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish()
    }
}

impl Store for RedbStore {
    fn bulk_upsert(&self, collection: Collection, records: &[(String, Vec<u8>)]) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::database(format!("begin_write failed: {e}")))?;
        {
            let mut table = txn
                .open_table(table(collection))
                .map_err(|e| StoreError::database(format!("open_table failed: {e}")))?;
            for (key, value) in records {
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| StoreError::database(format!("insert failed: {e}")))?;
            }
        }
        txn.commit()
            .map_err(|e| StoreError::database(format!("commit failed: {e}")))?;
        Ok(())
    }

    fn read_all(&self, collection: Collection) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::database(format!("begin_read failed: {e}")))?;
        let table = match txn.open_table(table(collection)) {
            Ok(table) => table,
            // Nothing has been written to this collection yet.
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::database(format!("open_table failed: {e}"))),
        };

        let mut records = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| StoreError::database(format!("iter failed: {e}")))?
        {
            let (key, value) = entry.map_err(|e| StoreError::database(format!("read failed: {e}")))?;
            records.push((key.value().to_string(), value.value().to_vec()));
        }
        Ok(records)
    }

    fn remove(&self, collection: Collection, keys: &[String]) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::database(format!("begin_write failed: {e}")))?;
        {
            let mut table = txn
                .open_table(table(collection))
                .map_err(|e| StoreError::database(format!("open_table failed: {e}")))?;
            for key in keys {
                table
                    .remove(key.as_str())
                    .map_err(|e| StoreError::database(format!("remove failed: {e}")))?;
            }
        }
        txn.commit()
            .map_err(|e| StoreError::database(format!("commit failed: {e}")))?;
        Ok(())
    }

    fn clear(&self, collection: Collection) -> StoreResult<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::database(format!("begin_write failed: {e}")))?;
        txn.delete_table(table(collection))
            .map_err(|e| StoreError::database(format!("delete_table failed: {e}")))?;
        txn.commit()
            .map_err(|e| StoreError::database(format!("commit failed: {e}")))?;
        Ok(())
    }
}
