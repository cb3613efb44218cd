use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::{KVError, storage};
use crate::traits::KVStore;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("ngac");

/// RedbStore is a KVStore backed by redb, a pure-Rust embedded database.
/// Every write is its own transaction; `batch_set` groups several keys into one.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(storage)?;

        // Create the table up front so read transactions never miss it.
        let txn = db.begin_write().map_err(storage)?;
        txn.open_table(TABLE).map_err(storage)?;
        txn.commit().map_err(storage)?;

        debug!(path = %path.display(), "opened redb store");
        Ok(Self { db: Arc::new(db) })
    }

    fn write<F>(&self, f: F) -> Result<(), KVError>
    where
        F: FnOnce(&mut redb::Table<'_, &'static str, &'static [u8]>) -> Result<(), KVError>,
    {
        let txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = txn.open_table(TABLE).map_err(storage)?;
            f(&mut table)?;
        }
        txn.commit().map_err(storage)
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let txn = self.db.begin_read().map_err(storage)?;
        let table = txn.open_table(TABLE).map_err(storage)?;
        let value = table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.write(|table| {
            table.insert(key, value).map_err(storage)?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        self.write(|table| {
            table.remove(key).map_err(storage)?;
            Ok(())
        })
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError> {
        self.write(|table| {
            for (key, value) in entries {
                table.insert(*key, *value).map_err(storage)?;
            }
            Ok(())
        })
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let txn = self.db.begin_read().map_err(storage)?;
        let table = txn.open_table(TABLE).map_err(storage)?;

        let mut results = Vec::new();
        for entry in table.range(prefix..).map_err(storage)? {
            let (key, value) = entry.map_err(storage)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_string(), value.value().to_vec()));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, RedbStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_set_get_delete() {
        let (_dir, store) = open_temp();
        assert!(store.get("ngac:p:graph").unwrap().is_none());

        store.set("ngac:p:graph", b"{}").unwrap();
        assert_eq!(store.get("ngac:p:graph").unwrap().unwrap(), b"{}");

        store.delete("ngac:p:graph").unwrap();
        assert!(store.get("ngac:p:graph").unwrap().is_none());
        // Missing keys delete cleanly.
        store.delete("ngac:p:graph").unwrap();
    }

    #[test]
    fn test_batch_set_and_scan() {
        let (_dir, store) = open_temp();
        store
            .batch_set(&[
                ("ngac:a:graph", b"1".as_slice()),
                ("ngac:a:obligations", b"2".as_slice()),
                ("ngac:b:graph", b"3".as_slice()),
            ])
            .unwrap();

        let a = store.scan("ngac:a:").unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].0, "ngac:a:graph");
        assert_eq!(a[1].0, "ngac:a:obligations");
        assert_eq!(store.scan("ngac:").unwrap().len(), 3);
        assert!(store.scan("other:").unwrap().is_empty());
    }

    #[test]
    fn test_reopen_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persist.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.set("k", b"v").unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), b"v");
    }
}
