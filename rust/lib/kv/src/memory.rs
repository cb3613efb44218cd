use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{KVError, storage};
use crate::traits::KVStore;

/// In-memory KVStore for tests and ephemeral servers.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, KVError> {
        Ok(self.entries.read().map_err(storage)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, KVError> {
        Ok(self.len()? == 0)
    }
}

impl KVStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let entries = self.entries.read().map_err(storage)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let mut entries = self.entries.write().map_err(storage)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        let mut entries = self.entries.write().map_err(storage)?;
        entries.remove(key);
        Ok(())
    }

    fn batch_set(&self, batch: &[(&str, &[u8])]) -> Result<(), KVError> {
        let mut entries = self.entries.write().map_err(storage)?;
        for (key, value) in batch {
            entries.insert(key.to_string(), value.to_vec());
        }
        Ok(())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let entries = self.entries.read().map_err(storage)?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
