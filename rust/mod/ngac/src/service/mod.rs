pub mod policy;
pub mod workflows;

use std::sync::{Arc, Mutex};

use tracing::debug;

use blossom_core::ServiceConfig;
use blossom_kv::KVStore;

use crate::error::NgacError;
use crate::model::{Graph, GraphSnapshot, Obligations, Prohibitions};
use crate::policy_store::PolicyStore;

/// The policy engine service. Holds the storage backend and configuration.
///
/// Every call loads the partition it touches, works on that copy, and writes
/// it back in one batch. Mutations are serialized through `write_lock`.
pub struct NgacService {
    pub(crate) kv: Arc<dyn KVStore>,
    pub(crate) config: ServiceConfig,
    write_lock: Mutex<()>,
}

impl NgacService {
    pub fn new(kv: Arc<dyn KVStore>, config: ServiceConfig) -> Arc<Self> {
        Arc::new(Self {
            kv,
            config,
            write_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn shared_partition(&self) -> &str {
        &self.config.shared_partition
    }

    // ── Persistence helpers ──

    fn key(partition: &str, collection: &str) -> String {
        format!("ngac:{}:{}", partition, collection)
    }

    pub(crate) fn validate_partition(partition: &str) -> Result<(), NgacError> {
        if partition.is_empty() || partition.contains(':') {
            return Err(NgacError::Validation(format!(
                "invalid partition name {:?}",
                partition
            )));
        }
        Ok(())
    }

    pub(crate) fn exists(&self, partition: &str) -> Result<bool, NgacError> {
        Ok(self.kv.get(&Self::key(partition, "graph"))?.is_some())
    }

    /// Names of every initialized partition, sorted.
    pub fn list_partitions(&self) -> Result<Vec<String>, NgacError> {
        let entries = self.kv.scan("ngac:")?;
        Ok(entries
            .into_iter()
            .filter_map(|(key, _)| {
                key.strip_prefix("ngac:")
                    .and_then(|rest| rest.strip_suffix(":graph"))
                    .map(str::to_string)
            })
            .collect())
    }

    /// Load a partition's graph, prohibitions and obligations.
    pub(crate) fn load(&self, partition: &str) -> Result<PolicyStore, NgacError> {
        Self::validate_partition(partition)?;

        let graph = match self.kv.get(&Self::key(partition, "graph"))? {
            Some(bytes) => Graph::try_from(serde_json::from_slice::<GraphSnapshot>(&bytes)?)?,
            None => {
                return Err(NgacError::NotFound(format!(
                    "partition {:?} is not initialized",
                    partition
                )))
            }
        };
        let prohibitions: Prohibitions = match self.kv.get(&Self::key(partition, "prohibitions"))? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Prohibitions::new(),
        };
        let obligations: Obligations = match self.kv.get(&Self::key(partition, "obligations"))? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Obligations::new(),
        };

        debug!(partition, nodes = graph.len(), "policy loaded");
        Ok(PolicyStore {
            graph,
            prohibitions,
            obligations,
        })
    }

    /// Write all three collections of a partition in one batch.
    pub(crate) fn save(&self, partition: &str, store: &PolicyStore) -> Result<(), NgacError> {
        let graph = serde_json::to_vec(&store.graph)?;
        let prohibitions = serde_json::to_vec(&store.prohibitions)?;
        let obligations = serde_json::to_vec(&store.obligations)?;

        let graph_key = Self::key(partition, "graph");
        let prohibitions_key = Self::key(partition, "prohibitions");
        let obligations_key = Self::key(partition, "obligations");
        self.kv.batch_set(&[
            (graph_key.as_str(), graph.as_slice()),
            (prohibitions_key.as_str(), prohibitions.as_slice()),
            (obligations_key.as_str(), obligations.as_slice()),
        ])?;

        debug!(partition, nodes = store.graph.len(), "policy stored");
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, NgacError> {
        self.write_lock
            .lock()
            .map_err(|e| NgacError::Storage(format!("write lock poisoned: {}", e)))
    }

    /// Load `partition`, run `f` on it, and store the result if `f` succeeds.
    /// A failing `f` leaves the persisted partition untouched.
    pub(crate) fn transact<T, F>(&self, partition: &str, f: F) -> Result<T, NgacError>
    where
        F: FnOnce(&mut PolicyStore) -> Result<T, NgacError>,
    {
        let _guard = self.lock()?;
        let mut store = self.load(partition)?;
        let out = f(&mut store)?;
        self.save(partition, &store)?;
        Ok(out)
    }

    /// Deny unless `principal` is a known user holding `op` on `target`.
    /// A missing target is reported as missing.
    pub(crate) fn authorize(
        store: &PolicyStore,
        principal: &str,
        target: &str,
        op: &str,
    ) -> Result<(), NgacError> {
        if !store.graph.contains(principal) {
            return Err(NgacError::AccessDenied(format!(
                "unknown principal {:?}",
                principal
            )));
        }
        store.decider().check(principal, target, op)
    }
}
