use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::command::Command;
use crate::epp::EventContext;
use crate::error::NgacError;
use crate::model::operations::resource::INIT_BLOSSOM;
use crate::model::{Graph, Node, NodeKind, Operations};
use crate::pap::naming;
use crate::pap::policy::base_store;

use super::NgacService;

impl NgacService {
    /// Initialize the shared partition with the base policy.
    pub fn init(&self, principal: &str) -> Result<(), NgacError> {
        let shared = self.config.shared_partition.clone();
        self.init_partition(principal, &shared)
    }

    /// Initialize `partition` with the base policy and default obligations.
    ///
    /// The very first initialization of the shared partition is reserved for
    /// the configured administrator. After that, any partition may be
    /// initialized by a principal holding `init_blossom` on `blossom` in the
    /// shared partition.
    pub fn init_partition(&self, principal: &str, partition: &str) -> Result<(), NgacError> {
        Self::validate_partition(partition)?;
        let _guard = self.lock()?;

        if self.exists(partition)? {
            return Err(NgacError::DuplicateName(format!(
                "partition {:?} is already initialized",
                partition
            )));
        }

        let shared = self.config.shared_partition.as_str();
        if self.exists(shared)? {
            let store = self.load(shared)?;
            Self::authorize(&store, principal, naming::BLOSSOM_OBJECT, INIT_BLOSSOM)?;
        } else if partition != shared {
            return Err(NgacError::NotFound(format!(
                "shared partition {:?} is not initialized",
                shared
            )));
        } else if principal != self.config.admin_principal {
            warn!(principal, partition, "init refused");
            return Err(NgacError::AccessDenied(format!(
                "{:?} is not the administrator",
                principal
            )));
        }

        let store = base_store(&self.config.admin_principal)?;
        self.save(partition, &store)?;
        info!(partition, principal, nodes = store.graph.len(), "partition initialized");
        Ok(())
    }

    pub fn graph(&self, partition: &str) -> Result<Graph, NgacError> {
        Ok(self.load(partition)?.graph)
    }

    pub fn list_permissions(
        &self,
        partition: &str,
        user: &str,
        target: &str,
    ) -> Result<Operations, NgacError> {
        self.load(partition)?.decider().list_permissions(user, target)
    }

    pub fn decide(
        &self,
        partition: &str,
        user: &str,
        target: &str,
        op: &str,
    ) -> Result<bool, NgacError> {
        self.load(partition)?.decider().decide(user, target, op)
    }

    pub fn find_nodes(
        &self,
        partition: &str,
        kind: Option<NodeKind>,
        filter: &BTreeMap<String, String>,
    ) -> Result<Vec<Node>, NgacError> {
        let store = self.load(partition)?;
        Ok(store
            .graph
            .find_nodes(kind, filter)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Replace a partition's graph with `proposed` on behalf of `principal`.
    /// Either every difference is authorized and applied, or nothing is stored.
    pub fn update_graph(
        &self,
        partition: &str,
        principal: &str,
        proposed: &Graph,
    ) -> Result<Vec<Command>, NgacError> {
        self.transact(partition, |store| store.update_graph(principal, proposed))
    }

    /// Raise an event directly. Obligations run with system authority, so
    /// only a principal holding `init_blossom` on the partition's `blossom`
    /// object may do this.
    pub fn raise_event(
        &self,
        partition: &str,
        ctx: &EventContext,
    ) -> Result<Vec<String>, NgacError> {
        self.transact(partition, |store| {
            Self::authorize(store, &ctx.principal, naming::BLOSSOM_OBJECT, INIT_BLOSSOM)?;
            store.process_event(ctx)
        })
    }
}
