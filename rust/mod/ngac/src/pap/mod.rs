//! Policy administration: the base policy and the system-authority graph
//! edits behind each domain workflow.
//!
//! Everything here mutates the graph directly, without per-command
//! authorization. Callers decide beforehand whether the acting principal may
//! run the workflow at all.

pub mod account;
pub mod asset;
pub mod naming;
pub mod policy;
pub mod swid;

use crate::error::NgacError;
use crate::model::{Graph, Node, NodeKind};

/// Create `name` and assign it under each of `parents`.
pub(crate) fn create_in(
    graph: &mut Graph,
    name: &str,
    kind: NodeKind,
    parents: &[&str],
) -> Result<(), NgacError> {
    graph.create_node(Node::new(name, kind))?;
    for parent in parents {
        graph.assign(name, parent)?;
    }
    Ok(())
}
