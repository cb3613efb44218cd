use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::decider::Decider;
use crate::differ;
use crate::error::NgacError;
use crate::model::{Graph, Obligation, Obligations, Prohibition, Prohibitions};

/// Everything the engine persists for one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStore {
    pub graph: Graph,
    #[serde(default)]
    pub prohibitions: Prohibitions,
    #[serde(default)]
    pub obligations: Obligations,
}

impl PolicyStore {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            ..Default::default()
        }
    }

    pub fn decider(&self) -> Decider<'_> {
        Decider::new(&self.graph, &self.prohibitions)
    }

    pub fn add_prohibition(&mut self, prohibition: Prohibition) -> Result<(), NgacError> {
        self.prohibitions.add(prohibition)
    }

    pub fn add_obligation(&mut self, obligation: Obligation) -> Result<(), NgacError> {
        self.obligations.add(obligation)
    }

    /// Apply commands with system authority: no permission checks.
    ///
    /// All commands run against a copy of the graph; the copy replaces the
    /// graph only if every command succeeds.
    pub fn apply_as_system(&mut self, commands: &[Command]) -> Result<(), NgacError> {
        let mut next = self.graph.clone();
        apply_batch(&mut next, commands)?;
        self.graph = next;
        Ok(())
    }

    /// Apply commands on behalf of `principal`.
    ///
    /// Every command is authorized against the graph as it stands before the
    /// batch. The first denial aborts with `AccessDenied` and nothing changes.
    pub fn apply_as_principal(
        &mut self,
        principal: &str,
        commands: &[Command],
    ) -> Result<(), NgacError> {
        {
            let decider = self.decider();
            for command in commands {
                if let Err(e) = command.authorize(principal, &decider) {
                    warn!(principal, %command, error = %e, "command denied");
                    return Err(e);
                }
            }
        }
        self.apply_as_system(commands)
    }

    /// Replace the graph with `proposed`, applying only the difference and
    /// only if `principal` may make every edit in it. Returns the applied
    /// commands.
    pub fn update_graph(
        &mut self,
        principal: &str,
        proposed: &Graph,
    ) -> Result<Vec<Command>, NgacError> {
        let commands = differ::diff(&self.graph, proposed);
        debug!(principal, commands = commands.len(), "update plan");
        self.apply_as_principal(principal, &commands)?;
        info!(principal, commands = commands.len(), "graph updated");
        Ok(commands)
    }
}

/// Apply `commands` in order. A deassign or dissociate whose endpoint was
/// deleted earlier in the same batch has already been carried out by the
/// delete's cascade and is skipped.
pub(crate) fn apply_batch(graph: &mut Graph, commands: &[Command]) -> Result<(), NgacError> {
    let mut deleted: BTreeSet<String> = BTreeSet::new();

    for command in commands {
        match command {
            Command::Deassign { child: a, parent: b }
            | Command::Dissociate {
                subject: a,
                target: b,
            } if deleted.contains(a) || deleted.contains(b) => {
                debug!(%command, "skipped, endpoint deleted in batch");
                continue;
            }
            Command::DeleteNode { name } => {
                deleted.insert(name.clone());
            }
            _ => {}
        }
        command.apply(graph)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::operations::admin;
    use crate::model::{Node, NodeKind, Operations};

    fn store() -> PolicyStore {
        let mut g = Graph::new();
        for (name, kind) in [
            ("root", NodeKind::PolicyClass),
            ("admins", NodeKind::UserAttribute),
            ("admin", NodeKind::User),
            ("files", NodeKind::ObjectAttribute),
            ("doc", NodeKind::Object),
        ] {
            g.create_node(Node::new(name, kind)).unwrap();
        }
        g.assign("admin", "admins").unwrap();
        g.assign("admins", "root").unwrap();
        g.assign("files", "root").unwrap();
        g.assign("doc", "files").unwrap();
        g.associate("admins", "root", Operations::all()).unwrap();
        PolicyStore::new(g)
    }

    #[test]
    fn test_system_batch_is_atomic() {
        let mut s = store();
        let before = s.graph.clone();
        let err = s
            .apply_as_system(&[
                Command::CreateNode {
                    node: Node::new("new_oa", NodeKind::ObjectAttribute),
                    parents: BTreeSet::from(["root".to_string()]),
                },
                Command::Assign {
                    child: "doc".into(),
                    parent: "ghost".into(),
                },
            ])
            .unwrap_err();
        assert!(matches!(err, NgacError::NotFound(_)));
        assert_eq!(s.graph, before);
    }

    #[test]
    fn test_delete_then_deassign_in_one_batch() {
        let mut s = store();
        s.apply_as_system(&[
            Command::DeleteNode { name: "files".into() },
            Command::Deassign {
                child: "doc".into(),
                parent: "files".into(),
            },
        ])
        .unwrap();
        assert!(!s.graph.contains("files"));
        assert!(s.graph.parents("doc").unwrap().is_empty());
    }

    #[test]
    fn test_principal_batch_checked_against_pre_state() {
        let mut s = store();
        s.graph
            .create_node(Node::new("clerks", NodeKind::UserAttribute))
            .unwrap();
        s.graph.create_node(Node::new("clerk", NodeKind::User)).unwrap();
        s.graph.assign("clerks", "root").unwrap();
        s.graph.assign("clerk", "clerks").unwrap();
        s.graph
            .associate("clerks", "files", Operations::from_iter([admin::CREATE_NODE]))
            .unwrap();

        // The second create depends on the first; it is denied even though the
        // batch itself would create the parent.
        let batch = [
            Command::CreateNode {
                node: Node::new("reports", NodeKind::ObjectAttribute),
                parents: BTreeSet::from(["files".to_string()]),
            },
            Command::CreateNode {
                node: Node::new("q1", NodeKind::Object),
                parents: BTreeSet::from(["reports".to_string()]),
            },
        ];
        let before = s.graph.clone();
        let err = s.apply_as_principal("clerk", &batch).unwrap_err();
        assert!(matches!(err, NgacError::AccessDenied(_)));
        assert_eq!(s.graph, before);

        s.apply_as_principal("clerk", &batch[..1]).unwrap();
        assert!(s.graph.has_assignment("reports", "files"));
    }

    #[test]
    fn test_update_graph_applies_diff() {
        let mut s = store();
        let mut proposed = s.graph.clone();
        proposed
            .create_node(Node::new("archive", NodeKind::ObjectAttribute))
            .unwrap();
        proposed.assign("archive", "files").unwrap();

        let applied = s.update_graph("admin", &proposed).unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(s.graph, proposed);

        assert!(s.update_graph("admin", &proposed).unwrap().is_empty());
    }
}
