use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decider::Decider;
use crate::error::NgacError;
use crate::model::operations::admin;
use crate::model::{Graph, Node, Operations};

/// The six primitive graph mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateNode {
        node: Node,
        #[serde(default)]
        parents: BTreeSet<String>,
    },
    DeleteNode {
        name: String,
    },
    Assign {
        child: String,
        parent: String,
    },
    Deassign {
        child: String,
        parent: String,
    },
    Associate {
        subject: String,
        target: String,
        operations: Operations,
    },
    Dissociate {
        subject: String,
        target: String,
    },
}

impl Command {
    /// Check that `principal` may perform this command.
    ///
    /// The decider sees the graph as it was before the batch containing this
    /// command. Endpoints missing from that graph are denied, not reported
    /// missing. A create needs `create node` on each initial parent, so a
    /// parentless create (a new policy class) is not checked.
    pub fn authorize(&self, principal: &str, decider: &Decider<'_>) -> Result<(), NgacError> {
        let check = |target: &str, op: &str| require(decider, principal, target, op);

        match self {
            Command::CreateNode { parents, .. } => {
                for parent in parents {
                    check(parent, admin::CREATE_NODE)?;
                }
                Ok(())
            }
            Command::DeleteNode { name } => {
                check(name, admin::DELETE_NODE)?;
                let parents = match decider.graph().parents(name) {
                    Ok(parents) => parents,
                    Err(NgacError::NotFound(m)) => return Err(NgacError::AccessDenied(m)),
                    Err(e) => return Err(e),
                };
                for parent in parents {
                    check(parent, admin::DEASSIGN_FROM)?;
                }
                Ok(())
            }
            Command::Assign { child, parent } => {
                check(child, admin::ASSIGN)?;
                check(parent, admin::ASSIGN_TO)
            }
            Command::Deassign { child, parent } => {
                check(child, admin::DEASSIGN)?;
                check(parent, admin::DEASSIGN_FROM)
            }
            Command::Associate {
                subject, target, ..
            } => {
                check(subject, admin::ASSOCIATE)?;
                check(target, admin::ASSOCIATE)
            }
            Command::Dissociate { subject, target } => {
                check(subject, admin::DISSOCIATE)?;
                check(target, admin::DISSOCIATE)
            }
        }
    }

    /// Apply the command to `graph` without any permission check.
    pub fn apply(&self, graph: &mut Graph) -> Result<(), NgacError> {
        match self {
            Command::CreateNode { node, parents } => {
                graph.create_node(node.clone())?;
                for parent in parents {
                    graph.assign(&node.name, parent)?;
                }
                Ok(())
            }
            Command::DeleteNode { name } => graph.delete_node(name).map(|_| ()),
            Command::Assign { child, parent } => graph.assign(child, parent),
            Command::Deassign { child, parent } => graph.deassign(child, parent),
            Command::Associate {
                subject,
                target,
                operations,
            } => graph.associate(subject, target, operations.clone()),
            Command::Dissociate { subject, target } => graph.dissociate(subject, target),
        }
    }

    /// Node names this command touches.
    pub fn endpoints(&self) -> Vec<&str> {
        match self {
            Command::CreateNode { node, parents } => std::iter::once(node.name.as_str())
                .chain(parents.iter().map(String::as_str))
                .collect(),
            Command::DeleteNode { name } => vec![name.as_str()],
            Command::Assign { child, parent } | Command::Deassign { child, parent } => {
                vec![child.as_str(), parent.as_str()]
            }
            Command::Associate {
                subject, target, ..
            }
            | Command::Dissociate { subject, target } => vec![subject.as_str(), target.as_str()],
        }
    }

    /// Every string that may carry an obligation placeholder.
    pub(crate) fn texts(&self) -> Vec<&str> {
        let mut texts = self.endpoints();
        match self {
            Command::CreateNode { node, .. } => {
                for (k, v) in &node.properties {
                    texts.push(k);
                    texts.push(v);
                }
            }
            Command::Associate { operations, .. } => texts.extend(operations.iter()),
            _ => {}
        }
        texts
    }

    /// Rebuild the command with every string passed through `f`.
    pub(crate) fn map_texts<F>(&self, f: F) -> Result<Command, NgacError>
    where
        F: Fn(&str) -> Result<String, NgacError>,
    {
        let cmd = match self {
            Command::CreateNode { node, parents } => {
                let mut properties = BTreeMap::new();
                for (k, v) in &node.properties {
                    properties.insert(f(k)?, f(v)?);
                }
                Command::CreateNode {
                    node: Node {
                        name: f(&node.name)?,
                        kind: node.kind,
                        properties,
                    },
                    parents: parents.iter().map(|p| f(p)).collect::<Result<_, _>>()?,
                }
            }
            Command::DeleteNode { name } => Command::DeleteNode { name: f(name)? },
            Command::Assign { child, parent } => Command::Assign {
                child: f(child)?,
                parent: f(parent)?,
            },
            Command::Deassign { child, parent } => Command::Deassign {
                child: f(child)?,
                parent: f(parent)?,
            },
            Command::Associate {
                subject,
                target,
                operations,
            } => Command::Associate {
                subject: f(subject)?,
                target: f(target)?,
                operations: operations.iter().map(|op| f(op)).collect::<Result<_, _>>()?,
            },
            Command::Dissociate { subject, target } => Command::Dissociate {
                subject: f(subject)?,
                target: f(target)?,
            },
        };
        Ok(cmd)
    }
}

fn require(
    decider: &Decider<'_>,
    principal: &str,
    target: &str,
    op: &str,
) -> Result<(), NgacError> {
    match decider.check(principal, target, op) {
        Err(NgacError::NotFound(m)) => Err(NgacError::AccessDenied(format!(
            "{:?} cannot perform {:?} on {:?}: {}",
            principal, op, target, m
        ))),
        other => other,
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::CreateNode { node, parents } => {
                write!(f, "create {} {:?}", node.kind, node.name)?;
                if !parents.is_empty() {
                    let parents: Vec<&str> = parents.iter().map(String::as_str).collect();
                    write!(f, " in {:?}", parents)?;
                }
                Ok(())
            }
            Command::DeleteNode { name } => write!(f, "delete {:?}", name),
            Command::Assign { child, parent } => write!(f, "assign {:?} to {:?}", child, parent),
            Command::Deassign { child, parent } => {
                write!(f, "deassign {:?} from {:?}", child, parent)
            }
            Command::Associate {
                subject,
                target,
                operations,
            } => write!(f, "associate {:?} with {:?} {}", subject, target, operations),
            Command::Dissociate { subject, target } => {
                write!(f, "dissociate {:?} from {:?}", subject, target)
            }
        }
    }
}
