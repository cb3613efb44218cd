use std::collections::{BTreeMap, BTreeSet};

use crate::command::Command;
use crate::model::{Graph, Node};

/// Commands that turn `ledger` into `proposed`.
///
/// Emitted in order: node creations (with their new parent edges folded in,
/// parents before children), node deletions, assignments, deassignments,
/// associations, dissociations. Associations are compared by (subject, target)
/// pair only; an operation-set change on an existing pair yields no command.
/// Node kind and property changes on surviving names are not diffed.
pub fn diff(ledger: &Graph, proposed: &Graph) -> Vec<Command> {
    let created: BTreeSet<&str> = proposed
        .nodes()
        .map(|n| n.name.as_str())
        .filter(|name| !ledger.contains(name))
        .collect();
    let deleted: BTreeSet<&str> = ledger
        .nodes()
        .map(|n| n.name.as_str())
        .filter(|name| !proposed.contains(name))
        .collect();

    let mut commands = Vec::new();

    // Parents of created nodes ride along with the create.
    let mut new_parents: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    let mut assigns = Vec::new();
    for (child, parent) in proposed.assignments() {
        if ledger.has_assignment(child, parent) {
            continue;
        }
        if created.contains(child) {
            new_parents.entry(child).or_default().insert(parent.to_string());
        } else {
            assigns.push(Command::Assign {
                child: child.to_string(),
                parent: parent.to_string(),
            });
        }
    }

    for name in creation_order(&created, &new_parents) {
        if let Ok(node) = proposed.node(name) {
            commands.push(Command::CreateNode {
                node: Node::clone(node),
                parents: new_parents.remove(name).unwrap_or_default(),
            });
        }
    }

    for name in &deleted {
        commands.push(Command::DeleteNode {
            name: name.to_string(),
        });
    }

    commands.extend(assigns);

    for (child, parent) in ledger.assignments() {
        if deleted.contains(child) || proposed.has_assignment(child, parent) {
            continue;
        }
        commands.push(Command::Deassign {
            child: child.to_string(),
            parent: parent.to_string(),
        });
    }

    for (subject, target, ops) in proposed.associations() {
        if !ledger.has_association(subject, target) {
            commands.push(Command::Associate {
                subject: subject.to_string(),
                target: target.to_string(),
                operations: ops.clone(),
            });
        }
    }

    for (subject, target, _) in ledger.associations() {
        if !proposed.has_association(subject, target) {
            commands.push(Command::Dissociate {
                subject: subject.to_string(),
                target: target.to_string(),
            });
        }
    }

    commands
}

/// Order created nodes so a node's new parents are created before it.
/// Ties break by name.
fn creation_order<'a>(
    created: &BTreeSet<&'a str>,
    new_parents: &BTreeMap<&'a str, BTreeSet<String>>,
) -> Vec<&'a str> {
    let mut order = Vec::with_capacity(created.len());
    let mut done: BTreeSet<&str> = BTreeSet::new();
    let mut pending: Vec<&str> = created.iter().copied().collect();

    while !pending.is_empty() {
        let (ready, blocked): (Vec<&str>, Vec<&str>) = pending.into_iter().partition(|name| {
            new_parents.get(name).map_or(true, |parents| {
                parents
                    .iter()
                    .all(|p| !created.contains(p.as_str()) || done.contains(p.as_str()))
            })
        });
        if ready.is_empty() {
            // Only reachable when the proposed graph itself is cyclic.
            order.extend(blocked);
            break;
        }
        for name in ready {
            done.insert(name);
            order.push(name);
        }
        pending = blocked;
    }

    order
}
