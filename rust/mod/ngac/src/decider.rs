use std::collections::BTreeSet;

use tracing::debug;

use crate::error::NgacError;
use crate::model::{Graph, Operations, Prohibitions};

/// Permission resolution over a policy graph.
///
/// A user holds an operation on a target when some association connects a node
/// reachable upward from the user (the user included) to a node reachable
/// upward from the target (the target included). Grants are unioned across all
/// such associations; matching prohibitions are subtracted afterwards.
pub struct Decider<'a> {
    graph: &'a Graph,
    prohibitions: &'a Prohibitions,
}

impl<'a> Decider<'a> {
    pub fn new(graph: &'a Graph, prohibitions: &'a Prohibitions) -> Self {
        Self {
            graph,
            prohibitions,
        }
    }

    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    /// Operations `user` may perform on `target`.
    ///
    /// A `*` grant is reported as `*` unless a prohibition applies, in which
    /// case it narrows to the known operation names minus the denied ones.
    /// A prohibition of `*` empties the set.
    pub fn list_permissions(&self, user: &str, target: &str) -> Result<Operations, NgacError> {
        let (mut granted, denied) = self.resolve(user, target)?;
        granted.subtract(&denied);
        Ok(granted)
    }

    /// Whether `user` holds every operation in `ops` on `target`, i.e.
    /// whether `ops` is covered by [`Decider::list_permissions`].
    pub fn has_permissions(
        &self,
        user: &str,
        target: &str,
        ops: &[&str],
    ) -> Result<bool, NgacError> {
        let permitted = self.list_permissions(user, target)?;
        let allowed = ops.iter().all(|op| permitted.allows(op));
        debug!(user, target, ?ops, allowed, "decision");
        Ok(allowed)
    }

    pub fn decide(&self, user: &str, target: &str, op: &str) -> Result<bool, NgacError> {
        self.has_permissions(user, target, &[op])
    }

    /// Like [`Decider::decide`], but a denial is an `AccessDenied` error.
    pub fn check(&self, user: &str, target: &str, op: &str) -> Result<(), NgacError> {
        if self.decide(user, target, op)? {
            Ok(())
        } else {
            Err(NgacError::AccessDenied(format!(
                "{:?} lacks {:?} on {:?}",
                user, op, target
            )))
        }
    }

    fn resolve(&self, user: &str, target: &str) -> Result<(Operations, Operations), NgacError> {
        let user_side = self.graph.ascendants(user)?;
        let target_side = self.graph.ascendants(target)?;

        let mut granted = Operations::new();
        for subject in &user_side {
            for (assoc_target, ops) in self.graph.associations_from(subject) {
                if target_side.contains(assoc_target) {
                    granted.extend(ops);
                }
            }
        }

        let denied = self.denied(&user_side, &target_side);
        Ok((granted, denied))
    }

    fn denied(&self, user_side: &BTreeSet<String>, target_side: &BTreeSet<String>) -> Operations {
        if self.prohibitions.is_empty() {
            return Operations::new();
        }
        self.prohibitions.denied(user_side, target_side)
    }
}
