use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::NgacError;
use crate::model::operations::Operations;

/// A deny overlay: `subject` may not perform `operations` on `target`.
///
/// Applies when `subject` is the requesting user or one of its attributes and
/// `target` is the requested node or one of its containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prohibition {
    pub name: String,
    pub subject: String,
    pub target: String,
    pub operations: Operations,
}

/// Prohibitions of one partition, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prohibitions(BTreeMap<String, Prohibition>);

impl Prohibitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, prohibition: Prohibition) -> Result<(), NgacError> {
        if self.0.contains_key(&prohibition.name) {
            return Err(NgacError::DuplicateName(prohibition.name));
        }
        self.0.insert(prohibition.name.clone(), prohibition);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prohibition> {
        self.0.values()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Union of operations denied between any reached subject and any reached target.
    pub fn denied(&self, subjects: &BTreeSet<String>, targets: &BTreeSet<String>) -> Operations {
        let mut denied = Operations::new();
        for p in self.0.values() {
            if subjects.contains(&p.subject) && targets.contains(&p.target) {
                denied.extend(&p.operations);
            }
        }
        denied
    }
}
