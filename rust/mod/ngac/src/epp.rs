use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::NgacError;
use crate::policy_store::{apply_batch, PolicyStore};

/// A domain event raised after an action, e.g. an account status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    /// Principal whose action raised the event.
    pub principal: String,
    pub event: String,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl EventContext {
    pub fn new(principal: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            event: event.into(),
            args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }
}

impl PolicyStore {
    /// Run every obligation triggered by `ctx`, in declaration order, with
    /// system authority. The raising principal's permissions are not
    /// consulted. Returns the names of the obligations that ran.
    ///
    /// Any failing action aborts processing and leaves the graph unchanged.
    pub fn process_event(&mut self, ctx: &EventContext) -> Result<Vec<String>, NgacError> {
        let mut next = self.graph.clone();
        let mut fired = Vec::new();

        for obligation in self.obligations.iter() {
            let trigger = &obligation.trigger;
            if trigger.event != ctx.event || !trigger.subject.matches(&ctx.principal) {
                continue;
            }
            let commands = obligation.resolve(&ctx.args)?;
            debug!(
                obligation = %obligation.name,
                commands = commands.len(),
                "obligation matched"
            );
            apply_batch(&mut next, &commands)?;
            fired.push(obligation.name.clone());
        }

        self.graph = next;
        info!(
            event = %ctx.event,
            principal = %ctx.principal,
            fired = fired.len(),
            "event processed"
        );
        Ok(fired)
    }
}
