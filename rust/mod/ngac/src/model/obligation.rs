use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::NgacError;

/// Which principals an obligation reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectMatcher {
    Any,
    Principal(String),
}

impl SubjectMatcher {
    pub fn matches(&self, principal: &str) -> bool {
        match self {
            SubjectMatcher::Any => true,
            SubjectMatcher::Principal(p) => p == principal,
        }
    }
}

/// Trigger of an obligation: who raised which event, with which arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPattern {
    pub subject: SubjectMatcher,
    pub event: String,
    /// Formal argument names, referenced as `<name>` in the response.
    #[serde(default)]
    pub args: Vec<String>,
}

/// "When `trigger` happens, apply `response`."
///
/// Response commands are templates: every `<arg>` in a node name, property or
/// operation is replaced by the event's value for `arg` before the command runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub name: String,
    pub trigger: EventPattern,
    pub response: Vec<Command>,
}

impl Obligation {
    /// Check that every placeholder in the response names a declared argument.
    pub fn validate(&self) -> Result<(), NgacError> {
        for command in &self.response {
            for text in command.texts() {
                for placeholder in placeholders(text) {
                    if !self.trigger.args.iter().any(|a| a == placeholder) {
                        return Err(NgacError::MalformedObligationArgs(format!(
                            "obligation {:?} uses <{}> but event {:?} declares {:?}",
                            self.name, placeholder, self.trigger.event, self.trigger.args
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Substitute `args` into the response, producing concrete commands.
    pub fn resolve(&self, args: &BTreeMap<String, String>) -> Result<Vec<Command>, NgacError> {
        for declared in &self.trigger.args {
            if !args.contains_key(declared) {
                return Err(NgacError::MalformedObligationArgs(format!(
                    "event {:?} is missing argument {:?} required by obligation {:?}",
                    self.trigger.event, declared, self.name
                )));
            }
        }

        self.response
            .iter()
            .map(|command| command.map_texts(|text| substitute(text, args)))
            .collect()
    }
}

/// Obligations of one partition, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Obligations(Vec<Obligation>);

impl Obligations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an obligation after validating its placeholders.
    pub fn add(&mut self, obligation: Obligation) -> Result<(), NgacError> {
        if self.get(&obligation.name).is_some() {
            return Err(NgacError::DuplicateName(obligation.name));
        }
        obligation.validate()?;
        self.0.push(obligation);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Obligation> {
        self.0.iter().find(|o| o.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obligation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Names inside `<...>` markers, in order of appearance.
fn placeholders(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        match after.find('>') {
            Some(end) => {
                found.push(&after[..end]);
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    found
}

fn substitute(text: &str, args: &BTreeMap<String, String>) -> Result<String, NgacError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('>') else {
            break;
        };
        let name = &after[..end];
        let value = args.get(name).ok_or_else(|| {
            NgacError::MalformedObligationArgs(format!("undefined argument <{}>", name))
        })?;
        out.push_str(&rest[..start]);
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
