use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The five NGAC node kinds. Serialized with their short NGAC names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "PC")]
    PolicyClass,
    #[serde(rename = "UA")]
    UserAttribute,
    #[serde(rename = "OA")]
    ObjectAttribute,
    #[serde(rename = "U")]
    User,
    #[serde(rename = "O")]
    Object,
}

impl NodeKind {
    /// Whether a node of this kind may be assigned under a node of `parent` kind.
    ///
    /// U → UA, UA → UA | PC, O → OA, OA → OA | PC. Policy classes are roots.
    pub fn can_assign_to(self, parent: NodeKind) -> bool {
        use NodeKind::*;
        matches!(
            (self, parent),
            (User, UserAttribute)
                | (UserAttribute, UserAttribute)
                | (UserAttribute, PolicyClass)
                | (Object, ObjectAttribute)
                | (ObjectAttribute, ObjectAttribute)
                | (ObjectAttribute, PolicyClass)
        )
    }

    /// Whether a node of this kind may be the subject of an association.
    pub fn can_be_subject(self) -> bool {
        matches!(self, NodeKind::UserAttribute | NodeKind::PolicyClass)
    }

    /// Whether a node of this kind may be the target of an association.
    pub fn can_be_target(self) -> bool {
        !matches!(self, NodeKind::User)
    }

    pub fn short_name(self) -> &'static str {
        match self {
            NodeKind::PolicyClass => "PC",
            NodeKind::UserAttribute => "UA",
            NodeKind::ObjectAttribute => "OA",
            NodeKind::User => "U",
            NodeKind::Object => "O",
        }
    }

    pub fn parse(s: &str) -> Option<NodeKind> {
        match s {
            "PC" => Some(NodeKind::PolicyClass),
            "UA" => Some(NodeKind::UserAttribute),
            "OA" => Some(NodeKind::ObjectAttribute),
            "U" => Some(NodeKind::User),
            "O" => Some(NodeKind::Object),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A named, typed vertex of the policy graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// True when every `(key, value)` in `filter` is present on this node.
    pub fn matches(&self, filter: &BTreeMap<String, String>) -> bool {
        filter
            .iter()
            .all(|(k, v)| self.properties.get(k).is_some_and(|p| p == v))
    }
}
