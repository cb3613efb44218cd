use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::NgacError;
use crate::model::node::{Node, NodeKind};
use crate::model::operations::Operations;

static NO_EDGES: BTreeSet<String> = BTreeSet::new();

/// The attributed policy graph.
///
/// Nodes are keyed by globally unique name. Assignments are stored in both
/// directions (child → parents and parent → children); associations are keyed
/// subject → target → operations. The assignment relation is kept acyclic and
/// follows the NGAC kind rules at every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GraphSnapshot", into = "GraphSnapshot")]
pub struct Graph {
    nodes: BTreeMap<String, Node>,
    parents: BTreeMap<String, BTreeSet<String>>,
    children: BTreeMap<String, BTreeSet<String>>,
    associations: BTreeMap<String, BTreeMap<String, Operations>>,
}

/// Wire form of a graph: node list, child → parent-set map and
/// subject → target → operation-set map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub assignments: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub associations: BTreeMap<String, BTreeMap<String, Operations>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Result<&Node, NgacError> {
        self.nodes
            .get(name)
            .ok_or_else(|| NgacError::NotFound(format!("node {:?}", name)))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Add a node with no edges. Fails if the name is taken.
    pub fn create_node(&mut self, node: Node) -> Result<(), NgacError> {
        if node.name.is_empty() {
            return Err(NgacError::Validation("node name must not be empty".into()));
        }
        if self.nodes.contains_key(&node.name) {
            return Err(NgacError::DuplicateName(node.name));
        }
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    /// Remove a node and every assignment and association that references it.
    pub fn delete_node(&mut self, name: &str) -> Result<Node, NgacError> {
        let node = self
            .nodes
            .remove(name)
            .ok_or_else(|| NgacError::NotFound(format!("node {:?}", name)))?;

        for parent in self.parents.get(name).cloned().unwrap_or_default() {
            self.unlink(name, &parent);
        }
        for child in self.children.get(name).cloned().unwrap_or_default() {
            self.unlink(&child, name);
        }

        self.associations.remove(name);
        for targets in self.associations.values_mut() {
            targets.remove(name);
        }
        self.associations.retain(|_, targets| !targets.is_empty());

        Ok(node)
    }

    /// Assign `child` under `parent`.
    ///
    /// Re-assigning an existing edge is a no-op. Kind violations and edges
    /// that would close a cycle fail with `InvalidGraph`.
    pub fn assign(&mut self, child: &str, parent: &str) -> Result<(), NgacError> {
        let child_kind = self.node(child)?.kind;
        let parent_kind = self.node(parent)?.kind;

        if self.has_assignment(child, parent) {
            return Ok(());
        }
        if child == parent {
            return Err(NgacError::InvalidGraph(format!(
                "node {:?} cannot be assigned to itself",
                child
            )));
        }
        if !child_kind.can_assign_to(parent_kind) {
            return Err(NgacError::InvalidGraph(format!(
                "cannot assign {} {:?} to {} {:?}",
                child_kind, child, parent_kind, parent
            )));
        }
        if self.ascendants(parent)?.contains(child) {
            return Err(NgacError::InvalidGraph(format!(
                "assigning {:?} to {:?} would create a cycle",
                child, parent
            )));
        }

        self.parents
            .entry(child.to_string())
            .or_default()
            .insert(parent.to_string());
        self.children
            .entry(parent.to_string())
            .or_default()
            .insert(child.to_string());
        Ok(())
    }

    /// Remove the edge `child → parent`. A missing edge is a no-op.
    pub fn deassign(&mut self, child: &str, parent: &str) -> Result<(), NgacError> {
        self.node(child)?;
        self.node(parent)?;
        self.unlink(child, parent);
        Ok(())
    }

    fn unlink(&mut self, child: &str, parent: &str) {
        if let Some(set) = self.parents.get_mut(child) {
            set.remove(parent);
            if set.is_empty() {
                self.parents.remove(child);
            }
        }
        if let Some(set) = self.children.get_mut(parent) {
            set.remove(child);
            if set.is_empty() {
                self.children.remove(parent);
            }
        }
    }

    /// Grant `ops` from `subject` to `target`. An existing grant between the
    /// pair keeps its operations and gains `ops`.
    pub fn associate(
        &mut self,
        subject: &str,
        target: &str,
        ops: Operations,
    ) -> Result<(), NgacError> {
        let subject_kind = self.node(subject)?.kind;
        let target_kind = self.node(target)?.kind;

        if !subject_kind.can_be_subject() {
            return Err(NgacError::InvalidGraph(format!(
                "{} {:?} cannot be an association subject",
                subject_kind, subject
            )));
        }
        if !target_kind.can_be_target() {
            return Err(NgacError::InvalidGraph(format!(
                "{} {:?} cannot be an association target",
                target_kind, target
            )));
        }

        self.associations
            .entry(subject.to_string())
            .or_default()
            .entry(target.to_string())
            .or_default()
            .extend(&ops);
        Ok(())
    }

    /// Remove the association between `subject` and `target`, if any.
    pub fn dissociate(&mut self, subject: &str, target: &str) -> Result<(), NgacError> {
        self.node(subject)?;
        self.node(target)?;

        if let Some(targets) = self.associations.get_mut(subject) {
            targets.remove(target);
            if targets.is_empty() {
                self.associations.remove(subject);
            }
        }
        Ok(())
    }

    pub fn has_assignment(&self, child: &str, parent: &str) -> bool {
        self.parents
            .get(child)
            .is_some_and(|set| set.contains(parent))
    }

    pub fn has_association(&self, subject: &str, target: &str) -> bool {
        self.associations
            .get(subject)
            .is_some_and(|targets| targets.contains_key(target))
    }

    /// Direct parents of a node.
    pub fn parents(&self, name: &str) -> Result<&BTreeSet<String>, NgacError> {
        self.node(name)?;
        Ok(self.parents.get(name).unwrap_or(&NO_EDGES))
    }

    /// Direct children of a node.
    pub fn children(&self, name: &str) -> Result<&BTreeSet<String>, NgacError> {
        self.node(name)?;
        Ok(self.children.get(name).unwrap_or(&NO_EDGES))
    }

    /// Every `(child, parent)` edge.
    pub fn assignments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parents.iter().flat_map(|(child, parents)| {
            parents.iter().map(move |p| (child.as_str(), p.as_str()))
        })
    }

    /// Every `(subject, target, operations)` association.
    pub fn associations(&self) -> impl Iterator<Item = (&str, &str, &Operations)> {
        self.associations.iter().flat_map(|(subject, targets)| {
            targets
                .iter()
                .map(move |(target, ops)| (subject.as_str(), target.as_str(), ops))
        })
    }

    /// Targets and operations granted directly to `subject`.
    pub fn associations_from(&self, subject: &str) -> impl Iterator<Item = (&str, &Operations)> {
        self.associations
            .get(subject)
            .into_iter()
            .flat_map(|targets| targets.iter().map(|(t, ops)| (t.as_str(), ops)))
    }

    /// All nodes reachable upward from `name` through assignments,
    /// including `name` itself.
    pub fn ascendants(&self, name: &str) -> Result<BTreeSet<String>, NgacError> {
        self.node(name)?;

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        visited.insert(name.to_string());
        queue.push_back(name.to_string());

        while let Some(current) = queue.pop_front() {
            if let Some(parents) = self.parents.get(&current) {
                for parent in parents {
                    if visited.insert(parent.clone()) {
                        queue.push_back(parent.clone());
                    }
                }
            }
        }

        Ok(visited)
    }

    /// Nodes of the given kind (or any kind) whose properties contain `filter`.
    pub fn find_nodes(
        &self,
        kind: Option<NodeKind>,
        filter: &BTreeMap<String, String>,
    ) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| kind.map_or(true, |k| n.kind == k))
            .filter(|n| n.matches(filter))
            .collect()
    }

    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::from(self.clone())
    }
}

impl From<Graph> for GraphSnapshot {
    fn from(graph: Graph) -> Self {
        GraphSnapshot {
            nodes: graph.nodes.into_values().collect(),
            assignments: graph.parents,
            associations: graph.associations,
        }
    }
}

impl TryFrom<GraphSnapshot> for Graph {
    type Error = NgacError;

    /// Rebuild a graph, rejecting duplicates, dangling edges, kind violations
    /// and cycles.
    fn try_from(snapshot: GraphSnapshot) -> Result<Self, Self::Error> {
        let invalid = |e: NgacError| match e {
            NgacError::InvalidGraph(m) => NgacError::InvalidGraph(m),
            other => NgacError::InvalidGraph(other.to_string()),
        };

        let mut graph = Graph::new();
        for node in snapshot.nodes {
            graph.create_node(node).map_err(invalid)?;
        }
        for (child, parents) in &snapshot.assignments {
            for parent in parents {
                graph.assign(child, parent).map_err(invalid)?;
            }
        }
        for (subject, targets) in snapshot.associations {
            for (target, ops) in targets {
                graph.associate(&subject, &target, ops).map_err(invalid)?;
            }
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Graph {
        let mut g = Graph::new();
        g.create_node(Node::new("pc", NodeKind::PolicyClass)).unwrap();
        g.create_node(Node::new("ua", NodeKind::UserAttribute)).unwrap();
        g.create_node(Node::new("oa", NodeKind::ObjectAttribute)).unwrap();
        g.create_node(Node::new("u", NodeKind::User)).unwrap();
        g.create_node(Node::new("o", NodeKind::Object)).unwrap();
        g.assign("ua", "pc").unwrap();
        g.assign("oa", "pc").unwrap();
        g.assign("u", "ua").unwrap();
        g.assign("o", "oa").unwrap();
        g.associate("ua", "oa", Operations::from_iter(["read"])).unwrap();
        g
    }

    #[test]
    fn test_create_duplicate() {
        let mut g = sample();
        let err = g.create_node(Node::new("ua", NodeKind::UserAttribute)).unwrap_err();
        assert!(matches!(err, NgacError::DuplicateName(n) if n == "ua"));
    }

    #[test]
    fn test_assign_missing_endpoint() {
        let mut g = sample();
        assert!(matches!(g.assign("ghost", "pc"), Err(NgacError::NotFound(_))));
        assert!(matches!(g.assign("ua", "ghost"), Err(NgacError::NotFound(_))));
        assert!(matches!(g.deassign("ua", "ghost"), Err(NgacError::NotFound(_))));
        assert!(matches!(
            g.associate("ghost", "oa", Operations::new()),
            Err(NgacError::NotFound(_))
        ));
    }

    #[test]
    fn test_assign_rejects_cycle() {
        let mut g = sample();
        g.create_node(Node::new("ua2", NodeKind::UserAttribute)).unwrap();
        g.assign("ua2", "ua").unwrap();
        let err = g.assign("ua", "ua2").unwrap_err();
        assert!(matches!(err, NgacError::InvalidGraph(_)));
        assert!(!g.has_assignment("ua", "ua2"));
    }

    #[test]
    fn test_assign_rejects_kind_violation() {
        let mut g = sample();
        assert!(matches!(g.assign("u", "oa"), Err(NgacError::InvalidGraph(_))));
        assert!(matches!(g.assign("ua", "ua"), Err(NgacError::InvalidGraph(_))));
    }

    #[test]
    fn test_assign_and_deassign_idempotent() {
        let mut g = sample();
        g.assign("u", "ua").unwrap();
        assert_eq!(g.parents("u").unwrap().len(), 1);

        g.deassign("u", "ua").unwrap();
        g.deassign("u", "ua").unwrap();
        assert!(g.parents("u").unwrap().is_empty());
        assert!(g.children("ua").unwrap().is_empty());
    }

    #[test]
    fn test_associate_subject_kind() {
        let mut g = sample();
        let err = g.associate("u", "oa", Operations::all()).unwrap_err();
        assert!(matches!(err, NgacError::InvalidGraph(_)));
        // Associating again adds to the operation set.
        g.associate("ua", "oa", Operations::from_iter(["write"])).unwrap();
        let ops: Vec<_> = g.associations_from("ua").collect();
        assert_eq!(ops, vec![("oa", &Operations::from_iter(["read", "write"]))]);
    }

    #[test]
    fn test_delete_cascades_edges() {
        let mut g = sample();
        g.delete_node("ua").unwrap();
        assert!(!g.contains("ua"));
        assert!(g.parents("u").unwrap().is_empty());
        assert!(g.children("pc").unwrap().contains("oa"));
        assert_eq!(g.associations().count(), 0);

        g.delete_node("oa").unwrap();
        assert!(g.parents("o").unwrap().is_empty());
        assert!(matches!(g.delete_node("oa"), Err(NgacError::NotFound(_))));
    }

    #[test]
    fn test_ascendants_inclusive() {
        let g = sample();
        let asc = g.ascendants("u").unwrap();
        let expected: BTreeSet<String> =
            ["u", "ua", "pc"].into_iter().map(String::from).collect();
        assert_eq!(asc, expected);
        assert!(matches!(g.ascendants("ghost"), Err(NgacError::NotFound(_))));
    }

    #[test]
    fn test_find_nodes_by_kind_and_property() {
        let mut g = sample();
        g.create_node(
            Node::new("acme_info", NodeKind::Object).with_property("type", "account"),
        )
        .unwrap();

        let all_objects = g.find_nodes(Some(NodeKind::Object), &BTreeMap::new());
        assert_eq!(all_objects.len(), 2);

        let filter = BTreeMap::from([("type".to_string(), "account".to_string())]);
        let accounts = g.find_nodes(None, &filter);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "acme_info");
    }

    #[test]
    fn test_json_round_trip() {
        let g = sample();
        let json = serde_json::to_string(&g).unwrap();
        let back: Graph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn test_load_rejects_dangling_edge() {
        let json = r#"{
            "nodes": [{"name": "ua", "kind": "UA"}],
            "assignments": {"ua": ["missing_pc"]},
            "associations": {}
        }"#;
        let err = serde_json::from_str::<Graph>(json).unwrap_err();
        assert!(err.to_string().contains("invalid graph"));
    }

    #[test]
    fn test_load_rejects_cycle() {
        let snapshot = GraphSnapshot {
            nodes: vec![
                Node::new("a", NodeKind::UserAttribute),
                Node::new("b", NodeKind::UserAttribute),
            ],
            assignments: BTreeMap::from([
                ("a".to_string(), BTreeSet::from(["b".to_string()])),
                ("b".to_string(), BTreeSet::from(["a".to_string()])),
            ]),
            associations: BTreeMap::new(),
        };
        let err = Graph::try_from(snapshot).unwrap_err();
        assert!(matches!(err, NgacError::InvalidGraph(ref m) if m.contains("cycle")));
        assert_eq!(err.to_string().matches("invalid graph").count(), 1);
    }
}
