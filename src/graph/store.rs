//! In-memory graph storage using petgraph
//!
//! A `GraphStore` is built once per scan and then shared read-only behind an
//! `Arc`, so mutation takes `&mut self` and needs no interior locking.

use super::store_models::{CodeEdge, CodeNode, EdgeKind, NodeKind};
use crate::error::{CortexError, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Directed code graph keyed by node id
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graph: DiGraph<CodeNode, EdgeKind>,
    node_index: HashMap<String, NodeIndex>,
}

/// Counts over the graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_files: usize,
    pub total_classes: usize,
    pub total_functions: usize,
    pub total_modules: usize,
    pub total_nodes: usize,
    pub total_edges: usize,
}

/// One level of a contains/method hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<TreeNode>,
}

impl GraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from scanner facts
    ///
    /// Nodes are inserted first so that every edge source resolves; an edge
    /// whose source is still unknown is an error.
    pub fn from_facts(nodes: Vec<CodeNode>, edges: Vec<CodeEdge>) -> Result<Self> {
        let mut store = Self::new();
        for node in nodes {
            store.add_node(node);
        }
        for edge in edges {
            store.add_edge(edge)?;
        }
        debug!(
            "Graph built: {} nodes, {} edges",
            store.node_count(),
            store.edge_count()
        );
        Ok(store)
    }

    // ==================== Node Operations ====================

    /// Add a node to the graph
    ///
    /// Re-adding an existing id replaces its metadata and keeps its index.
    pub fn add_node(&mut self, node: CodeNode) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(node.id()) {
            if let Some(existing) = self.graph.node_weight_mut(idx) {
                *existing = node;
            }
            return idx;
        }

        let id = node.id().to_string();
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        idx
    }

    /// Get node by id
    pub fn get_node(&self, id: &str) -> Option<&CodeNode> {
        self.node_index
            .get(id)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &CodeNode> {
        self.graph.node_weights()
    }

    /// Get all nodes of a specific kind
    pub fn nodes_by_kind(&self, kind: NodeKind) -> Vec<&CodeNode> {
        self.graph
            .node_weights()
            .filter(|n| n.kind() == kind)
            .collect()
    }

    // ==================== Edge Operations ====================

    /// Add an edge
    ///
    /// The source must already exist. A missing target is created as a
    /// placeholder module node so no edge ever dangles.
    pub fn add_edge(&mut self, edge: CodeEdge) -> Result<()> {
        let from = *self
            .node_index
            .get(&edge.source_id)
            .ok_or_else(|| {
                CortexError::Graph(format!(
                    "edge source '{}' does not exist ({} -> {})",
                    edge.source_id,
                    edge.kind.as_str(),
                    edge.target_id
                ))
            })?;

        let to = match self.node_index.get(&edge.target_id) {
            Some(&idx) => idx,
            None => self.add_node(CodeNode::module(&edge.target_id)),
        };

        self.graph.add_edge(from, to, edge.kind);
        Ok(())
    }

    /// All edges as owned records
    pub fn edges(&self) -> Vec<CodeEdge> {
        self.graph
            .edge_references()
            .filter_map(|e| self.edge_record(e.source(), e.target(), *e.weight()))
            .collect()
    }

    /// Get all edges of a specific kind
    pub fn edges_of_kind(&self, kind: EdgeKind) -> Vec<CodeEdge> {
        self.graph
            .edge_references()
            .filter(|e| *e.weight() == kind)
            .filter_map(|e| self.edge_record(e.source(), e.target(), kind))
            .collect()
    }

    fn edge_record(&self, src: NodeIndex, dst: NodeIndex, kind: EdgeKind) -> Option<CodeEdge> {
        let src = self.graph.node_weight(src)?;
        let dst = self.graph.node_weight(dst)?;
        Some(CodeEdge::new(src.id(), dst.id(), kind))
    }

    fn neighbors(&self, id: &str, direction: Direction, kind: Option<EdgeKind>) -> Vec<&CodeNode> {
        let Some(&idx) = self.node_index.get(id) else {
            return vec![];
        };

        let mut seen = HashSet::new();
        self.graph
            .edges_directed(idx, direction)
            .filter(|e| kind.map_or(true, |k| *e.weight() == k))
            .map(|e| match direction {
                Direction::Outgoing => e.target(),
                Direction::Incoming => e.source(),
            })
            .filter(|n| seen.insert(*n))
            .filter_map(|n| self.graph.node_weight(n))
            .collect()
    }

    /// What does this node depend on?
    pub fn successors(&self, id: &str) -> Vec<&CodeNode> {
        self.neighbors(id, Direction::Outgoing, None)
    }

    /// What depends on this node?
    pub fn predecessors(&self, id: &str) -> Vec<&CodeNode> {
        self.neighbors(id, Direction::Incoming, None)
    }

    /// Successors reached over one edge kind
    pub fn successors_by(&self, id: &str, kind: EdgeKind) -> Vec<&CodeNode> {
        self.neighbors(id, Direction::Outgoing, Some(kind))
    }

    /// Predecessors reached over one edge kind
    pub fn predecessors_by(&self, id: &str, kind: EdgeKind) -> Vec<&CodeNode> {
        self.neighbors(id, Direction::Incoming, Some(kind))
    }

    // ==================== Graph Metrics ====================

    /// Number of predecessor edges (fan-in)
    pub fn fan_in(&self, id: &str) -> usize {
        self.node_index
            .get(id)
            .map_or(0, |&idx| self.graph.edges_directed(idx, Direction::Incoming).count())
    }

    /// Number of successor edges (fan-out)
    pub fn fan_out(&self, id: &str) -> usize {
        self.node_index
            .get(id)
            .map_or(0, |&idx| self.graph.edges_directed(idx, Direction::Outgoing).count())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Get statistics
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            total_nodes: self.graph.node_count(),
            total_edges: self.graph.edge_count(),
            ..Default::default()
        };

        for node in self.graph.node_weights() {
            match node.kind() {
                NodeKind::File => stats.total_files += 1,
                NodeKind::Class => stats.total_classes += 1,
                NodeKind::Function => stats.total_functions += 1,
                NodeKind::Module => stats.total_modules += 1,
            }
        }

        stats
    }

    // ==================== Hierarchy ====================

    /// The contains/method subtree rooted at a file or class
    pub fn subtree(&self, id: &str) -> Option<TreeNode> {
        let root = self.get_node(id)?;
        let mut visited = HashSet::new();
        Some(self.build_tree(root, &mut visited))
    }

    fn build_tree<'a>(&'a self, node: &'a CodeNode, visited: &mut HashSet<&'a str>) -> TreeNode {
        visited.insert(node.id());

        let mut children: Vec<&CodeNode> = self
            .successors_by(node.id(), EdgeKind::Contains)
            .into_iter()
            .chain(self.successors_by(node.id(), EdgeKind::Method))
            .collect();
        children.sort_by(|a, b| {
            let a_line = a.lines().map_or(0, |(s, _)| s);
            let b_line = b.lines().map_or(0, |(s, _)| s);
            a_line.cmp(&b_line).then_with(|| a.id().cmp(b.id()))
        });

        let mut tree = TreeNode {
            id: node.id().to_string(),
            kind: node.kind(),
            label: node.name().to_string(),
            children: Vec::with_capacity(children.len()),
        };
        for child in children {
            if visited.contains(child.id()) {
                continue;
            }
            tree.children.push(self.build_tree(child, visited));
        }
        tree
    }

    // ==================== Raw access ====================

    pub(crate) fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.node_index.get(id).copied()
    }

    pub(crate) fn raw(&self) -> &DiGraph<CodeNode, EdgeKind> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::store_models::{ClassNode, FunctionNode};

    fn function(id: &str, file: &str, line: u32) -> CodeNode {
        CodeNode::Function(FunctionNode {
            id: id.to_string(),
            name: id.rsplit(['.', ':']).next().unwrap_or(id).to_string(),
            file_path: file.to_string(),
            line_start: line,
            line_end: line + 2,
            parameters: vec![],
            is_async: false,
        })
    }

    fn class(id: &str, file: &str, line: u32) -> CodeNode {
        CodeNode::Class(ClassNode {
            id: id.to_string(),
            name: id.rsplit(':').next().unwrap_or(id).to_string(),
            file_path: file.to_string(),
            line_start: line,
            line_end: line + 10,
            bases: vec![],
        })
    }

    #[test]
    fn test_basic_operations() {
        let mut store = GraphStore::new();
        store.add_node(CodeNode::file("main.py", 10));
        store.add_node(function("main.py:main", "main.py", 1));
        store
            .add_edge(CodeEdge::contains("main.py", "main.py:main"))
            .unwrap();

        assert_eq!(store.node_count(), 2);
        assert_eq!(store.nodes_by_kind(NodeKind::File).len(), 1);
        assert_eq!(store.successors("main.py").len(), 1);
        assert_eq!(store.predecessors("main.py:main")[0].id(), "main.py");
    }

    #[test]
    fn test_add_node_is_idempotent_last_write_wins() {
        let mut store = GraphStore::new();
        let first = store.add_node(CodeNode::file("a.py", 1));
        let second = store.add_node(CodeNode::file("a.py", 99));
        assert_eq!(first, second);
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.get_node("a.py").unwrap().loc(), 99);
    }

    #[test]
    fn test_edge_requires_source() {
        let mut store = GraphStore::new();
        let err = store.add_edge(CodeEdge::imports("missing.py", "os"));
        assert!(matches!(err, Err(CortexError::Graph(_))));
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn test_missing_target_becomes_module_placeholder() {
        let mut store = GraphStore::new();
        store.add_node(CodeNode::file("a.py", 1));
        store.add_edge(CodeEdge::imports("a.py", "requests")).unwrap();

        let target = store.get_node("requests").unwrap();
        assert_eq!(target.kind(), NodeKind::Module);
        assert_eq!(store.fan_out("a.py"), 1);
        assert_eq!(store.fan_in("requests"), 1);
    }

    #[test]
    fn test_edges_of_kind() {
        let mut store = GraphStore::new();
        store.add_node(CodeNode::file("a.py", 1));
        store.add_node(CodeNode::file("b.py", 1));
        store.add_edge(CodeEdge::imports("a.py", "b.py")).unwrap();
        store.add_edge(CodeEdge::imports("a.py", "os")).unwrap();

        let imports = store.edges_of_kind(EdgeKind::Imports);
        assert_eq!(imports.len(), 2);
        assert!(store.edges_of_kind(EdgeKind::Contains).is_empty());
        assert_eq!(store.edges().len(), 2);
    }

    #[test]
    fn test_subtree_follows_contains_and_method() {
        let mut store = GraphStore::new();
        store.add_node(CodeNode::file("a.py", 30));
        store.add_node(class("a.py:Service", "a.py", 1));
        store.add_node(function("a.py:Service.run", "a.py", 2));
        store.add_node(function("a.py:helper", "a.py", 20));
        store.add_edge(CodeEdge::contains("a.py", "a.py:helper")).unwrap();
        store.add_edge(CodeEdge::contains("a.py", "a.py:Service")).unwrap();
        store
            .add_edge(CodeEdge::method("a.py:Service", "a.py:Service.run"))
            .unwrap();
        store.add_edge(CodeEdge::imports("a.py", "os")).unwrap();

        let tree = store.subtree("a.py").unwrap();
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].id, "a.py:Service");
        assert_eq!(tree.children[0].children[0].id, "a.py:Service.run");
        assert_eq!(tree.children[1].id, "a.py:helper");
        assert!(store.subtree("nope").is_none());
    }

    #[test]
    fn test_stats() {
        let mut store = GraphStore::new();
        store.add_node(CodeNode::file("a.py", 1));
        store.add_node(class("a.py:A", "a.py", 1));
        store.add_edge(CodeEdge::contains("a.py", "a.py:A")).unwrap();
        store.add_edge(CodeEdge::inherits("a.py:A", "Base")).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_files, 1);
        assert_eq!(stats.total_classes, 1);
        assert_eq!(stats.total_modules, 1);
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.total_edges, 2);
    }
}
