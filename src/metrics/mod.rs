//! Per-entity quality metrics
//!
//! Function metrics are computed by the parser while the syntax tree is
//! alive ([`analyze_function`]). Class metrics are aggregated afterwards
//! from the class's direct methods over `method` edges in the graph.

mod complexity;

pub use complexity::analyze_function;

use crate::graph::{EdgeKind, GraphStore, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMetrics {
    /// Always at least 1
    pub cyclomatic_complexity: u32,
    pub cognitive_complexity: u32,
    pub lines_of_code: u32,
    pub parameter_count: u32,
    pub max_nesting_depth: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub cyclomatic_complexity: u32,
    pub cognitive_complexity: u32,
    pub lines_of_code: u32,
    pub method_count: u32,
    pub max_nesting_depth: u32,
}

impl ClassMetrics {
    /// Aggregate over the class's direct methods
    pub fn aggregate<'a>(
        lines_of_code: u32,
        methods: impl IntoIterator<Item = &'a FunctionMetrics>,
    ) -> Self {
        let mut metrics = ClassMetrics {
            lines_of_code,
            ..Default::default()
        };
        for m in methods {
            metrics.cyclomatic_complexity += m.cyclomatic_complexity;
            metrics.cognitive_complexity += m.cognitive_complexity;
            metrics.max_nesting_depth = metrics.max_nesting_depth.max(m.max_nesting_depth);
            metrics.method_count += 1;
        }
        metrics
    }
}

/// Metrics for one entity, shaped by its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityMetrics {
    Function(FunctionMetrics),
    Class(ClassMetrics),
}

impl EntityMetrics {
    pub fn cyclomatic(&self) -> u32 {
        match self {
            EntityMetrics::Function(m) => m.cyclomatic_complexity,
            EntityMetrics::Class(m) => m.cyclomatic_complexity,
        }
    }

    pub fn cognitive(&self) -> u32 {
        match self {
            EntityMetrics::Function(m) => m.cognitive_complexity,
            EntityMetrics::Class(m) => m.cognitive_complexity,
        }
    }

    pub fn lines_of_code(&self) -> u32 {
        match self {
            EntityMetrics::Function(m) => m.lines_of_code,
            EntityMetrics::Class(m) => m.lines_of_code,
        }
    }

    pub fn max_nesting(&self) -> u32 {
        match self {
            EntityMetrics::Function(m) => m.max_nesting_depth,
            EntityMetrics::Class(m) => m.max_nesting_depth,
        }
    }

    /// Parameter count for functions, method count for classes
    pub fn arity(&self) -> u32 {
        match self {
            EntityMetrics::Function(m) => m.parameter_count,
            EntityMetrics::Class(m) => m.method_count,
        }
    }

    pub fn node_kind(&self) -> NodeKind {
        match self {
            EntityMetrics::Function(_) => NodeKind::Function,
            EntityMetrics::Class(_) => NodeKind::Class,
        }
    }
}

/// Build the metrics table for every function and class in the graph
pub fn analyze(
    graph: &GraphStore,
    function_metrics: &HashMap<String, FunctionMetrics>,
) -> HashMap<String, EntityMetrics> {
    let mut table: HashMap<String, EntityMetrics> = function_metrics
        .iter()
        .filter(|(id, _)| graph.contains_node(id))
        .map(|(id, m)| (id.clone(), EntityMetrics::Function(*m)))
        .collect();

    for class in graph.nodes_by_kind(NodeKind::Class) {
        let methods = graph
            .successors_by(class.id(), EdgeKind::Method)
            .into_iter()
            .filter_map(|m| function_metrics.get(m.id()));
        let metrics = ClassMetrics::aggregate(class.loc(), methods);
        table.insert(class.id().to_string(), EntityMetrics::Class(metrics));
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClassNode, CodeEdge, CodeNode, FunctionNode};

    fn fm(cc: u32, cog: u32, nest: u32) -> FunctionMetrics {
        FunctionMetrics {
            cyclomatic_complexity: cc,
            cognitive_complexity: cog,
            lines_of_code: 5,
            parameter_count: 1,
            max_nesting_depth: nest,
        }
    }

    #[test]
    fn test_class_aggregate() {
        let methods = [fm(2, 1, 1), fm(5, 4, 3)];
        let m = ClassMetrics::aggregate(40, methods.iter());
        assert_eq!(m.cyclomatic_complexity, 7);
        assert_eq!(m.cognitive_complexity, 5);
        assert_eq!(m.max_nesting_depth, 3);
        assert_eq!(m.method_count, 2);
        assert_eq!(m.lines_of_code, 40);
    }

    #[test]
    fn test_analyze_uses_method_edges_only() {
        let mut graph = GraphStore::new();
        graph.add_node(CodeNode::file("a.py", 30));
        graph.add_node(CodeNode::Class(ClassNode {
            id: "a.py:C".into(),
            name: "C".into(),
            file_path: "a.py".into(),
            line_start: 1,
            line_end: 10,
            bases: vec![],
        }));
        for (id, line) in [("a.py:C.m", 2), ("a.py:free", 20)] {
            graph.add_node(CodeNode::Function(FunctionNode {
                id: id.into(),
                name: id.into(),
                file_path: "a.py".into(),
                line_start: line,
                line_end: line + 4,
                parameters: vec![],
                is_async: false,
            }));
        }
        graph.add_edge(CodeEdge::method("a.py:C", "a.py:C.m")).unwrap();
        graph.add_edge(CodeEdge::contains("a.py", "a.py:free")).unwrap();

        let mut raw = HashMap::new();
        raw.insert("a.py:C.m".to_string(), fm(3, 2, 1));
        raw.insert("a.py:free".to_string(), fm(9, 9, 2));

        let table = analyze(&graph, &raw);
        assert_eq!(table.len(), 3);
        match table["a.py:C"] {
            EntityMetrics::Class(m) => {
                assert_eq!(m.method_count, 1);
                assert_eq!(m.cyclomatic_complexity, 3);
                assert_eq!(m.lines_of_code, 10);
            }
            other => panic!("expected class metrics, got {:?}", other),
        }
        assert_eq!(table["a.py:free"].arity(), 1);
        assert_eq!(table["a.py:C"].arity(), 1);
    }
}
