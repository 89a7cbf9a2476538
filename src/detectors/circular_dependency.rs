//! Import cycle detection
//!
//! Iterative depth-first search over `imports` edges only. Roots are visited
//! in sorted id order and successors in sorted id order, so the result is
//! deterministic for a given graph.
//!
//! # Algorithm
//!
//! 1. Keep an explicit frame stack plus the current path and an on-path set
//! 2. When an edge reaches a node on the path, the path slice from that node
//!    to the current node is one cycle
//! 3. Nodes finished in an earlier traversal are never re-entered
//!
//! This runs in O(V+E) and reports one cycle per back edge.

use crate::graph::{EdgeKind, GraphStore};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashSet;
use tracing::debug;

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    next: usize,
}

fn import_successors(graph: &GraphStore, node: NodeIndex) -> Vec<NodeIndex> {
    let raw = graph.raw();
    let mut targets: Vec<NodeIndex> = raw
        .edges_directed(node, Direction::Outgoing)
        .filter(|e| *e.weight() == EdgeKind::Imports)
        .map(|e| e.target())
        .collect();
    targets.sort_by(|a, b| raw[*a].id().cmp(raw[*b].id()));
    targets.dedup();
    targets
}

/// Find import cycles; each cycle lists node ids in traversal order without
/// repeating the first node at the end
pub fn find_import_cycles(graph: &GraphStore) -> Vec<Vec<String>> {
    let raw = graph.raw();

    let mut roots: Vec<NodeIndex> = raw.node_indices().collect();
    roots.sort_by(|a, b| raw[*a].id().cmp(raw[*b].id()));

    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut cycles = Vec::new();

    for root in roots {
        if visited.contains(&root) {
            continue;
        }

        let mut path: Vec<NodeIndex> = vec![root];
        let mut on_path: HashSet<NodeIndex> = HashSet::from([root]);
        let mut stack = vec![Frame {
            node: root,
            successors: import_successors(graph, root),
            next: 0,
        }];
        visited.insert(root);

        while let Some(frame) = stack.last_mut() {
            if frame.next >= frame.successors.len() {
                on_path.remove(&frame.node);
                path.pop();
                stack.pop();
                continue;
            }

            let target = frame.successors[frame.next];
            frame.next += 1;

            if on_path.contains(&target) {
                if let Some(start) = path.iter().position(|n| *n == target) {
                    let cycle: Vec<String> =
                        path[start..].iter().map(|n| raw[*n].id().to_string()).collect();
                    debug!("Import cycle: {}", cycle.join(" -> "));
                    cycles.push(cycle);
                }
                continue;
            }

            if visited.insert(target) {
                path.push(target);
                on_path.insert(target);
                stack.push(Frame {
                    node: target,
                    successors: import_successors(graph, target),
                    next: 0,
                });
            }
        }
    }

    cycles
}
