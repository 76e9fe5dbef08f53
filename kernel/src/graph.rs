//! Topological ordering shared by the admissibility checker's cycle check
//! and dimensional inference pass, and by `hir-codegen`'s emitter.
//!
//! Uses Kahn's algorithm with a stack (LIFO) frontier rather than a queue:
//! the frontier is popped from the end, matching the order the checker and
//! emitter both depend on for deterministic node numbering.

use std::collections::BTreeMap;

use crate::hir::{Hir, NodeKind};

/// Result of peeling a graph's nodes in dependency order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopoResult {
    /// Node ids in the order they were peeled (dependencies before
    /// dependents). Does not necessarily include every node id if the graph
    /// contains a cycle.
    pub order: Vec<String>,
    /// Number of nodes peeled. Equal to `order.len()`.
    pub visited: usize,
    /// Total number of nodes in the graph (`hir.nodes.len()`).
    pub total: usize,
}

impl TopoResult {
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        self.visited == self.total
    }
}

/// Compute in-degree and successor lists over `op` node dependency edges
/// (`arg -> node`), then peel zero-in-degree nodes with a LIFO stack until
/// none remain.
#[must_use]
pub fn topo_peel(hir: &Hir) -> TopoResult {
    let total = hir.nodes.len();
    let mut indeg: BTreeMap<&str, usize> = hir.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut succ: BTreeMap<&str, Vec<&str>> =
        hir.nodes.iter().map(|n| (n.id.as_str(), Vec::new())).collect();

    for node in &hir.nodes {
        if node.kind == NodeKind::Op {
            for arg in node.args_or_empty() {
                if let Some(list) = succ.get_mut(arg.as_str()) {
                    list.push(node.id.as_str());
                }
                if let Some(deg) = indeg.get_mut(node.id.as_str()) {
                    *deg += 1;
                }
            }
        }
    }

    // Stack frontier, seeded in node declaration order, then driven LIFO.
    let mut stack: Vec<&str> = hir
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| indeg.get(id).copied() == Some(0))
        .collect();

    let mut order = Vec::new();
    while let Some(cur) = stack.pop() {
        order.push(cur.to_string());
        if let Some(nexts) = succ.get(cur) {
            for &next in nexts {
                if let Some(deg) = indeg.get_mut(next) {
                    *deg -= 1;
                    if *deg == 0 {
                        stack.push(next);
                    }
                }
            }
        }
    }

    let visited = order.len();
    TopoResult {
        order,
        visited,
        total,
    }
}
