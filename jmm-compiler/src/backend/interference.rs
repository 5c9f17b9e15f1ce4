//! Interference graph built from liveness results.

use super::liveness::LivenessInfo;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Undirected graph of variables that are live at the same time.
///
/// Kept symmetric and irreflexive by construction: the only way to add an
/// edge is [`InterferenceGraph::add_edge`], which inserts both directions
/// and ignores self-loops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterferenceGraph {
    adj: BTreeMap<String, BTreeSet<String>>,
}

impl InterferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// For every instruction defining `d`, connect `d` with everything live
    /// after it. Every defined or live variable becomes a node.
    pub fn build(info: &LivenessInfo) -> Self {
        let mut graph = Self::new();
        for idx in 0..info.len() {
            for v in info.live_in(idx).iter().chain(info.live_out(idx)) {
                graph.add_node(v);
            }
            if let Some(d) = info.def(idx) {
                graph.add_node(d);
                for v in info.live_out(idx) {
                    graph.add_edge(d, v);
                }
            }
        }
        graph
    }

    pub fn add_node(&mut self, name: &str) {
        if !self.adj.contains_key(name) {
            self.adj.insert(name.to_string(), BTreeSet::new());
        }
    }

    pub fn add_edge(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        self.add_node(a);
        self.add_node(b);
        if let Some(n) = self.adj.get_mut(a) {
            n.insert(b.to_string());
        }
        if let Some(n) = self.adj.get_mut(b) {
            n.insert(a.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adj.contains_key(name)
    }

    pub fn interferes(&self, a: &str, b: &str) -> bool {
        self.adj.get(a).is_some_and(|n| n.contains(b))
    }

    /// Nodes in name order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.adj.keys().map(String::as_str)
    }

    pub fn neighbors(&self, name: &str) -> impl Iterator<Item = &str> {
        self.adj
            .get(name)
            .into_iter()
            .flat_map(|n| n.iter().map(String::as_str))
    }

    pub fn degree(&self, name: &str) -> usize {
        self.adj.get(name).map_or(0, BTreeSet::len)
    }

    pub fn len(&self) -> usize {
        self.adj.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }
}

impl fmt::Display for InterferenceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, neighbors) in &self.adj {
            let list = neighbors
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "{name}: {{{list}}}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_symmetric_and_irreflexive() {
        let mut g = InterferenceGraph::new();
        g.add_edge("a", "b");
        g.add_edge("a", "a");
        assert!(g.interferes("a", "b"));
        assert!(g.interferes("b", "a"));
        assert!(!g.interferes("a", "a"));
        assert_eq!(g.degree("a"), 1);
    }

    #[test]
    fn display_lists_neighbors_in_order() {
        let mut g = InterferenceGraph::new();
        g.add_edge("b", "c");
        g.add_edge("b", "a");
        g.add_node("z");
        assert_eq!(g.to_string(), "a: {b}\nb: {a, c}\nc: {b}\nz: {}\n");
    }
}
