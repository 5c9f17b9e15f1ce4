//! Simplify/select graph coloring.

use super::{RegAllocator, RegisterAssignment};
use crate::backend::interference::InterferenceGraph;
use crate::ir::{Method, VarScope};
use crate::CompileError;
use log::{debug, warn};
use std::collections::BTreeSet;

/// Chaitin-style coloring with `k` colors.
///
/// Only locals are colored: `this` and parameters keep their fixed slots and
/// do not count towards a candidate's degree. Candidates are visited in name
/// order so the result is reproducible.
pub struct GraphColoring {
    k: usize,
}

impl GraphColoring {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    fn candidates(method: &Method, graph: &InterferenceGraph) -> BTreeSet<String> {
        graph
            .nodes()
            .filter(|n| {
                method
                    .var_table
                    .get(*n)
                    .is_some_and(|d| d.scope == VarScope::Local)
            })
            .map(str::to_string)
            .collect()
    }

    /// Simplify: repeatedly remove a node with fewer than `k` remaining
    /// neighbors, or the first remaining node when none qualifies.
    fn simplify(&self, method: &Method, graph: &InterferenceGraph) -> Vec<String> {
        let mut remaining = Self::candidates(method, graph);
        let mut stack = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let pick = remaining
                .iter()
                .find(|n| {
                    graph
                        .neighbors(n)
                        .filter(|m| remaining.contains(*m))
                        .count()
                        < self.k
                })
                .or_else(|| remaining.iter().next())
                .cloned();
            let Some(pick) = pick else { break };

            let degree = graph.neighbors(&pick).filter(|m| remaining.contains(*m)).count();
            if degree >= self.k {
                warn!(
                    "'{}': no node below degree {}, pushing spill candidate '{pick}'",
                    method.name, self.k
                );
            }
            remaining.remove(&pick);
            stack.push(pick);
        }
        stack
    }
}

impl RegAllocator for GraphColoring {
    fn color(
        &self,
        method: &Method,
        graph: &InterferenceGraph,
    ) -> Result<RegisterAssignment, CompileError> {
        let mut stack = self.simplify(method, graph);
        let mut assignment = RegisterAssignment::new();

        while let Some(name) = stack.pop() {
            let taken: BTreeSet<usize> = graph
                .neighbors(&name)
                .filter_map(|n| assignment.color(n))
                .collect();
            let color = (0..).find(|c| !taken.contains(c)).unwrap_or(0);
            if color >= self.k {
                return Err(CompileError::BudgetExceeded {
                    method: method.name.clone(),
                    variable: name,
                    budget: self.k,
                });
            }
            debug!("'{}': {name} gets color {color}", method.name);
            assignment.assign(&name, color);
        }
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrType;

    fn method(locals: &[&str]) -> Method {
        let mut m = Method::new("m", true, IrType::Void);
        for l in locals {
            m.declare(*l, IrType::Int, VarScope::Local);
        }
        m
    }

    #[test]
    fn triangle_needs_three_colors() {
        let m = method(&["a", "b", "c"]);
        let mut g = InterferenceGraph::new();
        g.add_edge("a", "b");
        g.add_edge("b", "c");
        g.add_edge("a", "c");

        let ok = GraphColoring::new(3).color(&m, &g).unwrap();
        assert_eq!(ok.registers_used(), 3);

        let err = GraphColoring::new(2).color(&m, &g).unwrap_err();
        assert!(matches!(err, CompileError::BudgetExceeded { budget: 2, .. }));
    }

    #[test]
    fn parameters_are_not_colored() {
        let mut m = method(&["a"]);
        m.params.push(crate::ir::Operand::var("p", IrType::Int));
        m.var_table.insert(
            "p".into(),
            crate::ir::VarDescriptor {
                ty: IrType::Int,
                scope: VarScope::Param,
                slot: 0,
            },
        );
        let mut g = InterferenceGraph::new();
        g.add_edge("a", "p");

        let colors = GraphColoring::new(1).color(&m, &g).unwrap();
        assert_eq!(colors.color("a"), Some(0));
        assert!(!colors.contains("p"));
    }
}
