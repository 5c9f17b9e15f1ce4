//! Register allocation over a method's variable table.
//!
//! This module defines:
//! - [`RegAllocator`]: the trait that maps an interference graph to colors.
//! - [`RegisterAssignment`]: the resulting name → color map.
//! - [`allocate`]: the driver: liveness, graph, coloring, then slot offsets
//!   and dead-temporary cleanup written back into the method.

mod coloring;

pub use coloring::GraphColoring;

use super::interference::InterferenceGraph;
use super::liveness;
use crate::ir::{is_temp_name, Method, VarScope};
use crate::CompileError;
use log::{debug, info};
use std::collections::BTreeMap;

// ============================================================================
// Assignment
// ============================================================================

/// Variable name → color. Colors start at 0 and stay below the budget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterAssignment {
    colors: BTreeMap<String, usize>,
}

impl RegisterAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, name: &str, color: usize) {
        self.colors.insert(name.to_string(), color);
    }

    pub fn color(&self, name: &str) -> Option<usize> {
        self.colors.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.colors.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.colors.iter().map(|(n, c)| (n.as_str(), *c))
    }

    /// Number of distinct colors in use.
    pub fn registers_used(&self) -> usize {
        self.colors.values().max().map_or(0, |m| m + 1)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

// ============================================================================
// Allocator trait
// ============================================================================

/// Maps an interference graph to a coloring for one method.
pub trait RegAllocator {
    fn color(
        &self,
        method: &Method,
        graph: &InterferenceGraph,
    ) -> Result<RegisterAssignment, CompileError>;
}

// ============================================================================
// Driver
// ============================================================================

/// Run register allocation on `method` with a budget of `k` registers.
///
/// A budget of zero leaves the method untouched and returns `None`.
pub fn allocate(
    method: &mut Method,
    k: usize,
) -> Result<Option<RegisterAssignment>, CompileError> {
    if k == 0 {
        return Ok(None);
    }

    let info = liveness::analyze(method);
    let graph = InterferenceGraph::build(&info);
    debug!("interference graph for '{}':\n{graph}", method.name);

    let assignment = GraphColoring::new(k).color(method, &graph)?;
    apply_offsets(method, &assignment);
    cleanup_dead_temps(method, &assignment);

    info!(
        "allocated '{}': {} variable(s) in {} register(s), budget {k}",
        method.name,
        assignment.len(),
        assignment.registers_used()
    );
    Ok(Some(assignment))
}

/// Final slot = color + receiver + parameter count, for every colored local.
pub fn apply_offsets(method: &mut Method, assignment: &RegisterAssignment) {
    let offset = method.base_slot();
    for (name, color) in assignment.iter() {
        if let Some(desc) = method.var_table.get_mut(name) {
            if desc.scope == VarScope::Local {
                desc.slot = color + offset;
                debug!("[RegisterAllocator] {name} => r{}", desc.slot);
            }
        }
    }
}

/// Drop temporaries that never received a color. Running it twice is a no-op.
///
/// Every variable the method defines is a graph node and gets colored, so
/// temporaries produced by lowering always survive. Only table entries that
/// no instruction defines or reads are removed here.
pub fn cleanup_dead_temps(method: &mut Method, assignment: &RegisterAssignment) {
    method.var_table.retain(|name, _| {
        let keep = !is_temp_name(name) || assignment.contains(name);
        if !keep {
            debug!("removed dead temporary '{name}'");
        }
        keep
    });
}
