//! Tree optimizations.
//!
//! Passes are pure transformations of the typed tree: each takes the program
//! by value and hands back the rewritten program together with a flag telling
//! whether anything changed. The [`PassManager`] reruns its passes until a full
//! round reports no change.

use crate::ir::ast::Program;
use crate::ir::symbol_table::SymbolTable;
use log::{debug, warn};

pub mod constant_folding;
pub mod constant_propagation;

/// Upper bound on optimization rounds; folding and propagation converge well before it.
const MAX_ROUNDS: usize = 64;

/// A trait for a tree optimization pass.
pub trait AstPass {
    fn name(&self) -> &'static str;
    fn run(&mut self, program: Program, table: &SymbolTable) -> (Program, bool);
}

/// Manages and executes a sequence of tree passes.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn AstPass>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self, pass: Box<dyn AstPass>) {
        self.passes.push(pass);
    }

    /// One round over every pass. Returns whether any pass changed the tree.
    pub fn run_passes(&mut self, mut program: Program, table: &SymbolTable) -> (Program, bool) {
        let mut changed = false;
        for pass in &mut self.passes {
            let (next, pass_changed) = pass.run(program, table);
            if pass_changed {
                debug!("pass '{}' changed the tree", pass.name());
            }
            program = next;
            changed |= pass_changed;
        }
        (program, changed)
    }

    /// Repeat rounds until nothing changes.
    pub fn run_to_fixed_point(&mut self, mut program: Program, table: &SymbolTable) -> Program {
        for round in 1..=MAX_ROUNDS {
            let (next, changed) = self.run_passes(program, table);
            program = next;
            if !changed {
                debug!("optimizer converged after {round} round(s)");
                return program;
            }
        }
        warn!("optimizer stopped after {MAX_ROUNDS} rounds without converging");
        program
    }
}

/// Constant propagation followed by constant folding, to a fixed point.
pub fn optimize(program: Program, table: &SymbolTable) -> Program {
    let mut pm = PassManager::new();
    pm.add_pass(Box::new(constant_propagation::ConstantPropagator));
    pm.add_pass(Box::new(constant_folding::ConstantFolder));
    pm.run_to_fixed_point(program, table)
}
