//! Intermediate Representation (IR) module.
//!
//! This module contains the typed input tree and symbol table, the IR
//! definitions and CFG, the tree-to-IR generator, and the tree optimizer.

pub mod ast;
pub mod cfg;
pub mod ir;
pub use ir::*;
pub mod ir_generator;
pub mod opt;
pub mod symbol_table;
