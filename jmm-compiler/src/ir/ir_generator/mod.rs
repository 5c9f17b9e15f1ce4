//! Typed tree to IR lowering.
//!
//! Every non-trivial sub-expression is materialized into a fresh `tmp<N>`
//! temporary; assignment right-hand sides stay inline.

pub mod context;
pub mod expr;
pub mod stmt;

use crate::ir::ast::Program;
use crate::ir::symbol_table::SymbolTable;
use crate::ir::ClassUnit;
use crate::CompileError;

pub use context::Gen;

/// Lower a typed program to an IR class unit.
pub fn lower(program: &Program, table: &SymbolTable) -> Result<ClassUnit, CompileError> {
    let mut g = Gen::new(table);
    g.lower_program(program)?;
    Ok(g.finish())
}
