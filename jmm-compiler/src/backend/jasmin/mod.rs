//! Jasmin code generation.
//!
//! Lowers an IR class unit into Jasmin assembly, computing `.limit stack`
//! from a running operand-stack counter and `.limit locals` from the
//! highest slot touched.

pub mod descriptors;
pub mod emitter;
pub mod instr_lowering;

/// Codegen orchestrates the emission of Jasmin text from IR.
pub use emitter::{Codegen, Limits};

use crate::ir::ClassUnit;
use crate::CompileError;

/// Emit the Jasmin text of a whole class unit.
pub fn generate(unit: &ClassUnit) -> Result<String, CompileError> {
    let mut cg = Codegen::new(unit);
    cg.emit_class()?;
    Ok(cg.finish())
}
