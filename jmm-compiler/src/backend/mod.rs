//! JVM backend: register allocation and Jasmin emission.
//!
//! Module layout:
//! - `instruction`: typed JVM instructions with their stack effects
//! - `liveness`: dataflow-based liveness analysis
//! - `interference`: interference graph from liveness results
//! - `regalloc`: graph-coloring register allocation
//! - `jasmin`: code generation driver (IR → Jasmin)

pub mod instruction;
pub mod interference;
pub mod jasmin;
pub mod liveness;
pub mod regalloc;

pub use interference::InterferenceGraph;
pub use liveness::LivenessInfo;
pub use regalloc::RegisterAssignment;

use crate::ir::ClassUnit;
use crate::CompileError;

/// Run register allocation on every method with budget `k` (0 skips it).
pub fn allocate_registers(unit: &mut ClassUnit, k: usize) -> Result<(), CompileError> {
    for method in &mut unit.methods {
        regalloc::allocate(method, k)?;
    }
    Ok(())
}

/// Allocate registers (when `k > 0`) and emit Jasmin text.
pub fn compile_ir_to_jasmin(unit: &mut ClassUnit, k: usize) -> Result<String, CompileError> {
    allocate_registers(unit, k)?;
    jasmin::generate(unit)
}
