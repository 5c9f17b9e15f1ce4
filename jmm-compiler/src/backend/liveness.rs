//! Liveness analysis over a method's instruction list.
//!
//! Backward dataflow on the method's CFG, iterated to a fixed point:
//!
//! ```text
//! out[n] = ∪ in[s]            for s in succ(n)
//! in[n]  = use[n] ∪ (out[n] − def[n])
//! ```
//!
//! Only names present in the method's variable table take part.

use crate::ir::{Instr, Method, Operand, VarTable};
use log::trace;
use std::collections::BTreeSet;

pub type VarSet = BTreeSet<String>;

/// Per-instruction liveness sets for one method.
#[derive(Debug, Clone, Default)]
pub struct LivenessInfo {
    defs: Vec<Option<String>>,
    uses: Vec<VarSet>,
    live_in: Vec<VarSet>,
    live_out: Vec<VarSet>,
    iterations: usize,
}

impl LivenessInfo {
    pub fn len(&self) -> usize {
        self.live_in.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live_in.is_empty()
    }

    pub fn live_in(&self, idx: usize) -> &VarSet {
        &self.live_in[idx]
    }

    pub fn live_out(&self, idx: usize) -> &VarSet {
        &self.live_out[idx]
    }

    pub fn def(&self, idx: usize) -> Option<&str> {
        self.defs[idx].as_deref()
    }

    pub fn uses(&self, idx: usize) -> &VarSet {
        &self.uses[idx]
    }

    /// Number of full backward passes until convergence (the last one changes nothing).
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

// ── Instruction-level use/def extraction ────────────────────────────────

fn add_operand(op: &Operand, vars: &VarTable, out: &mut VarSet) {
    if let Some(name) = op.name() {
        if vars.contains_key(name) {
            out.insert(name.to_string());
        }
    }
}

/// Variables read by an instruction, including its nested right-hand side.
pub fn uses_of(instr: &Instr, vars: &VarTable) -> VarSet {
    let mut out = VarSet::new();
    collect_uses(instr, vars, &mut out);
    out
}

fn collect_uses(instr: &Instr, vars: &VarTable, out: &mut VarSet) {
    match instr {
        Instr::Assign { rhs, .. } => collect_uses(rhs, vars, out),
        Instr::SingleOp { operand } => add_operand(operand, vars, out),
        Instr::BinaryOp { left, right, .. } => {
            add_operand(left, vars, out);
            add_operand(right, vars, out);
        }
        Instr::Return { value, .. } => {
            if let Some(v) = value {
                add_operand(v, vars, out);
            }
        }
        Instr::Call { target, args, .. } => {
            add_operand(target, vars, out);
            for a in args {
                add_operand(a, vars, out);
            }
        }
        Instr::NewObject { .. } => {}
        Instr::NewArray { size, .. } => add_operand(size, vars, out),
        Instr::ArrayLoad { array, index, .. } => {
            add_operand(array, vars, out);
            add_operand(index, vars, out);
        }
        Instr::ArrayLength { array, .. } => add_operand(array, vars, out),
        Instr::GetField { object, .. } => add_operand(object, vars, out),
        Instr::PutField { object, value, .. } => {
            add_operand(object, vars, out);
            add_operand(value, vars, out);
        }
    }
}

/// The variable written by an instruction, if any.
pub fn def_of(instr: &Instr, vars: &VarTable) -> Option<String> {
    match instr {
        Instr::Assign { dest, .. } => dest
            .name()
            .filter(|name| vars.contains_key(*name))
            .map(str::to_string),
        _ => None,
    }
}

// ── Core dataflow analysis ──────────────────────────────────────────────

/// Compute live-in/live-out sets for every instruction of `method`.
pub fn analyze(method: &Method) -> LivenessInfo {
    let vars = &method.var_table;
    let n = method.instrs.len();

    let defs: Vec<Option<String>> = method.instrs.iter().map(|i| def_of(i, vars)).collect();
    let uses: Vec<VarSet> = method.instrs.iter().map(|i| uses_of(i, vars)).collect();
    let mut live_in = vec![VarSet::new(); n];
    let mut live_out = vec![VarSet::new(); n];

    let mut iterations = 0;
    let mut changed = true;
    while changed {
        changed = false;
        iterations += 1;

        for idx in (0..n).rev() {
            let mut out = VarSet::new();
            for &succ in method.cfg.successors(idx) {
                if let Some(succ_in) = live_in.get(succ) {
                    out.extend(succ_in.iter().cloned());
                }
            }

            let mut inn = uses[idx].clone();
            inn.extend(
                out.iter()
                    .filter(|v| defs[idx].as_deref() != Some(v.as_str()))
                    .cloned(),
            );

            if out != live_out[idx] || inn != live_in[idx] {
                live_out[idx] = out;
                live_in[idx] = inn;
                changed = true;
            }
        }
    }

    trace!(
        "liveness for '{}' converged after {iterations} pass(es)",
        method.name
    );

    LivenessInfo {
        defs,
        uses,
        live_in,
        live_out,
        iterations,
    }
}
