//! Index-based control-flow graph over a method's instruction list.

use crate::ir::Instr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cfg {
    succs: Vec<Vec<usize>>,
}

impl Cfg {
    /// Straight-line CFG: each instruction falls through to the next one,
    /// returns end the flow.
    pub fn build(instrs: &[Instr]) -> Self {
        let n = instrs.len();
        let succs = instrs
            .iter()
            .enumerate()
            .map(|(i, instr)| match instr {
                Instr::Return { .. } => Vec::new(),
                _ if i + 1 < n => vec![i + 1],
                _ => Vec::new(),
            })
            .collect();
        Self { succs }
    }

    /// CFG with explicit successor lists (instruction index → successors).
    pub fn from_edges(succs: Vec<Vec<usize>>) -> Self {
        Self { succs }
    }

    pub fn successors(&self, idx: usize) -> &[usize] {
        self.succs.get(idx).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.succs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.succs.is_empty()
    }
}
