//! Typed JVM instructions as they appear in Jasmin text.
//!
//! Every instruction knows its net effect on the operand stack, so the
//! emitter can keep the running stack counter without re-deriving it from
//! mnemonics.

use crate::ir::CallKind;
use std::fmt;

// ============================================================================
// Slot kinds
// ============================================================================

/// Prefix of load/store/return instructions: `i` for int and boolean
/// values, `a` for references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Int,
    Ref,
}

impl SlotKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            SlotKind::Int => "i",
            SlotKind::Ref => "a",
        }
    }
}

// ============================================================================
// Instructions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JvmInstr {
    Load { kind: SlotKind, slot: usize },
    Store { kind: SlotKind, slot: usize },
    /// Integer constant; the mnemonic is picked by value range.
    Const(i32),
    IAdd,
    ISub,
    IMul,
    IDiv,
    IAnd,
    IOr,
    IfICmpLt(String),
    Goto(String),
    Label(String),
    New(String),
    /// `newarray int|boolean`
    NewArray(&'static str),
    ANewArray(String),
    GetField {
        owner: String,
        name: String,
        desc: String,
    },
    PutField {
        owner: String,
        name: String,
        desc: String,
    },
    Invoke {
        kind: CallKind,
        owner: String,
        name: String,
        desc: String,
        /// Number of declared arguments (receiver excluded).
        arg_count: usize,
        returns_value: bool,
    },
    Pop,
    Return(Option<SlotKind>),
}

impl JvmInstr {
    /// Net change of the operand-stack depth after executing this instruction.
    pub fn stack_effect(&self) -> i32 {
        match self {
            JvmInstr::Load { .. } | JvmInstr::Const(_) | JvmInstr::New(_) => 1,
            JvmInstr::Store { .. } | JvmInstr::Pop => -1,
            JvmInstr::IAdd
            | JvmInstr::ISub
            | JvmInstr::IMul
            | JvmInstr::IDiv
            | JvmInstr::IAnd
            | JvmInstr::IOr => -1,
            JvmInstr::IfICmpLt(_) => -2,
            JvmInstr::Goto(_) | JvmInstr::Label(_) => 0,
            JvmInstr::NewArray(_) | JvmInstr::ANewArray(_) => 0,
            JvmInstr::GetField { .. } => 0,
            JvmInstr::PutField { .. } => -2,
            JvmInstr::Invoke {
                kind,
                arg_count,
                returns_value,
                ..
            } => {
                let receiver = i32::from(*kind != CallKind::Static);
                let popped = *arg_count as i32 + receiver;
                i32::from(*returns_value) - popped
            }
            JvmInstr::Return(Some(_)) => -1,
            JvmInstr::Return(None) => 0,
        }
    }
}

fn slot_suffix(slot: usize) -> String {
    if slot <= 3 {
        format!("_{slot}")
    } else {
        format!(" {slot}")
    }
}

impl fmt::Display for JvmInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JvmInstr::Load { kind, slot } => {
                write!(f, "{}load{}", kind.prefix(), slot_suffix(*slot))
            }
            JvmInstr::Store { kind, slot } => {
                write!(f, "{}store{}", kind.prefix(), slot_suffix(*slot))
            }
            JvmInstr::Const(v) => match *v {
                -1 => write!(f, "iconst_m1"),
                0..=5 => write!(f, "iconst_{v}"),
                -128..=127 => write!(f, "bipush {v}"),
                -32768..=32767 => write!(f, "sipush {v}"),
                _ => write!(f, "ldc {v}"),
            },
            JvmInstr::IAdd => write!(f, "iadd"),
            JvmInstr::ISub => write!(f, "isub"),
            JvmInstr::IMul => write!(f, "imul"),
            JvmInstr::IDiv => write!(f, "idiv"),
            JvmInstr::IAnd => write!(f, "iand"),
            JvmInstr::IOr => write!(f, "ior"),
            JvmInstr::IfICmpLt(label) => write!(f, "if_icmplt {label}"),
            JvmInstr::Goto(label) => write!(f, "goto {label}"),
            JvmInstr::Label(label) => write!(f, "{label}:"),
            JvmInstr::New(class) => write!(f, "new {class}"),
            JvmInstr::NewArray(elem) => write!(f, "newarray {elem}"),
            JvmInstr::ANewArray(class) => write!(f, "anewarray {class}"),
            JvmInstr::GetField { owner, name, desc } => {
                write!(f, "getfield {owner}/{name} {desc}")
            }
            JvmInstr::PutField { owner, name, desc } => {
                write!(f, "putfield {owner}/{name} {desc}")
            }
            JvmInstr::Invoke {
                kind,
                owner,
                name,
                desc,
                ..
            } => write!(f, "{kind} {owner}/{name}{desc}"),
            JvmInstr::Pop => write!(f, "pop"),
            JvmInstr::Return(Some(kind)) => write!(f, "{}return", kind.prefix()),
            JvmInstr::Return(None) => write!(f, "return"),
        }
    }
}
