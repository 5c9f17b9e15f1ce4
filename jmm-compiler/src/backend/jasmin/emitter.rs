use super::descriptors::{self, super_path, type_descriptor};
use crate::backend::instruction::{JvmInstr, SlotKind};
use crate::ir::{ClassUnit, IrType, Method, Operand};
use crate::CompileError;
use log::{debug, info};

const TAB: &str = "    ";

/// Operand-stack and local-slot bookkeeping for the method being emitted.
#[derive(Debug, Clone, Default)]
pub struct Limits {
    stack: i32,
    max_stack: i32,
    max_local: Option<usize>,
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, effect: i32) {
        self.stack += effect;
        self.max_stack = self.max_stack.max(self.stack);
    }

    pub fn touch_local(&mut self, slot: usize) {
        self.max_local = Some(self.max_local.map_or(slot, |m| m.max(slot)));
    }

    pub fn current(&self) -> i32 {
        self.stack
    }

    pub fn max_stack(&self) -> i32 {
        self.max_stack
    }

    /// Highest touched slot + 1, never below `reserved`.
    pub fn max_locals(&self, reserved: usize) -> usize {
        self.max_local.map_or(0, |m| m + 1).max(reserved)
    }
}

/// Jasmin emission state for one class unit.
pub struct Codegen<'a> {
    pub unit: &'a ClassUnit,
    pub out: Vec<String>,
    /// Method being emitted, with its limits; recreated per method.
    pub method: Option<&'a Method>,
    pub body: Vec<JvmInstr>,
    pub limits: Limits,
    pub label_count: usize,
}

impl<'a> Codegen<'a> {
    pub fn new(unit: &'a ClassUnit) -> Self {
        Self {
            unit,
            out: Vec::new(),
            method: None,
            body: Vec::new(),
            limits: Limits::new(),
            label_count: 0,
        }
    }

    pub fn finish(self) -> String {
        let mut text = self.out.join("\n");
        text.push('\n');
        text
    }

    pub fn emit(&mut self, instr: JvmInstr) {
        self.limits.apply(instr.stack_effect());
        if let JvmInstr::Load { slot, .. } | JvmInstr::Store { slot, .. } = instr {
            self.limits.touch_local(slot);
        }
        self.body.push(instr);
    }

    /// Correct the running counter where the linear text over-counts,
    /// e.g. after a `goto` that skips a push on the other path.
    pub fn adjust_stack(&mut self, delta: i32) {
        self.limits.apply(delta);
    }

    pub fn new_label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}_{}", self.label_count);
        self.label_count += 1;
        label
    }

    pub fn current_method(&self) -> Result<&'a Method, CompileError> {
        self.method
            .ok_or_else(|| CompileError::MalformedIr("instruction outside of a method".into()))
    }

    pub fn slot_kind(ty: &IrType) -> SlotKind {
        if ty.is_reference() {
            SlotKind::Ref
        } else {
            SlotKind::Int
        }
    }

    /// Slot of a variable operand, from the method's variable table.
    pub fn slot_of(&self, op: &Operand) -> Result<usize, CompileError> {
        let method = self.current_method()?;
        let name = op.name().ok_or_else(|| {
            CompileError::MalformedIr(format!("expected a variable, found literal {op}"))
        })?;
        method
            .var_table
            .get(name)
            .map(|d| d.slot)
            .ok_or_else(|| {
                CompileError::MalformedIr(format!(
                    "variable '{name}' missing from the variable table of '{}'",
                    method.name
                ))
            })
    }

    // ── Class layout ────────────────────────────────────────────────────

    pub fn emit_class(&mut self) -> Result<(), CompileError> {
        let unit = self.unit;
        let super_class = super_path(unit);

        self.out.push(format!(".class {}", unit.name));
        self.out.push(format!(".super {super_class}"));
        self.out.push(String::new());

        for field in &unit.fields {
            self.out.push(format!(
                ".field {}'{}' {}",
                field.visibility.modifier(),
                field.name,
                type_descriptor(&field.ty, unit)
            ));
        }

        self.out.push(";default constructor".to_string());
        self.out.push(".method public <init>()V".to_string());
        self.out.push(format!("{TAB}aload_0"));
        self.out.push(format!("{TAB}invokespecial {super_class}/<init>()V"));
        self.out.push(format!("{TAB}return"));
        self.out.push(".end method".to_string());

        for method in &unit.methods {
            self.out.push(String::new());
            self.emit_method(method)?;
        }
        Ok(())
    }

    pub fn emit_method(&mut self, method: &'a Method) -> Result<(), CompileError> {
        self.method = Some(method);
        self.limits = Limits::new();
        self.body.clear();

        for instr in &method.instrs {
            self.emit_instr(instr)?;
        }

        let params = method.params.iter().map(Operand::ty);
        let desc = descriptors::method_descriptor(params, &method.return_type, self.unit);
        let modifiers = format!(
            "{}{}",
            method.visibility.modifier(),
            if method.is_static { "static " } else { "" }
        );
        let max_locals = self.limits.max_locals(method.base_slot());

        self.out
            .push(format!(".method {modifiers}{}{desc}", method.name));
        self.out
            .push(format!("{TAB}.limit stack {}", self.limits.max_stack()));
        self.out.push(format!("{TAB}.limit locals {max_locals}"));
        for instr in self.body.drain(..) {
            match instr {
                JvmInstr::Label(_) => self.out.push(instr.to_string()),
                _ => self.out.push(format!("{TAB}{instr}")),
            }
        }
        self.out.push(".end method".to_string());

        if self.limits.current() != 0 {
            debug!(
                "'{}' ends with {} value(s) left on the stack",
                method.name,
                self.limits.current()
            );
        }
        info!(
            "emitted method '{}': stack {}, locals {max_locals}",
            method.name,
            self.limits.max_stack()
        );

        self.method = None;
        Ok(())
    }
}
