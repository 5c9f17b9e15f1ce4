use super::descriptors::{class_path, type_descriptor, STRING};
use super::emitter::Codegen;
use crate::backend::instruction::JvmInstr;
use crate::ir::{BinaryOp, CallKind, FieldRef, Instr, IrType, Operand};
use crate::CompileError;

impl Codegen<'_> {
    /// Lower one top-level IR instruction.
    pub fn emit_instr(&mut self, instr: &Instr) -> Result<(), CompileError> {
        match instr {
            Instr::Assign { dest, rhs, .. } => {
                self.push_value(rhs)?;
                self.store(dest)
            }
            Instr::Call {
                kind,
                target,
                method,
                args,
                ret,
            } => {
                self.push_call(*kind, target, method, args, ret)?;
                if !ret.is_void() {
                    self.emit(JvmInstr::Pop);
                }
                Ok(())
            }
            Instr::PutField {
                object,
                field,
                value,
            } => {
                self.load(object)?;
                self.push_operand(value)?;
                let (owner, name, desc) = self.field_parts(field);
                self.emit(JvmInstr::PutField { owner, name, desc });
                Ok(())
            }
            Instr::Return { ty, value } => {
                match value {
                    Some(v) => {
                        self.push_operand(v)?;
                        self.emit(JvmInstr::Return(Some(Self::slot_kind(ty))));
                    }
                    None => self.emit(JvmInstr::Return(None)),
                }
                Ok(())
            }
            other => Err(CompileError::Unimplemented(format!(
                "standalone instruction '{other}'"
            ))),
        }
    }

    /// Push the value produced by an assignment's right-hand side.
    fn push_value(&mut self, rhs: &Instr) -> Result<(), CompileError> {
        match rhs {
            Instr::SingleOp { operand } => self.push_operand(operand),
            Instr::BinaryOp {
                op, left, right, ..
            } => self.push_binary(*op, left, right),
            Instr::Call {
                kind,
                target,
                method,
                args,
                ret,
            } => {
                if ret.is_void() {
                    return Err(CompileError::MalformedIr(format!(
                        "void call to '{method}' assigned to a variable"
                    )));
                }
                self.push_call(*kind, target, method, args, ret)
            }
            Instr::NewObject { class_name, .. } => {
                let path = class_path(class_name, self.unit);
                self.emit(JvmInstr::New(path));
                Ok(())
            }
            Instr::NewArray { size, ty } => {
                self.push_operand(size)?;
                let instr = match ty {
                    IrType::Array(elem) => match elem.as_ref() {
                        IrType::Int => JvmInstr::NewArray("int"),
                        IrType::Bool => JvmInstr::NewArray("boolean"),
                        IrType::String => JvmInstr::ANewArray(STRING.to_string()),
                        IrType::Class(name) => JvmInstr::ANewArray(class_path(name, self.unit)),
                        other => {
                            return Err(CompileError::Unimplemented(format!(
                                "array of {other}"
                            )))
                        }
                    },
                    other => {
                        return Err(CompileError::MalformedIr(format!(
                            "new(array) with non-array type {other}"
                        )))
                    }
                };
                self.emit(instr);
                Ok(())
            }
            Instr::ArrayLoad { array, .. } => Err(CompileError::Unimplemented(format!(
                "array access on {array}"
            ))),
            Instr::ArrayLength { array, .. } => Err(CompileError::Unimplemented(format!(
                "array length of {array}"
            ))),
            Instr::GetField { object, field } => {
                self.load(object)?;
                let (owner, name, desc) = self.field_parts(field);
                self.emit(JvmInstr::GetField { owner, name, desc });
                Ok(())
            }
            other => Err(CompileError::MalformedIr(format!(
                "'{other}' cannot be the right-hand side of an assignment"
            ))),
        }
    }

    fn push_binary(
        &mut self,
        op: BinaryOp,
        left: &Operand,
        right: &Operand,
    ) -> Result<(), CompileError> {
        self.push_operand(left)?;
        self.push_operand(right)?;
        let arith = match op {
            BinaryOp::Add => JvmInstr::IAdd,
            BinaryOp::Sub => JvmInstr::ISub,
            BinaryOp::Mul => JvmInstr::IMul,
            BinaryOp::Div => JvmInstr::IDiv,
            BinaryOp::And => JvmInstr::IAnd,
            BinaryOp::Or => JvmInstr::IOr,
            BinaryOp::Lt => {
                let on_true = self.new_label("cmp_true");
                let end = self.new_label("cmp_end");
                self.emit(JvmInstr::IfICmpLt(on_true.clone()));
                self.emit(JvmInstr::Const(0));
                self.emit(JvmInstr::Goto(end.clone()));
                // The 0 pushed above is not on the stack at `on_true`.
                self.adjust_stack(-1);
                self.emit(JvmInstr::Label(on_true));
                self.emit(JvmInstr::Const(1));
                self.emit(JvmInstr::Label(end));
                return Ok(());
            }
        };
        self.emit(arith);
        Ok(())
    }

    fn push_call(
        &mut self,
        kind: CallKind,
        target: &Operand,
        method: &str,
        args: &[Operand],
        ret: &IrType,
    ) -> Result<(), CompileError> {
        let owner = self.call_owner(kind, target)?;
        if kind != CallKind::Static {
            self.load(target)?;
        }
        for a in args {
            self.push_operand(a)?;
        }

        let params: String = args
            .iter()
            .map(|a| type_descriptor(a.ty(), self.unit))
            .collect();
        let desc = format!("({params}){}", type_descriptor(ret, self.unit));
        self.emit(JvmInstr::Invoke {
            kind,
            owner,
            name: method.to_string(),
            desc,
            arg_count: args.len(),
            returns_value: !ret.is_void(),
        });
        Ok(())
    }

    fn call_owner(&self, kind: CallKind, target: &Operand) -> Result<String, CompileError> {
        if kind == CallKind::Static {
            let name = target.name().ok_or_else(|| {
                CompileError::MalformedIr(format!("static call on literal {target}"))
            })?;
            return Ok(class_path(name, self.unit));
        }
        match target.ty() {
            IrType::Class(name) => Ok(class_path(name, self.unit)),
            IrType::String => Ok(STRING.to_string()),
            other => Err(CompileError::MalformedIr(format!(
                "call receiver {target} has non-class type {other}"
            ))),
        }
    }

    fn field_parts(&self, field: &FieldRef) -> (String, String, String) {
        (
            self.unit.name.clone(),
            field.name.clone(),
            type_descriptor(&field.ty, self.unit),
        )
    }

    pub fn push_operand(&mut self, op: &Operand) -> Result<(), CompileError> {
        match op {
            Operand::Literal { value, .. } => {
                self.emit(JvmInstr::Const(*value));
                Ok(())
            }
            Operand::Variable { .. } => self.load(op),
        }
    }

    pub fn load(&mut self, op: &Operand) -> Result<(), CompileError> {
        let slot = self.slot_of(op)?;
        self.emit(JvmInstr::Load {
            kind: Self::slot_kind(op.ty()),
            slot,
        });
        Ok(())
    }

    fn store(&mut self, dest: &Operand) -> Result<(), CompileError> {
        if dest.is_literal() {
            return Err(CompileError::MalformedIr(format!(
                "assignment destination {dest} is not a simple variable"
            )));
        }
        let slot = self.slot_of(dest)?;
        self.emit(JvmInstr::Store {
            kind: Self::slot_kind(dest.ty()),
            slot,
        });
        Ok(())
    }
}
