use super::context::Gen;
use crate::ir::ast::{self, Expr};
use crate::ir::*;
use crate::CompileError;

impl Gen<'_> {
    /// Lower an expression to an operand, emitting whatever instructions are
    /// needed to materialize it. Children are evaluated left to right first.
    pub fn lower_expr(&mut self, e: &Expr) -> Result<Operand, CompileError> {
        match e {
            Expr::IntLit { value } => Ok(Operand::int(*value)),
            Expr::BoolLit { value } => Ok(Operand::boolean(*value)),
            Expr::This { .. } => Ok(Operand::this(self.class_name())),
            Expr::VarRef { name, ty } => self.lower_var(name, ty),

            Expr::Binary {
                op,
                left,
                right,
                ty,
            } => {
                let l = self.lower_expr(left)?;
                let r = self.lower_expr(right)?;
                let ty = IrType::from_ast(ty);
                let tmp = self.new_temp(ty.clone());
                self.emit(Instr::assign(
                    tmp.clone(),
                    Instr::BinaryOp {
                        op: BinaryOp::from_ast(*op),
                        left: l,
                        right: r,
                        ty,
                    },
                ));
                Ok(tmp)
            }

            Expr::MethodCall {
                target,
                name,
                args,
                ty,
            } => {
                let call = self.lower_call(target, name, args, ty, true)?;
                let ret = match &call {
                    Instr::Call { ret, .. } => ret.clone(),
                    _ => IrType::Void,
                };
                if ret.is_void() {
                    return Err(CompileError::MalformedIr(format!(
                        "void call to '{name}' used as a value in '{}'",
                        self.method_name()
                    )));
                }
                let tmp = self.new_temp(ret);
                self.emit(Instr::assign(tmp.clone(), call));
                Ok(tmp)
            }

            Expr::NewObject { class_name, .. } => {
                let ty = IrType::Class(class_name.clone());
                let tmp = self.new_temp(ty.clone());
                self.emit(Instr::assign(
                    tmp.clone(),
                    Instr::NewObject {
                        class_name: class_name.clone(),
                        ty,
                    },
                ));
                self.emit_init(tmp.clone());
                Ok(tmp)
            }

            Expr::NewArray { size, ty } => {
                let size = self.lower_expr(size)?;
                let ty = IrType::from_ast(ty);
                let tmp = self.new_temp(ty.clone());
                self.emit(Instr::assign(tmp.clone(), Instr::NewArray { size, ty }));
                Ok(tmp)
            }

            Expr::ArrayAccess { array, index, ty } => {
                let array = self.lower_expr(array)?;
                let index = self.lower_expr(index)?;
                let ty = IrType::from_ast(ty);
                let tmp = self.new_temp(ty.clone());
                self.emit(Instr::assign(tmp.clone(), Instr::ArrayLoad { array, index, ty }));
                Ok(tmp)
            }

            Expr::Length { array, ty } => {
                let array = self.lower_expr(array)?;
                let ty = IrType::from_ast(ty);
                let tmp = self.new_temp(ty.clone());
                self.emit(Instr::assign(tmp.clone(), Instr::ArrayLength { array, ty }));
                Ok(tmp)
            }
        }
    }

    /// Lower the right-hand side of an assignment to a local. Binary operations,
    /// calls and allocations stay inline instead of going through a temporary.
    pub fn lower_rhs(&mut self, e: &Expr) -> Result<Instr, CompileError> {
        match e {
            Expr::Binary {
                op,
                left,
                right,
                ty,
            } => {
                let l = self.lower_expr(left)?;
                let r = self.lower_expr(right)?;
                Ok(Instr::BinaryOp {
                    op: BinaryOp::from_ast(*op),
                    left: l,
                    right: r,
                    ty: IrType::from_ast(ty),
                })
            }
            Expr::MethodCall {
                target,
                name,
                args,
                ty,
            } => self.lower_call(target, name, args, ty, true),
            Expr::NewObject { class_name, .. } => Ok(Instr::NewObject {
                class_name: class_name.clone(),
                ty: IrType::Class(class_name.clone()),
            }),
            Expr::NewArray { size, ty } => {
                let size = self.lower_expr(size)?;
                Ok(Instr::NewArray {
                    size,
                    ty: IrType::from_ast(ty),
                })
            }
            other => Ok(Instr::SingleOp {
                operand: self.lower_expr(other)?,
            }),
        }
    }

    /// Build (but do not emit) a call instruction. `value_ctx` is true when
    /// the result is consumed.
    pub fn lower_call(
        &mut self,
        target: &Expr,
        name: &str,
        args: &[Expr],
        ty: &ast::Type,
        value_ctx: bool,
    ) -> Result<Instr, CompileError> {
        let kind = self.call_kind(target, name);
        let target_op = match (kind, target) {
            (CallKind::Static, Expr::VarRef { name, .. }) => Operand::class_ref(name.clone()),
            _ => self.lower_expr(target)?,
        };

        // Nested imported calls still resolve against the enclosing assignment.
        let args = args
            .iter()
            .map(|a| self.lower_expr(a))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Instr::Call {
            kind,
            target: target_op,
            method: name.to_string(),
            args,
            ret: self.call_return_type(ty, value_ctx),
        })
    }

    fn call_kind(&self, target: &Expr, method: &str) -> CallKind {
        if method == "<init>" {
            return CallKind::Special;
        }
        if let Expr::VarRef { name, ty } = target {
            let shadowed = self.is_field(name)
                || self
                    .method
                    .as_ref()
                    .is_some_and(|m| m.var_table.contains_key(name.as_str()))
                || self
                    .table
                    .local_variables(self.method_name())
                    .iter()
                    .any(|s| &s.name == name);
            if ty.is_imported() || (!shadowed && self.table.is_imported(name)) {
                return CallKind::Static;
            }
        }
        let recv = target.ty();
        if !recv.is_array && recv.name == self.class_name() && self.table.has_method(method) {
            return CallKind::Special;
        }
        CallKind::Virtual
    }

    /// Unknown (imported) return types take the type of the nearest enclosing
    /// assignment, however deeply the call is nested in it. Without one, a
    /// consumed result is an `int` and a discarded one is void.
    fn call_return_type(&self, ty: &ast::Type, value_ctx: bool) -> IrType {
        if !ty.is_imported() {
            return IrType::from_ast(ty);
        }
        match &self.assign_ty {
            Some(assign) => IrType::from_ast(assign),
            None if value_ctx => IrType::Int,
            None => IrType::Void,
        }
    }

    fn lower_var(&mut self, name: &str, ty: &ast::Type) -> Result<Operand, CompileError> {
        if self.is_field(name) {
            let field_ty = self
                .table
                .field(name)
                .map_or_else(|| IrType::from_ast(ty), |f| IrType::from_ast(&f.ty));
            let tmp = self.new_temp(field_ty.clone());
            let object = Operand::this(self.class_name());
            self.emit(Instr::assign(
                tmp.clone(),
                Instr::GetField {
                    object,
                    field: FieldRef {
                        name: name.to_string(),
                        ty: field_ty,
                    },
                },
            ));
            return Ok(tmp);
        }
        if ty.is_imported() {
            return Ok(Operand::class_ref(name));
        }

        let ty = IrType::from_ast(ty);
        let is_param = self.method.as_ref().is_some_and(|m| m.is_param(name));
        if !is_param {
            self.declare(name, ty.clone(), VarScope::Local);
        }
        Ok(Operand::var(name, ty))
    }

    /// `invokespecial(obj, "<init>").V` after an allocation.
    pub fn emit_init(&mut self, object: Operand) {
        self.emit(Instr::Call {
            kind: CallKind::Special,
            target: object,
            method: "<init>".to_string(),
            args: Vec::new(),
            ret: IrType::Void,
        });
    }
}
