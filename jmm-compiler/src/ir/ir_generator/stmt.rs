use super::context::Gen;
use crate::ir::ast::{Expr, MethodDecl, Program, Stmt};
use crate::ir::*;
use crate::CompileError;
use log::{debug, info};

impl Gen<'_> {
    pub fn lower_program(&mut self, p: &Program) -> Result<(), CompileError> {
        for decl in &p.class.methods {
            let method = self.lower_method(decl)?;
            self.out.methods.push(method);
        }
        Ok(())
    }

    pub fn lower_method(&mut self, decl: &MethodDecl) -> Result<Method, CompileError> {
        let mut method = Method::new(
            &decl.name,
            decl.is_static,
            IrType::from_ast(&decl.return_type),
        );
        method.visibility = if decl.is_public {
            Visibility::Public
        } else {
            Visibility::Default
        };

        let receiver = usize::from(!decl.is_static);
        if !decl.is_static {
            method.var_table.insert(
                "this".to_string(),
                VarDescriptor {
                    ty: IrType::Class(self.class_name().to_string()),
                    scope: VarScope::This,
                    slot: 0,
                },
            );
        }
        for (i, p) in decl.params.iter().enumerate() {
            let ty = IrType::from_ast(&p.ty);
            method.params.push(Operand::var(p.name.clone(), ty.clone()));
            method.var_table.insert(
                p.name.clone(),
                VarDescriptor {
                    ty,
                    scope: VarScope::Param,
                    slot: receiver + i,
                },
            );
        }

        self.method = Some(method);
        let lowered = decl.body.iter().try_for_each(|s| self.lower_stmt(s));
        let Some(mut method) = self.method.take() else {
            return Err(CompileError::MalformedIr(format!(
                "lost method context while lowering '{}'",
                decl.name
            )));
        };
        lowered?;

        let ends_in_return = matches!(method.instrs.last(), Some(Instr::Return { .. }));
        if method.return_type.is_void() && !ends_in_return {
            method.instrs.push(Instr::Return {
                ty: IrType::Void,
                value: None,
            });
        }
        method.build_cfg();

        info!(
            "lowered method '{}': {} instructions, {} variables",
            method.name,
            method.instrs.len(),
            method.var_table.len()
        );
        Ok(method)
    }

    pub fn lower_stmt(&mut self, s: &Stmt) -> Result<(), CompileError> {
        match s {
            Stmt::Assign { name, ty, value } => {
                if self.is_field(name) {
                    let value = self.with_assign_type(Some(ty.clone()), |this| this.lower_expr(value))?;
                    let field_ty = self
                        .table
                        .field(name)
                        .map_or_else(|| IrType::from_ast(ty), |f| IrType::from_ast(&f.ty));
                    debug!("field write '{name}' in '{}'", self.method_name());
                    self.emit(Instr::PutField {
                        object: Operand::this(self.class_name()),
                        field: FieldRef {
                            name: name.clone(),
                            ty: field_ty,
                        },
                        value,
                    });
                    return Ok(());
                }

                let rhs = self.with_assign_type(Some(ty.clone()), |this| this.lower_rhs(value))?;
                let ir_ty = IrType::from_ast(ty);
                let scope = if self.method.as_ref().is_some_and(|m| m.is_param(name)) {
                    VarScope::Param
                } else {
                    VarScope::Local
                };
                self.declare(name, ir_ty.clone(), scope);
                let dest = Operand::var(name.clone(), ir_ty);
                let needs_init = matches!(rhs, Instr::NewObject { .. });
                self.emit(Instr::assign(dest.clone(), rhs));
                if needs_init {
                    self.emit_init(dest);
                }
                Ok(())
            }

            Stmt::Expr { expr } => match expr {
                // Result discarded: a bare call, never a temporary.
                Expr::MethodCall {
                    target,
                    name,
                    args,
                    ty,
                } => {
                    let call = self.lower_call(target, name, args, ty, false)?;
                    self.emit(call);
                    Ok(())
                }
                other => self.lower_expr(other).map(|_| ()),
            },

            Stmt::Return { value } => {
                let ty = self
                    .method
                    .as_ref()
                    .map_or(IrType::Void, |m| m.return_type.clone());
                let value = match value {
                    Some(v) => Some(self.lower_expr(v)?),
                    None => None,
                };
                self.emit(Instr::Return { ty, value });
                Ok(())
            }
        }
    }
}
