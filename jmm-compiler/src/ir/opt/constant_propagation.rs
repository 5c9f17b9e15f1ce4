use super::AstPass;
use crate::ir::ast::{Expr, MethodDecl, Program, Stmt};
use crate::ir::symbol_table::SymbolTable;
use log::debug;
use std::collections::HashMap;

/// Replaces reads of locals holding a known literal with that literal.
///
/// Method bodies are straight-line, so a single forward walk per method is
/// exact: a literal assignment records the value, any other assignment to the
/// same name forgets it. Fields are never tracked since calls may write them.
pub struct ConstantPropagator;

impl AstPass for ConstantPropagator {
    fn name(&self) -> &'static str {
        "constant-propagation"
    }

    fn run(&mut self, mut program: Program, table: &SymbolTable) -> (Program, bool) {
        let mut changed = false;
        for method in &mut program.class.methods {
            changed |= propagate_method(method, table);
        }
        (program, changed)
    }
}

fn propagate_method(method: &mut MethodDecl, table: &SymbolTable) -> bool {
    let mut known: HashMap<String, Expr> = HashMap::new();
    let mut changed = false;
    let body = std::mem::take(&mut method.body);
    let mut out = Vec::with_capacity(body.len());

    for stmt in body {
        let stmt = match stmt {
            Stmt::Assign { name, ty, value } => {
                let value = substitute(value, &known, &mut changed);
                if table.is_field(&method.name, &name) {
                    known.remove(&name);
                } else if value.is_literal() {
                    debug!("'{}': {name} is constant {value:?}", method.name);
                    known.insert(name.clone(), value.clone());
                } else {
                    known.remove(&name);
                }
                Stmt::Assign { name, ty, value }
            }
            Stmt::Expr { expr } => Stmt::Expr {
                expr: substitute(expr, &known, &mut changed),
            },
            Stmt::Return { value } => Stmt::Return {
                value: value.map(|v| substitute(v, &known, &mut changed)),
            },
        };
        out.push(stmt);
    }

    method.body = out;
    changed
}

fn substitute(e: Expr, known: &HashMap<String, Expr>, changed: &mut bool) -> Expr {
    match e {
        Expr::VarRef { name, ty } => match known.get(&name) {
            Some(lit) => {
                debug!("propagated {name} -> {lit:?}");
                *changed = true;
                lit.clone()
            }
            None => Expr::VarRef { name, ty },
        },
        Expr::Binary {
            op,
            left,
            right,
            ty,
        } => Expr::binary(
            op,
            substitute(*left, known, changed),
            substitute(*right, known, changed),
            ty,
        ),
        Expr::MethodCall {
            target,
            name,
            args,
            ty,
        } => Expr::MethodCall {
            target: Box::new(substitute(*target, known, changed)),
            name,
            args: args
                .into_iter()
                .map(|a| substitute(a, known, changed))
                .collect(),
            ty,
        },
        Expr::NewArray { size, ty } => Expr::NewArray {
            size: Box::new(substitute(*size, known, changed)),
            ty,
        },
        Expr::ArrayAccess { array, index, ty } => Expr::ArrayAccess {
            array: Box::new(substitute(*array, known, changed)),
            index: Box::new(substitute(*index, known, changed)),
            ty,
        },
        Expr::Length { array, ty } => Expr::Length {
            array: Box::new(substitute(*array, known, changed)),
            ty,
        },
        other => other,
    }
}
