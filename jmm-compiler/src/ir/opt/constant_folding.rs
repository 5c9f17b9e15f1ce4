use super::AstPass;
use crate::ir::ast::{BinOp, Expr, Program, Stmt};
use crate::ir::symbol_table::SymbolTable;
use log::debug;

/// Folds binary operations whose operands are both literals.
pub struct ConstantFolder;

impl AstPass for ConstantFolder {
    fn name(&self) -> &'static str {
        "constant-folding"
    }

    fn run(&mut self, mut program: Program, _table: &SymbolTable) -> (Program, bool) {
        let mut changed = false;
        for method in &mut program.class.methods {
            let body = std::mem::take(&mut method.body);
            method.body = body
                .into_iter()
                .map(|s| fold_stmt(s, &mut changed))
                .collect();
        }
        (program, changed)
    }
}

fn fold_stmt(s: Stmt, changed: &mut bool) -> Stmt {
    match s {
        Stmt::Assign { name, ty, value } => Stmt::Assign {
            name,
            ty,
            value: fold_expr(value, changed),
        },
        Stmt::Expr { expr } => Stmt::Expr {
            expr: fold_expr(expr, changed),
        },
        Stmt::Return { value } => Stmt::Return {
            value: value.map(|v| fold_expr(v, changed)),
        },
    }
}

pub fn fold_expr(e: Expr, changed: &mut bool) -> Expr {
    match e {
        Expr::Binary {
            op,
            left,
            right,
            ty,
        } => {
            let left = fold_expr(*left, changed);
            let right = fold_expr(*right, changed);
            match fold_binary(op, &left, &right) {
                Some(folded) => {
                    debug!("folded {left:?} {} {right:?} -> {folded:?}", op.as_str());
                    *changed = true;
                    folded
                }
                None => Expr::binary(op, left, right, ty),
            }
        }
        Expr::MethodCall {
            target,
            name,
            args,
            ty,
        } => Expr::MethodCall {
            target: Box::new(fold_expr(*target, changed)),
            name,
            args: args.into_iter().map(|a| fold_expr(a, changed)).collect(),
            ty,
        },
        Expr::NewArray { size, ty } => Expr::NewArray {
            size: Box::new(fold_expr(*size, changed)),
            ty,
        },
        Expr::ArrayAccess { array, index, ty } => Expr::ArrayAccess {
            array: Box::new(fold_expr(*array, changed)),
            index: Box::new(fold_expr(*index, changed)),
            ty,
        },
        Expr::Length { array, ty } => Expr::Length {
            array: Box::new(fold_expr(*array, changed)),
            ty,
        },
        other => other,
    }
}

fn fold_binary(op: BinOp, left: &Expr, right: &Expr) -> Option<Expr> {
    match (left, right) {
        (Expr::IntLit { value: l }, Expr::IntLit { value: r }) => {
            let (l, r) = (*l, *r);
            match op {
                BinOp::Add => Some(Expr::int(l.wrapping_add(r))),
                BinOp::Sub => Some(Expr::int(l.wrapping_sub(r))),
                BinOp::Mul => Some(Expr::int(l.wrapping_mul(r))),
                BinOp::Div if r != 0 => Some(Expr::int(l.wrapping_div(r))),
                BinOp::Lt => Some(Expr::boolean(l < r)),
                _ => None,
            }
        }
        (Expr::BoolLit { value: l }, Expr::BoolLit { value: r }) => match op {
            BinOp::And => Some(Expr::boolean(*l && *r)),
            BinOp::Or => Some(Expr::boolean(*l || *r)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ast::Type;

    fn fold(e: Expr) -> (Expr, bool) {
        let mut changed = false;
        let out = fold_expr(e, &mut changed);
        (out, changed)
    }

    #[test]
    fn folds_nested_arithmetic() {
        // (2 + 3) * 4
        let e = Expr::binary(
            BinOp::Mul,
            Expr::binary(BinOp::Add, Expr::int(2), Expr::int(3), Type::int()),
            Expr::int(4),
            Type::int(),
        );
        assert_eq!(fold(e), (Expr::int(20), true));
    }

    #[test]
    fn division_by_zero_is_left_alone() {
        let e = Expr::binary(BinOp::Div, Expr::int(7), Expr::int(0), Type::int());
        let (out, changed) = fold(e.clone());
        assert!(!changed);
        assert_eq!(out, e);
    }

    #[test]
    fn arithmetic_wraps() {
        let e = Expr::binary(BinOp::Add, Expr::int(i32::MAX), Expr::int(1), Type::int());
        assert_eq!(fold(e).0, Expr::int(i32::MIN));
    }

    #[test]
    fn folds_comparison_and_logic() {
        let lt = Expr::binary(BinOp::Lt, Expr::int(1), Expr::int(2), Type::boolean());
        assert_eq!(fold(lt).0, Expr::boolean(true));

        let and = Expr::binary(
            BinOp::And,
            Expr::boolean(true),
            Expr::boolean(false),
            Type::boolean(),
        );
        assert_eq!(fold(and).0, Expr::boolean(false));
    }

    #[test]
    fn variables_block_folding() {
        let e = Expr::binary(
            BinOp::Add,
            Expr::var("a", Type::int()),
            Expr::int(1),
            Type::int(),
        );
        assert!(!fold(e).1);
    }
}
