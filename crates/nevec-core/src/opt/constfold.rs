//! Constant folding over unary ops, binary ops and concatenation.
//!
//! Only runs when the caller asked for it (`nevec` without `--no-opt`);
//! [`super::table::table_propagation`] always runs regardless, since it is
//! the pass that actually turns table-literal syntax into a single
//! constant rather than a chain of `TABLE_SET`s.

use crate::error::{bug, CoreError};
use crate::ir::{ConstNode, IrNode, Syms, Tac};
use crate::ops::{BinOp, UnOp};
use crate::ty::{StrEncoding, Type};

use super::runner::PassRunner;

pub fn const_fold(syms: &mut Syms, ir: Vec<Tac>) -> Vec<Tac> {
    let mut runner = PassRunner::new(syms);

    for tac in ir {
        match &tac.expr {
            IrNode::UnOp { op, operand, .. } => {
                let (op, operand) = (*op, *operand);

                if !runner.is_propagatable(operand) {
                    runner.emit(tac);
                    continue;
                }

                let value = runner.const_of(operand);
                let result = fold_un_op(op, value);

                runner.syms.get_mut(operand).propagate();

                runner.emit(Tac {
                    sym: tac.sym,
                    expr: IrNode::Const(result),
                    loc: tac.loc,
                    moment: tac.moment,
                });

                runner.elim_if_dead(operand);
            }
            IrNode::BinOp {
                left, op, right, ty,
            } => {
                let (left, op, right, ty) = (*left, *op, *right, ty.clone());

                if !runner.is_propagatable(left) || !runner.is_propagatable(right) {
                    runner.emit(tac);
                    continue;
                }

                let left_val = runner.const_of(left);
                let right_val = runner.const_of(right);
                let result = fold_bin_op(op, left_val, right_val, &ty);

                runner.syms.get_mut(left).propagate();
                runner.syms.get_mut(right).propagate();

                runner.emit(Tac {
                    sym: tac.sym,
                    expr: IrNode::Const(result),
                    loc: tac.loc,
                    moment: tac.moment,
                });

                runner.elim_if_dead(left);
                runner.elim_if_dead(right);
            }
            IrNode::Concat { left, right, .. } => {
                let (left, right) = (*left, *right);

                if !runner.is_propagatable(left) || !runner.is_propagatable(right) {
                    runner.emit(tac);
                    continue;
                }

                let left_val = runner.const_of(left);
                let right_val = runner.const_of(right);
                let result = fold_concat(left_val, right_val);

                runner.syms.get_mut(left).propagate();
                runner.syms.get_mut(right).propagate();

                runner.emit(Tac {
                    sym: tac.sym,
                    expr: IrNode::Const(result),
                    loc: tac.loc,
                    moment: tac.moment,
                });

                runner.elim_if_dead(left);
                runner.elim_if_dead(right);
            }
            _ => runner.emit(tac),
        }
    }

    runner.finish()
}

fn as_int(c: &ConstNode) -> i64 {
    match c {
        ConstNode::Int(v) => *v,
        _ => bug(CoreError::MalformedIr, "expected an integer constant"),
    }
}

fn as_float(c: &ConstNode) -> f64 {
    match c {
        ConstNode::Float(v) => *v,
        _ => bug(CoreError::MalformedIr, "expected a float constant"),
    }
}

fn fold_un_op(op: UnOp, operand: ConstNode) -> ConstNode {
    match op {
        UnOp::Neg => match operand {
            ConstNode::Int(v) => ConstNode::Int(v.wrapping_neg()),
            ConstNode::Float(v) => ConstNode::Float(-v),
            _ => bug(CoreError::MalformedIr, "neg on a non-numeric constant"),
        },
        UnOp::Not => match operand {
            ConstNode::Bool(b) => ConstNode::Bool(!b),
            _ => bug(CoreError::MalformedIr, "not on a non-bool constant"),
        },
        UnOp::IsZero => match operand {
            ConstNode::Int(v) => ConstNode::Bool(v == 0),
            ConstNode::Float(v) => ConstNode::Bool(v == 0.0),
            _ => bug(CoreError::MalformedIr, "iszero on a non-numeric constant"),
        },
        UnOp::IsNil => ConstNode::Bool(matches!(operand, ConstNode::Nil)),
        UnOp::IsNotNil => ConstNode::Bool(!matches!(operand, ConstNode::Nil)),
        UnOp::Show => ConstNode::Str {
            value: show(&operand),
            encoding: StrEncoding::Ascii,
            is_interned: false,
        },
    }
}

/// Renders a constant the way the runtime's `show` builtin would.
fn show(value: &ConstNode) -> String {
    match value {
        ConstNode::Int(v) => {
            let mut buf = itoa::Buffer::new();
            buf.format(*v).to_owned()
        }
        ConstNode::Float(v) => show_float(*v),
        ConstNode::Bool(b) => if *b { "true" } else { "false" }.to_owned(),
        ConstNode::Nil => "nil".to_owned(),
        ConstNode::Str { value, .. } => value.clone(),
        ConstNode::Table { .. } => bug(CoreError::MalformedIr, "show on a table constant"),
    }
}

/// Approximates the source's `"{:.14g}"` formatting: integral floats print
/// without a fractional part, everything else uses Rust's shortest
/// round-trip representation.
fn show_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn fold_bin_op(op: BinOp, left: ConstNode, right: ConstNode, ty: &Type) -> ConstNode {
    if op.is_comparison() {
        fold_comparison(op, left, right)
    } else {
        fold_arith(op, left, right, ty)
    }
}

fn fold_arith(op: BinOp, left: ConstNode, right: ConstNode, ty: &Type) -> ConstNode {
    if op.is_bitwise() {
        let l = as_int(&left);
        let r = as_int(&right);
        let result = match op {
            BinOp::Shl => l.wrapping_shl(r as u32),
            BinOp::Shr => l.wrapping_shr(r as u32),
            BinOp::BitAnd => l & r,
            BinOp::BitXor => l ^ r,
            BinOp::BitOr => l | r,
            _ => unreachable!("guarded by is_bitwise"),
        };
        return ConstNode::Int(result);
    }

    match ty {
        Type::Int => {
            let l = as_int(&left);
            let r = as_int(&right);
            let result = match op {
                BinOp::Add => l.wrapping_add(r),
                BinOp::Sub => l.wrapping_sub(r),
                BinOp::Mul => l.wrapping_mul(r),
                BinOp::Div => {
                    if r == 0 {
                        bug(CoreError::MalformedIr, "constant division by zero");
                    }
                    l.wrapping_div(r)
                }
                _ => bug(CoreError::MalformedIr, "non-arithmetic op reached fold_arith"),
            };
            ConstNode::Int(result)
        }
        Type::Float => {
            let l = as_float(&left);
            let r = as_float(&right);
            let result = match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                _ => bug(CoreError::MalformedIr, "non-arithmetic op reached fold_arith"),
            };
            ConstNode::Float(result)
        }
        _ => bug(CoreError::MalformedIr, "arithmetic fold on a non-numeric result type"),
    }
}

fn fold_comparison(op: BinOp, left: ConstNode, right: ConstNode) -> ConstNode {
    fn ord<T: PartialOrd>(op: BinOp, l: T, r: T) -> bool {
        match op {
            BinOp::Eq => l == r,
            BinOp::Neq => l != r,
            BinOp::Gt => l > r,
            BinOp::Gte => l >= r,
            BinOp::Lt => l < r,
            BinOp::Lte => l <= r,
            _ => bug(CoreError::MalformedIr, "non-comparison op reached fold_comparison"),
        }
    }

    fn eq_only<T: PartialEq>(op: BinOp, l: T, r: T) -> bool {
        match op {
            BinOp::Eq => l == r,
            BinOp::Neq => l != r,
            _ => bug(CoreError::MalformedIr, "ordering comparison on a non-orderable type"),
        }
    }

    let result = match (&left, &right) {
        (ConstNode::Int(l), ConstNode::Int(r)) => ord(op, *l, *r),
        (ConstNode::Float(l), ConstNode::Float(r)) => ord(op, *l, *r),
        (ConstNode::Str { value: l, .. }, ConstNode::Str { value: r, .. }) => ord(op, l, r),
        (ConstNode::Bool(l), ConstNode::Bool(r)) => eq_only(op, *l, *r),
        (ConstNode::Nil, ConstNode::Nil) => eq_only(op, (), ()),
        _ => bug(CoreError::MalformedIr, "comparison fold on mismatched operand kinds"),
    };

    ConstNode::Bool(result)
}

fn fold_concat(left: ConstNode, right: ConstNode) -> ConstNode {
    match (left, right) {
        (
            ConstNode::Str {
                value: l, encoding, ..
            },
            ConstNode::Str { value: r, .. },
        ) => ConstNode::Str {
            value: l + &r,
            encoding,
            is_interned: false,
        },
        _ => bug(CoreError::MalformedIr, "concat fold on non-string constants"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use crate::ir::IrBuilder;
    use crate::loc::Loc;

    fn loc() -> Loc {
        Loc::new(0, 1, 1)
    }

    #[test]
    fn folds_one_plus_two_times_three_to_seven() {
        let expr = Expr::BinOp {
            left: Box::new(Expr::Int { value: 1, loc: loc() }),
            op: BinOp::Add,
            right: Box::new(Expr::BinOp {
                left: Box::new(Expr::Int { value: 2, loc: loc() }),
                op: BinOp::Mul,
                right: Box::new(Expr::Int { value: 3, loc: loc() }),
                loc: loc(),
                ty: Type::Int,
            }),
            loc: loc(),
            ty: Type::Int,
        };

        let (ir, mut syms) = IrBuilder::new().build(expr);
        let folded = const_fold(&mut syms, ir);
        syms.cleanup();

        let consts: Vec<_> = folded
            .iter()
            .filter_map(|tac| tac.expr.as_const())
            .collect();
        assert_eq!(consts.len(), 1);
        assert_eq!(consts[0], &ConstNode::Int(7));
    }

    #[test]
    fn double_negation_folds_away_without_a_neg_opcode() {
        let expr = Expr::UnOp {
            op: UnOp::Neg,
            operand: Box::new(Expr::UnOp {
                op: UnOp::Neg,
                operand: Box::new(Expr::Int { value: 5, loc: loc() }),
                loc: loc(),
                ty: Type::Int,
            }),
            loc: loc(),
            ty: Type::Int,
        };

        let (ir, mut syms) = IrBuilder::new().build(expr);
        let folded = const_fold(&mut syms, ir);

        assert!(folded.iter().all(|tac| !matches!(
            tac.expr,
            IrNode::UnOp { op: UnOp::Neg, .. }
        )));
        let consts: Vec<_> = folded
            .iter()
            .filter_map(|tac| tac.expr.as_const())
            .collect();
        assert_eq!(consts, vec![&ConstNode::Int(5)]);
    }

    #[test]
    fn concat_of_two_literals_folds_to_one_string() {
        let expr = Expr::Concat {
            left: Box::new(Expr::Str {
                value: "Hello, ".into(),
                encoding: StrEncoding::Ascii,
                loc: loc(),
            }),
            right: Box::new(Expr::Str {
                value: "world!".into(),
                encoding: StrEncoding::Ascii,
                loc: loc(),
            }),
            loc: loc(),
            ty: Type::Str(StrEncoding::Ascii),
        };

        let (ir, mut syms) = IrBuilder::new().build(expr);
        let folded = const_fold(&mut syms, ir);

        let consts: Vec<_> = folded
            .iter()
            .filter_map(|tac| tac.expr.as_const())
            .collect();
        assert_eq!(
            consts,
            vec![&ConstNode::Str {
                value: "Hello, world!".into(),
                encoding: StrEncoding::Ascii,
                is_interned: false,
            }]
        );
    }

    #[test]
    fn show_renders_integers_without_a_fractional_part() {
        assert_eq!(show(&ConstNode::Int(42)), "42");
        assert_eq!(show(&ConstNode::Float(2.0)), "2");
        assert_eq!(show(&ConstNode::Bool(true)), "true");
        assert_eq!(show(&ConstNode::Nil), "nil");
    }
}
