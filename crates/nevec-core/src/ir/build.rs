//! AST-to-TAC lowering.
//!
//! A post-order walk: every node first lowers its children, then emits one
//! `Tac` for itself, naming a fresh symbol at the current moment. The
//! builder never looks back past the symbol it just produced -- forward
//! references don't exist in this IR.

use crate::ast::Expr;
use crate::ops::{BinOp, UnOp};
use crate::ty::Type;

use super::expr::{ConstNode, IrNode, Tac};
use super::sym::{Moment, SymId, SymValue, Syms};

pub struct IrBuilder {
    syms: Syms,
    ops: Vec<Tac>,
}

impl Default for IrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IrBuilder {
    pub fn new() -> Self {
        IrBuilder {
            syms: Syms::new(),
            ops: Vec::new(),
        }
    }

    fn next_moment(&self) -> Moment {
        self.ops.len() as Moment
    }

    fn new_sym(&mut self, value: Option<SymValue>) -> SymId {
        let moment = self.next_moment();
        self.syms.new_sym(moment, "t", value)
    }

    fn push(&mut self, sym: SymId, expr: IrNode, loc: crate::loc::Loc) -> SymId {
        let moment = self.syms.get(sym).first;
        self.ops.push(Tac {
            sym,
            expr,
            loc,
            moment,
        });
        sym
    }

    /// Lowers `program` to its TAC list, returning it together with the
    /// symbol table that describes every symbol referenced in it.
    ///
    /// Per the consumed-AST contract, `program.expr` must not contain any
    /// poisoned type; callers check `Expr::contains_unknown` upstream of
    /// this call, never here.
    pub fn build(mut self, expr: Expr) -> (Vec<Tac>, Syms) {
        let loc = expr.loc();
        let root = self.lower(expr);

        let ret_moment = self.next_moment();
        self.syms.get_mut(root).last_used(ret_moment);

        let ret_sym = root;
        self.push(ret_sym, IrNode::Ret(root), loc);

        (self.ops, self.syms)
    }

    fn lower(&mut self, expr: Expr) -> SymId {
        match expr {
            Expr::Int { value, loc } => {
                let sym = self.new_sym(Some(SymValue::Int(value)));
                self.push(sym, IrNode::Const(ConstNode::Int(value)), loc)
            }
            Expr::Float { value, loc } => {
                let sym = self.new_sym(Some(SymValue::Float(value)));
                self.push(sym, IrNode::Const(ConstNode::Float(value)), loc)
            }
            Expr::Bool { value, loc } => {
                let sym = self.new_sym(Some(SymValue::Bool(value)));
                self.push(sym, IrNode::Const(ConstNode::Bool(value)), loc)
            }
            Expr::Nil { loc } => {
                let sym = self.new_sym(Some(SymValue::Nil));
                self.push(sym, IrNode::Const(ConstNode::Nil), loc)
            }
            Expr::Str {
                value,
                encoding,
                loc,
            } => {
                let sym = self.new_sym(Some(SymValue::Str(value.clone())));
                self.push(
                    sym,
                    IrNode::Const(ConstNode::Str {
                        value,
                        encoding,
                        is_interned: false,
                    }),
                    loc,
                )
            }
            Expr::Parens { inner, .. } => self.lower(*inner),
            Expr::UnOp {
                op,
                operand,
                loc,
                ty,
            } => self.lower_un_op(op, *operand, loc, ty),
            Expr::BinOp {
                left,
                op,
                right,
                loc,
                ty,
            } => self.lower_bin_op(*left, op, *right, loc, ty),
            Expr::Concat {
                left, right, loc, ..
            } => self.lower_concat(*left, *right, loc),
            Expr::Interpol {
                left,
                left_encoding,
                expr,
                next,
                loc,
                ..
            } => self.lower_interpol(left, left_encoding, *expr, *next, loc),
            Expr::Table {
                keys, vals, loc, ..
            } => self.lower_table(keys, vals, loc),
        }
    }

    fn lower_un_op(&mut self, op: UnOp, operand: Expr, loc: crate::loc::Loc, ty: Type) -> SymId {
        let operand_sym = self.lower(operand);

        let moment = self.next_moment();
        self.syms.get_mut(operand_sym).last_used(moment);

        let dest = self.new_sym(None);
        self.push(
            dest,
            IrNode::UnOp {
                op,
                operand: operand_sym,
                ty,
            },
            loc,
        )
    }

    fn lower_bin_op(
        &mut self,
        left: Expr,
        op: BinOp,
        right: Expr,
        loc: crate::loc::Loc,
        ty: Type,
    ) -> SymId {
        let left_sym = self.lower(left);
        let right_sym = self.lower(right);

        let moment = self.next_moment();
        self.syms.get_mut(left_sym).last_used(moment);
        self.syms.get_mut(right_sym).last_used(moment);

        let dest = self.new_sym(None);
        self.push(
            dest,
            IrNode::BinOp {
                left: left_sym,
                op,
                right: right_sym,
                ty,
            },
            loc,
        )
    }

    fn lower_concat(&mut self, left: Expr, right: Expr, loc: crate::loc::Loc) -> SymId {
        let left_ascii = left.ty().is_ascii_str();
        let right_ascii = right.ty().is_ascii_str();

        let left_sym = self.lower(left);
        let right_sym = self.lower(right);

        let moment = self.next_moment();
        self.syms.get_mut(left_sym).last_used(moment);
        self.syms.get_mut(right_sym).last_used(moment);

        let dest = self.new_sym(None);
        self.push(
            dest,
            IrNode::Concat {
                left: left_sym,
                right: right_sym,
                left_ascii,
                right_ascii,
            },
            loc,
        )
    }

    /// `"left #{expr}next"` desugars to `Concat(Str(left), Concat(show?(expr), next))`,
    /// then is lowered exactly like any other concatenation chain.
    fn lower_interpol(
        &mut self,
        left: String,
        left_encoding: crate::ty::StrEncoding,
        expr: Expr,
        next: Expr,
        loc: crate::loc::Loc,
    ) -> SymId {
        let left_str = Expr::Str {
            value: left,
            encoding: left_encoding,
            loc,
        };

        let expr_loc = expr.loc();
        let expr = if expr.ty().is_str() {
            expr
        } else {
            Expr::UnOp {
                op: UnOp::Show,
                operand: Box::new(expr),
                loc: expr_loc,
                ty: Type::Str(crate::ty::StrEncoding::Ascii),
            }
        };

        let inner_loc = loc.union_hull(expr.loc());
        let inner = Expr::Concat {
            left: Box::new(left_str),
            right: Box::new(expr),
            loc: inner_loc,
            ty: Type::Str(crate::ty::StrEncoding::Ascii),
        };

        let outer_loc = inner_loc.union_hull(next.loc());
        let outer = Expr::Concat {
            left: Box::new(inner),
            right: Box::new(next),
            loc: outer_loc,
            ty: Type::Str(crate::ty::StrEncoding::Ascii),
        };

        self.lower(outer)
    }

    fn lower_table(&mut self, keys: Vec<Expr>, vals: Vec<Expr>, loc: crate::loc::Loc) -> SymId {
        let table_sym = self.new_sym(None);
        let table_sym = self.push(
            table_sym,
            IrNode::Const(ConstNode::Table {
                keys: Vec::new(),
                vals: Vec::new(),
            }),
            loc,
        );

        let n = keys.len();
        let key_syms: Vec<SymId> = keys.into_iter().map(|k| self.lower(k)).collect();
        let val_syms: Vec<SymId> = vals.into_iter().map(|v| self.lower(v)).collect();

        for i in 0..n {
            let moment = self.next_moment();
            self.syms.get_mut(key_syms[i]).last_used(moment);
            self.syms.get_mut(val_syms[i]).last_used(moment);

            self.push(
                key_syms[i],
                IrNode::TableSet {
                    table: table_sym,
                    key: key_syms[i],
                    value: val_syms[i],
                },
                loc,
            );
        }

        table_sym
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc::Loc;
    use crate::ty::StrEncoding;

    fn loc() -> Loc {
        Loc::new(0, 1, 1)
    }

    #[test]
    fn literal_lowers_to_a_single_const_plus_ret() {
        let expr = Expr::Int { value: 7, loc: loc() };
        let (ir, syms) = IrBuilder::new().build(expr);

        assert_eq!(ir.len(), 2);
        assert!(matches!(ir[0].expr, IrNode::Const(ConstNode::Int(7))));
        assert!(matches!(ir[1].expr, IrNode::Ret(_)));
        assert_eq!(syms.get(ir[0].sym).uses, 1);
    }

    #[test]
    fn bin_op_consumes_both_operands() {
        let expr = Expr::BinOp {
            left: Box::new(Expr::Int { value: 1, loc: loc() }),
            op: BinOp::Add,
            right: Box::new(Expr::Int { value: 2, loc: loc() }),
            loc: loc(),
            ty: Type::Int,
        };
        let (ir, syms) = IrBuilder::new().build(expr);

        // Int(1), Int(2), BinOp, Ret
        assert_eq!(ir.len(), 4);
        assert_eq!(syms.get(ir[0].sym).uses, 1);
        assert_eq!(syms.get(ir[1].sym).uses, 1);
    }

    #[test]
    fn empty_table_lowers_with_no_table_set() {
        let expr = Expr::Table {
            keys: Vec::new(),
            vals: Vec::new(),
            loc: loc(),
            ty: Type::Table(Box::new(Type::Nil), Box::new(Type::Nil)),
        };
        let (ir, _syms) = IrBuilder::new().build(expr);

        assert_eq!(ir.len(), 2);
        assert!(matches!(
            ir[0].expr,
            IrNode::Const(ConstNode::Table { .. })
        ));
        assert!(matches!(ir[1].expr, IrNode::Ret(_)));
    }

    #[test]
    fn table_with_entries_emits_one_table_set_per_pair() {
        let expr = Expr::Table {
            keys: vec![Expr::Str {
                value: "a".into(),
                encoding: StrEncoding::Ascii,
                loc: loc(),
            }],
            vals: vec![Expr::Int { value: 1, loc: loc() }],
            loc: loc(),
            ty: Type::Table(Box::new(Type::Str(StrEncoding::Ascii)), Box::new(Type::Int)),
        };
        let (ir, _syms) = IrBuilder::new().build(expr);

        let table_sets = ir
            .iter()
            .filter(|tac| matches!(tac.expr, IrNode::TableSet { .. }))
            .count();
        assert_eq!(table_sets, 1);
    }
}
