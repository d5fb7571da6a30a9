//! The type-annotated AST interface this crate consumes.
//!
//! This is the boundary described for the core: everything upstream of it
//! (lexing, parsing, type checking) lives in `nevec-syntax` or an
//! equivalent front end. `nevec-core` only ever reads an [`Expr`] tree that
//! has already been stamped with resolved [`Type`]s.

use crate::loc::Loc;
use crate::ops::{BinOp, UnOp};
use crate::ty::{StrEncoding, Type};

/// The root of a compilation unit: a single expression, since the source
/// language has no declarations, statements or control flow.
#[derive(Debug, Clone)]
pub struct Program {
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Int {
        value: i64,
        loc: Loc,
    },
    Float {
        value: f64,
        loc: Loc,
    },
    Bool {
        value: bool,
        loc: Loc,
    },
    Nil {
        loc: Loc,
    },
    Str {
        value: String,
        encoding: StrEncoding,
        loc: Loc,
    },
    /// Parenthesized sub-expression. Carried through to the AST purely so
    /// diagnostics can point at the parens; lowering forwards the child
    /// untouched (see `IrBuilder::lower`).
    Parens {
        inner: Box<Expr>,
        loc: Loc,
    },
    UnOp {
        op: UnOp,
        operand: Box<Expr>,
        loc: Loc,
        ty: Type,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        loc: Loc,
        ty: Type,
    },
    Concat {
        left: Box<Expr>,
        right: Box<Expr>,
        loc: Loc,
        ty: Type,
    },
    /// `"left #{expr}next"`. `next` is itself a `Str` or another `Interpol`,
    /// mirroring how the surface grammar nests one interpolation after
    /// another.
    Interpol {
        left: String,
        left_encoding: StrEncoding,
        expr: Box<Expr>,
        next: Box<Expr>,
        loc: Loc,
        ty: Type,
    },
    Table {
        keys: Vec<Expr>,
        vals: Vec<Expr>,
        loc: Loc,
        ty: Type,
    },
}

impl Expr {
    pub fn loc(&self) -> Loc {
        match self {
            Expr::Int { loc, .. }
            | Expr::Float { loc, .. }
            | Expr::Bool { loc, .. }
            | Expr::Nil { loc }
            | Expr::Str { loc, .. }
            | Expr::Parens { loc, .. }
            | Expr::UnOp { loc, .. }
            | Expr::BinOp { loc, .. }
            | Expr::Concat { loc, .. }
            | Expr::Interpol { loc, .. }
            | Expr::Table { loc, .. } => *loc,
        }
    }

    pub fn ty(&self) -> Type {
        match self {
            Expr::Int { .. } => Type::Int,
            Expr::Float { .. } => Type::Float,
            Expr::Bool { .. } => Type::Bool,
            Expr::Nil { .. } => Type::Nil,
            Expr::Str { encoding, .. } => Type::Str(*encoding),
            Expr::Parens { inner, .. } => inner.ty(),
            Expr::UnOp { ty, .. }
            | Expr::BinOp { ty, .. }
            | Expr::Concat { ty, .. }
            | Expr::Interpol { ty, .. }
            | Expr::Table { ty, .. } => ty.clone(),
        }
    }

    /// True when this node or any descendant carries a poisoned type.
    /// Per the consumed-AST contract, such a subtree must never reach
    /// [`crate::ir::build::IrBuilder`].
    pub fn contains_unknown(&self) -> bool {
        if self.ty().is_poisoned() {
            return true;
        }

        match self {
            Expr::Int { .. }
            | Expr::Float { .. }
            | Expr::Bool { .. }
            | Expr::Nil { .. }
            | Expr::Str { .. } => false,
            Expr::Parens { inner, .. } => inner.contains_unknown(),
            Expr::UnOp { operand, .. } => operand.contains_unknown(),
            Expr::BinOp { left, right, .. } | Expr::Concat { left, right, .. } => {
                left.contains_unknown() || right.contains_unknown()
            }
            Expr::Interpol { expr, next, .. } => {
                expr.contains_unknown() || next.contains_unknown()
            }
            Expr::Table { keys, vals, .. } => keys
                .iter()
                .chain(vals.iter())
                .any(Expr::contains_unknown),
        }
    }
}
