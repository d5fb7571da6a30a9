//! Operator kinds shared between the AST interface and the IR.
//!
//! The AST and IR deliberately use the very same enums: there is no surface
//! operator that desugars into a different IR op, so keeping one
//! definition avoids a pointless translation table.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    IsNil,
    IsNotNil,
    IsZero,
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Shl,
    Shr,
    BitAnd,
    BitXor,
    BitOr,
    Neq,
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl BinOp {
    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinOp::Shl | BinOp::Shr | BinOp::BitAnd | BinOp::BitXor | BinOp::BitOr
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Neq | BinOp::Eq | BinOp::Gt | BinOp::Gte | BinOp::Lt | BinOp::Lte
        )
    }

    pub fn is_arith(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    }

    /// The lexeme used both for pretty-printing and when folding comparisons
    /// (`ConstFold` re-derives the boolean by name rather than matching
    /// every variant again).
    pub fn lexeme(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::BitAnd => "&",
            BinOp::BitXor => "^",
            BinOp::BitOr => "bor",
            BinOp::Neq => "!=",
            BinOp::Eq => "==",
            BinOp::Gt => ">",
            BinOp::Gte => ">=",
            BinOp::Lt => "<",
            BinOp::Lte => "<=",
        }
    }
}
