//! Recursive-descent parser with type inference folded into construction.
//!
//! Every node computes its own `ty` the moment it is built, exactly the
//! way the upstream AST nodes do in their constructors: there is no
//! separate type-checking pass here. A caller that wants to know whether
//! the parse succeeded asks `Expr::contains_unknown()` on the result,
//! the same predicate `nevec_core` itself uses to decide what may be
//! lowered.

use nevec_core::ast::{Expr, Program};
use nevec_core::loc::Loc;
use nevec_core::ops::{BinOp, UnOp};
use nevec_core::ty::{StrEncoding, Type};

use crate::error::SyntaxError;
use crate::lexer::Lexer;
use crate::token::{Tok, TokKind};

pub struct Parser {
    lexer: Lexer,
    curr: Tok,
    errors: Vec<SyntaxError>,
}

/// Parses a full source string into a single expression program.
pub fn parse(source: &str) -> Result<Program, Vec<SyntaxError>> {
    let mut parser = Parser::new(source);
    let expr = parser.expr();

    if !parser.errors.is_empty() {
        return Err(parser.errors);
    }

    Ok(Program { expr })
}

impl Parser {
    fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let curr = lexer.next();
        Parser {
            lexer,
            curr,
            errors: Vec::new(),
        }
    }

    fn advance(&mut self) -> Tok {
        let next = self.lexer.next();
        std::mem::replace(&mut self.curr, next)
    }

    fn describe(kind: &TokKind) -> String {
        match kind {
            TokKind::Eof => "end of file".to_owned(),
            TokKind::Err(c) => c.to_string(),
            TokKind::Ident(s) => s.to_string(),
            other => format!("{other:?}"),
        }
    }

    fn error_expr(&mut self, loc: Loc) -> Expr {
        self.errors.push(SyntaxError::ExpectedExpr {
            found: Self::describe(&self.curr.kind),
            loc,
        });
        Expr::Nil { loc }
    }

    fn expect_rbracket(&mut self, open: Loc) -> Loc {
        if let TokKind::RBracket = self.curr.kind {
            let loc = self.curr.loc;
            self.advance();
            loc
        } else {
            self.errors.push(SyntaxError::UnexpectedToken {
                found: Self::describe(&self.curr.kind),
                loc: self.curr.loc,
            });
            open
        }
    }

    fn expect_rparen(&mut self, open: Loc) -> Loc {
        if let TokKind::RParen = self.curr.kind {
            let loc = self.curr.loc;
            self.advance();
            loc
        } else {
            self.errors.push(SyntaxError::UnexpectedToken {
                found: Self::describe(&self.curr.kind),
                loc: self.curr.loc,
            });
            open
        }
    }

    fn expect_col(&mut self) {
        if let TokKind::Col = self.curr.kind {
            self.advance();
        } else {
            self.errors.push(SyntaxError::UnexpectedToken {
                found: Self::describe(&self.curr.kind),
                loc: self.curr.loc,
            });
        }
    }

    // --- precedence chain, low to high ---

    fn expr(&mut self) -> Expr {
        self.bit_or()
    }

    fn bit_or(&mut self) -> Expr {
        let mut left = self.bit_xor();
        while let TokKind::Bor = self.curr.kind {
            self.advance();
            let right = self.bit_xor();
            left = self.bitwise(left, BinOp::BitOr, right);
        }
        left
    }

    fn bit_xor(&mut self) -> Expr {
        let mut left = self.bit_and();
        while let TokKind::Caret = self.curr.kind {
            self.advance();
            let right = self.bit_and();
            left = self.bitwise(left, BinOp::BitXor, right);
        }
        left
    }

    fn bit_and(&mut self) -> Expr {
        let mut left = self.equality();
        while let TokKind::Amp = self.curr.kind {
            self.advance();
            let right = self.equality();
            left = self.bitwise(left, BinOp::BitAnd, right);
        }
        left
    }

    fn equality(&mut self) -> Expr {
        let mut left = self.comparison();
        loop {
            let op = match self.curr.kind {
                TokKind::Eq => BinOp::Eq,
                TokKind::Neq => BinOp::Neq,
                _ => break,
            };
            self.advance();
            let right = self.comparison();
            left = self.comparison_op(left, op, right);
        }
        left
    }

    fn comparison(&mut self) -> Expr {
        let mut left = self.bit_shift();
        loop {
            let op = match self.curr.kind {
                TokKind::Gt => BinOp::Gt,
                TokKind::Gte => BinOp::Gte,
                TokKind::Lt => BinOp::Lt,
                TokKind::Lte => BinOp::Lte,
                _ => break,
            };
            self.advance();
            let right = self.bit_shift();
            left = self.comparison_op(left, op, right);
        }
        left
    }

    fn bit_shift(&mut self) -> Expr {
        let mut left = self.concat();
        loop {
            let op = match self.curr.kind {
                TokKind::Shl => BinOp::Shl,
                TokKind::Shr => BinOp::Shr,
                _ => break,
            };
            self.advance();
            let right = self.concat();
            left = self.bitwise(left, op, right);
        }
        left
    }

    fn concat(&mut self) -> Expr {
        let mut left = self.term();
        while let TokKind::PlusPlus = self.curr.kind {
            self.advance();
            let right = self.term();
            left = self.concat_op(left, right);
        }
        left
    }

    fn term(&mut self) -> Expr {
        let mut left = self.factor();
        loop {
            let op = match self.curr.kind {
                TokKind::Plus => BinOp::Add,
                TokKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.factor();
            left = self.arith(left, op, right);
        }
        left
    }

    fn factor(&mut self) -> Expr {
        let mut left = self.unary();
        loop {
            let op = match self.curr.kind {
                TokKind::Star => BinOp::Mul,
                TokKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.unary();
            left = self.arith(left, op, right);
        }
        left
    }

    fn unary(&mut self) -> Expr {
        match self.curr.kind {
            TokKind::Minus => {
                let op_loc = self.curr.loc;
                self.advance();
                let operand = self.unary();
                self.un_op(UnOp::Neg, operand, op_loc)
            }
            TokKind::Not => {
                let op_loc = self.curr.loc;
                self.advance();
                let operand = self.unary();
                self.un_op(UnOp::Not, operand, op_loc)
            }
            _ => self.postfix(),
        }
    }

    /// `.show`, `.isnil`, `.isnotnil`, `.iszero` -- a unary operator
    /// written as a property, the way the source language already writes
    /// `.show`.
    fn postfix(&mut self) -> Expr {
        let mut expr = self.primary();

        loop {
            if !matches!(self.curr.kind, TokKind::Dot) {
                break;
            }
            let dot_loc = self.curr.loc;
            self.advance();

            let TokKind::Ident(name) = self.curr.kind.clone() else {
                self.errors.push(SyntaxError::UnexpectedToken {
                    found: Self::describe(&self.curr.kind),
                    loc: self.curr.loc,
                });
                break;
            };

            let op = match name.as_str() {
                "show" => UnOp::Show,
                "isnil" => UnOp::IsNil,
                "isnotnil" => UnOp::IsNotNil,
                "iszero" => UnOp::IsZero,
                _ => {
                    self.errors.push(SyntaxError::UnexpectedToken {
                        found: name.to_string(),
                        loc: self.curr.loc,
                    });
                    break;
                }
            };
            self.advance();

            expr = self.un_op(op, expr, dot_loc);
        }

        expr
    }

    fn primary(&mut self) -> Expr {
        let tok = self.curr.clone();

        match tok.kind {
            TokKind::Int(v) => {
                self.advance();
                Expr::Int { value: v, loc: tok.loc }
            }
            TokKind::Float(v) => {
                self.advance();
                Expr::Float { value: v, loc: tok.loc }
            }
            TokKind::True => {
                self.advance();
                Expr::Bool { value: true, loc: tok.loc }
            }
            TokKind::False => {
                self.advance();
                Expr::Bool { value: false, loc: tok.loc }
            }
            TokKind::Nil => {
                self.advance();
                Expr::Nil { loc: tok.loc }
            }
            TokKind::Str(value) => {
                self.advance();
                let encoding = Self::encoding_of(&value);
                Expr::Str { value, encoding, loc: tok.loc }
            }
            TokKind::InterpolOpen(_) => self.interpol(),
            TokKind::LParen => self.grouping(),
            TokKind::LBracket => self.table_or_empty(),
            TokKind::Err('"') => {
                self.errors.push(SyntaxError::UnterminatedString { loc: tok.loc });
                Expr::Nil { loc: tok.loc }
            }
            TokKind::Err(found) => {
                self.errors.push(SyntaxError::UnexpectedChar { found, loc: tok.loc });
                Expr::Nil { loc: tok.loc }
            }
            _ => self.error_expr(tok.loc),
        }
    }

    fn grouping(&mut self) -> Expr {
        let open = self.curr.loc;
        self.advance();

        let inner = self.expr();
        let close = self.expect_rparen(open);

        let loc = open.union_hull(close);
        Expr::Parens {
            inner: Box::new(inner),
            loc,
        }
    }

    fn table_or_empty(&mut self) -> Expr {
        let open = self.curr.loc;
        self.advance();

        if let TokKind::Col = self.curr.kind {
            self.advance();
            let close = self.expect_rbracket(open);
            return self.table(Vec::new(), Vec::new(), open.union_hull(close));
        }

        let first_key = self.expr();
        self.expect_col();
        let first_val = self.expr();

        let mut keys = vec![first_key];
        let mut vals = vec![first_val];

        while let TokKind::Comma = self.curr.kind {
            self.advance();
            keys.push(self.expr());
            self.expect_col();
            vals.push(self.expr());
        }

        let close = self.expect_rbracket(open);
        self.table(keys, vals, open.union_hull(close))
    }

    fn interpol(&mut self) -> Expr {
        let tok = self.advance();
        let TokKind::InterpolOpen(left) = tok.kind else {
            unreachable!("caller checked InterpolOpen");
        };

        let inner_expr = self.expr();

        if !matches!(self.curr.kind, TokKind::InterpolSep) {
            self.errors.push(SyntaxError::UnexpectedToken {
                found: Self::describe(&self.curr.kind),
                loc: self.curr.loc,
            });
        } else {
            self.advance();
        }

        let next = match self.curr.kind.clone() {
            TokKind::InterpolOpen(_) => self.interpol(),
            TokKind::Str(value) => {
                let str_tok = self.advance();
                let encoding = Self::encoding_of(&value);
                Expr::Str {
                    value,
                    encoding,
                    loc: str_tok.loc,
                }
            }
            _ => self.error_expr(self.curr.loc),
        };

        let left_encoding = Self::encoding_of(&left);
        let loc = tok.loc.union_hull(next.loc());

        Expr::Interpol {
            left,
            left_encoding,
            expr: Box::new(inner_expr),
            next: Box::new(next),
            loc,
            ty: Type::Str(StrEncoding::Ascii),
        }
    }

    fn encoding_of(s: &str) -> StrEncoding {
        if s.is_ascii() {
            StrEncoding::Ascii
        } else {
            StrEncoding::Utf8
        }
    }

    // --- node builders: inline type inference, mirroring the upstream
    // AST constructors ---

    /// True when `t` is either already poisoned or merely ignorable
    /// (`UnknownSnd`) -- in both cases a builder should stay quiet rather
    /// than pile another diagnostic onto an already-reported root cause.
    fn already_flagged(t: &Type) -> bool {
        t.is_invalid() || t.is_ignorable()
    }

    fn un_op(&mut self, op: UnOp, operand: Expr, op_loc: Loc) -> Expr {
        let loc = op_loc.union_hull(operand.loc());
        let operand_ty = operand.ty();

        let ty = match op {
            UnOp::Neg => {
                if operand_ty.is_num() {
                    operand_ty.clone()
                } else {
                    if !Self::already_flagged(&operand_ty) {
                        self.errors.push(SyntaxError::TypeMismatch {
                            detail: format!("can only negate Int or Float values, found {operand_ty}"),
                            loc,
                        });
                    }
                    Type::Unknown
                }
            }
            .unless_unknown(&[&operand_ty]),
            UnOp::Not => {
                if operand_ty == Type::Bool {
                    Type::Bool
                } else {
                    if !Self::already_flagged(&operand_ty) {
                        self.errors.push(SyntaxError::TypeMismatch {
                            detail: format!("can only flip booleans, found {operand_ty}"),
                            loc,
                        });
                    }
                    Type::Unknown
                }
            }
            .unless_unknown(&[&operand_ty]),
            // These always report Bool/Str regardless of the operand's own
            // poison state -- they ask a question about the operand rather
            // than propagating its type, so there's nothing to cascade.
            UnOp::IsZero | UnOp::IsNil | UnOp::IsNotNil => Type::Bool,
            UnOp::Show => Type::Str(StrEncoding::Ascii),
        };

        Expr::UnOp {
            op,
            operand: Box::new(operand),
            loc,
            ty,
        }
    }

    fn bitwise(&mut self, left: Expr, op: BinOp, right: Expr) -> Expr {
        let loc = left.loc().union_hull(right.loc());
        let (lt, rt) = (left.ty(), right.ty());

        let ty = if lt != Type::Int || rt != Type::Int {
            if !Self::already_flagged(&lt) && !Self::already_flagged(&rt) {
                self.errors.push(SyntaxError::TypeMismatch {
                    detail: format!("operands of a bitwise operation must be Int, found {lt} and {rt}"),
                    loc,
                });
            }
            Type::Unknown
        } else {
            Type::Int
        }
        .unless_unknown(&[&lt, &rt]);

        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
            loc,
            ty,
        }
    }

    fn comparison_op(&mut self, left: Expr, op: BinOp, right: Expr) -> Expr {
        let loc = left.loc().union_hull(right.loc());
        let (lt, rt) = (left.ty(), right.ty());

        let ty = if lt != rt {
            if !Self::already_flagged(&lt) && !Self::already_flagged(&rt) {
                self.errors.push(SyntaxError::TypeMismatch {
                    detail: format!("cannot compare {lt} to {rt}"),
                    loc,
                });
            }
            Type::Unknown
        } else {
            Type::Bool
        }
        .unless_unknown(&[&lt, &rt]);

        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
            loc,
            ty,
        }
    }

    fn arith(&mut self, left: Expr, op: BinOp, right: Expr) -> Expr {
        let loc = left.loc().union_hull(right.loc());
        let (lt, rt) = (left.ty(), right.ty());

        let ty = if lt != rt || !lt.is_num() {
            if !Self::already_flagged(&lt) && !Self::already_flagged(&rt) {
                self.errors.push(SyntaxError::TypeMismatch {
                    detail: format!(
                        "arithmetic requires two operands of the same numeric type, found {lt} and {rt}"
                    ),
                    loc,
                });
            }
            Type::Unknown
        } else {
            lt.clone()
        }
        .unless_unknown(&[&lt, &rt]);

        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
            loc,
            ty,
        }
    }

    fn concat_op(&mut self, left: Expr, right: Expr) -> Expr {
        let loc = left.loc().union_hull(right.loc());
        let (lt, rt) = (left.ty(), right.ty());

        let ty = if lt != rt || !lt.is_str() {
            if !Self::already_flagged(&lt) && !Self::already_flagged(&rt) {
                self.errors.push(SyntaxError::TypeMismatch {
                    detail: format!(
                        "concatenation requires two string operands of the same encoding, found {lt} and {rt}"
                    ),
                    loc,
                });
            }
            Type::Unknown
        } else {
            lt.clone()
        }
        .unless_unknown(&[&lt, &rt]);

        Expr::Concat {
            left: Box::new(left),
            right: Box::new(right),
            loc,
            ty,
        }
    }

    /// An empty table is typed `[Nil: Nil]` rather than poisoned: unlike
    /// the language this was distilled from (whose checker rejects `[:]`
    /// outright), this core's own IR builder lowers an empty table
    /// literal successfully, so the front end must hand it a valid type.
    fn table(&mut self, keys: Vec<Expr>, vals: Vec<Expr>, loc: Loc) -> Expr {
        if keys.is_empty() {
            return Expr::Table {
                keys,
                vals,
                loc,
                ty: Type::Table(Box::new(Type::Nil), Box::new(Type::Nil)),
            };
        }

        let key_ty = Self::uniform_ty(&keys);
        let val_ty = Self::uniform_ty(&vals);

        let first_key_ty = keys[0].ty();
        let first_val_ty = vals[0].ty();

        if key_ty.is_invalid() && !Self::already_flagged(&first_key_ty) {
            self.errors.push(SyntaxError::TypeMismatch {
                detail: format!("these table keys don't all have type {first_key_ty}"),
                loc: keys[0].loc(),
            });
        }
        if val_ty.is_invalid() && !Self::already_flagged(&first_val_ty) {
            self.errors.push(SyntaxError::TypeMismatch {
                detail: format!("these table values don't all have type {first_val_ty}"),
                loc: vals[0].loc(),
            });
        }

        Expr::Table {
            keys,
            vals,
            loc,
            ty: Type::Table(Box::new(key_ty), Box::new(val_ty)),
        }
    }

    fn uniform_ty(exprs: &[Expr]) -> Type {
        let first = exprs[0].ty();
        if exprs[1..].iter().all(|e| e.ty() == first) {
            first
        } else {
            Type::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_respects_usual_precedence() {
        let program = parse("1 + 2 * 3").unwrap();
        let Expr::BinOp { op: BinOp::Add, left, right, .. } = program.expr else {
            panic!("expected a top-level Add");
        };
        assert!(matches!(*left, Expr::Int { value: 1, .. }));
        assert!(matches!(*right, Expr::BinOp { op: BinOp::Mul, .. }));
    }

    #[test]
    fn concat_binds_looser_than_arithmetic_but_tighter_than_comparison() {
        let program = parse(r#""a" < "b" ++ "c""#).unwrap();
        let Expr::BinOp { op: BinOp::Lt, right, .. } = program.expr else {
            panic!("expected a top-level Lt");
        };
        assert!(matches!(*right, Expr::Concat { .. }));
    }

    #[test]
    fn bitwise_or_is_left_associative_and_lowest_precedence() {
        let program = parse("1 bor 2 & 3").unwrap();
        let Expr::BinOp { op: BinOp::BitOr, right, .. } = program.expr else {
            panic!("expected a top-level BitOr");
        };
        assert!(matches!(*right, Expr::BinOp { op: BinOp::BitAnd, .. }));
    }

    #[test]
    fn empty_table_types_as_nil_to_nil_not_poisoned() {
        let program = parse("[:]").unwrap();
        assert!(!program.expr.contains_unknown());
        assert_eq!(
            program.expr.ty(),
            Type::Table(Box::new(Type::Nil), Box::new(Type::Nil))
        );
    }

    #[test]
    fn mismatched_table_value_types_poison_the_expression() {
        let program = parse(r#"["a": 1, "b": true]"#).unwrap();
        assert!(program.expr.contains_unknown());
    }

    #[test]
    fn show_property_stringifies_any_type() {
        let program = parse("5.show").unwrap();
        assert!(matches!(
            program.expr,
            Expr::UnOp { op: UnOp::Show, .. }
        ));
        assert_eq!(program.expr.ty(), Type::Str(StrEncoding::Ascii));
    }

    #[test]
    fn isnil_property_always_yields_bool() {
        let program = parse("nil.isnil").unwrap();
        assert_eq!(program.expr.ty(), Type::Bool);
    }

    #[test]
    fn mismatched_arithmetic_operands_report_a_type_error() {
        let err = parse("1 + 1.0").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn nested_interpolation_desugars_to_a_single_expr_tree() {
        let program = parse(r#""a#{1}b#{2}c""#).unwrap();
        assert!(matches!(program.expr, Expr::Interpol { .. }));
    }

    #[test]
    fn unterminated_string_reports_its_own_error_variant() {
        let err = parse("\"no closing quote").unwrap_err();
        assert!(matches!(err.as_slice(), [SyntaxError::UnterminatedString { .. }]));
    }

    #[test]
    fn stray_character_reports_an_unexpected_char_error() {
        let err = parse("|").unwrap_err();
        assert!(matches!(
            err.as_slice(),
            [SyntaxError::UnexpectedChar { found: '|', .. }]
        ));
    }
}
