//! Token kinds produced by the lexer.

use nevec_core::loc::Loc;
use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq)]
pub enum TokKind {
    Semicol,
    Col,
    Comma,
    Dot,

    Plus,
    Minus,
    Star,
    Slash,
    PlusPlus,

    Shl,
    Shr,
    Amp,
    Caret,

    Neq,
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,

    LParen,
    RParen,
    LBracket,
    RBracket,

    Ident(SmolStr),
    Int(i64),
    Float(f64),
    Str(String),
    /// The `"left #{` prefix of an interpolated string literal.
    InterpolOpen(String),
    /// The `}` that closes an interpolated expression; may be followed
    /// either by a plain `Str` (the tail) or by another `InterpolOpen`.
    InterpolSep,

    True,
    False,
    Nil,
    Not,
    Bor,

    Eof,
    /// An unrecognized character; carries what the lexer saw so the parser
    /// can report it.
    Err(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tok {
    pub kind: TokKind,
    pub loc: Loc,
}

impl Tok {
    pub fn eof() -> Tok {
        Tok {
            kind: TokKind::Eof,
            loc: Loc::start(),
        }
    }
}
