//! The narrow set of failures the front end can report.
//!
//! Rendering these for a human (colors, carets, suggestions) is explicitly
//! someone else's job; this crate only needs enough information for a
//! caller to decide whether to proceed to `nevec_core::compile`.

use nevec_core::loc::Loc;

#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxError {
    UnexpectedChar { found: char, loc: Loc },
    UnexpectedToken { found: String, loc: Loc },
    ExpectedExpr { found: String, loc: Loc },
    UnterminatedString { loc: Loc },
    TypeMismatch { detail: String, loc: Loc },
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyntaxError::UnexpectedChar { found, loc } => {
                write!(f, "{loc}: unexpected character '{found}'")
            }
            SyntaxError::UnexpectedToken { found, loc } => {
                write!(f, "{loc}: unexpected token '{found}'")
            }
            SyntaxError::ExpectedExpr { found, loc } => {
                write!(f, "{loc}: expected an expression, found '{found}'")
            }
            SyntaxError::UnterminatedString { loc } => {
                write!(f, "{loc}: unterminated string literal")
            }
            SyntaxError::TypeMismatch { detail, loc } => write!(f, "{loc}: {detail}"),
        }
    }
}

impl std::error::Error for SyntaxError {}
