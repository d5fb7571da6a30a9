//! The resolved `Type` values the type checker stamps onto every AST node.
//!
//! `nevec-core` never performs type inference itself -- it consumes a tree
//! that has already been checked -- but it still needs to read these types
//! to pick opcodes, fold constants and tell apart `Unknown` nodes that must
//! never reach the IR builder (see [`Type::is_poisoned`]).

use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrEncoding {
    Ascii,
    Utf8,
    Utf16,
    Utf32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// A type error that should not be diagnosed again further up the tree.
    Unknown,
    /// Same as `Unknown`, but already reported once; checkers may choose to
    /// stay silent about it a second time.
    UnknownSnd,
    Int,
    Float,
    Bool,
    Nil,
    Str(StrEncoding),
    Table(Box<Type>, Box<Type>),
}

impl Type {
    pub fn is_num(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Type::Str(_))
    }

    pub fn is_ascii_str(&self) -> bool {
        matches!(self, Type::Str(StrEncoding::Ascii))
    }

    pub fn is_poisoned(&self) -> bool {
        match self {
            Type::Unknown => true,
            Type::Table(key, val) => key.is_poisoned() || val.is_poisoned(),
            _ => false,
        }
    }

    pub fn is_ignorable(&self) -> bool {
        matches!(self, Type::UnknownSnd)
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Type::Unknown) && !self.is_poisoned()
    }

    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    /// Degrades `self` to `UnknownSnd` if any of `others` is already
    /// poisoned or merely ignorable (already reported once), so that a
    /// single root cause doesn't cascade into a wall of unrelated
    /// diagnostics further up the tree.
    pub fn unless_unknown(self, others: &[&Type]) -> Type {
        if others.iter().any(|t| t.is_poisoned() || t.is_ignorable()) {
            Type::UnknownSnd
        } else {
            self
        }
    }

    pub fn name(&self) -> SmolStr {
        match self {
            Type::Unknown | Type::UnknownSnd => SmolStr::new_static("Unknown"),
            Type::Int => SmolStr::new_static("Int"),
            Type::Float => SmolStr::new_static("Float"),
            Type::Bool => SmolStr::new_static("Bool"),
            Type::Nil => SmolStr::new_static("Nil"),
            Type::Str(StrEncoding::Ascii) => SmolStr::new_static("Str"),
            Type::Str(StrEncoding::Utf8) => SmolStr::new_static("Str8"),
            Type::Str(StrEncoding::Utf16) => SmolStr::new_static("Str16"),
            Type::Str(StrEncoding::Utf32) => SmolStr::new_static("Str32"),
            Type::Table(key, val) => SmolStr::new(format!("[{}: {}]", key.name(), val.name())),
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
