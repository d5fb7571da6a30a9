//! The intermediate representation: symbol table, TAC instruction set, and
//! the builder that lowers a type-annotated AST into it.

pub mod build;
pub mod expr;
pub mod sym;

pub use build::IrBuilder;
pub use expr::{ConstNode, IrNode, Tac};
pub use sym::{Lifetime, Moment, Sym, SymId, SymValue, Syms};
