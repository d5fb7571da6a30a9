//! nevec-core
//!
//! The middle and back end of the Neve compiler: lowers a type-annotated
//! AST to three-address IR, optimizes it, allocates registers by graph
//! coloring, and emits the final bytecode container. Lexing, parsing and
//! type checking live upstream, in `nevec-syntax`.

pub mod ast;
pub mod bytecode;
pub mod error;
pub mod ir;
pub mod loc;
pub mod ops;
pub mod opt;
pub mod reg;
pub mod ty;

pub use ast::{Expr, Program};
pub use error::CoreError;

/// Runs the whole pipeline over an already type-checked program: lowering,
/// optimization, register allocation, and emission.
///
/// `fold` toggles constant folding (the CLI's `--no-opt` flag sets it to
/// `false`); table propagation always runs, since without it every table
/// literal would lower to a chain of `TABLE_SET`s instead of one constant.
pub fn compile(program: Program, fold: bool, source_path: &str) -> Vec<u8> {
    let (ir, mut syms) = ir::IrBuilder::new().build(program.expr);
    let ir = opt::optimize(&mut syms, ir, fold);
    bytecode::emit(&ir, &syms, source_path)
}
