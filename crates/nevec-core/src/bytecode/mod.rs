//! Bytecode emission: the fixed opcode table, the constant pool's wire
//! encoding, and the emitter that assembles a final container.

pub mod constpool;
pub mod emit;
pub mod opcode;

pub use constpool::Const;
pub use emit::Emitter;
pub use opcode::Opcode;

use crate::ir::{Syms, Tac};
use crate::reg::InterferenceGraph;

/// Emits a finished container for an already-optimized, register-allocated
/// program.
pub fn emit(ir: &[Tac], syms: &Syms, source_path: &str) -> Vec<u8> {
    let regs = InterferenceGraph::build(syms);
    let mut emitter = Emitter::new();
    emitter.emit_program(ir, syms, &regs);
    emitter.finalize(source_path)
}
