//! The optimization driver: runs passes to a fixpoint, then compacts the
//! symbol table.

pub mod constfold;
pub mod runner;
pub mod table;

use crate::ir::{Syms, Tac};

pub use runner::PassRunner;

/// Runs the unconditional pass suite (table propagation), and -- when
/// `fold` is `true` -- the conditional suite (constant folding) too, once
/// per cycle, until a cycle changes nothing. `Syms::cleanup` runs after
/// every cycle regardless of whether anything changed, matching the
/// upstream driver's placement of the compaction step.
pub fn optimize(syms: &mut Syms, ir: Vec<Tac>, fold: bool) -> Vec<Tac> {
    let mut ir = ir;
    loop {
        let mut next = table::table_propagation(syms, ir.clone());
        if fold {
            next = constfold::const_fold(syms, next);
        }
        syms.cleanup();

        if next == ir {
            return next;
        }
        ir = next;
    }
}
