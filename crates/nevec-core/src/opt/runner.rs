//! Shared bookkeeping for a single pass over the TAC list: an output
//! accumulator plus the two helpers every pass leans on.

use crate::error::{bug, CoreError};
use crate::ir::{ConstNode, IrNode, Sym, SymId, Syms, Tac};

pub struct PassRunner<'s> {
    pub syms: &'s mut Syms,
    opts: Vec<Tac>,
}

impl<'s> PassRunner<'s> {
    pub fn new(syms: &'s mut Syms) -> Self {
        PassRunner {
            syms,
            opts: Vec::new(),
        }
    }

    pub fn emit(&mut self, tac: Tac) {
        self.opts.push(tac);
    }

    pub fn finish(self) -> Vec<Tac> {
        self.opts
    }

    fn find(&self, sym: SymId) -> Option<usize> {
        self.opts.iter().position(|t| t.sym == sym)
    }

    /// An operand is propagatable when whatever currently defines it (in
    /// this pass's output so far) is a literal and nothing besides the
    /// caller still reads it.
    pub fn is_propagatable(&self, operand: SymId) -> bool {
        match self.find(operand) {
            Some(i) => {
                matches!(self.opts[i].expr, IrNode::Const(_)) && self.syms.get(operand).uses <= 1
            }
            None => false,
        }
    }

    pub fn sym(&self, id: SymId) -> &Sym {
        self.syms.get(id)
    }

    /// The constant currently defining `sym`. Panics if `sym`'s defining
    /// TAC isn't in this pass's output or isn't a constant -- callers only
    /// reach this after `is_propagatable` confirmed both.
    pub fn const_of(&self, sym: SymId) -> ConstNode {
        let index = self.find(sym).unwrap_or_else(|| {
            bug(
                CoreError::MissingSymbol,
                format!("no TAC defines {}", self.syms.get(sym).full_name()),
            )
        });
        self.opts[index]
            .expr
            .as_const()
            .unwrap_or_else(|| bug(CoreError::MalformedIr, "operand is not a constant"))
            .clone()
    }

    /// Merges `(key, val)` into the table literal defining `table`. A key
    /// already present keeps its original position and takes the new
    /// value (last write wins, but doesn't reorder); a new key is
    /// appended.
    pub fn add_table_entry(&mut self, table: SymId, key: ConstNode, val: ConstNode) {
        let index = self.find(table).unwrap_or_else(|| {
            bug(
                CoreError::MissingSymbol,
                format!("no TAC defines {}", self.syms.get(table).full_name()),
            )
        });

        match &mut self.opts[index].expr {
            IrNode::Const(ConstNode::Table { keys, vals }) => {
                match keys.iter().position(|k| *k == key) {
                    Some(pos) => vals[pos] = val,
                    None => {
                        keys.push(key);
                        vals.push(val);
                    }
                }
            }
            _ => bug(CoreError::MalformedIr, "table operand is not a table literal"),
        }
    }

    /// Drops `sym`'s defining TAC from the output once nothing references
    /// it anymore, lending its numeric index to the next same-named symbol
    /// so the final renumbering stays dense.
    pub fn elim_if_dead(&mut self, sym: SymId) {
        if self.syms.get(sym).uses > 0 {
            return;
        }

        let lend_to = self.syms.next_after(sym);

        let index = self.find(sym).unwrap_or_else(|| {
            bug(
                CoreError::MissingSymbol,
                format!("no TAC defines {}", self.syms.get(sym).full_name()),
            )
        });
        self.opts.remove(index);

        if let Some(lend_to) = lend_to {
            self.syms.lend_index(lend_to, sym);
        }
    }
}
