//! The symbol table: every SSA-defined value gets exactly one [`Sym`] here,
//! looked up by handle ([`SymId`]) rather than by pointer, so that deleting
//! the `Tac` that defines a symbol never leaves a dangling reference behind
//! in whatever else still names that symbol as an operand.

use ahash::AHashMap;
use smol_str::SmolStr;

/// Monotonic index of a `Tac` within the IR list; the moment a symbol was
/// born, and the coordinate liveness analysis walks.
pub type Moment = u32;

/// Opaque handle into a [`Syms`] table. Stable across renumbering --
/// `cleanup` rewrites a symbol's name and index in place but never moves it
/// to a different slot, so every `SymId` any `Tac` holds stays valid for as
/// long as the symbol itself survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum SymValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    pub first: Moment,
    pub last: Moment,
}

impl Lifetime {
    /// Strict overlap: two lifetimes that merely touch at an endpoint do
    /// not interfere.
    pub fn intersects(&self, other: &Lifetime) -> bool {
        other.first < self.last && other.last > self.first
    }
}

#[derive(Debug, Clone)]
pub struct Sym {
    pub name: SmolStr,
    pub index: u32,
    pub first: Moment,
    pub value: Option<SymValue>,
    pub uses: u32,
    pub lifetime: Option<Lifetime>,
    full_name: SmolStr,
}

impl Sym {
    fn compute_full_name(name: &str, index: u32) -> SmolStr {
        SmolStr::new(format!("{name}{index}"))
    }

    pub fn full_name(&self) -> &SmolStr {
        &self.full_name
    }

    /// Records that this symbol is read at `last`, bumping its use count
    /// and widening its lifetime to cover that moment.
    pub fn last_used(&mut self, last: Moment) {
        self.uses += 1;
        self.lifetime = Some(Lifetime {
            first: self.first,
            last,
        });
    }

    /// Undoes one `last_used` call: an optimization removed a reference
    /// that used to count towards this symbol's use count.
    pub fn propagate(&mut self) {
        self.uses = self.uses.saturating_sub(1);
    }

    fn rename(&mut self, after_index: i64) {
        self.index = (after_index + 1) as u32;
        self.full_name = Self::compute_full_name(&self.name, self.index);
    }
}

/// A monotonically growing registry of IR symbols.
///
/// Symbols are only ever appended; `cleanup` tombstones dead ones in place
/// rather than physically removing them, which is what lets every `SymId`
/// issued before a cleanup stay meaningful afterwards.
#[derive(Debug, Default)]
pub struct Syms {
    syms: Vec<Option<Sym>>,
    by_full_name: AHashMap<SmolStr, SymId>,
}

impl Syms {
    pub fn new() -> Self {
        Syms {
            syms: Vec::new(),
            by_full_name: AHashMap::new(),
        }
    }

    /// Allocates a symbol with the smallest unused index for `name`,
    /// starting from 0.
    pub fn new_sym(&mut self, moment: Moment, name: &str, value: Option<SymValue>) -> SymId {
        let mut index = 0u32;
        loop {
            let candidate = Sym::compute_full_name(name, index);
            if !self.by_full_name.contains_key(&candidate) {
                break;
            }
            index += 1;
        }

        let full_name = Sym::compute_full_name(name, index);
        let sym = Sym {
            name: SmolStr::new(name),
            index,
            first: moment,
            value,
            uses: 0,
            lifetime: None,
            full_name: full_name.clone(),
        };

        let id = SymId(self.syms.len());
        self.by_full_name.insert(full_name, id);
        self.syms.push(Some(sym));
        id
    }

    pub fn get(&self, id: SymId) -> &Sym {
        self.syms[id.0]
            .as_ref()
            .expect("SymId referenced a tombstoned symbol")
    }

    pub fn get_mut(&mut self, id: SymId) -> &mut Sym {
        self.syms[id.0]
            .as_mut()
            .expect("SymId referenced a tombstoned symbol")
    }

    /// Looks up the symbol with the same base name and `index + 1`, if any
    /// -- used to lend a just-eliminated symbol's index to its successor so
    /// that numbering stays dense without a full renumbering pass.
    pub fn next_after(&self, id: SymId) -> Option<SymId> {
        let sym = self.get(id);
        let candidate = Sym::compute_full_name(&sym.name, sym.index + 1);
        self.by_full_name.get(&candidate).copied()
    }

    /// Lends the numeric index of the symbol just eliminated (`from`) to
    /// `to`, so a pass that deletes a TAC mid-cycle doesn't leave a gap
    /// for `Syms::cleanup` to worry about. Used by `elim_if_dead`, distinct
    /// from `cleanup`'s own global renumbering.
    pub fn lend_index(&mut self, to: SymId, from: SymId) {
        let after_index = self.get(from).index;
        let full_name = self.get(to).full_name.clone();
        self.by_full_name.remove(&full_name);

        let sym = self.get_mut(to);
        sym.rename(after_index as i64);

        let new_name = sym.full_name.clone();
        self.by_full_name.insert(new_name, to);
    }

    /// Drops symbols with zero remaining uses and renumbers the survivors
    /// so each base name's indices form a contiguous range starting at 0,
    /// in original relative order.
    pub fn cleanup(&mut self) {
        let mut next_index: AHashMap<SmolStr, i64> = AHashMap::new();
        self.by_full_name.clear();

        for slot in self.syms.iter_mut() {
            let keep = matches!(slot, Some(sym) if sym.uses > 0);
            if !keep {
                *slot = None;
                continue;
            }

            let sym = slot.as_mut().unwrap();
            let after = *next_index.get(&sym.name).unwrap_or(&-1);
            sym.rename(after);
            next_index.insert(sym.name.clone(), sym.index as i64);
        }

        for (i, slot) in self.syms.iter().enumerate() {
            if let Some(sym) = slot {
                self.by_full_name.insert(sym.full_name.clone(), SymId(i));
            }
        }
    }

    /// Live symbols in original creation order.
    pub fn values(&self) -> impl Iterator<Item = (SymId, &Sym)> {
        self.syms
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (SymId(i), s)))
    }

    pub fn len(&self) -> usize {
        self.values().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sym_picks_smallest_unused_index() {
        let mut syms = Syms::new();
        let t0 = syms.new_sym(0, "t", None);
        let t1 = syms.new_sym(1, "t", None);
        assert_eq!(syms.get(t0).index, 0);
        assert_eq!(syms.get(t1).index, 1);
        assert_ne!(t0, t1);
    }

    #[test]
    fn cleanup_drops_unused_and_renumbers_survivors() {
        let mut syms = Syms::new();
        let dead = syms.new_sym(0, "t", Some(SymValue::Int(1)));
        let live = syms.new_sym(1, "t", Some(SymValue::Int(2)));
        syms.get_mut(live).last_used(2);

        syms.cleanup();

        assert_eq!(syms.len(), 1);
        assert_eq!(syms.get(live).index, 0);
        assert_eq!(syms.get(live).full_name(), "t0");
        let _ = dead;
    }

    #[test]
    fn lifetime_intersects_is_strict_at_endpoints() {
        let a = Lifetime { first: 0, last: 2 };
        let b = Lifetime { first: 2, last: 4 };
        assert!(!a.intersects(&b));

        let c = Lifetime { first: 1, last: 3 };
        assert!(a.intersects(&c));
    }
}
