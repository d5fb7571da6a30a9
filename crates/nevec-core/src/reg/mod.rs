//! Liveness-based register allocation: build an interference graph over
//! the final symbol set, then color it greedily.

use ahash::AHashMap;

use crate::error::{bug, CoreError};
use crate::ir::{SymId, Syms};

struct Vertex {
    adjacent: Vec<usize>,
    reg: i64,
}

/// An undirected graph whose vertices are symbols and whose edges connect
/// any two symbols with overlapping lifetimes. Built once, after
/// optimization finishes mutating the symbol table, and read-only
/// thereafter.
pub struct InterferenceGraph {
    vertices: Vec<Vertex>,
    index: AHashMap<SymId, usize>,
}

impl InterferenceGraph {
    pub fn build(syms: &Syms) -> Self {
        let live: Vec<(SymId, crate::ir::Lifetime)> = syms
            .values()
            .map(|(id, sym)| {
                let lifetime = sym.lifetime.unwrap_or_else(|| {
                    bug(
                        CoreError::MalformedIr,
                        format!("{} reached register allocation with no lifetime", sym.full_name()),
                    )
                });
                (id, lifetime)
            })
            .collect();

        let mut vertices: Vec<Vertex> = live
            .iter()
            .map(|_| Vertex {
                adjacent: Vec::new(),
                reg: -1,
            })
            .collect();

        let index: AHashMap<SymId, usize> = live
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (*id, i))
            .collect();

        for i in 0..live.len() {
            for j in (i + 1)..live.len() {
                if live[i].1.intersects(&live[j].1) {
                    vertices[i].adjacent.push(j);
                    vertices[j].adjacent.push(i);
                }
            }
        }

        for i in 0..vertices.len() {
            let unavailable: Vec<i64> = vertices[i]
                .adjacent
                .iter()
                .map(|&a| vertices[a].reg)
                .collect();

            let mut reg = 0i64;
            while unavailable.contains(&reg) {
                reg += 1;
            }
            vertices[i].reg = reg;
        }

        InterferenceGraph { vertices, index }
    }

    pub fn get_reg(&self, sym: SymId) -> u32 {
        let i = *self
            .index
            .get(&sym)
            .unwrap_or_else(|| bug(CoreError::MissingSymbol, "symbol not present in interference graph"));
        self.vertices[i].reg as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Lifetime, Moment, SymValue};

    fn with_lifetime(syms: &mut Syms, first: Moment, last: Moment) -> SymId {
        let id = syms.new_sym(first, "t", Some(SymValue::Int(0)));
        syms.get_mut(id).lifetime = Some(Lifetime { first, last });
        id
    }

    #[test]
    fn disjoint_lifetimes_share_a_register() {
        let mut syms = Syms::new();
        let a = with_lifetime(&mut syms, 0, 1);
        let b = with_lifetime(&mut syms, 2, 3);

        let graph = InterferenceGraph::build(&syms);
        assert_eq!(graph.get_reg(a), graph.get_reg(b));
    }

    #[test]
    fn overlapping_lifetimes_get_distinct_registers() {
        let mut syms = Syms::new();
        let a = with_lifetime(&mut syms, 0, 3);
        let b = with_lifetime(&mut syms, 1, 2);

        let graph = InterferenceGraph::build(&syms);
        assert_ne!(graph.get_reg(a), graph.get_reg(b));
    }
}
