//! Table literal propagation.
//!
//! Folds a run of `TableSet` instructions back into the `ITable` literal
//! they originated from, whenever both the key and the value being set are
//! single-use constants. Runs unconditionally, even with `--no-opt`,
//! because without it every table literal in the source would otherwise
//! reach the emitter as a sequence of individual `TABLE_SET` instructions
//! instead of one interned constant.

use crate::ir::{IrNode, Syms, Tac};

use super::runner::PassRunner;

pub fn table_propagation(syms: &mut Syms, ir: Vec<Tac>) -> Vec<Tac> {
    let mut runner = PassRunner::new(syms);

    for tac in ir {
        match &tac.expr {
            IrNode::TableSet { table, key, value } => {
                let (table, key, value) = (*table, *key, *value);

                if !runner.is_propagatable(key) || !runner.is_propagatable(value) {
                    runner.emit(tac);
                    continue;
                }

                let key_const = runner.const_of(key);
                let val_const = runner.const_of(value);

                runner.syms.get_mut(key).propagate();
                runner.syms.get_mut(value).propagate();
                runner.syms.get_mut(table).propagate();

                runner.add_table_entry(table, key_const, val_const);

                runner.elim_if_dead(key);
                runner.elim_if_dead(value);
            }
            _ => runner.emit(tac),
        }
    }

    runner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use crate::ir::{ConstNode, IrBuilder};
    use crate::loc::Loc;
    use crate::ty::{StrEncoding, Type};

    fn loc() -> Loc {
        Loc::new(0, 1, 1)
    }

    #[test]
    fn duplicate_key_keeps_the_last_write() {
        let expr = Expr::Table {
            keys: vec![
                Expr::Str {
                    value: "a".into(),
                    encoding: StrEncoding::Ascii,
                    loc: loc(),
                },
                Expr::Str {
                    value: "b".into(),
                    encoding: StrEncoding::Ascii,
                    loc: loc(),
                },
                Expr::Str {
                    value: "a".into(),
                    encoding: StrEncoding::Ascii,
                    loc: loc(),
                },
            ],
            vals: vec![
                Expr::Int { value: 1, loc: loc() },
                Expr::Int { value: 2, loc: loc() },
                Expr::Int { value: 3, loc: loc() },
            ],
            loc: loc(),
            ty: Type::Table(Box::new(Type::Str(StrEncoding::Ascii)), Box::new(Type::Int)),
        };

        let (ir, mut syms) = IrBuilder::new().build(expr);
        let propagated = table_propagation(&mut syms, ir);

        let table = propagated
            .iter()
            .find_map(|tac| tac.expr.as_const())
            .expect("table literal survives propagation");

        match table {
            ConstNode::Table { keys, vals } => {
                assert_eq!(
                    keys,
                    &vec![
                        ConstNode::Str {
                            value: "a".into(),
                            encoding: StrEncoding::Ascii,
                            is_interned: false
                        },
                        ConstNode::Str {
                            value: "b".into(),
                            encoding: StrEncoding::Ascii,
                            is_interned: false
                        },
                    ]
                );
                assert_eq!(vals, &vec![ConstNode::Int(3), ConstNode::Int(2)]);
            }
            other => panic!("expected a table literal, got {other:?}"),
        }
    }
}
