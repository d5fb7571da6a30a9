//! The code emitter: walks the final TAC list once, interning constants
//! and instructions into a finished container.

use crate::error::{bug, CoreError};
use crate::ir::{ConstNode, IrNode, SymId, Syms, Tac};
use crate::reg::InterferenceGraph;

use super::constpool::Const;
use super::opcode::Opcode;

const MAGIC: [u8; 4] = [0xBA, 0xDB, 0xED, 0x00];
const SECTION_SEPARATOR: u8 = 0x1C;
const TRAILING_PADDING: [u8; 16] = [0xFF; 16];

pub struct Emitter {
    pool: Vec<Const>,
    const_header: Vec<u8>,
    debug: Vec<(u32, u32)>,
    last_line: Option<u32>,
    instr_bytes: Vec<u8>,
    /// Single-instruction window between the logical push and the byte
    /// stream. Always `None` between calls -- a placeholder for peephole
    /// rewrites that don't exist yet.
    peephole: Option<Vec<u8>>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Emitter {
            pool: Vec::new(),
            const_header: Vec::new(),
            debug: Vec::new(),
            last_line: None,
            instr_bytes: Vec::new(),
            peephole: None,
        }
    }

    /// Interns `candidate`, returning its pool index. Dedupes against
    /// existing entries by value (see `Const`'s `PartialEq`); only a
    /// genuinely new constant grows the header buffer.
    fn make_const(&mut self, candidate: Const) -> u32 {
        if let Some(pos) = self.pool.iter().position(|c| *c == candidate) {
            return pos as u32;
        }

        let id = self.pool.len() as u32;
        candidate.emit(&mut self.const_header);
        self.pool.push(candidate);
        id
    }

    fn push_instr(&mut self, opcode: Opcode, operands: &[u8]) {
        let mut bytes = Vec::with_capacity(1 + operands.len());
        bytes.push(opcode.raw());
        bytes.extend_from_slice(operands);
        self.peephole = Some(bytes);
        self.flush_peephole();
    }

    fn flush_peephole(&mut self) {
        if let Some(bytes) = self.peephole.take() {
            self.instr_bytes.extend_from_slice(&bytes);
        }
    }

    fn record_debug(&mut self, line: u32) {
        if self.last_line != Some(line) {
            self.debug.push((self.instr_bytes.len() as u32, line));
            self.last_line = Some(line);
        }
    }

    fn reg(&self, regs: &InterferenceGraph, sym: SymId) -> u8 {
        let r = regs.get_reg(sym);
        if r > u8::MAX as u32 {
            bug(CoreError::UnsupportedOpcode, "register index exceeds one byte");
        }
        r as u8
    }

    pub fn emit_program(&mut self, ir: &[Tac], syms: &Syms, regs: &InterferenceGraph) {
        let _ = syms;
        for tac in ir {
            self.record_debug(tac.loc.line);
            self.emit_tac(tac, regs);
        }
    }

    fn emit_tac(&mut self, tac: &Tac, regs: &InterferenceGraph) {
        match &tac.expr {
            IrNode::Const(c) => self.emit_const(tac.sym, c, regs),
            IrNode::UnOp { op, operand, .. } => {
                let opcode = Opcode::for_un_op(*op);
                let dest = self.reg(regs, tac.sym);
                let operand_reg = self.reg(regs, *operand);
                self.push_instr(opcode, &[dest, operand_reg]);
            }
            IrNode::BinOp { left, op, right, .. } => {
                let opcode = Opcode::for_bin_op(*op);
                let dest = self.reg(regs, tac.sym);
                let left_reg = self.reg(regs, *left);
                let right_reg = self.reg(regs, *right);
                self.push_instr(opcode, &[dest, left_reg, right_reg]);
            }
            IrNode::Concat {
                left,
                right,
                left_ascii,
                right_ascii,
            } => {
                let opcode = if *left_ascii && *right_ascii {
                    Opcode::Concat
                } else {
                    Opcode::UConcat
                };
                let dest = self.reg(regs, tac.sym);
                let left_reg = self.reg(regs, *left);
                let right_reg = self.reg(regs, *right);
                self.push_instr(opcode, &[dest, left_reg, right_reg]);
            }
            IrNode::TableSet { table, key, value } => {
                let table_reg = self.reg(regs, *table);
                let key_reg = self.reg(regs, *key);
                let val_reg = self.reg(regs, *value);
                self.push_instr(Opcode::TableSet, &[table_reg, key_reg, val_reg]);
            }
            IrNode::TableGet { table, key, .. } => {
                let dest = self.reg(regs, tac.sym);
                let table_reg = self.reg(regs, *table);
                let key_reg = self.reg(regs, *key);
                self.push_instr(Opcode::TableGet, &[dest, table_reg, key_reg]);
            }
            IrNode::Ret(sym) => {
                let reg = self.reg(regs, *sym);
                self.push_instr(Opcode::Ret, &[reg]);
            }
        }
    }

    fn emit_const(&mut self, dest_sym: SymId, value: &ConstNode, regs: &InterferenceGraph) {
        let dest = self.reg(regs, dest_sym);

        match value {
            ConstNode::Int(0) => self.push_instr(Opcode::Zero, &[dest]),
            ConstNode::Int(1) => self.push_instr(Opcode::One, &[dest]),
            ConstNode::Int(-1) => self.push_instr(Opcode::MinusOne, &[dest]),
            ConstNode::Int(v) => {
                let idx = self.make_const(Const::Num(*v as f64));
                self.push_instr(Opcode::Const, &[dest, idx as u8]);
            }
            ConstNode::Float(v) => {
                let idx = self.make_const(Const::Num(*v));
                self.push_instr(Opcode::Const, &[dest, idx as u8]);
            }
            ConstNode::Bool(true) => self.push_instr(Opcode::True, &[dest]),
            ConstNode::Bool(false) => self.push_instr(Opcode::False, &[dest]),
            ConstNode::Nil => self.push_instr(Opcode::Nil, &[dest]),
            ConstNode::Str {
                value,
                encoding,
                is_interned,
            } => {
                let idx = self.make_const(Const::StrLit {
                    encoding: *encoding,
                    value: value.clone(),
                    is_interned: *is_interned,
                });
                self.push_instr(Opcode::Const, &[dest, idx as u8]);
            }
            ConstNode::Table { keys, vals } => {
                if keys.is_empty() {
                    self.push_instr(Opcode::TableNew, &[dest]);
                    return;
                }

                let entries = interleave(keys, vals);
                let idx = self.make_const(Const::TableLit { entries });
                self.push_instr(Opcode::Const, &[dest, idx as u8]);
            }
        }
    }

    /// Writes the finished container: magic, constant pool, debug
    /// section, instruction stream, trailing padding.
    pub fn finalize(self, source_path: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.const_header);
        out.push(SECTION_SEPARATOR);

        let mut debug_bytes = Vec::new();
        debug_bytes.extend_from_slice(&(source_path.len() as u16).to_le_bytes());
        debug_bytes.extend_from_slice(source_path.as_bytes());
        for (offset, line) in &self.debug {
            debug_bytes.extend_from_slice(&offset.to_le_bytes());
            debug_bytes.extend_from_slice(&line.to_le_bytes());
        }
        out.extend_from_slice(&(debug_bytes.len() as u16).to_le_bytes());
        out.extend_from_slice(&debug_bytes);

        out.push(SECTION_SEPARATOR);
        out.extend_from_slice(&self.instr_bytes);
        out.extend_from_slice(&TRAILING_PADDING);

        out
    }
}

fn const_node_to_const(c: &ConstNode) -> Const {
    match c {
        ConstNode::Int(v) => Const::Num(*v as f64),
        ConstNode::Float(v) => Const::Num(*v),
        ConstNode::Bool(b) => Const::BoolLit(*b),
        ConstNode::Nil => Const::NilLit,
        ConstNode::Str {
            value,
            encoding,
            is_interned,
        } => Const::StrLit {
            encoding: *encoding,
            value: value.clone(),
            is_interned: *is_interned,
        },
        ConstNode::Table { keys, vals } => Const::TableLit {
            entries: interleave(keys, vals),
        },
    }
}

fn interleave(keys: &[ConstNode], vals: &[ConstNode]) -> Vec<Const> {
    keys.iter()
        .zip(vals.iter())
        .flat_map(|(k, v)| [const_node_to_const(k), const_node_to_const(v)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;
    use crate::ir::IrBuilder;
    use crate::loc::Loc;
    use crate::opt;
    use crate::ty::Type;

    fn loc() -> Loc {
        Loc::new(0, 1, 1)
    }

    fn compiled(expr: Expr, fold: bool) -> Vec<u8> {
        let (ir, mut syms) = IrBuilder::new().build(expr);
        let ir = opt::optimize(&mut syms, ir, fold);
        crate::bytecode::emit(&ir, &syms, "test.neve")
    }

    #[test]
    fn container_starts_with_the_exact_magic_bytes() {
        let bytes = compiled(Expr::Int { value: 0, loc: loc() }, true);
        assert_eq!(&bytes[..4], &[0xBA, 0xDB, 0xED, 0x00]);
    }

    #[test]
    fn container_ends_with_sixteen_0xff_bytes() {
        let bytes = compiled(Expr::Int { value: 0, loc: loc() }, true);
        assert_eq!(&bytes[bytes.len() - 16..], &[0xFF; 16]);
    }

    #[test]
    fn folded_arithmetic_uses_one_const_and_one_ret() {
        let expr = Expr::BinOp {
            left: Box::new(Expr::Int { value: 1, loc: loc() }),
            op: crate::ops::BinOp::Add,
            right: Box::new(Expr::BinOp {
                left: Box::new(Expr::Int { value: 2, loc: loc() }),
                op: crate::ops::BinOp::Mul,
                right: Box::new(Expr::Int { value: 3, loc: loc() }),
                loc: loc(),
                ty: Type::Int,
            }),
            loc: loc(),
            ty: Type::Int,
        };
        let bytes = compiled(expr, true);

        // magic(4) + Num(7.0) = tag(1) + f64(8) = 9 bytes, then separator.
        assert_eq!(bytes[4], 0); // VAL_NUM
        assert_eq!(f64::from_le_bytes(bytes[5..13].try_into().unwrap()), 7.0);
        assert_eq!(bytes[13], 0x1C);

        // CONST dest,idx (3 bytes) then RET reg (2 bytes), right before the
        // fixed 16-byte trailing pad -- found from the back so a stray
        // 0x1C inside an earlier section's payload can't confuse the scan.
        let instr_start = bytes.len() - 16 - 5;
        assert_eq!(bytes[instr_start], Opcode::Const.raw());
        assert_eq!(bytes[instr_start + 3], Opcode::Ret.raw());
    }

    #[test]
    fn empty_table_emits_table_new_then_ret_with_no_constants() {
        let expr = Expr::Table {
            keys: Vec::new(),
            vals: Vec::new(),
            loc: loc(),
            ty: Type::Table(Box::new(Type::Nil), Box::new(Type::Nil)),
        };
        let bytes = compiled(expr, true);

        assert_eq!(bytes[4], 0x1C); // empty pool, separator right after magic

        // TABLE_NEW dest (2 bytes) then RET reg (2 bytes).
        let instr_start = bytes.len() - 16 - 4;
        assert_eq!(bytes[instr_start], Opcode::TableNew.raw());
        assert_eq!(bytes[instr_start + 2], Opcode::Ret.raw());
    }
}
