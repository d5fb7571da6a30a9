//! Disassembles a `.geada` container back into a human-readable listing.
//! Grounded on the bit-exact layout `nevec-core::bytecode` emits: this
//! reads the same magic, section separators and tag bytes, just in
//! reverse.

use std::env;
use std::fs;
use std::process::ExitCode;

const MAGIC: [u8; 4] = [0xBA, 0xDB, 0xED, 0x00];
const SECTION_SEPARATOR: u8 = 0x1C;

const MNEMONICS: &[&str] = &[
    "CONST",
    "CONST_LONG",
    "TRUE",
    "FALSE",
    "NIL",
    "ZERO",
    "ONE",
    "MINUS_ONE",
    "NEG",
    "NOT",
    "IS_NIL",
    "IS_NOT_NIL",
    "IS_ZERO",
    "SHOW",
    "ADD",
    "SUB",
    "MUL",
    "DIV",
    "SHL",
    "SHR",
    "BIT_AND",
    "BIT_XOR",
    "BIT_OR",
    "NEQ",
    "EQ",
    "GT",
    "LT",
    "GTE",
    "LTE",
    "CONCAT",
    "UCONCAT",
    "TABLE_NEW",
    "TABLE_SET",
    "TABLE_GET",
    "RET",
];

/// Operand count for each opcode, indexed the same way as `MNEMONICS`.
/// `TABLE_SET` takes three operands but has no destination register;
/// everything else with three operands is `dest, left, right`.
fn operand_count(raw: u8) -> usize {
    match raw {
        0 => 2,                    // CONST dest, idx
        1 => 2,                    // CONST_LONG dest, idx (never emitted)
        2..=7 => 1,                // TRUE, FALSE, NIL, ZERO, ONE, MINUS_ONE
        8..=13 => 2,                // NEG..SHOW
        14..=30 => 3,               // ADD..UCONCAT
        31 => 1,                    // TABLE_NEW
        32..=33 => 3,                // TABLE_SET, TABLE_GET
        34 => 1,                     // RET
        _ => 0,
    }
}

fn main() -> ExitCode {
    let path = match env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("usage: nevec-dump <file.geada>");
            return ExitCode::FAILURE;
        }
    };

    let bytes = match fs::read(&path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("nevec-dump: couldn't read '{path}': {e}");
            return ExitCode::FAILURE;
        }
    };

    match dump(&bytes) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("nevec-dump: {msg}");
            ExitCode::FAILURE
        }
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn u8(&mut self) -> Result<u8, String> {
        let b = *self.bytes.get(self.pos).ok_or("unexpected end of file")?;
        self.pos += 1;
        Ok(b)
    }

    fn bytes_n(&mut self, n: usize) -> Result<&'a [u8], String> {
        let slice = self
            .bytes
            .get(self.pos..self.pos + n)
            .ok_or("unexpected end of file")?;
        self.pos += n;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, String> {
        let b = self.bytes_n(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, String> {
        let b = self.bytes_n(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f64(&mut self) -> Result<f64, String> {
        let b = self.bytes_n(8)?;
        Ok(f64::from_le_bytes(b.try_into().unwrap()))
    }
}

/// Decodes one `Const.emit()` entry, printing it indented under `depth`.
fn decode_const(c: &mut Cursor, depth: usize, index: &mut u32) -> Result<(), String> {
    let pad = "  ".repeat(depth);
    let tag = c.u8()?;

    match tag {
        0 => {
            let v = c.f64()?;
            println!("{pad}[{index}] NUM {v}");
        }
        1 => {
            let v = c.u8()?;
            println!("{pad}[{index}] BOOL {}", v != 0);
        }
        2 => println!("{pad}[{index}] NIL"),
        3 => {
            let obj_tag = c.u8()?;
            match obj_tag {
                0 => {
                    let len = c.u32()?;
                    let bytes = c.bytes_n(len as usize)?;
                    let interned = c.u8()? != 0;
                    println!(
                        "{pad}[{index}] STR {:?} (interned={interned})",
                        String::from_utf8_lossy(bytes)
                    );
                }
                1 => {
                    let enc = match c.u8()? {
                        0 => "UTF8",
                        1 => "UTF16",
                        2 => "UTF32",
                        other => return Err(format!("unknown string encoding tag {other}")),
                    };
                    let char_count = c.u32()?;
                    let byte_len = c.u32()?;
                    let _payload = c.bytes_n(byte_len as usize)?;
                    let interned = c.u8()? != 0;
                    println!(
                        "{pad}[{index}] USTR {enc} chars={char_count} bytes={byte_len} (interned={interned})"
                    );
                }
                2 => {
                    let entries = c.u32()?;
                    println!("{pad}[{index}] TABLE entries={entries}");
                    for _ in 0..entries {
                        let mut key_index = 0;
                        let mut val_index = 0;
                        decode_const(c, depth + 1, &mut key_index)?;
                        decode_const(c, depth + 1, &mut val_index)?;
                    }
                }
                other => return Err(format!("unknown object sub-tag {other}")),
            }
        }
        4 => println!("{pad}[{index}] EMPTY"),
        other => return Err(format!("unknown constant tag {other}")),
    }

    *index += 1;
    Ok(())
}

fn dump(bytes: &[u8]) -> Result<(), String> {
    let mut c = Cursor::new(bytes);

    if c.bytes_n(4)? != MAGIC {
        return Err("bad magic number".to_owned());
    }

    println!("=== constant pool ===");
    let mut index = 0;
    loop {
        if c.bytes.get(c.pos) == Some(&SECTION_SEPARATOR) {
            break;
        }
        decode_const(&mut c, 0, &mut index)?;
    }
    if index == 0 {
        println!("(empty)");
    }
    c.u8()?; // separator

    println!("\n=== debug info ===");
    let debug_len = c.u16()? as usize;
    let debug_bytes = c.bytes_n(debug_len)?;
    let mut d = Cursor::new(debug_bytes);
    let path_len = d.u16()? as usize;
    let path = String::from_utf8_lossy(d.bytes_n(path_len)?).into_owned();
    println!("source: {path}");
    while d.pos < debug_bytes.len() {
        let offset = d.u32()?;
        let line = d.u32()?;
        println!("  instr {offset} -> line {line}");
    }
    c.u8()?; // separator

    println!("\n=== instructions ===");
    let mut pc = 0usize;
    while c.pos + 16 < bytes.len() {
        let start = c.pos;
        let raw = c.u8()?;
        let mnemonic = MNEMONICS.get(raw as usize).copied().unwrap_or("???");
        let n = operand_count(raw);
        let mut operands = Vec::with_capacity(n);
        for _ in 0..n {
            operands.push(c.u8()?.to_string());
        }
        println!("{pc:>4} {:04x}: {mnemonic:<10} {}", start, operands.join(", "));
        pc += 1;
    }

    Ok(())
}
