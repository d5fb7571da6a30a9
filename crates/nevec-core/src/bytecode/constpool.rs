//! Constant pool entries and their wire encoding.

use crate::ty::StrEncoding;

#[derive(Debug, Clone)]
pub enum Const {
    Num(f64),
    BoolLit(bool),
    NilLit,
    /// Present for ABI completeness; no IR path in this implementation
    /// ever constructs one.
    Empty,
    StrLit {
        encoding: StrEncoding,
        value: String,
        is_interned: bool,
    },
    TableLit {
        /// Flattened `[key0, val0, key1, val1, ...]`.
        entries: Vec<Const>,
    },
}

/// Two constants are equal when their kind and value match -- for
/// `StrLit`, only the decoded string is compared, not its encoding or
/// interned flag, so that `make_const` dedupes an ASCII and a UTF-8
/// constant holding the same text.
impl PartialEq for Const {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Const::Num(a), Const::Num(b)) => a == b,
            (Const::BoolLit(a), Const::BoolLit(b)) => a == b,
            (Const::NilLit, Const::NilLit) => true,
            (Const::Empty, Const::Empty) => true,
            (Const::StrLit { value: a, .. }, Const::StrLit { value: b, .. }) => a == b,
            (Const::TableLit { entries: a }, Const::TableLit { entries: b }) => a == b,
            _ => false,
        }
    }
}

const VAL_NUM: u8 = 0;
const VAL_BOOL: u8 = 1;
const VAL_NIL: u8 = 2;
const VAL_OBJ: u8 = 3;
const VAL_EMPTY: u8 = 4;

const OBJ_STR: u8 = 0;
const OBJ_USTR: u8 = 1;
const OBJ_TABLE: u8 = 2;

const ENC_UTF8: u8 = 0;
const ENC_UTF16: u8 = 1;
const ENC_UTF32: u8 = 2;

impl Const {
    pub fn emit(&self, out: &mut Vec<u8>) {
        match self {
            Const::Num(v) => {
                out.push(VAL_NUM);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Const::BoolLit(b) => {
                out.push(VAL_BOOL);
                out.push(*b as u8);
            }
            Const::NilLit => out.push(VAL_NIL),
            Const::Empty => out.push(VAL_EMPTY),
            Const::StrLit {
                encoding,
                value,
                is_interned,
            } => Self::emit_str(out, *encoding, value, *is_interned),
            Const::TableLit { entries } => {
                out.push(VAL_OBJ);
                out.push(OBJ_TABLE);
                out.extend_from_slice(&((entries.len() / 2) as u32).to_le_bytes());
                for entry in entries {
                    entry.emit(out);
                }
            }
        }
    }

    fn emit_str(out: &mut Vec<u8>, encoding: StrEncoding, value: &str, is_interned: bool) {
        out.push(VAL_OBJ);

        if encoding == StrEncoding::Ascii {
            out.push(OBJ_STR);
            out.extend_from_slice(&(value.chars().count() as u32).to_le_bytes());
            out.extend_from_slice(value.as_bytes());
            out.push(is_interned as u8);
            return;
        }

        out.push(OBJ_USTR);

        let (enc_tag, payload) = match encoding {
            StrEncoding::Utf8 => (ENC_UTF8, value.as_bytes().to_vec()),
            StrEncoding::Utf16 => {
                let units: Vec<u8> = value.encode_utf16().flat_map(u16::to_le_bytes).collect();
                (ENC_UTF16, units)
            }
            StrEncoding::Utf32 => {
                let units: Vec<u8> = value
                    .chars()
                    .flat_map(|c| (c as u32).to_le_bytes())
                    .collect();
                (ENC_UTF32, units)
            }
            StrEncoding::Ascii => unreachable!("handled above"),
        };

        out.push(enc_tag);
        out.extend_from_slice(&(value.chars().count() as u32).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&payload);
        out.push(is_interned as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_lit_equality_ignores_encoding_and_interned_flag() {
        let a = Const::StrLit {
            encoding: StrEncoding::Ascii,
            value: "hi".into(),
            is_interned: false,
        };
        let b = Const::StrLit {
            encoding: StrEncoding::Utf8,
            value: "hi".into(),
            is_interned: true,
        };
        assert_eq!(a, b);
    }

    #[test]
    fn table_lit_equality_is_recursive() {
        let a = Const::TableLit {
            entries: vec![Const::Num(1.0), Const::BoolLit(true)],
        };
        let b = Const::TableLit {
            entries: vec![Const::Num(1.0), Const::BoolLit(true)],
        };
        let c = Const::TableLit {
            entries: vec![Const::Num(2.0), Const::BoolLit(true)],
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn num_emits_tag_then_eight_le_bytes() {
        let mut out = Vec::new();
        Const::Num(7.0).emit(&mut out);
        assert_eq!(out[0], VAL_NUM);
        assert_eq!(&out[1..9], &7.0f64.to_le_bytes());
        assert_eq!(out.len(), 9);
    }

    #[test]
    fn ascii_str_emits_obj_str_with_char_count_prefix() {
        let mut out = Vec::new();
        Const::StrLit {
            encoding: StrEncoding::Ascii,
            value: "hi".into(),
            is_interned: true,
        }
        .emit(&mut out);

        assert_eq!(out[0], VAL_OBJ);
        assert_eq!(out[1], OBJ_STR);
        assert_eq!(u32::from_le_bytes(out[2..6].try_into().unwrap()), 2);
        assert_eq!(&out[6..8], b"hi");
        assert_eq!(out[8], 1);
    }
}
