//! End-to-end checks driving the whole pipeline through real source text,
//! using `nevec-syntax` as the front end `nevec-core` was always meant to
//! sit behind.

fn compile(source: &str) -> Vec<u8> {
    let program = nevec_syntax::parse(source).expect("source parses");
    assert!(
        !program.expr.contains_unknown(),
        "source type-checks cleanly"
    );
    nevec_core::compile(program, true, "pipeline.neve")
}

const MAGIC: [u8; 4] = [0xBA, 0xDB, 0xED, 0x00];

#[test]
fn arithmetic_folds_to_a_single_constant() {
    let bytes = compile("1 + 2 * 3");

    assert_eq!(&bytes[..4], &MAGIC);
    assert_eq!(bytes[4], 0); // VAL_NUM tag
    assert_eq!(f64::from_le_bytes(bytes[5..13].try_into().unwrap()), 7.0);
    assert_eq!(bytes[13], 0x1C); // no further constants
}

#[test]
fn empty_table_has_no_constants() {
    let bytes = compile("[:]");

    assert_eq!(bytes[4], 0x1C); // empty constant pool
}

#[test]
fn string_concat_folds_to_one_literal() {
    let bytes = compile(r#""Hello, " ++ "world!""#);

    assert_eq!(bytes[4], 3); // VAL_OBJ
    assert_eq!(bytes[5], 0); // OBJ_STR
    let len = u32::from_le_bytes(bytes[6..10].try_into().unwrap()) as usize;
    assert_eq!(&bytes[10..10 + len], b"Hello, world!");
}

#[test]
fn double_negation_cancels_out() {
    let bytes = compile("-(-5)");

    assert_eq!(bytes[4], 0); // VAL_NUM
    assert_eq!(f64::from_le_bytes(bytes[5..13].try_into().unwrap()), 5.0);
    assert_eq!(bytes[13], 0x1C);
}

#[test]
fn show_postfix_stringifies_its_operand() {
    let bytes = compile("5.show");

    assert_eq!(bytes[4], 3); // VAL_OBJ
    assert_eq!(bytes[5], 0); // OBJ_STR
    let len = u32::from_le_bytes(bytes[6..10].try_into().unwrap()) as usize;
    assert_eq!(&bytes[10..10 + len], b"5");
}

#[test]
fn no_opt_skips_constant_folding() {
    let program = nevec_syntax::parse("1 + 2").unwrap();
    let bytes = nevec_core::compile(program, false, "pipeline.neve");

    // Without folding, `2` (not one of the ZERO/ONE/MINUS_ONE specials)
    // still needs its own pool entry, and the ADD runs at load time
    // instead of collapsing to a single constant.
    assert_eq!(bytes[4], 0); // VAL_NUM
    assert_eq!(f64::from_le_bytes(bytes[5..13].try_into().unwrap()), 2.0);
}
