//! The core's own, narrow error taxonomy.
//!
//! Everything in here is a programming error: a pass invariant broke, an
//! opcode has no encoding, or a symbol meant to exist does not. There is no
//! recovery path -- the caller reconstructs the whole pipeline and tries
//! again, it does not resume a broken one. Callers upstream (parser, type
//! checker) never route their own diagnostics through this type; they exit
//! before IR construction starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// A pass visited a node whose shape contradicts an invariant it
    /// assumed, e.g. constant-folding a binary op whose operand isn't
    /// actually a propagatable constant.
    MalformedIr,
    /// A match over the opcode space had no arm for the combination of
    /// IR kind and result type it was given.
    UnsupportedOpcode,
    /// A pass asked to eliminate a TAC for a symbol that isn't present in
    /// the pass's output list.
    MissingSymbol,
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            CoreError::MalformedIr => "malformed IR",
            CoreError::UnsupportedOpcode => "unsupported opcode",
            CoreError::MissingSymbol => "missing symbol",
        };
        write!(f, "{msg}")
    }
}

impl std::error::Error for CoreError {}

/// Aborts the pipeline with `err`. Every call site here represents a bug in
/// an earlier stage, never a condition a caller can sensibly recover from.
#[cold]
#[inline(never)]
pub fn bug(err: CoreError, detail: impl std::fmt::Display) -> ! {
    panic!("{err}: {detail}");
}
