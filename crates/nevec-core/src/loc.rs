//! Source location tracking.
//!
//! A [`Loc`] pins an AST or IR node to a span of source text. `col`/`length`
//! count UTF-8 scalar positions; `true_col`/`true_length` count display
//! cells, so a location spanning a double-width character reports a
//! `true_length` of 2 while `length` stays 1.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub col: u32,
    pub line: u32,
    pub length: u32,
    pub true_col: u32,
    pub true_length: u32,
    pub on_multiple_lines: bool,
}

impl Loc {
    pub fn new(col: u32, line: u32, length: u32) -> Self {
        Loc {
            col,
            line,
            length,
            true_col: col,
            true_length: length,
            on_multiple_lines: false,
        }
    }

    pub fn with_true(col: u32, line: u32, length: u32, true_col: u32, true_length: u32) -> Self {
        Loc {
            col,
            line,
            length,
            true_col,
            true_length,
            on_multiple_lines: false,
        }
    }

    pub fn start() -> Self {
        Loc::new(0, 1, 0)
    }

    /// Picks a point roughly between two locations, used when a diagnostic
    /// needs to point "in between" two tokens rather than at either one.
    pub fn in_between(a: Loc, b: Loc) -> Loc {
        if a.line == b.line {
            Loc::with_true(
                (a.col + b.col) / 2,
                a.line,
                b.col.saturating_sub(a.col),
                (a.true_col + b.true_col) / 2,
                b.true_col.saturating_sub(a.true_col),
            )
        } else {
            Loc::with_true(a.col + 1, a.line, 1, a.true_col + 1, 1)
        }
    }

    pub fn right_after(other: Loc) -> Loc {
        Loc::with_true(
            other.col + other.length,
            other.line,
            1,
            other.true_col + other.true_length,
            1,
        )
    }

    /// Smallest location that contains both `self` and `other`.
    pub fn union_hull(self, other: Loc) -> Loc {
        if self.line != other.line {
            if self.on_multiple_lines {
                return self;
            }
            if other.on_multiple_lines {
                return other;
            }

            let mut earliest = if self.line < other.line { self } else { other };
            earliest.on_multiple_lines = true;
            return earliest;
        }

        let max_loc = if self.col > other.col { self } else { other };

        let min_col = self.col.min(other.col);
        let max_col = self.col.max(other.col);
        let min_true_col = self.true_col.min(other.true_col);
        let max_true_col = self.true_col.max(other.true_col);

        Loc::with_true(
            min_col,
            self.line,
            max_col - min_col + max_loc.length,
            min_true_col,
            max_true_col - min_true_col + max_loc.true_length,
        )
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
