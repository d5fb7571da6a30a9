//! Character-level scanner producing a flat token stream.
//!
//! No lookahead buffer beyond a single peeked character; interpolated
//! strings are handled by tracking how many `#{...}` levels are currently
//! open, exactly the way the source language's own lexer does it.

use smol_str::SmolStr;

use nevec_core::loc::Loc;

use crate::token::{Tok, TokKind};

const MAX_INTERPOL_DEPTH: u32 = 255;

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    interpol_depth: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 0,
            interpol_depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;

        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }

        Some(c)
    }

    fn loc(&self, start_col: u32, start_line: u32, len: u32) -> Loc {
        Loc::new(start_col, start_line, len)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c == ' ' || c == '\t' || c == '\r' || c == '\n' => {
                    self.advance();
                }
                Some('#') if self.peek2() != Some('{') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    pub fn next(&mut self) -> Tok {
        self.skip_trivia();

        let start_col = self.col;
        let start_line = self.line;

        let Some(c) = self.peek() else {
            return Tok {
                kind: TokKind::Eof,
                loc: self.loc(start_col, start_line, 0),
            };
        };

        if c == '"' {
            return self.string(start_col, start_line);
        }

        if c == '}' {
            self.advance();
            if self.interpol_depth == 0 {
                return Tok {
                    kind: TokKind::Err('}'),
                    loc: self.loc(start_col, start_line, 1),
                };
            }
            self.interpol_depth -= 1;
            return Tok {
                kind: TokKind::InterpolSep,
                loc: self.loc(start_col, start_line, 1),
            };
        }

        if c.is_ascii_digit() {
            return self.number(start_col, start_line);
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return self.ident(start_col, start_line);
        }

        self.simple(start_col, start_line)
    }

    fn number(&mut self, start_col: u32, start_line: u32) -> Tok {
        let mut lexeme = String::new();

        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            lexeme.push(self.advance().unwrap());
        }

        let mut is_float = false;
        if self.peek() == Some('.') && matches!(self.peek2(), Some(c) if c.is_ascii_digit()) {
            is_float = true;
            lexeme.push(self.advance().unwrap());
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                lexeme.push(self.advance().unwrap());
            }
        }

        let len = self.col - start_col;
        let loc = self.loc(start_col, start_line, len);

        if is_float {
            Tok {
                kind: TokKind::Float(lexeme.parse().unwrap_or(0.0)),
                loc,
            }
        } else {
            Tok {
                kind: TokKind::Int(lexeme.parse().unwrap_or(0)),
                loc,
            }
        }
    }

    fn ident(&mut self, start_col: u32, start_line: u32) -> Tok {
        let mut lexeme = String::new();

        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            lexeme.push(self.advance().unwrap());
        }

        let len = self.col - start_col;
        let loc = self.loc(start_col, start_line, len);

        let kind = match lexeme.as_str() {
            "true" => TokKind::True,
            "false" => TokKind::False,
            "nil" => TokKind::Nil,
            "not" => TokKind::Not,
            "bor" => TokKind::Bor,
            _ => TokKind::Ident(SmolStr::new(&lexeme)),
        };

        Tok { kind, loc }
    }

    /// Scans the body of a string literal (or the continuation of one
    /// after an interpolated expression closes), stopping at a closing
    /// `"` or at a `#{` that opens an interpolation.
    fn string(&mut self, start_col: u32, start_line: u32) -> Tok {
        self.advance(); // opening quote

        let mut text = String::new();

        loop {
            match self.peek() {
                None => {
                    let len = self.col - start_col;
                    return Tok {
                        kind: TokKind::Err('"'),
                        loc: self.loc(start_col, start_line, len),
                    };
                }
                Some('"') => {
                    self.advance();
                    let len = self.col - start_col;
                    return Tok {
                        kind: TokKind::Str(text),
                        loc: self.loc(start_col, start_line, len),
                    };
                }
                Some('#') if self.peek2() == Some('{') => {
                    if self.interpol_depth == MAX_INTERPOL_DEPTH {
                        let len = self.col - start_col;
                        return Tok {
                            kind: TokKind::Err('#'),
                            loc: self.loc(start_col, start_line, len),
                        };
                    }

                    self.advance();
                    self.advance();
                    self.interpol_depth += 1;

                    let len = self.col - start_col;
                    return Tok {
                        kind: TokKind::InterpolOpen(text),
                        loc: self.loc(start_col, start_line, len),
                    };
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some('"') => text.push('"'),
                        Some('\\') => text.push('\\'),
                        Some(other) => text.push(other),
                        None => {}
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    fn simple(&mut self, start_col: u32, start_line: u32) -> Tok {
        let two: Option<(char, char)> = self.peek().zip(self.peek2());

        if let Some(kind) = two.and_then(|(a, b)| Self::match_two(a, b)) {
            self.advance();
            self.advance();
            return Tok {
                kind,
                loc: self.loc(start_col, start_line, 2),
            };
        }

        let c = self.advance().unwrap();
        let kind = match c {
            ';' => TokKind::Semicol,
            ':' => TokKind::Col,
            ',' => TokKind::Comma,
            '.' => TokKind::Dot,
            '+' => TokKind::Plus,
            '-' => TokKind::Minus,
            '*' => TokKind::Star,
            '/' => TokKind::Slash,
            '&' => TokKind::Amp,
            '^' => TokKind::Caret,
            '>' => TokKind::Gt,
            '<' => TokKind::Lt,
            '(' => TokKind::LParen,
            ')' => TokKind::RParen,
            '[' => TokKind::LBracket,
            ']' => TokKind::RBracket,
            other => TokKind::Err(other),
        };

        Tok {
            kind,
            loc: self.loc(start_col, start_line, 1),
        }
    }

    fn match_two(a: char, b: char) -> Option<TokKind> {
        Some(match (a, b) {
            ('+', '+') => TokKind::PlusPlus,
            ('<', '<') => TokKind::Shl,
            ('>', '>') => TokKind::Shr,
            ('!', '=') => TokKind::Neq,
            ('=', '=') => TokKind::Eq,
            ('>', '=') => TokKind::Gte,
            ('<', '=') => TokKind::Lte,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next();
            if tok.kind == TokKind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn bitwise_or_is_only_reachable_via_the_bor_keyword() {
        assert_eq!(kinds("bor"), vec![TokKind::Bor]);
        assert_eq!(kinds("|"), vec![TokKind::Err('|')]);
    }

    #[test]
    fn comment_runs_to_end_of_line_unless_followed_by_brace() {
        assert_eq!(kinds("1 # trailing comment\n2"), vec![TokKind::Int(1), TokKind::Int(2)]);
    }

    #[test]
    fn two_char_operators_win_over_their_single_char_prefix() {
        assert_eq!(kinds("++"), vec![TokKind::PlusPlus]);
        assert_eq!(kinds(">="), vec![TokKind::Gte]);
        assert_eq!(kinds("="), vec![TokKind::Err('=')]);
    }

    #[test]
    fn interpolated_string_yields_open_sep_and_tail() {
        let got = kinds(r#""hi #{1}there""#);
        assert_eq!(
            got,
            vec![
                TokKind::InterpolOpen("hi ".into()),
                TokKind::Int(1),
                TokKind::InterpolSep,
                TokKind::Str("there".into()),
            ]
        );
    }

    #[test]
    fn unterminated_string_reports_an_error_token() {
        assert_eq!(kinds("\"no closing quote"), vec![TokKind::Err('"')]);
    }

    #[test]
    fn escapes_decode_into_the_string_value() {
        assert_eq!(kinds(r#""a\nb""#), vec![TokKind::Str("a\nb".into())]);
    }
}
