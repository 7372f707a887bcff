//! Character-level scanner for T-SQL text
//!
//! Every stage that needs to know whether a character is "real code" drives this
//! one state machine instead of carrying its own quote and parenthesis tracking.
//!
//! ## States
//!
//! - `Normal` — top-level code
//! - `InStringLiteral` — inside `'...'`; every apostrophe toggles in and out, so a
//!   doubled apostrophe (`''`) leaves and immediately re-enters the literal
//! - `InQuotedIdentifier` — inside `[...]`
//! - `InParentheses(depth)` — code nested inside `depth` open parentheses
//!
//! An unterminated literal keeps the scanner in `InStringLiteral` for the rest of
//! the input. [`SqlScanner::ignoring_literals`] builds a scanner that only tracks
//! parentheses, for recovering text that such a literal would otherwise hide.

use crate::util::is_identifier_char;

/// State of the scanner at a given character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Normal,
    InStringLiteral,
    InQuotedIdentifier,
    InParentheses(usize),
}

impl ScanState {
    /// True when the character is code rather than literal or quoted-name content.
    #[inline]
    pub fn is_code(self) -> bool {
        matches!(self, ScanState::Normal | ScanState::InParentheses(_))
    }

    /// Parenthesis depth for code states, zero otherwise.
    #[inline]
    pub fn depth(self) -> usize {
        match self {
            ScanState::InParentheses(depth) => depth,
            _ => 0,
        }
    }
}

/// Literal- and parenthesis-aware character scanner.
#[derive(Debug, Clone)]
pub struct SqlScanner {
    in_string: bool,
    in_bracket: bool,
    depth: usize,
    track_literals: bool,
}

impl Default for SqlScanner {
    fn default() -> Self {
        Self {
            in_string: false,
            in_bracket: false,
            depth: 0,
            track_literals: true,
        }
    }
}

impl SqlScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scanner that treats quotes and brackets as ordinary characters.
    pub fn ignoring_literals() -> Self {
        Self {
            track_literals: false,
            ..Self::default()
        }
    }

    /// Current state, i.e. the state the next character will be scanned in.
    pub fn state(&self) -> ScanState {
        if self.in_string {
            ScanState::InStringLiteral
        } else if self.in_bracket {
            ScanState::InQuotedIdentifier
        } else if self.depth > 0 {
            ScanState::InParentheses(self.depth)
        } else {
            ScanState::Normal
        }
    }

    /// True when the next character would be scanned as code.
    #[inline]
    pub fn in_code(&self) -> bool {
        !self.in_string && !self.in_bracket
    }

    /// Feed one character and return the state in effect at that character.
    pub fn advance(&mut self, c: char) -> ScanState {
        let state = self.state();
        match c {
            '\'' if self.track_literals && !self.in_bracket => self.in_string = !self.in_string,
            '[' if self.track_literals && self.in_code() => self.in_bracket = true,
            ']' if self.in_bracket => self.in_bracket = false,
            '(' if self.in_code() => self.depth += 1,
            ')' if self.in_code() => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        state
    }
}

/// Find the `)` that closes the `(` at byte offset `open`.
///
/// Parentheses inside string literals and quoted identifiers are ignored.
/// Returns `None` when `open` is not a `(` or the input ends first.
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    if !text[open..].starts_with('(') {
        return None;
    }
    let mut scanner = SqlScanner::new();
    for (offset, c) in text[open..].char_indices() {
        let state = scanner.advance(c);
        if c == ')' && state.is_code() && scanner.state() == ScanState::Normal {
            return Some(open + offset);
        }
    }
    None
}

/// A word that appears in code (outside literals and quoted identifiers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeWord<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    /// Parenthesis depth the word sits at
    pub depth: usize,
}

impl CodeWord<'_> {
    #[inline]
    pub fn is(&self, keyword: &str) -> bool {
        self.text.eq_ignore_ascii_case(keyword)
    }
}

/// Enumerate the identifier-shaped words of `text` that are code.
pub fn code_words(text: &str) -> Vec<CodeWord<'_>> {
    collect_words(text, SqlScanner::new())
}

/// Like [`code_words`], but quotes and brackets hide nothing.
pub fn plain_words(text: &str) -> Vec<CodeWord<'_>> {
    collect_words(text, SqlScanner::ignoring_literals())
}

fn collect_words(text: &str, mut scanner: SqlScanner) -> Vec<CodeWord<'_>> {
    let mut words = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for (i, c) in text.char_indices() {
        let state = scanner.advance(c);
        if state.is_code() && is_identifier_char(c) {
            if current.is_none() {
                current = Some((i, state.depth()));
            }
        } else if let Some((start, depth)) = current.take() {
            words.push(CodeWord {
                text: &text[start..i],
                start,
                end: i,
                depth,
            });
        }
    }
    if let Some((start, depth)) = current {
        words.push(CodeWord {
            text: &text[start..],
            start,
            end: text.len(),
            depth,
        });
    }

    words
}
