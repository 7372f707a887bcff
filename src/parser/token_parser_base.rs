//! Base token parser providing common helper methods for fragment parsing.
//!
//! The declaration parser and the RETURNS scan both read a short piece of
//! comment-free T-SQL one construct at a time. This struct tokenizes the piece
//! with `MsSqlDialect` and offers the navigation and checking methods they share.
//!
//! Every token keeps its span, so a parser can hand back the source text of a
//! token range exactly as written (`nvarchar ( max )`, `N'it''s'`).
//!
//! ```ignore
//! let mut parser = TokenParser::new("@p decimal(10,2) OUTPUT")?;
//! assert!(parser.parse_variable());
//! parser.skip_whitespace();
//! assert!(parser.check_word_ci("decimal"));
//! ```

use sqlparser::dialect::MsSqlDialect;
use sqlparser::tokenizer::{Location, Token, TokenWithSpan, Tokenizer, TokenizerError};

use super::identifier_utils::{is_bare_keyword, is_variable_word, QualifiedName};

/// Token cursor over a borrowed piece of T-SQL text.
pub struct TokenParser<'a> {
    sql: &'a str,
    tokens: Vec<TokenWithSpan>,
    line_offsets: Vec<usize>,
    pos: usize,
}

impl<'a> TokenParser<'a> {
    /// Tokenize `sql` with the MsSqlDialect.
    pub fn new(sql: &'a str) -> Result<Self, TokenizerError> {
        let dialect = MsSqlDialect {};
        let tokens = Tokenizer::new(&dialect, sql).tokenize_with_location()?;

        Ok(Self {
            sql,
            tokens,
            line_offsets: compute_line_offsets(sql),
            pos: 0,
        })
    }

    // ========================================================================
    // Position and state
    // ========================================================================

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    // ========================================================================
    // Token access
    // ========================================================================

    #[inline]
    pub fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    #[inline]
    pub fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Skip whitespace tokens. Returns whether any were skipped.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.current_token(), Some(Token::Whitespace(_))) {
            self.advance();
        }
        self.pos > start
    }

    /// Non-whitespace tokens in `start..end`.
    pub fn significant_tokens(&self, start: usize, end: usize) -> Vec<&Token> {
        self.tokens[start..end]
            .iter()
            .map(|t| &t.token)
            .filter(|t| !matches!(t, Token::Whitespace(_)))
            .collect()
    }

    // ========================================================================
    // Token type checks
    // ========================================================================

    /// Check if the current token is an unquoted word matching (case-insensitive).
    ///
    /// T-SQL words such as `OUTPUT` and `READONLY` are not sqlparser keywords,
    /// so words are compared by value.
    #[inline]
    pub fn check_word_ci(&self, word: &str) -> bool {
        matches!(self.current_token(), Some(Token::Word(w)) if is_bare_keyword(w, word))
    }

    /// Consume the current token if it is the unquoted word `word`.
    pub fn consume_word_ci(&mut self, word: &str) -> bool {
        if self.check_word_ci(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Check if the current token matches a token type (by discriminant).
    #[inline]
    pub fn check_token(&self, expected: &Token) -> bool {
        self.current_token()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    // ========================================================================
    // Compound constructs
    // ========================================================================

    /// Consume a variable reference: `@name` or `@@name`.
    ///
    /// Accepts both the single-word form and a separate `@`/`@@` token directly
    /// followed by a word. Position is unchanged on failure.
    pub fn parse_variable(&mut self) -> bool {
        let start = self.pos;
        match self.current_token() {
            Some(Token::Word(w)) if is_variable_word(w) && w.value.len() > 1 => {
                self.advance();
                return true;
            }
            Some(Token::AtSign | Token::AtAt) => self.advance(),
            _ => return false,
        }

        if matches!(self.current_token(), Some(Token::Word(w)) if w.quote_style.is_none()) {
            self.advance();
            true
        } else {
            self.pos = start;
            false
        }
    }

    /// Parse a dotted name such as `dbo.Proc`, `[dbo].[Proc]` or `[s] . p`.
    ///
    /// Variables are not names. Position is unchanged when no name starts here,
    /// and a trailing dot is left unconsumed.
    pub fn parse_qualified_name(&mut self) -> Option<QualifiedName> {
        let (first, quoted) = self.name_part()?;
        self.advance();
        let mut name = QualifiedName {
            parts: vec![first],
            last_part_quoted: quoted,
        };

        loop {
            let save = self.pos;
            self.skip_whitespace();
            if !self.check_token(&Token::Period) {
                self.pos = save;
                break;
            }
            self.advance();
            self.skip_whitespace();
            match self.name_part() {
                Some((part, quoted)) => {
                    self.advance();
                    name.parts.push(part);
                    name.last_part_quoted = quoted;
                }
                None => {
                    self.pos = save;
                    break;
                }
            }
        }

        Some(name)
    }

    fn name_part(&self) -> Option<(String, bool)> {
        match self.current_token()? {
            Token::Word(w) if !is_variable_word(w) => {
                Some((w.value.clone(), w.quote_style.is_some()))
            }
            _ => None,
        }
    }

    /// Consume a parenthesized group, handling nested parentheses.
    ///
    /// Position should be at the opening parenthesis. Returns the token range
    /// strictly inside the group and leaves the position after the closing
    /// parenthesis. Returns `None`, position unchanged, when not at `(` or when
    /// the group never closes.
    pub fn consume_parenthesized(&mut self) -> Option<(usize, usize)> {
        if !self.check_token(&Token::LParen) {
            return None;
        }

        let start = self.pos;
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.current_token() {
                Some(Token::LParen) => depth += 1,
                Some(Token::RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        let close = self.pos;
                        self.advance();
                        return Some((start + 1, close));
                    }
                }
                _ => {}
            }
            self.advance();
        }

        self.pos = start;
        None
    }

    // ========================================================================
    // Source text
    // ========================================================================

    /// Source text of the tokens in `start..end`, as written.
    pub fn text_between(&self, start: usize, end: usize) -> &'a str {
        if start >= end || end > self.tokens.len() {
            return "";
        }
        let from = self.byte_offset(self.tokens[start].span.start);
        let to = self.byte_offset(self.tokens[end - 1].span.end);
        &self.sql[from..to.max(from)]
    }

    /// Source text from the current token to the end of input.
    pub fn rest(&self) -> &'a str {
        match self.tokens.get(self.pos) {
            Some(token) => &self.sql[self.byte_offset(token.span.start)..],
            None => "",
        }
    }

    /// Byte offset of the current token, or the input length at the end.
    pub fn current_offset(&self) -> usize {
        self.sql.len() - self.rest().len()
    }

    /// Convert a 1-based line/column location to a byte offset.
    ///
    /// Columns count characters, so multi-byte text is walked rather than
    /// indexed.
    fn byte_offset(&self, location: Location) -> usize {
        let line = location.line as usize;
        if line == 0 || line > self.line_offsets.len() {
            return self.sql.len();
        }
        let line_start = self.line_offsets[line - 1];
        let column = location.column.saturating_sub(1) as usize;
        self.sql[line_start..]
            .char_indices()
            .nth(column)
            .map(|(offset, _)| line_start + offset)
            .unwrap_or(self.sql.len())
    }
}

fn compute_line_offsets(sql: &str) -> Vec<usize> {
    let mut offsets = vec![0]; // Line 1 starts at offset 0
    for (i, ch) in sql.char_indices() {
        if ch == '\n' {
            offsets.push(i + 1);
        }
    }
    offsets
}
