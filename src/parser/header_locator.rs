//! Routine header location for T-SQL procedure and function definitions
//!
//! Finds the declaration header of a comment-free definition and isolates the
//! text of its parameter list.
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE PROCEDURE [schema].[name] @p1 INT, @p2 VARCHAR(10) = 'x' OUTPUT AS ...
//! CREATE PROC schema.name (@p1 INT) WITH RECOMPILE AS ...
//! CREATE OR ALTER PROCEDURE [name] AS ...
//! ALTER FUNCTION [schema].[name](@p1 INT) RETURNS INT AS ...
//! ```
//!
//! The parameter list ends at the first whole-word `AS`, `RETURNS` or `WITH`
//! outside literals, preferring one at parenthesis depth zero so that a default
//! such as `CAST(1 AS int)` does not end the header early.

use sqlparser::tokenizer::Token;

use super::identifier_utils::is_bare_keyword;
use super::sql_scanner::{
    code_words, find_matching_paren, plain_words, CodeWord, ScanState, SqlScanner,
};
use super::token_parser_base::TokenParser;
use crate::util::skip_whitespace;

const HEADER_TERMINATORS: [&str; 3] = ["AS", "RETURNS", "WITH"];
const RETURN_TYPE_TERMINATORS: [&str; 3] = ["WITH", "AS", "BEGIN"];

/// Which kind of object the header declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderObjectKind {
    Procedure,
    Function,
}

/// Result of locating a routine header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedHeader {
    pub object_kind: HeaderObjectKind,
    /// Schema qualifier as written, brackets removed
    pub schema: Option<String>,
    /// Routine name as written, brackets removed
    pub name: String,
    /// Text of the parameter list, without enclosing parentheses
    pub parameter_list: String,
    /// False when the list opened with `(` but no matching `)` was found
    pub balanced: bool,
}

/// Locate the `CREATE|ALTER PROC|PROCEDURE|FUNCTION` header in `text`.
///
/// `text` should already have comments removed. Returns `None` when no header
/// (or no terminator after it) is present. A terminator hidden by an
/// unterminated literal is still found by a second scan that ignores quotes.
pub fn locate_header(text: &str) -> Option<LocatedHeader> {
    let words = code_words(text);

    let (kind_index, object_kind) = find_header_keywords(text, &words)?;
    let name_start = skip_whitespace(text, words[kind_index].end);

    let terminator = find_terminator(&words, name_start, &HEADER_TERMINATORS)
        .or_else(|| find_terminator(&plain_words(text), name_start, &HEADER_TERMINATORS))?;

    // The name ends where the parameter list or the terminator begins
    let name_end = name_region_end(text, name_start, terminator.start);
    let mut parser = TokenParser::new(&text[name_start..name_end]).ok()?;
    let ident = parser.parse_qualified_name()?;
    let list_start = name_start + parser.current_offset();

    let span = text[list_start..terminator.start].trim();
    let (parameter_list, balanced) = if span.starts_with('(') {
        match find_matching_paren(span, 0) {
            Some(close) => (span[1..close].to_string(), true),
            None => (span[1..].to_string(), false),
        }
    } else {
        (span.to_string(), true)
    };

    Some(LocatedHeader {
        object_kind,
        schema: ident.schema().map(str::to_string),
        name: ident.name().to_string(),
        parameter_list,
        balanced,
    })
}

/// Find `CREATE [OR ALTER] | ALTER` followed by `PROC|PROCEDURE|FUNCTION`.
///
/// Returns the index of the object-kind word.
fn find_header_keywords(text: &str, words: &[CodeWord<'_>]) -> Option<(usize, HeaderObjectKind)> {
    let adjacent = |a: &CodeWord<'_>, b: &CodeWord<'_>| text[a.end..b.start].trim().is_empty();

    for (i, word) in words.iter().enumerate() {
        if word.depth != 0 || !(word.is("CREATE") || word.is("ALTER")) {
            continue;
        }

        let mut next = i + 1;
        if word.is("CREATE")
            && words.get(next).is_some_and(|w| w.is("OR"))
            && words.get(next + 1).is_some_and(|w| w.is("ALTER"))
            && adjacent(word, &words[next])
            && adjacent(&words[next], &words[next + 1])
        {
            next += 2;
        }

        let Some(kind_word) = words.get(next) else {
            continue;
        };
        if !adjacent(&words[next - 1], kind_word) {
            continue;
        }
        let object_kind = if kind_word.is("PROC") || kind_word.is("PROCEDURE") {
            HeaderObjectKind::Procedure
        } else if kind_word.is("FUNCTION") {
            HeaderObjectKind::Function
        } else {
            continue;
        };
        return Some((next, object_kind));
    }

    None
}

/// First terminator keyword after `from`, preferring depth zero.
///
/// The routine name itself is skipped: the search starts after the first word.
fn find_terminator<'a>(
    words: &[CodeWord<'a>],
    from: usize,
    keywords: &[&str],
) -> Option<CodeWord<'a>> {
    let candidates = || {
        words
            .iter()
            .filter(move |w| w.start > from && keywords.iter().any(|k| w.is(k)))
    };
    candidates()
        .find(|w| w.depth == 0)
        .or_else(|| candidates().next())
        .copied()
}

/// Byte offset of the first `(` or `@` in code between `from` and `limit`,
/// or `limit` when there is none.
fn name_region_end(text: &str, from: usize, limit: usize) -> usize {
    let mut scanner = SqlScanner::new();
    for (offset, c) in text[from..limit].char_indices() {
        let state = scanner.advance(c);
        if state == ScanState::Normal && matches!(c, '(' | '@') {
            return from + offset;
        }
    }
    limit
}

/// Recover the declared return type from a function's `RETURNS` clause.
///
/// Table returns (`RETURNS TABLE`, `RETURNS @t TABLE (...)`) are reported as
/// `TABLE`. Otherwise the type is returned as written, including a size
/// specifier of `MAX` or numbers, provided it is followed by `WITH`, `AS` or
/// `BEGIN`. Returns `None` when no such clause can be read.
pub fn locate_return_type(text: &str) -> Option<String> {
    let words = code_words(text);
    let returns = words.iter().find(|w| w.depth == 0 && w.is("RETURNS"))?;

    // Only the clause itself is tokenized, never the routine body
    let clause_end = words
        .iter()
        .find(|w| {
            w.start > returns.end
                && w.depth == 0
                && RETURN_TYPE_TERMINATORS.iter().any(|k| w.is(k))
        })
        .map_or(text.len(), |w| w.end);
    let mut parser = TokenParser::new(&text[returns.end..clause_end]).ok()?;
    parser.skip_whitespace();

    if parser.check_word_ci("TABLE") {
        return Some("TABLE".to_string());
    }

    if parser.parse_variable() {
        parser.skip_whitespace();
        return parser.check_word_ci("TABLE").then(|| "TABLE".to_string());
    }

    let type_start = parser.pos();
    parser.parse_qualified_name()?;
    let mut type_end = parser.pos();

    parser.skip_whitespace();
    if parser.check_token(&Token::LParen) {
        let (start, end) = parser.consume_parenthesized()?;
        let size = parser.significant_tokens(start, end);
        let is_max = matches!(size.as_slice(), [Token::Word(w)] if is_bare_keyword(w, "MAX"));
        let numeric = !size.is_empty()
            && size
                .iter()
                .all(|t| matches!(t, Token::Number(..) | Token::Comma));
        if !(is_max || numeric) {
            return None;
        }
        type_end = parser.pos();
        parser.skip_whitespace();
    }

    if !RETURN_TYPE_TERMINATORS
        .iter()
        .any(|k| parser.check_word_ci(k))
    {
        return None;
    }

    Some(parser.text_between(type_start, type_end).trim().to_string())
}
