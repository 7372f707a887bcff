//! Parameter declaration splitting and parsing
//!
//! Takes the parameter-list text isolated by the header locator, splits it into
//! one fragment per parameter and parses each fragment into a
//! [`ParameterDeclaration`].
//!
//! ## Supported Syntax
//!
//! ```sql
//! @id INT
//! @amount DECIMAL(10, 2) = 0.00 OUTPUT
//! @name NVARCHAR(MAX) = N'it''s'
//! @items [dbo].[IdList] READONLY
//! @when DATETIME2 = GETDATE()
//! @c CURSOR VARYING OUT
//! @p AS INT = @@SPID
//! ```
//!
//! A fragment that does not have this shape is skipped with a diagnostic; the
//! remaining fragments are still parsed.

use sqlparser::tokenizer::Token;
use thiserror::Error;

use super::identifier_utils::is_bare_keyword;
use super::sql_scanner::{ScanState, SqlScanner};
use super::token_parser_base::TokenParser;
use crate::model::{DeclarationSet, DiagnosticKind, Diagnostics, ParameterDeclaration, SizeSpec};
use crate::util::snippet;

/// Words that continue a multi-word type name (`CURSOR VARYING`,
/// `DOUBLE PRECISION`, `NATIONAL CHARACTER VARYING`)
const TYPE_CONTINUATIONS: [&str; 4] = ["VARYING", "PRECISION", "CHARACTER", "CHAR"];

/// Bare words that can never be a parameter's type
const NON_TYPE_WORDS: [&str; 5] = ["OUTPUT", "OUT", "READONLY", "NULL", "NOT"];

const SNIPPET_CHARS: usize = 80;

/// Why a declaration fragment was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("declaration could not be tokenized: {message}")]
    Tokenize { message: String },

    #[error("declaration does not start with an @name")]
    MissingName,

    #[error("parameter {name} has no type")]
    MissingType { name: String },

    #[error("size specifier ({size}) of {name} is not MAX or one or two numbers")]
    InvalidSize { name: String, size: String },

    #[error("unbalanced parentheses in declaration of {name}")]
    UnbalancedParentheses { name: String },

    #[error("unrecognized default value for {name} near '{near}'")]
    InvalidDefault { name: String, near: String },

    #[error("{name} has more than one default clause")]
    DuplicateDefault { name: String },

    #[error("unexpected '{near}' after declaration of {name}")]
    UnexpectedText { name: String, near: String },
}

/// Split a parameter list into one trimmed fragment per parameter.
///
/// A comma separates parameters only when it is outside literals and
/// parentheses and the next non-whitespace character is `@`. Commas inside
/// `decimal(10,2)`, `'a,b'` or `fn(1, 2)` therefore never split.
///
/// When the list leaves a parenthesis open, parentheses stop counting; when it
/// leaves a literal open, literals stop counting too. Either way the parameters
/// after the damaged one are still separated.
pub fn split_declarations(list: &str) -> Vec<&str> {
    let (fragments, end_state) = split_where(list, SqlScanner::new(), |s| s == ScanState::Normal);
    if end_state == ScanState::Normal {
        return fragments;
    }

    let (fragments, end_state) = split_where(list, SqlScanner::new(), ScanState::is_code);
    if end_state.is_code() {
        return fragments;
    }

    split_where(list, SqlScanner::ignoring_literals(), |_| true).0
}

/// Split at `,` + `@` wherever `splits` accepts the scanner state, returning the
/// fragments and the state left at the end of the list.
fn split_where(
    list: &str,
    mut scanner: SqlScanner,
    splits: impl Fn(ScanState) -> bool,
) -> (Vec<&str>, ScanState) {
    let mut fragments = Vec::new();
    let mut start = 0;

    for (i, c) in list.char_indices() {
        let state = scanner.advance(c);
        if c == ',' && splits(state) && list[i + 1..].trim_start().starts_with('@') {
            fragments.push(list[start..i].trim());
            start = i + 1;
        }
    }
    fragments.push(list[start..].trim());

    fragments.retain(|f| !f.is_empty());
    (fragments, scanner.state())
}

/// Parse a whole parameter list.
///
/// Malformed fragments and duplicate names are reported to `diagnostics`; a
/// repeated name keeps the position of its first occurrence and the content
/// of its last.
pub fn parse_parameter_list(list: &str, diagnostics: &mut Diagnostics) -> DeclarationSet {
    let mut declarations = DeclarationSet::new();

    for fragment in split_declarations(list) {
        match parse_declaration(fragment) {
            Ok(declaration) => {
                let name = declaration.name.clone();
                if declarations.insert(declaration).is_some() {
                    diagnostics.warning(
                        DiagnosticKind::DuplicateDeclaration,
                        format!("{} is declared more than once; the last declaration wins", name),
                    );
                }
            }
            Err(e) => diagnostics.warning(
                DiagnosticKind::MalformedDeclaration,
                format!("skipped '{}': {}", snippet(fragment, SNIPPET_CHARS), e),
            ),
        }
    }

    declarations
}

/// Parse one declaration fragment: `@name [AS] type [(size)] [= default] [OUTPUT|OUT] [READONLY]`
pub fn parse_declaration(fragment: &str) -> Result<ParameterDeclaration, DeclarationError> {
    let text = fragment.trim();
    let mut parser = TokenParser::new(text).map_err(|e| DeclarationError::Tokenize {
        message: e.to_string(),
    })?;

    // Parameter name
    let name_start = parser.pos();
    if !parser.parse_variable() {
        return Err(DeclarationError::MissingName);
    }
    let name = parser.text_between(name_start, parser.pos()).to_string();

    parser.skip_whitespace();
    if parser.consume_word_ci("AS") {
        parser.skip_whitespace();
    }

    let (type_text, size) = parse_type(&mut parser, &name)?;

    // Default value and trailing modifiers, in any order
    let mut default_value = None;
    let mut is_output = false;
    let mut is_readonly = false;

    loop {
        parser.skip_whitespace();
        if parser.is_at_end() {
            break;
        }

        if parser.check_token(&Token::Eq) {
            if default_value.is_some() {
                return Err(DeclarationError::DuplicateDefault { name });
            }
            parser.advance();
            parser.skip_whitespace();
            default_value = Some(parse_default_value(&mut parser, &name)?);
            continue;
        }

        if parser.consume_word_ci("OUTPUT") || parser.consume_word_ci("OUT") {
            is_output = true;
            continue;
        }

        if parser.consume_word_ci("READONLY") {
            is_readonly = true;
            continue;
        }

        // Nullability of natively compiled module parameters
        if parser.consume_word_ci("NULL") {
            continue;
        }
        if parser.check_word_ci("NOT") {
            let save = parser.pos();
            parser.advance();
            parser.skip_whitespace();
            if parser.consume_word_ci("NULL") {
                continue;
            }
            parser.set_pos(save);
        }

        return Err(DeclarationError::UnexpectedText {
            name,
            near: snippet(parser.rest(), 20),
        });
    }

    Ok(ParameterDeclaration {
        name,
        type_text,
        size,
        default_value,
        is_output,
        is_readonly,
        raw_text: text.to_string(),
    })
}

/// Parse the type: a qualified name, optional continuation words, an optional
/// parenthesized size and an optional `(TRANSLATOR)` marker.
fn parse_type(
    parser: &mut TokenParser<'_>,
    name: &str,
) -> Result<(String, Option<SizeSpec>), DeclarationError> {
    let type_start = parser.pos();
    let missing = || DeclarationError::MissingType {
        name: name.to_string(),
    };

    let ident = parser.parse_qualified_name().ok_or_else(missing)?;
    if ident.parts.len() == 1
        && !ident.last_part_quoted
        && NON_TYPE_WORDS
            .iter()
            .any(|w| ident.name().eq_ignore_ascii_case(w))
    {
        return Err(missing());
    }

    loop {
        let save = parser.pos();
        parser.skip_whitespace();
        if !TYPE_CONTINUATIONS.iter().any(|c| parser.consume_word_ci(c)) {
            parser.set_pos(save);
            break;
        }
    }

    let mut size = None;
    let save = parser.pos();
    parser.skip_whitespace();
    if parser.check_token(&Token::LParen) {
        let (start, end) = parser.consume_parenthesized().ok_or_else(|| {
            DeclarationError::UnbalancedParentheses {
                name: name.to_string(),
            }
        })?;
        size = parse_size_spec(
            &parser.significant_tokens(start, end),
            parser.text_between(start, end),
            name,
        )?;
    } else {
        parser.set_pos(save);
    }

    // Collation translation marker of legacy string types
    let save = parser.pos();
    parser.skip_whitespace();
    match parser.consume_parenthesized() {
        Some((start, end))
            if matches!(
                parser.significant_tokens(start, end).as_slice(),
                [Token::Word(w)] if is_bare_keyword(w, "TRANSLATOR")
            ) => {}
        _ => parser.set_pos(save),
    }

    let type_text = parser
        .text_between(type_start, parser.pos())
        .trim()
        .to_string();
    Ok((type_text, size))
}

/// Interpret the tokens inside a type's parentheses.
///
/// `MAX` and one or two unsigned integers are size specifiers. Other content
/// (such as an XML schema collection) is kept as part of the type text and
/// yields `None`. Purely numeric content of any other shape is an error.
fn parse_size_spec(
    tokens: &[&Token],
    inner_text: &str,
    name: &str,
) -> Result<Option<SizeSpec>, DeclarationError> {
    if let [Token::Word(w)] = tokens {
        if is_bare_keyword(w, "MAX") {
            return Ok(Some(SizeSpec::Max));
        }
    }

    let numeric_shape = tokens.iter().all(|t| match t {
        Token::Comma => true,
        Token::Number(n, _) => n.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    });
    if !numeric_shape {
        return Ok(None);
    }

    let invalid = || DeclarationError::InvalidSize {
        name: name.to_string(),
        size: inner_text.trim().to_string(),
    };
    // Numbers and commas must alternate, starting and ending with a number
    if tokens.len() % 2 == 0 {
        return Err(invalid());
    }
    let mut components = Vec::with_capacity(tokens.len() / 2 + 1);
    for (i, token) in tokens.iter().enumerate() {
        match (i % 2, token) {
            (0, Token::Number(n, _)) => {
                components.push(n.parse::<u32>().map_err(|_| invalid())?);
            }
            (1, Token::Comma) => {}
            _ => return Err(invalid()),
        }
    }

    match components.as_slice() {
        [length] => Ok(Some(SizeSpec::Length(*length))),
        [precision, scale] => Ok(Some(SizeSpec::PrecisionScale {
            precision: *precision,
            scale: *scale,
        })),
        _ => Err(invalid()),
    }
}

/// Parse a default value at the current token and return it as written.
///
/// Accepted forms: `NULL`; a string literal with optional `N` prefix; a hex
/// literal; a signed number with optional exponent; a variable such as
/// `@@SPID`; a function call with a balanced argument list; a bare word, which
/// T-SQL treats as a string constant.
fn parse_default_value(
    parser: &mut TokenParser<'_>,
    name: &str,
) -> Result<String, DeclarationError> {
    let start = parser.pos();
    let invalid = |rest: &str| DeclarationError::InvalidDefault {
        name: name.to_string(),
        near: snippet(rest, 20),
    };

    match parser.current_token() {
        Some(Token::Word(w)) if is_bare_keyword(w, "NULL") => {
            parser.advance();
            return Ok("NULL".to_string());
        }
        Some(
            Token::SingleQuotedString(_)
            | Token::NationalStringLiteral(_)
            | Token::HexStringLiteral(_)
            | Token::Number(..),
        ) => {
            parser.advance();
            return finish_literal(parser, start, name);
        }
        Some(Token::Plus | Token::Minus) => {
            parser.advance();
            parser.skip_whitespace();
            if !parser.check_token(&Token::Number(String::new(), false)) {
                return Err(invalid(parser.rest()));
            }
            parser.advance();
            return finish_literal(parser, start, name);
        }
        _ => {}
    }

    if parser.parse_variable() {
        return Ok(parser.text_between(start, parser.pos()).to_string());
    }

    if parser.parse_qualified_name().is_some() {
        let ident_end = parser.pos();
        parser.skip_whitespace();
        if parser.check_token(&Token::LParen) {
            if parser.consume_parenthesized().is_none() {
                return Err(DeclarationError::UnbalancedParentheses {
                    name: name.to_string(),
                });
            }
        } else {
            parser.set_pos(ident_end);
        }
        return Ok(parser.text_between(start, parser.pos()).to_string());
    }

    Err(invalid(parser.rest()))
}

/// Accept a literal ending at the current position unless a word or number
/// is glued straight onto it (`12abc`, `1.2.3`).
fn finish_literal(
    parser: &TokenParser<'_>,
    start: usize,
    name: &str,
) -> Result<String, DeclarationError> {
    if matches!(
        parser.current_token(),
        Some(Token::Word(_) | Token::Number(..) | Token::Period)
    ) {
        return Err(DeclarationError::InvalidDefault {
            name: name.to_string(),
            near: snippet(parser.text_between(start, parser.pos() + 1), 20),
        });
    }
    Ok(parser.text_between(start, parser.pos()).to_string())
}
