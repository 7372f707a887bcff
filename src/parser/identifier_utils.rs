//! Centralized identifier handling utilities for T-SQL parsing.
//!
//! Routine names, type names and default-value function names may be written
//! bare (`dbo.MyType`), bracket-quoted (`[dbo].[My Type]`) or mixed, with optional
//! whitespace around the separating dots. The tokenizer removes the quoting;
//! these helpers work with the resulting words.
//!
//! # Examples
//!
//! ```ignore
//! use crate::parser::identifier_utils::*;
//!
//! assert_eq!(parameter_key("@CustomerId"), "@customerid");
//! ```

use sqlparser::tokenizer::Word;

/// Case-insensitive lookup key for a parameter name.
///
/// Parameter names are compared without regard to case and surrounding
/// whitespace; `@Id` and `@ID` are the same parameter.
pub fn parameter_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// True for an unquoted word spelling `keyword` in any case.
///
/// `[OUTPUT]` names something; `OUTPUT` is the keyword.
#[inline]
pub fn is_bare_keyword(word: &Word, keyword: &str) -> bool {
    word.quote_style.is_none() && word.value.eq_ignore_ascii_case(keyword)
}

/// True for a word the MsSql tokenizer produced from `@name` or `@@name`.
#[inline]
pub fn is_variable_word(word: &Word) -> bool {
    word.quote_style.is_none() && word.value.starts_with('@')
}

/// A possibly schema-qualified name read from tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    /// Name parts with quoting removed, outermost qualifier first
    pub parts: Vec<String>,
    /// Whether the final part was quoted (`[x]` or `"x"`)
    pub last_part_quoted: bool,
}

impl QualifiedName {
    /// The unqualified (last) name part.
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }

    /// The qualifier directly before the name, if any.
    pub fn schema(&self) -> Option<&str> {
        if self.parts.len() >= 2 {
            Some(self.parts[self.parts.len() - 2].as_str())
        } else {
            None
        }
    }
}
