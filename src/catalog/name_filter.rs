//! Routine selection by SQL `LIKE`-style name patterns
//!
//! `%` matches any run of characters and `_` a single character. Brackets are
//! treated as name quoting and removed. A `schema.` qualifier restricts the
//! schema as well as the name; without one only the name is matched. Matching
//! is case-insensitive, like the default SQL Server collation.

use anyhow::Result;
use glob::{MatchOptions, Pattern};

use crate::error::SqlSigError;
use crate::model::RoutineDefinition;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct NamePattern {
    schema: Option<Pattern>,
    name: Pattern,
}

impl NamePattern {
    fn parse(raw: &str) -> Result<Option<Self>> {
        let cleaned: String = raw.trim().chars().filter(|c| !matches!(c, '[' | ']')).collect();
        if cleaned.is_empty() {
            return Ok(None);
        }

        let (schema, name) = match cleaned.split_once('.') {
            Some((schema, name)) => (Some(schema.trim()), name.trim()),
            None => (None, cleaned.as_str()),
        };

        let compile = |like: &str| {
            Pattern::new(&like_to_glob(like)).map_err(|e| SqlSigError::InvalidNamePattern {
                pattern: raw.to_string(),
                message: e.to_string(),
            })
        };

        Ok(Some(Self {
            schema: schema.filter(|s| !s.is_empty()).map(&compile).transpose()?,
            name: compile(name)?,
        }))
    }

    fn matches(&self, schema: &str, name: &str) -> bool {
        self.schema
            .as_ref()
            .map_or(true, |p| p.matches_with(schema, MATCH_OPTIONS))
            && self.name.matches_with(name, MATCH_OPTIONS)
    }
}

/// Translate a `LIKE` pattern into glob syntax.
fn like_to_glob(like: &str) -> String {
    let mut glob = String::with_capacity(like.len() + 4);
    for c in like.chars() {
        match c {
            '%' => glob.push('*'),
            '_' => glob.push('?'),
            '*' => glob.push_str("[*]"),
            '?' => glob.push_str("[?]"),
            _ => glob.push(c),
        }
    }
    glob
}

/// A set of name patterns; a routine is selected when any pattern matches.
///
/// An empty set selects every routine.
#[derive(Debug, Clone, Default)]
pub struct NamePatternSet {
    patterns: Vec<NamePattern>,
}

impl NamePatternSet {
    /// Compile `LIKE`-style patterns. Blank entries are ignored.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for raw in patterns {
            if let Some(pattern) = NamePattern::parse(raw.as_ref())? {
                compiled.push(pattern);
            }
        }
        Ok(Self { patterns: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, routine: &RoutineDefinition) -> bool {
        self.is_empty()
            || self
                .patterns
                .iter()
                .any(|p| p.matches(&routine.schema, &routine.name))
    }
}
