//! Comment removal for routine definitions
//!
//! Block comments (`/* ... */`, non-nesting, shortest match) and line comments
//! (`-- ...` up to the end of the line) are removed in a single left-to-right pass
//! driven by [`SqlScanner`], so comment markers inside string literals and
//! bracket-quoted identifiers are left alone.
//!
//! A removed block comment is replaced by one space so that the tokens on either
//! side never fuse. Line comments keep their terminating newline. An unterminated
//! block comment is kept verbatim, and an unterminated string literal disables
//! comment removal for the rest of the text.

use regex::Regex;

use super::sql_scanner::SqlScanner;

/// Remove block and line comments from `text` while respecting literals.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut scanner = SqlScanner::new();
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if scanner.in_code() {
            let rest = &text[i..];

            if rest.starts_with("/*") {
                if let Some(close) = rest[2..].find("*/") {
                    let resume = i + 2 + close + 2;
                    while chars.peek().is_some_and(|&(j, _)| j < resume) {
                        chars.next();
                    }
                    out.push(' ');
                    continue;
                }
            }

            if rest.starts_with("--") {
                while chars
                    .peek()
                    .is_some_and(|&(_, n)| n != '\n' && n != '\r')
                {
                    chars.next();
                }
                continue;
            }
        }

        scanner.advance(c);
        out.push(c);
    }

    out
}

/// Extract the body of the first `/* <tag> ... */` block in `text`.
///
/// Routines document themselves with blocks such as `/* code EXEC ... */` and
/// `/* help.description ... */`. Matching is case-insensitive and the body is
/// returned trimmed; an empty body counts as absent.
pub fn extract_comment_block(text: &str, tag: &str) -> Option<String> {
    let pattern = format!(r"(?is)/\*\s*{}\s(.*?)\*/", regex::escape(tag));
    let re = Regex::new(&pattern).ok()?;
    let body = re.captures(text)?.get(1)?.as_str().trim();
    (!body.is_empty()).then(|| body.to_string())
}
