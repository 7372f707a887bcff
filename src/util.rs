//! Shared utility helpers.

/// True for characters that may continue a T-SQL regular identifier.
///
/// `@`, `#` and `$` are included so that variables such as `@as` never read as
/// the keyword `AS`.
#[inline]
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$')
}

/// Byte offset of the first non-whitespace character at or after `pos`.
#[inline]
pub fn skip_whitespace(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(offset, _)| pos + offset)
        .unwrap_or(text.len())
}

/// Shorten `text` for inclusion in a diagnostic message.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut short: String = collapsed.chars().take(max_chars).collect();
        short.push_str("...");
        short
    }
}
