//! T-SQL routine definition parsing

mod comment_stripper;
mod declaration_parser;
mod header_locator;
pub mod identifier_utils;
mod sql_scanner;
mod token_parser_base;

pub use comment_stripper::{extract_comment_block, strip_comments};
pub use declaration_parser::{
    parse_declaration, parse_parameter_list, split_declarations, DeclarationError,
};
pub use header_locator::{locate_header, locate_return_type, HeaderObjectKind, LocatedHeader};
pub use sql_scanner::{
    code_words, find_matching_paren, plain_words, CodeWord, ScanState, SqlScanner,
};
