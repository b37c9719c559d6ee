/*
 * Character Codes
 *
 * Bytes the tokenizer dispatches on
 */

//! Byte constants used by the tokenizer and the helpers around it

// Whitespace
pub const TAB: u8 = b'\t';
pub const NEWLINE: u8 = b'\n';
pub const FEED: u8 = 0x0C;
pub const CR: u8 = b'\r';
pub const SPACE: u8 = b' ';

// Punctuation
pub const DOUBLE_QUOTE: u8 = b'"';
pub const HASH: u8 = b'#';
pub const SINGLE_QUOTE: u8 = b'\'';
pub const OPEN_PARENTHESES: u8 = b'(';
pub const CLOSE_PARENTHESES: u8 = b')';
pub const ASTERISK: u8 = b'*';
pub const SLASH: u8 = b'/';
pub const COLON: u8 = b':';
pub const SEMICOLON: u8 = b';';
pub const AT: u8 = b'@';
pub const BANG: u8 = b'!';
pub const OPEN_SQUARE: u8 = b'[';
pub const BACKSLASH: u8 = b'\\';
pub const CLOSE_SQUARE: u8 = b']';
pub const OPEN_CURLY: u8 = b'{';
pub const CLOSE_CURLY: u8 = b'}';

/// Whitespace that separates tokens
pub fn is_space(code: u8) -> bool {
    matches!(code, SPACE | NEWLINE | TAB | CR | FEED)
}

/// Characters trimmed from comment text
pub fn is_trim_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

/// Bytes that end an at-rule name
pub fn is_at_end(code: u8) -> bool {
    is_space(code)
        || matches!(
            code,
            OPEN_CURLY
                | OPEN_PARENTHESES
                | CLOSE_PARENTHESES
                | SINGLE_QUOTE
                | DOUBLE_QUOTE
                | BACKSLASH
                | SEMICOLON
                | SLASH
                | OPEN_SQUARE
                | CLOSE_SQUARE
                | HASH
        )
}

/// Bytes that end a word. A `/` ends a word only when a comment starts.
pub fn is_word_end(code: u8, next: Option<u8>) -> bool {
    is_space(code)
        || matches!(
            code,
            OPEN_PARENTHESES
                | CLOSE_PARENTHESES
                | OPEN_CURLY
                | CLOSE_CURLY
                | COLON
                | SEMICOLON
                | AT
                | BANG
                | SINGLE_QUOTE
                | DOUBLE_QUOTE
                | BACKSLASH
                | CLOSE_SQUARE
                | OPEN_SQUARE
                | HASH
        )
        || (code == SLASH && next == Some(ASTERISK))
}
