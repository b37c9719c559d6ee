//! Tokenizer
//!
//! Splits CSS into tokens without losing a single byte: concatenating the
//! text of every token gives back the input. Columns count bytes from 1.

use crate::chars::{self, *};
use crate::error::Result;
use crate::input::Input;
use crate::source_map::Position;
use once_cell::sync::Lazy;
use regex::Regex;

static BAD_BRACKET_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r#".[\\/("'\n]"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Space,
    Word,
    String,
    AtWord,
    Comment,
    /// Parenthesised content kept as one token, e.g. `(a)` or the body of
    /// `url(...)`
    Brackets,
    OpenSquare,
    CloseSquare,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,
    Colon,
    Semicolon,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Space => "space",
            TokenKind::Word => "word",
            TokenKind::String => "string",
            TokenKind::AtWord => "at-word",
            TokenKind::Comment => "comment",
            TokenKind::Brackets => "brackets",
            TokenKind::OpenSquare => "[",
            TokenKind::CloseSquare => "]",
            TokenKind::OpenCurly => "{",
            TokenKind::CloseCurly => "}",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
        }
    }
}

/// Token borrowing its text from the input. Space tokens carry no position;
/// single-character punctuation carries only a start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: Option<Position>,
    pub end: Option<Position>,
}

impl<'a> Token<'a> {
    fn space(text: &'a str) -> Self {
        Token {
            kind: TokenKind::Space,
            text,
            start: None,
            end: None,
        }
    }

    fn punctuation(kind: TokenKind, text: &'a str, start: Position) -> Self {
        Token {
            kind,
            text,
            start: Some(start),
            end: None,
        }
    }

    fn span(kind: TokenKind, text: &'a str, start: Position, end: Position) -> Self {
        Token {
            kind,
            text,
            start: Some(start),
            end: Some(end),
        }
    }

    /// True for whitespace and comments
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Space | TokenKind::Comment)
    }
}

/// Tokenize the CSS of `input`. With `ignore_errors`, unclosed strings,
/// comments and `url(` stop at the end of input instead of failing.
pub fn tokenize(input: &Input, ignore_errors: bool) -> Result<Vec<Token<'_>>> {
    let tokens = Tokenizer::new(input, ignore_errors).run()?;
    tracing::trace!(tokens = tokens.len(), from = input.from(), "tokenized css");
    Ok(tokens)
}

struct Tokenizer<'a> {
    input: &'a Input,
    css: &'a str,
    bytes: &'a [u8],
    ignore_errors: bool,
    tokens: Vec<Token<'a>>,
    pos: usize,
    line: usize,
    /// Index of the last line break; -1 before the first one
    offset: isize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a Input, ignore_errors: bool) -> Self {
        let css = input.css();
        Tokenizer {
            input,
            css,
            bytes: css.as_bytes(),
            ignore_errors,
            tokens: Vec::new(),
            pos: 0,
            line: 1,
            offset: -1,
        }
    }

    fn column(&self, index: usize) -> usize {
        (index as isize - self.offset) as usize
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column(self.pos))
    }

    fn at(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// Source text of `from..=to_inclusive`, widened to whole characters.
    fn text(&self, from: usize, to_inclusive: usize) -> &'a str {
        let mut start = from.min(self.css.len());
        while !self.css.is_char_boundary(start) {
            start -= 1;
        }
        let mut end = (to_inclusive + 1).min(self.css.len());
        while !self.css.is_char_boundary(end) {
            end += 1;
        }
        &self.css[start..end]
    }

    fn unclosed(&self, what: &str) -> crate::error::Error {
        self.input
            .error(
                &format!("Unclosed {}", what),
                self.line,
                self.column(self.pos),
                None,
            )
            .into()
    }

    fn run(mut self) -> Result<Vec<Token<'a>>> {
        let length = self.bytes.len();

        while self.pos < length {
            let code = self.bytes[self.pos];

            if code == NEWLINE
                || code == FEED
                || (code == CR && self.at(self.pos + 1) != Some(NEWLINE))
            {
                self.offset = self.pos as isize;
                self.line += 1;
            }

            match code {
                NEWLINE | SPACE | TAB | CR | FEED => self.space(),
                OPEN_SQUARE => self.punctuation(TokenKind::OpenSquare),
                CLOSE_SQUARE => self.punctuation(TokenKind::CloseSquare),
                OPEN_CURLY => self.punctuation(TokenKind::OpenCurly),
                CLOSE_CURLY => self.punctuation(TokenKind::CloseCurly),
                COLON => self.punctuation(TokenKind::Colon),
                SEMICOLON => self.punctuation(TokenKind::Semicolon),
                CLOSE_PARENTHESES => self.punctuation(TokenKind::CloseParen),
                OPEN_PARENTHESES => self.parentheses()?,
                SINGLE_QUOTE | DOUBLE_QUOTE => self.string(code)?,
                AT => self.at_word(),
                BACKSLASH => self.backslash(),
                SLASH if self.at(self.pos + 1) == Some(ASTERISK) => self.comment()?,
                _ => self.word(),
            }

            self.pos += 1;
        }

        Ok(self.tokens)
    }

    fn space(&mut self) {
        let mut next = self.pos;
        loop {
            next += 1;
            match self.at(next) {
                Some(NEWLINE) => {
                    self.offset = next as isize;
                    self.line += 1;
                }
                Some(code) if chars::is_space(code) => {}
                _ => break,
            }
        }
        self.tokens.push(Token::space(&self.css[self.pos..next]));
        self.pos = next - 1;
    }

    fn punctuation(&mut self, kind: TokenKind) {
        let text = &self.css[self.pos..self.pos + 1];
        self.tokens.push(Token::punctuation(kind, text, self.here()));
    }

    /// Index of the next unescaped `needle` after `from`.
    fn find_unescaped(&self, needle: u8, from: usize) -> Option<usize> {
        let mut next = from;
        loop {
            next = next + 1 + self.bytes.get(next + 1..)?.iter().position(|b| *b == needle)?;
            let mut escape_pos = next;
            let mut escaped = false;
            while escape_pos > 0 && self.bytes[escape_pos - 1] == BACKSLASH {
                escape_pos -= 1;
                escaped = !escaped;
            }
            if !escaped {
                return Some(next);
            }
        }
    }

    fn parentheses(&mut self) -> Result<()> {
        let prev = self.tokens.last().map(|t| t.text);
        let n = self.at(self.pos + 1);
        let quoted_or_spaced = matches!(n, Some(SINGLE_QUOTE) | Some(DOUBLE_QUOTE))
            || n.map_or(false, chars::is_space);

        if prev == Some("url") && !quoted_or_spaced {
            let next = match self.find_unescaped(CLOSE_PARENTHESES, self.pos) {
                Some(next) => next,
                None if self.ignore_errors => self.pos,
                None => return Err(self.unclosed("bracket")),
            };
            let start = self.here();
            let end = Position::new(self.line, self.column(next));
            self.tokens.push(Token::span(
                TokenKind::Brackets,
                self.text(self.pos, next),
                start,
                end,
            ));
            self.pos = next;
            return Ok(());
        }

        let close = self.bytes[self.pos + 1..]
            .iter()
            .position(|b| *b == CLOSE_PARENTHESES)
            .map(|i| self.pos + 1 + i);
        match close {
            Some(next) if !BAD_BRACKET_REGEXP.is_match(self.text(self.pos, next)) => {
                let start = self.here();
                let end = Position::new(self.line, self.column(next));
                self.tokens.push(Token::span(
                    TokenKind::Brackets,
                    self.text(self.pos, next),
                    start,
                    end,
                ));
                self.pos = next;
            }
            _ => self.punctuation(TokenKind::OpenParen),
        }
        Ok(())
    }

    fn string(&mut self, quote: u8) -> Result<()> {
        let next = match self.find_unescaped(quote, self.pos) {
            Some(next) => next,
            None if self.ignore_errors => {
                let mut next = self.pos + 1;
                while next < self.bytes.len() && !self.css.is_char_boundary(next + 1) {
                    next += 1;
                }
                next
            }
            None => return Err(self.unclosed("quote")),
        };
        self.multiline(TokenKind::String, next);
        Ok(())
    }

    fn comment(&mut self) -> Result<()> {
        let next = match self.css[self.pos + 2..].find("*/") {
            Some(index) => self.pos + 2 + index + 1,
            None if self.ignore_errors => self.bytes.len(),
            None => return Err(self.unclosed("comment")),
        };
        self.multiline(TokenKind::Comment, next);
        Ok(())
    }

    /// Push a string or comment token ending at `next`, which may span lines.
    fn multiline(&mut self, kind: TokenKind, next: usize) {
        let content = self.text(self.pos, next);
        let start = self.here();

        let (next_line, next_offset) = match content.rfind('\n') {
            Some(last_break) => (
                self.line + content.matches('\n').count(),
                (next - (content.len() - last_break - 1)) as isize,
            ),
            None => (self.line, self.offset),
        };
        let end = Position::new(next_line, (next as isize - next_offset) as usize);
        self.tokens.push(Token::span(kind, content, start, end));

        self.offset = next_offset;
        self.line = next_line;
        self.pos = next;
    }

    fn at_word(&mut self) {
        let next = self.bytes[self.pos + 1..]
            .iter()
            .position(|b| chars::is_at_end(*b))
            .map_or(self.bytes.len() - 1, |i| self.pos + i);
        self.push_word(TokenKind::AtWord, next);
    }

    fn backslash(&mut self) {
        let length = self.bytes.len();
        let mut next = self.pos;
        let mut escape = true;
        while next + 1 < length && self.bytes[next + 1] == BACKSLASH {
            next += 1;
            escape = !escape;
        }
        let code = self.at(next + 1);
        if escape && code.map_or(true, |c| c != SLASH && !chars::is_space(c)) {
            // the escaped character may span several bytes
            next += self.css[next + 1..].chars().next().map_or(1, char::len_utf8);
        }
        self.push_word(TokenKind::Word, next);
    }

    fn word(&mut self) {
        let start = self.pos + 1;
        let next = (start..self.bytes.len())
            .find(|&i| chars::is_word_end(self.bytes[i], self.at(i + 1)))
            .map_or(self.bytes.len() - 1, |i| i - 1);
        self.push_word(TokenKind::Word, next);
    }

    fn push_word(&mut self, kind: TokenKind, next: usize) {
        let start = self.here();
        let end = Position::new(self.line, self.column(next));
        let text = self.text(self.pos, next);
        self.tokens.push(Token::span(kind, text, start, end));
        self.pos = next;
    }
}
