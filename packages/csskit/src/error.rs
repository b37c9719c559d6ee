//! Errors
//!
//! `Error` is returned by every fallible operation of the crate.
//! `CssSyntaxError` carries the position of a problem in the CSS source and
//! can render a code excerpt pointing at it.

use crate::source_map::VlqError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] CssSyntaxError),

    #[error("Unsupported source map encoding{}", describe_encoding(.0))]
    Encoding(String),

    #[error("Unsupported previous source map format: {0}")]
    MapFormat(String),

    #[error("Unable to load previous source map: {}", .0.display())]
    MapLoad(PathBuf),

    #[error(transparent)]
    Vlq(#[from] VlqError),

    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    #[error("Invalid source map: {0}")]
    InvalidSourceMap(String),

    #[error("Indexed source maps do not support {0}")]
    UnsupportedIndexedMap(&'static str),

    #[error("SourceMapGenerator.apply_source_map requires either an explicit source file, or the source map's file property")]
    MissingSourceFile,

    #[error("{0}")]
    NodeCreation(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn describe_encoding(encoding: &str) -> String {
    if encoding.is_empty() {
        String::new()
    } else {
        format!(": {}", encoding)
    }
}

impl Error {
    pub fn as_syntax(&self) -> Option<&CssSyntaxError> {
        match self {
            Error::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

/// Position of an error in the immediate input, kept when the reported
/// position was remapped through a previous source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPosition {
    pub line: usize,
    pub column: usize,
    pub css: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssSyntaxError {
    pub reason: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    /// CSS the error was found in
    pub css: Option<String>,
    pub file: Option<String>,
    pub plugin: Option<String>,
    pub input: Option<InputPosition>,
    /// Appended after the reason every time the message is rebuilt
    notes: String,
    message: String,
}

impl CssSyntaxError {
    pub fn new(reason: impl Into<String>) -> Self {
        let mut error = CssSyntaxError {
            reason: reason.into(),
            line: None,
            column: None,
            css: None,
            file: None,
            plugin: None,
            input: None,
            notes: String::new(),
            message: String::new(),
        };
        error.set_message();
        error
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self.set_message();
        self
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self.set_message();
        self
    }

    pub fn with_plugin(mut self, plugin: Option<String>) -> Self {
        self.plugin = plugin;
        self.set_message();
        self
    }

    pub fn with_input(mut self, input: InputPosition) -> Self {
        self.input = Some(input);
        self
    }

    /// `[plugin: ]file:line:column: reason`
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Append a note to the message, e.g. a hint about the input syntax.
    pub fn append_to_message(&mut self, note: &str) {
        self.notes.push_str(note);
        self.message.push_str(note);
    }

    fn set_message(&mut self) {
        let mut message = String::new();
        if let Some(plugin) = &self.plugin {
            message.push_str(plugin);
            message.push_str(": ");
        }
        message.push_str(self.file.as_deref().unwrap_or("<css input>"));
        if let (Some(line), Some(column)) = (self.line, self.column) {
            message.push_str(&format!(":{}:{}", line, column));
        }
        message.push_str(": ");
        message.push_str(&self.reason);
        message.push_str(&self.notes);
        self.message = message;
    }

    /// Lines around the error with a `>` marker and a caret under the
    /// column. Empty without source text or position.
    pub fn show_source_code(&self) -> String {
        let (Some(css), Some(line), Some(column)) = (&self.css, self.line, self.column) else {
            return String::new();
        };

        let lines: Vec<&str> = css
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
        let start = line.saturating_sub(3);
        let end = (line + 2).min(lines.len());
        let max_width = end.to_string().len();

        let mut excerpt: Vec<String> = Vec::new();
        for (index, text) in lines.iter().enumerate().take(end).skip(start) {
            let number = index + 1;
            let gutter = format!(" {:>width$} | ", number, width = max_width);
            if number == line {
                let blank_gutter: String = gutter
                    .chars()
                    .map(|c| if c.is_ascii_digit() { ' ' } else { c })
                    .collect();
                let prefix = text.get(..column.saturating_sub(1)).unwrap_or(text);
                let spacing: String = prefix
                    .chars()
                    .map(|c| if c == '\t' { '\t' } else { ' ' })
                    .collect();
                excerpt.push(format!(">{}{}\n {}{}^", gutter, text, blank_gutter, spacing));
            } else {
                excerpt.push(format!(" {}{}", gutter, text));
            }
        }
        excerpt.join("\n")
    }
}

impl fmt::Display for CssSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CssSyntaxError: {}", self.message)?;
        let code = self.show_source_code();
        if !code.is_empty() {
            write!(f, "\n\n{}\n", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for CssSyntaxError {}
