//! Input
//!
//! CSS source text together with its file name and previous source map.
//! Positions reported against an input are remapped through that map when
//! one exists.

use crate::error::{CssSyntaxError, InputPosition, Result};
use crate::node::Node;
use crate::options::ProcessOptions;
use crate::parser::Parser;
use crate::path_util;
use crate::previous_map::PreviousMap;
use crate::source_map::Bias;
use std::cell::Cell;
use std::rc::Rc;

const BOM: char = '\u{feff}';

/// Parsing session. Inputs without a file name get ids that are unique
/// within the session that created them.
#[derive(Debug, Default)]
pub struct Session {
    sequence: Cell<usize>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> String {
        let next = self.sequence.get() + 1;
        self.sequence.set(next);
        format!("<input css {}>", next)
    }

    pub fn input(&self, css: &str, options: &ProcessOptions) -> Result<Input> {
        Input::new(css, options, self)
    }

    pub fn parse(&self, css: &str, options: &ProcessOptions) -> Result<Node> {
        let input = Rc::new(self.input(css, options)?);
        Parser::new(input, options.ignore_errors).parse()
    }
}

#[derive(Debug)]
pub struct Input {
    css: String,
    file: Option<String>,
    id: Option<String>,
    map: Option<PreviousMap>,
}

impl Input {
    pub fn new(css: &str, options: &ProcessOptions, session: &Session) -> Result<Self> {
        let css = css.strip_prefix(BOM).unwrap_or(css).to_owned();

        let mut file = options
            .from
            .as_deref()
            .filter(|from| !from.is_empty())
            .map(|from| {
                if path_util::is_url(from) {
                    from.to_owned()
                } else {
                    path_util::normalize_file(from)
                }
            });

        let mut map = PreviousMap::load(&css, options.from.as_deref(), options.prev())?;
        if let Some(previous) = &map {
            let consumer = previous.consumer()?;
            if file.is_none() {
                if let Some(map_file) = consumer.file().filter(|f| !f.is_empty()) {
                    file = Some(map_resolve(consumer.source_root(), map_file));
                }
            }
        }

        let id = match file {
            Some(_) => None,
            None => Some(session.next_id()),
        };

        let from = file.clone().or_else(|| id.clone());
        if let Some(previous) = &mut map {
            previous.set_file(from);
        }

        Ok(Input { css, file, id, map })
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// File name, or the generated id for unnamed input
    pub fn from(&self) -> &str {
        self.file
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or_default()
    }

    pub fn map(&self) -> Option<&PreviousMap> {
        self.map.as_ref()
    }

    /// Syntax error at `line`:`column` of this input, reported at the
    /// original position when a previous map knows it.
    pub fn error(
        &self,
        reason: &str,
        line: usize,
        column: usize,
        plugin: Option<&str>,
    ) -> CssSyntaxError {
        let plugin = plugin.map(str::to_owned);
        let error = match self.origin(line, column) {
            Some(origin) => CssSyntaxError::new(reason)
                .at(origin.line, origin.column)
                .with_css(origin.css)
                .with_file(origin.file)
                .with_plugin(plugin),
            None => CssSyntaxError::new(reason)
                .at(line, column)
                .with_css(self.css.clone())
                .with_file(self.file.clone())
                .with_plugin(plugin),
        };

        error.with_input(InputPosition {
            line,
            column,
            css: self.css.clone(),
            file: self.file.clone(),
        })
    }

    /// Position in the original source through the previous map.
    pub fn origin(&self, line: usize, column: usize) -> Option<InputPosition> {
        let consumer = self.map.as_ref()?.consumer().ok()?;
        let found = consumer
            .original_position_for(line, column, Bias::GreatestLowerBound)
            .ok()??;
        if found.source.is_empty() {
            return None;
        }

        let css = consumer
            .source_content_for(&found.source)
            .ok()
            .flatten()
            .unwrap_or_default()
            .to_owned();
        Some(InputPosition {
            line: found.line,
            column: found.column,
            css,
            file: Some(map_resolve(consumer.source_root(), &found.source)),
        })
    }
}

fn map_resolve(source_root: Option<&str>, file: &str) -> String {
    if path_util::is_url(file) {
        file.to_owned()
    } else {
        path_util::resolve(source_root.filter(|r| !r.is_empty()).unwrap_or("."), file)
    }
}
