//! Transform result
//!
//! Printed CSS, its source map, and the warnings collected while working on
//! the tree.

use crate::error::Result;
use crate::map_generator::MapGenerator;
use crate::node::{ErrorOptions, Node};
use crate::options::ProcessOptions;
use crate::source_map::SourceMapGenerator;
use std::fmt;

/// Non-fatal problem found in a stylesheet
#[derive(Debug, Clone)]
pub struct Warning {
    pub text: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub node: Option<Node>,
    pub plugin: Option<String>,
    pub index: Option<usize>,
    pub word: Option<String>,
}

impl Warning {
    pub fn new(text: impl Into<String>, node: Option<Node>, options: ErrorOptions) -> Self {
        let position = node.as_ref().and_then(|node| {
            node.source()?;
            node.position_by(options.index, options.word.as_deref())
        });
        Warning {
            text: text.into(),
            line: position.map(|p| p.line),
            column: position.map(|p| p.column),
            node,
            plugin: options.plugin,
            index: options.index,
            word: options.word,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.node, &self.plugin) {
            (Some(node), _) => {
                let error = node.error(
                    &self.text,
                    &ErrorOptions {
                        plugin: self.plugin.clone(),
                        index: self.index,
                        word: self.word.clone(),
                    },
                );
                f.write_str(error.message())
            }
            (None, Some(plugin)) => write!(f, "{}: {}", plugin, self.text),
            (None, None) => f.write_str(&self.text),
        }
    }
}

#[derive(Debug)]
pub struct TransformResult {
    pub css: String,
    /// Separate source map; `None` when no map was generated or when it
    /// was inlined into `css`
    pub map: Option<SourceMapGenerator>,
    pub root: Node,
    pub options: ProcessOptions,
    pub messages: Vec<Warning>,
}

impl TransformResult {
    /// Print `root` with `options`.
    pub fn new(root: &Node, options: &ProcessOptions) -> Result<Self> {
        let (css, map) = MapGenerator::new(root, options).generate()?;
        Ok(TransformResult {
            css,
            map,
            root: root.clone(),
            options: options.clone(),
            messages: Vec::new(),
        })
    }

    pub fn content(&self) -> &str {
        &self.css
    }

    /// Record a warning not tied to a node.
    pub fn warn(&mut self, text: &str, options: ErrorOptions) -> &Warning {
        self.warn_about(text, None, options)
    }

    pub(crate) fn warn_about(
        &mut self,
        text: &str,
        node: Option<Node>,
        options: ErrorOptions,
    ) -> &Warning {
        let warning = Warning::new(text, node, options);
        tracing::debug!(warning = %warning, "warning recorded");
        self.messages.push(warning);
        &self.messages[self.messages.len() - 1]
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.messages
    }
}

impl fmt::Display for TransformResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css)
    }
}
