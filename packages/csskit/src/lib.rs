#![deny(clippy::all)]

//! csskit
//!
//! Lossless CSS parser, editable node tree and source map aware printer.
//! Parsing and printing an unmodified tree reproduces the input byte for
//! byte; edited trees are printed with whitespace inferred from the rest of
//! the stylesheet.

pub mod chars;
mod error;
pub mod input;
pub mod list;
pub mod map_generator;
pub mod node;
pub mod options;
pub mod parser;
pub mod path_util;
pub mod previous_map;
pub mod result;
pub mod source_map;
pub mod stringifier;
pub mod tokenizer;
pub mod vendor;

// Re-exports
pub use error::{CssSyntaxError, Error, InputPosition, Result};
pub use input::{Input, Session};
pub use node::{ErrorOptions, Node, NodeData, NodeInput, NodeProps, NodeType, Raws, Source, Walk};
pub use options::{Annotation, MapOptions, MapSetting, PrevMap, ProcessOptions};
pub use previous_map::PreviousMap;
pub use result::{TransformResult, Warning};

/// Parse `css` into a root node. Every call starts a new session, so
/// unnamed inputs of separate calls may share an id.
pub fn parse(css: &str, options: &ProcessOptions) -> Result<Node> {
    Session::new().parse(css, options)
}

/// Print a node without a source map.
pub fn stringify(node: &Node) -> String {
    node.to_string()
}
