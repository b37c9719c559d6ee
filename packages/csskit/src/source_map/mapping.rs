//! Mappings
//!
//! A single generated-to-original correspondence and the orderings used to
//! sort them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Line/column pair. Lines are 1-based everywhere. Columns are 1-based for
/// node source positions and 0-based inside source maps.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    pub generated: Position,
    pub original: Option<Position>,
    pub source: Option<String>,
    pub name: Option<String>,
}

impl Mapping {
    pub fn new(generated: Position) -> Self {
        Mapping {
            generated,
            ..Default::default()
        }
    }

    pub fn with_original(mut self, source: impl Into<String>, original: Position) -> Self {
        self.source = Some(source.into());
        self.original = Some(original);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

fn compare_str(a: Option<&str>, b: Option<&str>) -> Ordering {
    a.unwrap_or("").cmp(b.unwrap_or(""))
}

fn original_line(mapping: &Mapping) -> usize {
    mapping.original.map_or(0, |p| p.line)
}

fn original_column(mapping: &Mapping) -> usize {
    mapping.original.map_or(0, |p| p.column)
}

/// Generated position first, then source, original position and name.
/// Missing strings order as empty ones.
pub fn compare_by_generated_positions_inflated(a: &Mapping, b: &Mapping) -> Ordering {
    a.generated
        .line
        .cmp(&b.generated.line)
        .then(a.generated.column.cmp(&b.generated.column))
        .then_with(|| compare_str(a.source.as_deref(), b.source.as_deref()))
        .then(original_line(a).cmp(&original_line(b)))
        .then(original_column(a).cmp(&original_column(b)))
        .then_with(|| compare_str(a.name.as_deref(), b.name.as_deref()))
}

/// Source and original position first, then generated position and name.
pub fn compare_by_original_positions(a: &Mapping, b: &Mapping) -> Ordering {
    compare_str(a.source.as_deref(), b.source.as_deref())
        .then(original_line(a).cmp(&original_line(b)))
        .then(original_column(a).cmp(&original_column(b)))
        .then(a.generated.column.cmp(&b.generated.column))
        .then(a.generated.line.cmp(&b.generated.line))
        .then_with(|| compare_str(a.name.as_deref(), b.name.as_deref()))
}

/// Mapping as stored by a consumer: sources and names are indices into the
/// consumer's tables, original coordinates are zero when there is no source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct IndexedMapping {
    pub generated_line: usize,
    pub generated_column: usize,
    pub source: Option<usize>,
    pub original_line: usize,
    pub original_column: usize,
    pub name: Option<usize>,
}

impl IndexedMapping {
    pub fn generated_key(&self) -> (usize, usize) {
        (self.generated_line, self.generated_column)
    }

    pub fn original_key(&self) -> (Option<usize>, usize, usize) {
        (self.source, self.original_line, self.original_column)
    }
}

pub(crate) fn compare_by_generated_positions_deflated(
    a: &IndexedMapping,
    b: &IndexedMapping,
) -> Ordering {
    a.generated_key()
        .cmp(&b.generated_key())
        .then(a.source.cmp(&b.source))
        .then(a.original_line.cmp(&b.original_line))
        .then(a.original_column.cmp(&b.original_column))
        .then(a.name.cmp(&b.name))
}

pub(crate) fn compare_by_original_indices(a: &IndexedMapping, b: &IndexedMapping) -> Ordering {
    a.original_key()
        .cmp(&b.original_key())
        .then(a.generated_column.cmp(&b.generated_column))
        .then(a.generated_line.cmp(&b.generated_line))
        .then(a.name.cmp(&b.name))
}
