//! Source Map Consumer
//!
//! Read side of source maps. A regular map is decoded once into two sorted
//! views, one by generated position and one by original position, and both
//! are queried with a binary search. Indexed maps delegate to the section
//! that covers the queried generated position.

use super::generator::SourceMapGenerator;
use super::mapping::{
    compare_by_generated_positions_deflated, compare_by_original_indices, IndexedMapping,
    Mapping, Position,
};
use super::raw::{RawSection, RawSourceMap, VERSION};
use super::vlq;
use crate::error::{Error, Result};
use crate::path_util;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Which neighbour a search settles on when there is no exact match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Bias {
    #[default]
    GreatestLowerBound,
    LeastUpperBound,
}

/// Iteration order for `each_mapping`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Generated,
    Original,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPosition {
    pub source: String,
    pub line: usize,
    pub column: usize,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedPosition {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub enum SourceMapConsumer {
    Basic(BasicSourceMapConsumer),
    Indexed(IndexedSourceMapConsumer),
}

impl SourceMapConsumer {
    pub fn from_json(text: &str) -> Result<Self> {
        let raw = RawSourceMap::from_json(text)?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawSourceMap) -> Result<Self> {
        if raw.is_indexed() {
            Ok(SourceMapConsumer::Indexed(IndexedSourceMapConsumer::new(
                raw,
            )?))
        } else {
            Ok(SourceMapConsumer::Basic(BasicSourceMapConsumer::new(raw)?))
        }
    }

    pub fn from_generator(generator: &SourceMapGenerator) -> Self {
        SourceMapConsumer::Basic(BasicSourceMapConsumer::from_generator(generator))
    }

    pub fn file(&self) -> Option<&str> {
        match self {
            SourceMapConsumer::Basic(basic) => basic.file.as_deref(),
            SourceMapConsumer::Indexed(indexed) => indexed.file.as_deref(),
        }
    }

    pub fn source_root(&self) -> Option<&str> {
        match self {
            SourceMapConsumer::Basic(basic) => basic.source_root.as_deref(),
            SourceMapConsumer::Indexed(_) => None,
        }
    }

    pub fn sources(&self) -> Result<Vec<String>> {
        match self {
            SourceMapConsumer::Basic(basic) => Ok(basic.sources()),
            SourceMapConsumer::Indexed(indexed) => Ok(indexed.sources()),
        }
    }

    pub fn original_position_for(
        &self,
        line: usize,
        column: usize,
        bias: Bias,
    ) -> Result<Option<OriginalPosition>> {
        match self {
            SourceMapConsumer::Basic(basic) => Ok(basic.original_position_for(line, column, bias)),
            SourceMapConsumer::Indexed(indexed) => {
                Ok(indexed.original_position_for(line, column, bias))
            }
        }
    }

    pub fn generated_position_for(
        &self,
        source: &str,
        line: usize,
        column: usize,
        bias: Bias,
    ) -> Result<Option<GeneratedPosition>> {
        Ok(self
            .basic("generated_position_for")?
            .generated_position_for(source, line, column, bias))
    }

    pub fn all_generated_positions_for(
        &self,
        source: &str,
        line: usize,
        column: Option<usize>,
    ) -> Result<Vec<GeneratedPosition>> {
        Ok(self
            .basic("all_generated_positions_for")?
            .all_generated_positions_for(source, line, column))
    }

    pub fn source_content_for(&self, source: &str) -> Result<Option<&str>> {
        match self {
            SourceMapConsumer::Basic(basic) => Ok(basic.source_content_for(source)),
            // sections carry no content of their own
            SourceMapConsumer::Indexed(indexed) => Ok(indexed
                .sections
                .iter()
                .find_map(|section| section.consumer.source_content_for(source))),
        }
    }

    pub fn has_contents_of_all_sources(&self) -> Result<bool> {
        Ok(self
            .basic("has_contents_of_all_sources")?
            .has_contents_of_all_sources())
    }

    pub fn each_mapping(
        &self,
        order: Order,
        callback: impl FnMut(&Mapping) -> Result<()>,
    ) -> Result<()> {
        self.basic("each_mapping")?.each_mapping(order, callback)
    }

    /// Same map with every source content dropped.
    pub fn without_content(&self) -> Self {
        match self {
            SourceMapConsumer::Basic(basic) => {
                let mut basic = basic.clone();
                basic.sources_content = None;
                SourceMapConsumer::Basic(basic)
            }
            SourceMapConsumer::Indexed(indexed) => {
                let mut indexed = indexed.clone();
                for section in &mut indexed.sections {
                    section.consumer.sources_content = None;
                }
                SourceMapConsumer::Indexed(indexed)
            }
        }
    }

    fn basic(&self, operation: &'static str) -> Result<&BasicSourceMapConsumer> {
        match self {
            SourceMapConsumer::Basic(basic) => Ok(basic),
            SourceMapConsumer::Indexed(_) => Err(Error::UnsupportedIndexedMap(operation)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BasicSourceMapConsumer {
    file: Option<String>,
    source_root: Option<String>,
    sources: Vec<String>,
    names: Vec<String>,
    sources_content: Option<Vec<Option<String>>>,
    generated_mappings: Vec<IndexedMapping>,
    original_mappings: Vec<IndexedMapping>,
}

impl BasicSourceMapConsumer {
    pub fn new(raw: RawSourceMap) -> Result<Self> {
        if raw.version != VERSION {
            return Err(Error::InvalidSourceMap(format!(
                "Unsupported version: {}",
                raw.version
            )));
        }

        let source_root = raw.source_root.filter(|root| !root.is_empty());
        let sources = raw
            .sources
            .iter()
            .map(|source| {
                let source = path_util::normalize(source);
                match &source_root {
                    Some(root)
                        if path_util::is_absolute(root) && path_util::is_absolute(&source) =>
                    {
                        path_util::relative(root, &source)
                    }
                    _ => source,
                }
            })
            .collect();

        let mut consumer = BasicSourceMapConsumer {
            file: raw.file,
            source_root,
            sources,
            names: raw.names,
            sources_content: raw.sources_content,
            generated_mappings: Vec::new(),
            original_mappings: Vec::new(),
        };
        consumer.parse_mappings(&raw.mappings)?;
        Ok(consumer)
    }

    pub fn from_generator(generator: &SourceMapGenerator) -> Self {
        let sources: Vec<String> = generator.sources().map(str::to_owned).collect();
        let names: Vec<String> = generator.names().map(str::to_owned).collect();
        let raw = generator.to_raw();

        let generated_mappings: Vec<IndexedMapping> = generator
            .mappings()
            .to_array()
            .iter()
            .map(|mapping| {
                let original = mapping.original.unwrap_or_default();
                let source = mapping
                    .source
                    .as_ref()
                    .and_then(|s| sources.iter().position(|x| x == s));
                IndexedMapping {
                    generated_line: mapping.generated.line,
                    generated_column: mapping.generated.column,
                    source,
                    original_line: if source.is_some() { original.line } else { 0 },
                    original_column: if source.is_some() { original.column } else { 0 },
                    name: mapping
                        .name
                        .as_ref()
                        .and_then(|n| names.iter().position(|x| x == n)),
                }
            })
            .collect();

        let mut original_mappings: Vec<IndexedMapping> = generated_mappings
            .iter()
            .filter(|m| m.source.is_some())
            .copied()
            .collect();
        original_mappings.sort_by(compare_by_original_indices);

        BasicSourceMapConsumer {
            file: raw.file,
            source_root: raw.source_root,
            sources,
            names,
            sources_content: raw.sources_content,
            generated_mappings,
            original_mappings,
        }
    }

    fn parse_mappings(&mut self, mappings: &str) -> Result<()> {
        let bytes = mappings.as_bytes();
        let mut cache: HashMap<&str, SmallVec<[i64; 5]>> = HashMap::new();

        let mut generated_line = 1usize;
        let mut previous_generated_column = 0i64;
        let mut previous_original_line = 0i64;
        let mut previous_original_column = 0i64;
        let mut previous_source = 0i64;
        let mut previous_name = 0i64;
        let mut index = 0usize;

        while index < bytes.len() {
            match bytes[index] {
                b';' => {
                    generated_line += 1;
                    index += 1;
                    previous_generated_column = 0;
                }
                b',' => index += 1,
                _ => {
                    let end = bytes[index..]
                        .iter()
                        .position(|b| *b == b',' || *b == b';')
                        .map_or(bytes.len(), |offset| index + offset);
                    let key = &mappings[index..end];

                    let segment = match cache.get(key) {
                        Some(segment) => segment.clone(),
                        None => {
                            let segment = decode_segment(key.as_bytes())?;
                            cache.insert(key, segment.clone());
                            segment
                        }
                    };
                    index = end;

                    let mut mapping = IndexedMapping {
                        generated_line,
                        ..Default::default()
                    };
                    previous_generated_column += segment[0];
                    mapping.generated_column = to_position(previous_generated_column)?;

                    if segment.len() > 1 {
                        previous_source += segment[1];
                        previous_original_line += segment[2];
                        previous_original_column += segment[3];
                        mapping.source = Some(to_position(previous_source)?);
                        // stored 0-based, exposed 1-based
                        mapping.original_line = to_position(previous_original_line)? + 1;
                        mapping.original_column = to_position(previous_original_column)?;

                        if segment.len() > 4 {
                            previous_name += segment[4];
                            mapping.name = Some(to_position(previous_name)?);
                        }
                    }

                    self.generated_mappings.push(mapping);
                    if mapping.source.is_some() {
                        self.original_mappings.push(mapping);
                    }
                }
            }
        }

        self.generated_mappings
            .sort_by(compare_by_generated_positions_deflated);
        self.original_mappings.sort_by(compare_by_original_indices);
        tracing::trace!(
            mappings = self.generated_mappings.len(),
            "decoded source map mappings"
        );
        Ok(())
    }

    fn source_path(&self, index: usize) -> Option<String> {
        let source = self.sources.get(index)?;
        Some(match &self.source_root {
            Some(root) => path_util::join(root, source),
            None => source.clone(),
        })
    }

    fn source_index(&self, source: &str) -> Option<usize> {
        let source = match &self.source_root {
            Some(root) => path_util::relative(root, source),
            None => source.to_owned(),
        };
        self.sources.iter().position(|s| *s == source)
    }

    /// Sources as listed in the map, joined onto `sourceRoot`.
    pub fn sources(&self) -> Vec<String> {
        (0..self.sources.len())
            .filter_map(|i| self.source_path(i))
            .collect()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    fn to_mapping(&self, mapping: &IndexedMapping) -> Mapping {
        let source = mapping.source.and_then(|i| self.source_path(i));
        Mapping {
            generated: Position::new(mapping.generated_line, mapping.generated_column),
            original: source
                .as_ref()
                .map(|_| Position::new(mapping.original_line, mapping.original_column)),
            source,
            name: mapping.name.and_then(|i| self.names.get(i).cloned()),
        }
    }

    pub fn each_mapping(
        &self,
        order: Order,
        mut callback: impl FnMut(&Mapping) -> Result<()>,
    ) -> Result<()> {
        let mappings = match order {
            Order::Generated => &self.generated_mappings,
            Order::Original => &self.original_mappings,
        };
        for mapping in mappings {
            callback(&self.to_mapping(mapping))?;
        }
        Ok(())
    }

    /// Original position for a generated position. `None` when nothing on
    /// that generated line maps to a source.
    pub fn original_position_for(
        &self,
        line: usize,
        column: usize,
        bias: Bias,
    ) -> Option<OriginalPosition> {
        let index = search(
            &(line, column),
            &self.generated_mappings,
            IndexedMapping::generated_key,
            bias,
        )?;
        let mapping = &self.generated_mappings[index];
        if mapping.generated_line != line {
            return None;
        }

        let source = self.source_path(mapping.source?)?;
        Some(OriginalPosition {
            source,
            line: mapping.original_line,
            column: mapping.original_column,
            name: mapping.name.and_then(|i| self.names.get(i).cloned()),
        })
    }

    pub fn generated_position_for(
        &self,
        source: &str,
        line: usize,
        column: usize,
        bias: Bias,
    ) -> Option<GeneratedPosition> {
        let source_index = self.source_index(source)?;
        let index = search(
            &(Some(source_index), line, column),
            &self.original_mappings,
            IndexedMapping::original_key,
            bias,
        )?;
        let mapping = &self.original_mappings[index];
        if mapping.source != Some(source_index) {
            return None;
        }
        Some(GeneratedPosition {
            line: mapping.generated_line,
            column: mapping.generated_column,
        })
    }

    /// Every generated position for an original line, or for a line and
    /// column. Without an exact hit the closest following line (or column)
    /// that has mappings is used.
    pub fn all_generated_positions_for(
        &self,
        source: &str,
        line: usize,
        column: Option<usize>,
    ) -> Vec<GeneratedPosition> {
        let mut positions = Vec::new();
        let Some(source_index) = self.source_index(source) else {
            return positions;
        };
        let Some(start) = search(
            &(Some(source_index), line, column.unwrap_or(0)),
            &self.original_mappings,
            IndexedMapping::original_key,
            Bias::LeastUpperBound,
        ) else {
            return positions;
        };

        let first = self.original_mappings[start];
        for mapping in &self.original_mappings[start..] {
            let same = match column {
                None => mapping.original_line == first.original_line,
                Some(_) => {
                    mapping.original_line == line
                        && mapping.original_column == first.original_column
                }
            };
            if !same || mapping.source != Some(source_index) {
                break;
            }
            positions.push(GeneratedPosition {
                line: mapping.generated_line,
                column: mapping.generated_column,
            });
        }
        positions
    }

    pub fn source_content_for(&self, source: &str) -> Option<&str> {
        let contents = self.sources_content.as_ref()?;
        let index = self.source_index(source).or_else(|| {
            // `file://` roots may list sources with the scheme stripped
            let root = self.source_root.as_deref()?;
            let parts = path_util::url_parse(root)?;
            let bare = source.strip_prefix("file://");
            let candidate = match (parts.scheme.as_str(), bare) {
                ("file", Some(bare)) => bare.to_owned(),
                _ if parts.path.is_empty() || parts.path == "/" => format!("/{}", source),
                _ => return None,
            };
            self.sources.iter().position(|s| *s == candidate)
        })?;
        contents.get(index)?.as_deref()
    }

    pub fn has_contents_of_all_sources(&self) -> bool {
        match &self.sources_content {
            Some(contents) => {
                contents.len() >= self.sources.len()
                    && contents.iter().take(self.sources.len()).all(Option::is_some)
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Section {
    /// 1-based generated line and 1-based column of the section start
    generated_offset: Position,
    consumer: BasicSourceMapConsumer,
}

#[derive(Debug, Clone)]
pub struct IndexedSourceMapConsumer {
    file: Option<String>,
    sections: Vec<Section>,
}

impl IndexedSourceMapConsumer {
    pub fn new(raw: RawSourceMap) -> Result<Self> {
        if raw.version != VERSION {
            return Err(Error::InvalidSourceMap(format!(
                "Unsupported version: {}",
                raw.version
            )));
        }

        let mut last_offset = (0usize, 0usize);
        let mut sections = Vec::new();
        for RawSection { offset, url, map } in raw.sections.unwrap_or_default() {
            if url.is_some() {
                return Err(Error::InvalidSourceMap(
                    "Support for url field in sections not implemented.".into(),
                ));
            }
            if (offset.line, offset.column) < last_offset {
                return Err(Error::InvalidSourceMap(
                    "Section offsets must be ordered and non-overlapping.".into(),
                ));
            }
            last_offset = (offset.line, offset.column);

            let map = map.ok_or_else(|| {
                Error::InvalidSourceMap("Section without a map".into())
            })?;
            if map.is_indexed() {
                return Err(Error::InvalidSourceMap(
                    "Nested indexed source maps are not supported".into(),
                ));
            }
            sections.push(Section {
                generated_offset: Position::new(offset.line + 1, offset.column + 1),
                consumer: BasicSourceMapConsumer::new(*map)?,
            });
        }

        Ok(IndexedSourceMapConsumer {
            file: raw.file,
            sections,
        })
    }

    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for section in &self.sections {
            for source in section.consumer.sources() {
                if !sources.contains(&source) {
                    sources.push(source);
                }
            }
        }
        sources
    }

    pub fn original_position_for(
        &self,
        line: usize,
        column: usize,
        bias: Bias,
    ) -> Option<OriginalPosition> {
        let index = search(
            &(line, column),
            &self.sections,
            |section| (section.generated_offset.line, section.generated_offset.column),
            Bias::GreatestLowerBound,
        )?;
        let section = &self.sections[index];
        let offset = section.generated_offset;
        let column = if offset.line == line {
            column.checked_sub(offset.column - 1)?
        } else {
            column
        };
        section
            .consumer
            .original_position_for(line - (offset.line - 1), column, bias)
    }
}

fn decode_segment(bytes: &[u8]) -> Result<SmallVec<[i64; 5]>> {
    let mut segment = SmallVec::new();
    let mut index = 0;
    while index < bytes.len() {
        let (value, consumed) = vlq::decode_at(bytes, index)?;
        segment.push(value);
        index += consumed;
    }

    match segment.len() {
        2 => Err(Error::InvalidSourceMap(
            "Found a source, but no line and column".into(),
        )),
        3 => Err(Error::InvalidSourceMap(
            "Found a source and line, but no column".into(),
        )),
        0 => Err(Error::InvalidSourceMap("Empty mapping segment".into())),
        _ => Ok(segment),
    }
}

fn to_position(value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| Error::InvalidSourceMap(format!("Negative position in mappings: {}", value)))
}

/// Binary search over a sorted slice. On an exact match the first of several
/// equal entries is returned; otherwise the bias picks the neighbour.
pub(crate) fn search<T, K: Ord>(
    needle: &K,
    haystack: &[T],
    key: impl Fn(&T) -> K,
    bias: Bias,
) -> Option<usize> {
    if haystack.is_empty() {
        return None;
    }

    let len = haystack.len() as isize;
    let mut low: isize = -1;
    let mut high: isize = len;
    let found = loop {
        let mid = (high - low) / 2 + low;
        match needle.cmp(&key(&haystack[mid as usize])) {
            Ordering::Equal => break mid,
            Ordering::Greater => {
                if high - mid > 1 {
                    low = mid;
                    continue;
                }
                break match bias {
                    Bias::LeastUpperBound if high < len => high,
                    Bias::LeastUpperBound => -1,
                    Bias::GreatestLowerBound => mid,
                };
            }
            Ordering::Less => {
                if mid - low > 1 {
                    high = mid;
                    continue;
                }
                break match bias {
                    Bias::LeastUpperBound => mid,
                    Bias::GreatestLowerBound => low,
                };
            }
        }
    };

    if found < 0 {
        return None;
    }
    let mut index = found as usize;
    while index > 0 && key(&haystack[index]) == key(&haystack[index - 1]) {
        index -= 1;
    }
    Some(index)
}
