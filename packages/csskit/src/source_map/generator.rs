//! Source Map Generator
//!
//! Accumulates mappings and sources content and serializes them as a version 3
//! source map. Mappings from an existing map can be rebased onto their
//! original sources with `apply_source_map`.

use super::consumer::{Bias, SourceMapConsumer};
use super::mapping::{compare_by_generated_positions_inflated, Mapping, Position};
use super::mapping_list::MappingList;
use super::raw::{RawSourceMap, VERSION};
use super::vlq;
use crate::error::{Error, Result};
use crate::path_util;
use indexmap::{IndexMap, IndexSet};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct SourceMapGenerator {
    file: Option<String>,
    source_root: Option<String>,
    skip_validation: bool,
    sources: IndexSet<String>,
    names: IndexSet<String>,
    mappings: MappingList,
    sources_contents: Option<IndexMap<String, String>>,
}

impl SourceMapGenerator {
    pub fn new(file: Option<String>, source_root: Option<String>, skip_validation: bool) -> Self {
        SourceMapGenerator {
            file,
            source_root,
            skip_validation,
            ..Default::default()
        }
    }

    /// Copy every mapping and source content of an existing map.
    pub fn from_consumer(consumer: &SourceMapConsumer) -> Result<Self> {
        let source_root = consumer.source_root().map(str::to_owned);
        let mut generator = SourceMapGenerator::new(
            consumer.file().map(str::to_owned),
            source_root.clone(),
            false,
        );

        consumer.each_mapping(super::consumer::Order::Generated, |mapping| {
            let mut mapping = mapping.clone();
            if let (Some(root), Some(source)) = (&source_root, &mapping.source) {
                mapping.source = Some(path_util::relative(root, source));
            }
            generator.add_mapping(mapping).map(|_| ())
        })?;

        for source in consumer.sources()? {
            if let Some(content) = consumer.source_content_for(&source)? {
                generator.set_source_content(&source, Some(content.to_owned()));
            }
        }

        Ok(generator)
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn source_root(&self) -> Option<&str> {
        self.source_root.as_deref()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn mappings(&self) -> &MappingList {
        &self.mappings
    }

    pub fn add_mapping(&mut self, mapping: Mapping) -> Result<&mut Self> {
        if !self.skip_validation {
            validate_mapping(&mapping)?;
        }

        if let Some(source) = &mapping.source {
            self.sources.insert(source.clone());
        }
        if let Some(name) = &mapping.name {
            self.names.insert(name.clone());
        }
        self.mappings.add(mapping);
        Ok(self)
    }

    /// Set or, with `None`, remove the content of a source file.
    pub fn set_source_content(&mut self, source: &str, content: Option<String>) -> &mut Self {
        let source = match &self.source_root {
            Some(root) => path_util::relative(root, source),
            None => source.to_owned(),
        };

        match content {
            Some(content) => {
                self.sources_contents
                    .get_or_insert_with(IndexMap::new)
                    .insert(source, content);
            }
            None => {
                if let Some(contents) = &mut self.sources_contents {
                    contents.shift_remove(&source);
                    if contents.is_empty() {
                        self.sources_contents = None;
                    }
                }
            }
        }
        self
    }

    /// Rebase mappings that point into `source_file` through `consumer`, so
    /// they point at the sources the consumer's map was generated from.
    /// `source_file` defaults to the consumer's `file`; `map_path` is the
    /// directory of the consumer's map, joined onto every rebased source.
    pub fn apply_source_map(
        &mut self,
        consumer: &SourceMapConsumer,
        source_file: Option<&str>,
        map_path: Option<&str>,
    ) -> Result<()> {
        let source_file = match source_file.filter(|f| !f.is_empty()) {
            Some(file) => file.to_owned(),
            None => consumer
                .file()
                .filter(|f| !f.is_empty())
                .map(str::to_owned)
                .ok_or(Error::MissingSourceFile)?,
        };
        let map_path = map_path.filter(|p| !p.is_empty());
        let source_root = self.source_root.clone();
        let source_file = match &source_root {
            Some(root) => path_util::relative(root, &source_file),
            None => source_file,
        };

        let mut new_sources = IndexSet::new();
        let mut new_names = IndexSet::new();

        for mapping in self.mappings.iter_mut() {
            if mapping.source.as_deref() == Some(source_file.as_str()) {
                if let Some(original) = mapping.original {
                    let found = consumer.original_position_for(
                        original.line,
                        original.column,
                        Bias::GreatestLowerBound,
                    )?;
                    if let Some(found) = found {
                        let mut source = found.source;
                        if let Some(path) = map_path {
                            source = path_util::join(path, &source);
                        }
                        if let Some(root) = &source_root {
                            source = path_util::relative(root, &source);
                        }
                        mapping.source = Some(source);
                        mapping.original = Some(Position::new(found.line, found.column));
                        if found.name.is_some() {
                            mapping.name = found.name;
                        }
                    }
                }
            }

            if let Some(source) = &mapping.source {
                new_sources.insert(source.clone());
            }
            if let Some(name) = &mapping.name {
                new_names.insert(name.clone());
            }
        }

        self.sources = new_sources;
        self.names = new_names;

        for source in consumer.sources()? {
            if let Some(content) = consumer.source_content_for(&source)? {
                let mut file = source.clone();
                if let Some(path) = map_path {
                    file = path_util::join(path, &file);
                }
                if let Some(root) = &source_root {
                    file = path_util::relative(root, &file);
                }
                self.set_source_content(&file, Some(content.to_owned()));
            }
        }

        Ok(())
    }

    /// Delta-encoded `mappings` string.
    pub fn serialize_mappings(&self) -> String {
        let mut result = String::new();
        let mut previous_generated_line = 1usize;
        let mut previous_generated_column = 0i64;
        let mut previous_original_line = 0i64;
        let mut previous_original_column = 0i64;
        let mut previous_name = 0i64;
        let mut previous_source = 0i64;

        let mappings = self.mappings.to_array();
        for (i, mapping) in mappings.iter().enumerate() {
            if mapping.generated.line > previous_generated_line {
                previous_generated_column = 0;
                for _ in previous_generated_line..mapping.generated.line {
                    result.push(';');
                }
                previous_generated_line = mapping.generated.line;
            } else if i > 0 {
                if compare_by_generated_positions_inflated(mapping, &mappings[i - 1])
                    == Ordering::Equal
                {
                    continue;
                }
                result.push(',');
            }

            let column = mapping.generated.column as i64;
            vlq::encode_into(column - previous_generated_column, &mut result);
            previous_generated_column = column;

            if let Some(source) = &mapping.source {
                let original = mapping.original.unwrap_or_default();
                let source_index = index_of(&self.sources, source);
                vlq::encode_into(source_index - previous_source, &mut result);
                previous_source = source_index;

                let line = original.line as i64 - 1;
                vlq::encode_into(line - previous_original_line, &mut result);
                previous_original_line = line;

                let column = original.column as i64;
                vlq::encode_into(column - previous_original_column, &mut result);
                previous_original_column = column;

                if let Some(name) = &mapping.name {
                    let name_index = index_of(&self.names, name);
                    vlq::encode_into(name_index - previous_name, &mut result);
                    previous_name = name_index;
                }
            }
        }

        result
    }

    fn sources_content_list(&self) -> Option<Vec<Option<String>>> {
        let contents = self.sources_contents.as_ref()?;
        Some(
            self.sources
                .iter()
                .map(|source| {
                    let key = match &self.source_root {
                        Some(root) => path_util::relative(root, source),
                        None => source.clone(),
                    };
                    contents.get(&key).cloned()
                })
                .collect(),
        )
    }

    pub fn to_raw(&self) -> RawSourceMap {
        RawSourceMap {
            version: VERSION,
            sources: self.sources.iter().cloned().collect(),
            names: self.names.iter().cloned().collect(),
            mappings: self.serialize_mappings(),
            file: self.file.clone(),
            source_root: self.source_root.clone(),
            sources_content: self.sources_content_list(),
            sections: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_raw())
    }
}

impl fmt::Display for SourceMapGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

fn index_of(set: &IndexSet<String>, value: &str) -> i64 {
    set.get_index_of(value).map_or(-1, |i| i as i64)
}

fn validate_mapping(mapping: &Mapping) -> Result<()> {
    if mapping.generated.line == 0 {
        return Err(Error::InvalidMapping(format!(
            "generated line must be positive: {:?}",
            mapping
        )));
    }

    match (&mapping.original, &mapping.source) {
        (None, None) if mapping.name.is_none() => Ok(()),
        (Some(original), Some(source)) if original.line > 0 && !source.is_empty() => Ok(()),
        _ => Err(Error::InvalidMapping(format!(
            "original position and source must be given together: {:?}",
            mapping
        ))),
    }
}
