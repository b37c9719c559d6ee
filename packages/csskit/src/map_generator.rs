//! Map-aware printing
//!
//! Prints a root and, when the options or the inputs ask for it, builds the
//! source map of the output, chains it onto the maps of the inputs and adds
//! the `sourceMappingURL` annotation.

use crate::error::{Error, Result};
use crate::input::Input;
use crate::node::{Node, NodeType};
use crate::options::{Annotation, MapOptions, MapSetting, ProcessOptions};
use crate::path_util;
use crate::source_map::{Mapping, Position, SourceMapGenerator};
use crate::stringifier::{Boundary, Builder, Stringifier};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::rc::Rc;

const ANNOTATION_PREFIX: &str = "# sourceMappingURL=";
const NO_SOURCE: &str = "<no source>";
const DEFAULT_OUTPUT: &str = "to.css";

pub struct MapGenerator<'a> {
    root: &'a Node,
    options: &'a ProcessOptions,
    map_options: Option<&'a MapOptions>,
    previous: Vec<Rc<Input>>,
}

impl<'a> MapGenerator<'a> {
    pub fn new(root: &'a Node, options: &'a ProcessOptions) -> Self {
        let mut previous: Vec<Rc<Input>> = Vec::new();
        root.walk(|node, _| {
            if let Some(input) = node.input() {
                if input.map().is_some() && !previous.iter().any(|p| Rc::ptr_eq(p, &input)) {
                    previous.push(input);
                }
            }
        });
        MapGenerator {
            root,
            options,
            map_options: options.map_options(),
            previous,
        }
    }

    /// Print the root. The map is `None` when no map is generated or when
    /// it is inlined into the CSS.
    pub fn generate(&self) -> Result<(String, Option<SourceMapGenerator>)> {
        self.clear_annotation();
        if !self.is_map() {
            let mut css = String::new();
            Stringifier::new(&mut css).stringify(self.root, false);
            return Ok((css, None));
        }

        let (mut css, mut map) = self.generate_string()?;
        if self.is_sources_content() {
            self.set_sources_content(&mut map);
        }
        if !self.previous.is_empty() {
            self.apply_prev_maps(&mut map)?;
        }
        if self.is_annotation() {
            self.add_annotation(&mut css, &map)?;
        }

        tracing::debug!(
            inline = self.is_inline(),
            previous = self.previous.len(),
            "generated source map"
        );
        if self.is_inline() {
            Ok((css, None))
        } else {
            Ok((css, Some(map)))
        }
    }

    fn annotation_option(&self) -> Option<&Annotation> {
        self.map_options.and_then(|o| o.annotation.as_ref())
    }

    pub fn is_map(&self) -> bool {
        match self.options.map {
            MapSetting::Auto => !self.previous.is_empty(),
            MapSetting::Disabled => false,
            MapSetting::Enabled(_) => true,
        }
    }

    pub fn is_inline(&self) -> bool {
        if let Some(inline) = self.map_options.and_then(|o| o.inline) {
            return inline;
        }
        if let Some(annotation) = self.annotation_option() {
            if *annotation != Annotation::Enabled(true) {
                return false;
            }
        }
        if self.previous.is_empty() {
            return true;
        }
        self.previous_maps().any(|prev| prev.inline())
    }

    pub fn is_sources_content(&self) -> bool {
        if let Some(sources_content) = self.map_options.and_then(|o| o.sources_content) {
            return sources_content;
        }
        if self.previous.is_empty() {
            return true;
        }
        self.previous_maps().any(|prev| prev.with_content())
    }

    pub fn is_annotation(&self) -> bool {
        if self.is_inline() {
            return true;
        }
        match self.annotation_option() {
            Some(Annotation::Enabled(enabled)) => *enabled,
            Some(Annotation::Path(_)) => true,
            None if self.previous.is_empty() => true,
            None => self.previous_maps().any(|prev| prev.annotation().is_some()),
        }
    }

    fn previous_maps(&self) -> impl Iterator<Item = &crate::previous_map::PreviousMap> {
        self.previous.iter().filter_map(|input| input.map())
    }

    /// Drop old `sourceMappingURL` comments from the top level.
    fn clear_annotation(&self) {
        if self.annotation_option() == Some(&Annotation::Enabled(false)) {
            return;
        }
        for (index, node) in self.root.nodes().iter().enumerate().rev() {
            if node.node_type() == NodeType::Comment && node.text().starts_with(ANNOTATION_PREFIX) {
                tracing::debug!(index, "removed old map annotation");
                self.root.remove_child(index);
            }
        }
    }

    fn set_sources_content(&self, map: &mut SourceMapGenerator) {
        let mut already: Vec<String> = Vec::new();
        self.root.walk(|node, _| {
            let Some(input) = node.input() else {
                return;
            };
            let from = input.from();
            if from.is_empty() || already.iter().any(|seen| seen == from) {
                return;
            }
            already.push(from.to_owned());
            map.set_source_content(&self.relative(from), Some(input.css().to_owned()));
        });
    }

    fn apply_prev_maps(&self, map: &mut SourceMapGenerator) -> Result<()> {
        let drop_content = self.map_options.and_then(|o| o.sources_content) == Some(false);
        for prev in self.previous_maps() {
            let file = prev.file().unwrap_or_default();
            let from = self.relative(file);
            let root = match prev.root().filter(|r| !r.is_empty()) {
                Some(root) => root.to_owned(),
                None => path_util::dirname(file),
            };
            let map_path = self.relative(&root);

            if drop_content {
                let consumer = prev.without_content()?;
                map.apply_source_map(&consumer, Some(&from), Some(&map_path))?;
            } else {
                map.apply_source_map(prev.consumer()?, Some(&from), Some(&map_path))?;
            }
        }
        Ok(())
    }

    fn add_annotation(&self, css: &mut String, map: &SourceMapGenerator) -> Result<()> {
        let content = if self.is_inline() {
            format!("data:application/json;base64,{}", STANDARD.encode(map.to_json()?))
        } else if let Some(path) = self.annotation_option().and_then(Annotation::path) {
            path.to_owned()
        } else {
            format!("{}.map", self.output_file())
        };

        let eol = if css.contains("\r\n") { "\r\n" } else { "\n" };
        css.push_str(eol);
        css.push_str("/*");
        css.push_str(ANNOTATION_PREFIX);
        css.push_str(&content);
        css.push_str(" */");
        Ok(())
    }

    pub fn output_file(&self) -> String {
        let non_empty = |path: &Option<String>| path.clone().filter(|p| !p.is_empty());
        match non_empty(&self.options.to).or_else(|| non_empty(&self.options.from)) {
            Some(path) => self.relative(&path),
            None => DEFAULT_OUTPUT.to_owned(),
        }
    }

    /// Path of `file` as seen from the output file, or from the map file
    /// when the annotation names one.
    pub fn relative(&self, file: &str) -> String {
        if path_util::is_url(file) {
            return file.to_owned();
        }
        let mut from = match self.options.to.as_deref().filter(|to| !to.is_empty()) {
            Some(to) => path_util::dirname(to),
            None => ".".to_owned(),
        };
        if let Some(annotation) = self.annotation_option().and_then(Annotation::path) {
            from = path_util::dirname(&path_util::resolve(&from, annotation));
        }
        path_util::relative_path(&from, file).replace('\\', "/")
    }

    fn source_path(&self, node: &Node) -> String {
        if let Some(from) = self.map_options.and_then(|o| o.from.as_deref()).filter(|f| !f.is_empty()) {
            return from.to_owned();
        }
        let from = node.input().map(|input| input.from().to_owned()).unwrap_or_default();
        self.relative(&from)
    }

    fn generate_string(&self) -> Result<(String, SourceMapGenerator)> {
        let mut builder = MappingBuilder {
            generator: self,
            css: String::new(),
            map: SourceMapGenerator::new(Some(self.output_file()), None, false),
            line: 1,
            column: 1,
            error: None,
        };
        Stringifier::new(&mut builder).stringify(self.root, false);
        match builder.error {
            Some(error) => Err(error),
            None => Ok((builder.css, builder.map)),
        }
    }
}

/// Builder recording a mapping at the start and end of every printed node
struct MappingBuilder<'g, 'a> {
    generator: &'g MapGenerator<'a>,
    css: String,
    map: SourceMapGenerator,
    line: usize,
    column: usize,
    error: Option<Error>,
}

impl MappingBuilder<'_, '_> {
    fn add(&mut self, node: &Node, original: Option<Position>) {
        let generated = Position::new(self.line, self.column - 1);
        let mapping = match original {
            Some(original) => {
                Mapping::new(generated).with_original(self.generator.source_path(node), original)
            }
            None => Mapping::new(generated).with_original(NO_SOURCE, Position::new(1, 0)),
        };
        if let Err(error) = self.map.add_mapping(mapping) {
            self.error.get_or_insert(error);
        }
    }
}

impl Builder for MappingBuilder<'_, '_> {
    fn emit(&mut self, text: &str, node: Option<&Node>, boundary: Option<Boundary>) {
        self.css.push_str(text);
        let source = node.and_then(Node::source);

        if let Some(node) = node {
            if boundary != Some(Boundary::End) {
                let start = source
                    .as_ref()
                    .and_then(|s| s.start)
                    .map(|start| Position::new(start.line, start.column.saturating_sub(1)));
                self.add(node, start);
            }
        }

        let breaks = text.matches('\n').count();
        match text.rfind('\n') {
            Some(last) => {
                self.line += breaks;
                self.column = text.len() - last;
            }
            None => self.column += text.len(),
        }

        if let Some(node) = node {
            if boundary != Some(Boundary::Start) {
                let end = source.as_ref().and_then(|s| s.end);
                self.add(node, end);
            }
        }
    }
}
