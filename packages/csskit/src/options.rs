//! Processing options
//!
//! Options shared by parsing and printing. They deserialize from the same
//! camelCase JSON shape the command line accepts as a config file.

use crate::error::Result;
use crate::source_map::{SourceMapConsumer, SourceMapGenerator};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessOptions {
    /// Path of the input CSS
    pub from: Option<String>,
    /// Path the output CSS will be written to
    pub to: Option<String>,
    pub map: MapSetting,
    /// Tokenize leniently: unclosed strings, comments and `url(` are cut at
    /// the end of input instead of failing.
    pub ignore_errors: bool,
}

impl ProcessOptions {
    pub fn from_path(from: impl Into<String>) -> Self {
        ProcessOptions {
            from: Some(from.into()),
            ..Default::default()
        }
    }

    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn with_map(mut self, map: impl Into<MapSetting>) -> Self {
        self.map = map.into();
        self
    }

    /// Read options from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn map_options(&self) -> Option<&MapOptions> {
        match &self.map {
            MapSetting::Enabled(options) => Some(options),
            _ => None,
        }
    }

    pub(crate) fn prev(&self) -> Option<&PrevMap> {
        self.map_options().and_then(|options| options.prev.as_ref())
    }
}

/// `map` option: unset, a plain flag, or detailed options.
#[derive(Debug, Clone, Default)]
pub enum MapSetting {
    /// Generate a map only when the input had one
    #[default]
    Auto,
    Disabled,
    Enabled(MapOptions),
}

impl From<bool> for MapSetting {
    fn from(enabled: bool) -> Self {
        if enabled {
            MapSetting::Enabled(MapOptions::default())
        } else {
            MapSetting::Disabled
        }
    }
}

impl From<MapOptions> for MapSetting {
    fn from(options: MapOptions) -> Self {
        MapSetting::Enabled(options)
    }
}

impl<'de> Deserialize<'de> for MapSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Options(MapOptions),
        }

        Ok(match Option::<Repr>::deserialize(deserializer)? {
            None => MapSetting::Auto,
            Some(Repr::Flag(flag)) => flag.into(),
            Some(Repr::Options(options)) => MapSetting::Enabled(options),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapOptions {
    /// Embed the map as a data URI instead of a separate file
    pub inline: Option<bool>,
    pub annotation: Option<Annotation>,
    pub sources_content: Option<bool>,
    /// Override for the source path recorded in mappings
    pub from: Option<String>,
    #[serde(skip)]
    pub prev: Option<PrevMap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Annotation {
    Enabled(bool),
    Path(String),
}

impl Annotation {
    pub fn path(&self) -> Option<&str> {
        match self {
            Annotation::Path(path) => Some(path),
            Annotation::Enabled(_) => None,
        }
    }
}

pub type MapResolver = Rc<dyn Fn(Option<&str>) -> Option<PathBuf>>;

/// Explicit previous source map of the input.
#[derive(Clone)]
pub enum PrevMap {
    /// Ignore any previous map, including an annotation in the CSS
    Disabled,
    /// Map JSON text
    Text(String),
    /// Called with the input path, returns the path of the map file
    Resolver(MapResolver),
    Consumer(SourceMapConsumer),
    Generator(SourceMapGenerator),
    /// Map as a parsed JSON value
    Raw(serde_json::Value),
}

impl fmt::Debug for PrevMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrevMap::Disabled => f.write_str("Disabled"),
            PrevMap::Text(text) => f.debug_tuple("Text").field(text).finish(),
            PrevMap::Resolver(_) => f.write_str("Resolver(..)"),
            PrevMap::Consumer(consumer) => f.debug_tuple("Consumer").field(consumer).finish(),
            PrevMap::Generator(generator) => f.debug_tuple("Generator").field(generator).finish(),
            PrevMap::Raw(value) => f.debug_tuple("Raw").field(value).finish(),
        }
    }
}
