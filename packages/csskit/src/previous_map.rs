//! Previous source map
//!
//! Finds the source map an input CSS was generated with: given explicitly in
//! the options, embedded as a data URI annotation, or stored in a file the
//! annotation points to.

use crate::error::{Error, Result};
use crate::options::PrevMap;
use crate::path_util;
use crate::source_map::{SourceMapConsumer, SourceMapGenerator};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use std::path::Path;

static ANNOTATION_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\*\s*# sourceMappingURL=(.*)\s*\*/").unwrap());
static ENCODING_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"data:application/json;([^,]+),").unwrap());

const URI_PREFIX: &str = "data:application/json,";
const BASE64_PREFIXES: [&str; 3] = [
    "data:application/json;base64,",
    "data:application/json;charset=utf8;base64,",
    "data:application/json;charset=utf-8;base64,",
];

#[derive(Debug, Clone)]
pub struct PreviousMap {
    text: String,
    annotation: Option<String>,
    inline: bool,
    root: Option<String>,
    file: Option<String>,
    consumer: OnceCell<SourceMapConsumer>,
}

impl PreviousMap {
    /// Load the previous map of `css`. `from` is the input path, `prev` the
    /// explicit map from the options. `Ok(None)` when there is no map.
    pub fn load(css: &str, from: Option<&str>, prev: Option<&PrevMap>) -> Result<Option<Self>> {
        let annotation = find_annotation(css);
        let inline = annotation
            .as_deref()
            .map_or(false, |a| a.starts_with("data:"));

        let mut root = None;
        let text = match prev {
            Some(PrevMap::Disabled) => None,
            Some(PrevMap::Text(text)) => Some(text.clone()),
            Some(PrevMap::Resolver(resolver)) => {
                let path = resolver(from).unwrap_or_default();
                if path.as_os_str().is_empty() || !path.is_file() {
                    return Err(Error::MapLoad(path));
                }
                tracing::debug!(path = %path.display(), "previous map from resolver");
                Some(std::fs::read_to_string(&path)?.trim().to_owned())
            }
            Some(PrevMap::Consumer(consumer)) => {
                Some(SourceMapGenerator::from_consumer(consumer)?.to_string())
            }
            Some(PrevMap::Generator(generator)) => Some(generator.to_string()),
            Some(PrevMap::Raw(value)) => {
                if !is_map(value) {
                    return Err(Error::MapFormat(value.to_string()));
                }
                Some(value.to_string())
            }
            None => match &annotation {
                Some(annotation) if inline => Some(decode_inline(annotation)?),
                Some(annotation) => {
                    let map = match from {
                        Some(file) => path_util::resolve(&path_util::dirname(file), annotation),
                        None => annotation.clone(),
                    };
                    root = Some(path_util::dirname(&map));
                    if Path::new(&map).exists() {
                        tracing::debug!(path = %map, "previous map from annotation");
                        Some(std::fs::read_to_string(&map)?.trim().to_owned())
                    } else {
                        None
                    }
                }
                None => None,
            },
        };

        Ok(text.filter(|t| !t.is_empty()).map(|text| PreviousMap {
            text,
            annotation,
            inline,
            root,
            file: None,
            consumer: OnceCell::new(),
        }))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Reference of the `sourceMappingURL` annotation in the CSS
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    pub fn inline(&self) -> bool {
        self.inline
    }

    /// Directory of a map loaded from a file
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Path of the CSS this map belongs to
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub(crate) fn set_file(&mut self, file: Option<String>) {
        self.file = file;
    }

    pub fn consumer(&self) -> Result<&SourceMapConsumer> {
        self.consumer
            .get_or_try_init(|| SourceMapConsumer::from_json(&self.text))
    }

    /// Consumer with every source content dropped.
    pub fn without_content(&self) -> Result<SourceMapConsumer> {
        Ok(self.consumer()?.without_content())
    }

    /// True when the map embeds any source content.
    pub fn with_content(&self) -> bool {
        match self.consumer() {
            Ok(consumer) => consumer
                .sources()
                .map(|sources| {
                    sources
                        .iter()
                        .any(|s| matches!(consumer.source_content_for(s), Ok(Some(_))))
                })
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

fn find_annotation(css: &str) -> Option<String> {
    ANNOTATION_REGEXP
        .captures_iter(css)
        .last()
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_owned())
}

fn decode_inline(text: &str) -> Result<String> {
    if let Some(encoded) = text.strip_prefix(URI_PREFIX) {
        return urlencoding::decode(encoded)
            .map(|decoded| decoded.into_owned())
            .map_err(|_| Error::Encoding("uri".into()));
    }

    for prefix in BASE64_PREFIXES {
        if let Some(encoded) = text.strip_prefix(prefix) {
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|_| Error::Encoding("base64".into()))?;
            return String::from_utf8(bytes).map_err(|_| Error::Encoding("base64".into()));
        }
    }

    let encoding = ENCODING_REGEXP
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map_or(String::new(), |m| m.as_str().to_owned());
    Err(Error::Encoding(encoding))
}

fn is_map(value: &serde_json::Value) -> bool {
    ["mappings", "_mappings"]
        .iter()
        .any(|key| value.get(key).map_or(false, serde_json::Value::is_string))
}
