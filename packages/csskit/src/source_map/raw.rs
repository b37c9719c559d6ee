//! Raw source map JSON
//!
//! Serde shape of a version 3 source map, regular or indexed.

use serde::{Deserialize, Serialize};

/// Source map version written and accepted
pub const VERSION: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceMap {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub mappings: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<RawSection>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSection {
    pub offset: RawOffset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<Box<RawSourceMap>>,
}

/// Zero-based generated offset of an indexed map section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOffset {
    pub line: usize,
    pub column: usize,
}

impl RawSourceMap {
    /// Parse JSON text, tolerating the `)]}'` XSSI prefix.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let text = text.strip_prefix(")]}'").unwrap_or(text);
        serde_json::from_str(text)
    }

    pub fn is_indexed(&self) -> bool {
        self.sections.is_some()
    }
}
