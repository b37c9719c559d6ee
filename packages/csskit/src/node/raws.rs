//! Raw formatting
//!
//! Whitespace, punctuation and original spellings recorded by the parser so
//! the stringifier can reproduce the source byte for byte. A missing field is
//! inferred from sibling nodes when printing.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Raws {
    /// Whitespace before the node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Whitespace before the closing `}` of a container, or at the end of a
    /// root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// Text between property and value, or between selector/params and `{`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub between: Option<String>,
    /// Last child declaration ends with `;`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semicolon: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<String>,
    /// Spelling of `!important` when it differs from ` !important`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub important: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<RawValue>,
}

/// Cleaned value next to the source text it came from, e.g. a value with
/// comments stripped. The raw text is printed only while the node still
/// holds the cleaned value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawValue {
    pub value: String,
    pub raw: String,
}

impl RawValue {
    pub fn new(value: impl Into<String>, raw: impl Into<String>) -> Self {
        RawValue {
            value: value.into(),
            raw: raw.into(),
        }
    }
}

/// Raw string fields a node may carry itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawField {
    Before,
    After,
    Between,
    AfterName,
    Left,
    Right,
}

impl Raws {
    pub fn get(&self, field: RawField) -> Option<&str> {
        match field {
            RawField::Before => self.before.as_deref(),
            RawField::After => self.after.as_deref(),
            RawField::Between => self.between.as_deref(),
            RawField::AfterName => self.after_name.as_deref(),
            RawField::Left => self.left.as_deref(),
            RawField::Right => self.right.as_deref(),
        }
    }

    pub fn set(&mut self, field: RawField, value: Option<String>) {
        let slot = match field {
            RawField::Before => &mut self.before,
            RawField::After => &mut self.after,
            RawField::Between => &mut self.between,
            RawField::AfterName => &mut self.after_name,
            RawField::Left => &mut self.left,
            RawField::Right => &mut self.right,
        };
        *slot = value;
    }

    /// Drop the formatting that places a node among its siblings.
    pub(crate) fn strip_layout(&mut self) {
        self.before = None;
        self.after = None;
        self.between = None;
        self.semicolon = None;
    }

    /// Read a raw through its legacy flat name.
    pub fn legacy(&self, name: LegacyRaw) -> Option<String> {
        match name {
            LegacyRaw::Before => self.before.clone(),
            LegacyRaw::Between => self.between.clone(),
            LegacyRaw::AfterName => self.after_name.clone(),
            LegacyRaw::Left => self.left.clone(),
            LegacyRaw::Right => self.right.clone(),
            LegacyRaw::Important => self.important.clone(),
            LegacyRaw::Params => self.params.as_ref().map(|r| r.raw.clone()),
            LegacyRaw::Selector => self.selector.as_ref().map(|r| r.raw.clone()),
            LegacyRaw::Value => self.value.as_ref().map(|r| r.raw.clone()),
        }
    }

    /// Write a raw through its legacy flat name. Structured raws need the
    /// node's current value, which `current` supplies.
    pub fn set_legacy(&mut self, name: LegacyRaw, value: Option<String>, current: &str) {
        let structured = |raw: Option<String>| raw.map(|raw| RawValue::new(current, raw));
        match name {
            LegacyRaw::Before => self.before = value,
            LegacyRaw::Between => self.between = value,
            LegacyRaw::AfterName => self.after_name = value,
            LegacyRaw::Left => self.left = value,
            LegacyRaw::Right => self.right = value,
            LegacyRaw::Important => self.important = value,
            LegacyRaw::Params => self.params = structured(value),
            LegacyRaw::Selector => self.selector = structured(value),
            LegacyRaw::Value => self.value = structured(value),
        }
    }
}

/// Flat raw names used by older releases, e.g. `node.before` or
/// `decl._value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyRaw {
    Before,
    Between,
    AfterName,
    Left,
    Right,
    Important,
    Params,
    Selector,
    Value,
}

impl LegacyRaw {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "before" => LegacyRaw::Before,
            "between" => LegacyRaw::Between,
            "afterName" => LegacyRaw::AfterName,
            "left" => LegacyRaw::Left,
            "right" => LegacyRaw::Right,
            "_important" => LegacyRaw::Important,
            "_params" => LegacyRaw::Params,
            "_selector" => LegacyRaw::Selector,
            "_value" => LegacyRaw::Value,
            _ => return None,
        })
    }
}
