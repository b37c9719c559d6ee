//! Node tree
//!
//! A parsed stylesheet is a tree of reference-counted nodes. Containers own
//! their children; a child points back at its parent through a weak handle
//! that only the container API updates. `Node` is a cheap handle: cloning it
//! shares the node, `clone_node` deep-copies the subtree.

mod container;
mod props;
mod raws;

pub use container::{ChildRef, Filter, ReplaceOptions, Walk};
pub use props::{NodeInput, NodeProps};
pub use raws::{LegacyRaw, RawField, RawValue, Raws};

use crate::error::{CssSyntaxError, Result};
use crate::input::Input;
use crate::result::{TransformResult, Warning};
use crate::source_map::Position;
use crate::stringifier::{Builder, RawKey, RawResolver, Stringifier};
use container::CursorRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

static SELECTOR_SEPARATOR_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*").unwrap());
static NON_SPACE_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    AtRule,
    Rule,
    Declaration,
    Comment,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Root => "root",
            NodeType::AtRule => "atrule",
            NodeType::Rule => "rule",
            NodeType::Declaration => "decl",
            NodeType::Comment => "comment",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtRule {
    pub name: String,
    pub params: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    pub selector: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declaration {
    pub prop: String,
    pub value: String,
    pub important: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Root,
    AtRule(AtRule),
    Rule(Rule),
    Declaration(Declaration),
    Comment(Comment),
}

impl NodeData {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeData::Root => NodeType::Root,
            NodeData::AtRule(_) => NodeType::AtRule,
            NodeData::Rule(_) => NodeType::Rule,
            NodeData::Declaration(_) => NodeType::Declaration,
            NodeData::Comment(_) => NodeType::Comment,
        }
    }
}

/// Where a node came from. Positions are 1-based, columns count bytes.
#[derive(Debug, Clone)]
pub struct Source {
    pub input: Rc<Input>,
    pub start: Option<Position>,
    pub end: Option<Position>,
}

/// Options for `Node::error` and `Node::warn`
#[derive(Debug, Clone, Default)]
pub struct ErrorOptions {
    pub plugin: Option<String>,
    /// Byte index inside the node's CSS the message is about
    pub index: Option<usize>,
    /// Word inside the node's CSS the message is about
    pub word: Option<String>,
}

pub(crate) struct NodeInner {
    pub(crate) data: NodeData,
    pub(crate) raws: Raws,
    pub(crate) source: Option<Source>,
    pub(crate) parent: Weak<RefCell<NodeInner>>,
    pub(crate) nodes: Option<Vec<Node>>,
    pub(crate) cursors: CursorRegistry,
}

#[derive(Clone)]
pub struct Node(pub(crate) Rc<RefCell<NodeInner>>);

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(inner) => f
                .debug_struct("Node")
                .field("data", &inner.data)
                .field("raws", &inner.raws)
                .field("nodes", &inner.nodes.as_ref().map(Vec::len))
                .finish(),
            Err(_) => f.write_str("Node(<borrowed>)"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut css = String::new();
        Stringifier::new(&mut css).stringify(self, false);
        f.write_str(&css)
    }
}

impl Node {
    /// Node holding `data`. Roots and rules start with an empty child list;
    /// at-rules get one on first insertion.
    pub fn new(data: NodeData) -> Node {
        let nodes = match data {
            NodeData::Root | NodeData::Rule(_) => Some(Vec::new()),
            _ => None,
        };
        Node(Rc::new(RefCell::new(NodeInner {
            data,
            raws: Raws::default(),
            source: None,
            parent: Weak::new(),
            nodes,
            cursors: CursorRegistry::default(),
        })))
    }

    pub fn new_root() -> Node {
        Node::new(NodeData::Root)
    }

    pub fn new_rule(selector: impl Into<String>) -> Node {
        Node::new(NodeData::Rule(Rule {
            selector: selector.into(),
        }))
    }

    /// At-rule without a body, e.g. `@import`
    pub fn new_at_rule(name: impl Into<String>, params: impl Into<String>) -> Node {
        Node::new(NodeData::AtRule(AtRule {
            name: name.into(),
            params: params.into(),
        }))
    }

    pub fn new_decl(prop: impl Into<String>, value: impl Into<String>) -> Node {
        Node::new(NodeData::Declaration(Declaration {
            prop: prop.into(),
            value: value.into(),
            important: false,
        }))
    }

    pub fn new_comment(text: impl Into<String>) -> Node {
        Node::new(NodeData::Comment(Comment { text: text.into() }))
    }

    pub fn with_raws(self, raws: Raws) -> Node {
        self.0.borrow_mut().raws = raws;
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.0.borrow().data.node_type()
    }

    pub fn data(&self) -> Ref<'_, NodeData> {
        Ref::map(self.0.borrow(), |inner| &inner.data)
    }

    pub fn data_mut(&self) -> RefMut<'_, NodeData> {
        RefMut::map(self.0.borrow_mut(), |inner| &mut inner.data)
    }

    pub fn as_decl(&self) -> Option<Ref<'_, Declaration>> {
        Ref::filter_map(self.0.borrow(), |inner| match &inner.data {
            NodeData::Declaration(decl) => Some(decl),
            _ => None,
        })
        .ok()
    }

    pub fn as_decl_mut(&self) -> Option<RefMut<'_, Declaration>> {
        RefMut::filter_map(self.0.borrow_mut(), |inner| match &mut inner.data {
            NodeData::Declaration(decl) => Some(decl),
            _ => None,
        })
        .ok()
    }

    pub fn as_rule(&self) -> Option<Ref<'_, Rule>> {
        Ref::filter_map(self.0.borrow(), |inner| match &inner.data {
            NodeData::Rule(rule) => Some(rule),
            _ => None,
        })
        .ok()
    }

    pub fn as_rule_mut(&self) -> Option<RefMut<'_, Rule>> {
        RefMut::filter_map(self.0.borrow_mut(), |inner| match &mut inner.data {
            NodeData::Rule(rule) => Some(rule),
            _ => None,
        })
        .ok()
    }

    pub fn as_at_rule(&self) -> Option<Ref<'_, AtRule>> {
        Ref::filter_map(self.0.borrow(), |inner| match &inner.data {
            NodeData::AtRule(at_rule) => Some(at_rule),
            _ => None,
        })
        .ok()
    }

    pub fn as_at_rule_mut(&self) -> Option<RefMut<'_, AtRule>> {
        RefMut::filter_map(self.0.borrow_mut(), |inner| match &mut inner.data {
            NodeData::AtRule(at_rule) => Some(at_rule),
            _ => None,
        })
        .ok()
    }

    pub fn as_comment(&self) -> Option<Ref<'_, Comment>> {
        Ref::filter_map(self.0.borrow(), |inner| match &inner.data {
            NodeData::Comment(comment) => Some(comment),
            _ => None,
        })
        .ok()
    }

    pub fn as_comment_mut(&self) -> Option<RefMut<'_, Comment>> {
        RefMut::filter_map(self.0.borrow_mut(), |inner| match &mut inner.data {
            NodeData::Comment(comment) => Some(comment),
            _ => None,
        })
        .ok()
    }

    // Field shortcuts. Getters return an empty string (or false) for nodes
    // of another type; setters leave such nodes alone.

    pub fn prop(&self) -> String {
        self.as_decl().map(|d| d.prop.clone()).unwrap_or_default()
    }

    pub fn set_prop(&self, prop: impl Into<String>) {
        if let Some(mut decl) = self.as_decl_mut() {
            decl.prop = prop.into();
        }
    }

    pub fn value(&self) -> String {
        self.as_decl().map(|d| d.value.clone()).unwrap_or_default()
    }

    pub fn set_value(&self, value: impl Into<String>) {
        if let Some(mut decl) = self.as_decl_mut() {
            decl.value = value.into();
        }
    }

    pub fn important(&self) -> bool {
        self.as_decl().map_or(false, |d| d.important)
    }

    pub fn set_important(&self, important: bool) {
        if let Some(mut decl) = self.as_decl_mut() {
            decl.important = important;
        }
    }

    pub fn selector(&self) -> String {
        self.as_rule().map(|r| r.selector.clone()).unwrap_or_default()
    }

    pub fn set_selector(&self, selector: impl Into<String>) {
        if let Some(mut rule) = self.as_rule_mut() {
            rule.selector = selector.into();
        }
    }

    pub fn name(&self) -> String {
        self.as_at_rule().map(|a| a.name.clone()).unwrap_or_default()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        if let Some(mut at_rule) = self.as_at_rule_mut() {
            at_rule.name = name.into();
        }
    }

    pub fn params(&self) -> String {
        self.as_at_rule().map(|a| a.params.clone()).unwrap_or_default()
    }

    pub fn set_params(&self, params: impl Into<String>) {
        if let Some(mut at_rule) = self.as_at_rule_mut() {
            at_rule.params = params.into();
        }
    }

    pub fn text(&self) -> String {
        self.as_comment().map(|c| c.text.clone()).unwrap_or_default()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        if let Some(mut comment) = self.as_comment_mut() {
            comment.text = text.into();
        }
    }

    /// Selectors of a rule split on commas
    pub fn selectors(&self) -> Vec<String> {
        crate::list::comma(&self.selector())
    }

    /// Replace the selectors of a rule, joined with the separator already
    /// used in the selector.
    pub fn set_selectors(&self, selectors: &[impl AsRef<str>]) {
        let current = self.selector();
        let separator = match SELECTOR_SEPARATOR_REGEXP.find(&current) {
            Some(found) => found.as_str().to_owned(),
            None => format!(",{}", self.raw(Some(RawField::Between), RawKey::BeforeOpen)),
        };
        let joined = selectors
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(&separator);
        self.set_selector(joined);
    }

    pub fn raws(&self) -> Ref<'_, Raws> {
        Ref::map(self.0.borrow(), |inner| &inner.raws)
    }

    pub fn raws_mut(&self) -> RefMut<'_, Raws> {
        RefMut::map(self.0.borrow_mut(), |inner| &mut inner.raws)
    }

    pub fn source(&self) -> Option<Source> {
        self.0.borrow().source.clone()
    }

    pub fn set_source(&self, source: Option<Source>) {
        self.0.borrow_mut().source = source;
    }

    pub fn input(&self) -> Option<Rc<Input>> {
        self.0.borrow().source.as_ref().map(|s| s.input.clone())
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.borrow().parent.upgrade().map(Node)
    }

    pub(crate) fn set_parent(&self, parent: Option<&Node>) {
        self.0.borrow_mut().parent = parent.map_or_else(Weak::new, |p| Rc::downgrade(&p.0));
    }

    /// Topmost ancestor, the node itself when detached
    pub fn root(&self) -> Node {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Deep copy without parent and without the raws that place the node
    /// among siblings (`before`, `after`, `between`, `semicolon`).
    pub fn clone_node(&self) -> Node {
        let inner = self.0.borrow();
        let mut raws = inner.raws.clone();
        raws.strip_layout();

        let copy = Node(Rc::new(RefCell::new(NodeInner {
            data: inner.data.clone(),
            raws,
            source: inner.source.clone(),
            parent: Weak::new(),
            nodes: None,
            cursors: CursorRegistry::default(),
        })));

        if let Some(children) = &inner.nodes {
            let cloned: Vec<Node> = children
                .iter()
                .map(|child| {
                    let child = child.clone_node();
                    child.set_parent(Some(&copy));
                    child
                })
                .collect();
            copy.0.borrow_mut().nodes = Some(cloned);
        }
        copy
    }

    /// Deep copy with some fields replaced.
    pub fn clone_with(&self, overrides: NodeProps) -> Node {
        let copy = self.clone_node();
        overrides.apply_to(&copy);
        copy
    }

    /// Insert a modified copy before this node and return it.
    pub fn clone_before(&self, overrides: NodeProps) -> Result<Node> {
        let copy = self.clone_with(overrides);
        if let Some(parent) = self.parent() {
            parent.insert_before(self, copy.clone())?;
        }
        Ok(copy)
    }

    /// Insert a modified copy after this node and return it.
    pub fn clone_after(&self, overrides: NodeProps) -> Result<Node> {
        let copy = self.clone_with(overrides);
        if let Some(parent) = self.parent() {
            parent.insert_after(self, copy.clone())?;
        }
        Ok(copy)
    }

    /// Detach from the parent.
    pub fn remove(&self) -> &Self {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
        self.set_parent(None);
        self
    }

    /// Put `nodes` in place of this node.
    pub fn replace_with(&self, nodes: impl Into<NodeInput>) -> Result<&Self> {
        if let Some(parent) = self.parent() {
            parent.insert_before(self, nodes)?;
            self.remove();
        }
        Ok(self)
    }

    pub fn move_to(&self, new_parent: &Node) -> Result<&Self> {
        self.clean_raws(self.root() == new_parent.root());
        self.remove();
        new_parent.append(self.clone())?;
        Ok(self)
    }

    pub fn move_before(&self, other: &Node) -> Result<&Self> {
        self.clean_raws(self.root() == other.root());
        self.remove();
        if let Some(parent) = other.parent() {
            parent.insert_before(other, self.clone())?;
        }
        Ok(self)
    }

    pub fn move_after(&self, other: &Node) -> Result<&Self> {
        self.clean_raws(self.root() == other.root());
        self.remove();
        if let Some(parent) = other.parent() {
            parent.insert_after(other, self.clone())?;
        }
        Ok(self)
    }

    pub fn next(&self) -> Option<Node> {
        let parent = self.parent()?;
        let index = parent.index(self)?;
        parent.child(index + 1)
    }

    pub fn prev(&self) -> Option<Node> {
        let parent = self.parent()?;
        let index = parent.index(self)?;
        parent.child(index.checked_sub(1)?)
    }

    /// Forget `before` and `after` (and `between` unless kept) in the whole
    /// subtree, so the node takes the formatting of its new neighbours.
    pub fn clean_raws(&self, keep_between: bool) {
        {
            let mut raws = self.raws_mut();
            raws.before = None;
            raws.after = None;
            if !keep_between {
                raws.between = None;
            }
        }
        for child in self.nodes() {
            child.clean_raws(keep_between);
        }
    }

    /// Raw formatting value, inferred from the rest of the tree when this
    /// node has none of its own.
    pub fn raw(&self, own: Option<RawField>, detect: RawKey) -> String {
        RawResolver::new()
            .raw(self, own, detect)
            .unwrap_or_default()
    }

    /// Source position of the byte at `index` inside this node's CSS
    pub fn position_inside(&self, index: usize) -> Option<Position> {
        let start = self.0.borrow().source.as_ref()?.start?;
        let css = self.to_string();
        let mut line = start.line;
        let mut column = start.column;
        for byte in css.bytes().take(index) {
            if byte == b'\n' {
                column = 1;
                line += 1;
            } else {
                column += 1;
            }
        }
        Some(Position::new(line, column))
    }

    /// Start of the node, moved to `index` or to the first occurrence of
    /// `word` inside the node's CSS when given.
    pub fn position_by(&self, index: Option<usize>, word: Option<&str>) -> Option<Position> {
        let start = self.0.borrow().source.as_ref().and_then(|s| s.start);
        match (index.filter(|i| *i > 0), word.filter(|w| !w.is_empty())) {
            (Some(index), _) => self.position_inside(index),
            (None, Some(word)) => match self.to_string().find(word) {
                Some(index) => self.position_inside(index),
                None => start,
            },
            (None, None) => start,
        }
    }

    /// Syntax error pointing at this node.
    pub fn error(&self, message: &str, options: &ErrorOptions) -> CssSyntaxError {
        let Some(source) = self.source() else {
            return CssSyntaxError::new(message).with_plugin(options.plugin.clone());
        };
        match self.position_by(options.index, options.word.as_deref()) {
            Some(position) => source.input.error(
                message,
                position.line,
                position.column,
                options.plugin.as_deref(),
            ),
            None => CssSyntaxError::new(message)
                .with_css(source.input.css())
                .with_file(source.input.file().map(str::to_owned))
                .with_plugin(options.plugin.clone()),
        }
    }

    /// Record a warning about this node in `result`.
    pub fn warn<'r>(
        &self,
        result: &'r mut TransformResult,
        text: &str,
        options: ErrorOptions,
    ) -> &'r Warning {
        result.warn_about(text, Some(self.clone()), options)
    }

    pub fn stringify_with(&self, builder: &mut dyn Builder) {
        Stringifier::new(builder).stringify(self, false);
    }

    /// Print the tree, with a source map when the options ask for one.
    pub fn to_result(&self, options: &crate::options::ProcessOptions) -> Result<TransformResult> {
        TransformResult::new(self, options)
    }

    /// Plain JSON view of the node and its subtree.
    pub fn to_json(&self) -> Value {
        let inner = self.0.borrow();
        let mut object = Map::new();
        object.insert("type".into(), json!(inner.data.node_type().as_str()));

        match &inner.data {
            NodeData::Root => {}
            NodeData::AtRule(at_rule) => {
                object.insert("name".into(), json!(at_rule.name));
                object.insert("params".into(), json!(at_rule.params));
            }
            NodeData::Rule(rule) => {
                object.insert("selector".into(), json!(rule.selector));
            }
            NodeData::Declaration(decl) => {
                object.insert("prop".into(), json!(decl.prop));
                object.insert("value".into(), json!(decl.value));
                if decl.important {
                    object.insert("important".into(), json!(true));
                }
            }
            NodeData::Comment(comment) => {
                object.insert("text".into(), json!(comment.text));
            }
        }

        if let Ok(raws) = serde_json::to_value(&inner.raws) {
            if raws.as_object().map_or(false, |r| !r.is_empty()) {
                object.insert("raws".into(), raws);
            }
        }

        if let Some(source) = &inner.source {
            let mut input = Map::new();
            input.insert("css".into(), json!(source.input.css()));
            match source.input.file() {
                Some(file) => input.insert("file".into(), json!(file)),
                None => input.insert("id".into(), json!(source.input.from())),
            };
            let mut value = Map::new();
            value.insert("input".into(), Value::Object(input));
            if let Some(start) = source.start {
                value.insert("start".into(), json!(start));
            }
            if let Some(end) = source.end {
                value.insert("end".into(), json!(end));
            }
            object.insert("source".into(), Value::Object(value));
        }

        if let Some(children) = &inner.nodes {
            let children: Vec<Value> = children.iter().map(Node::to_json).collect();
            object.insert("nodes".into(), Value::Array(children));
        }

        Value::Object(object)
    }
}

/// Replace non-whitespace with nothing, keeping only the layout of a raw.
pub(crate) fn only_spaces(raw: &str) -> String {
    NON_SPACE_REGEXP.replace_all(raw, "").into_owned()
}
