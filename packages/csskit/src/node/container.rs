//! Container API
//!
//! Child lists of roots, rules and at-rules. Iteration keeps a cursor per
//! running `each`, and every mutation shifts the live cursors so callbacks
//! may insert or remove siblings while the loop is running.

use super::{only_spaces, Node, NodeInput, NodeType};
use crate::error::Result;
use crate::options::ProcessOptions;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::cell::Cell;
use std::rc::{Rc, Weak};

static REGEXP_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/(?P<body>.*)/(?P<flags>[a-zA-Z]*)$").unwrap());

/// Outcome of an iteration callback. Returning `()` keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Walk {
    #[default]
    Continue,
    Stop,
}

impl From<()> for Walk {
    fn from(_: ()) -> Self {
        Walk::Continue
    }
}

impl From<bool> for Walk {
    fn from(keep_going: bool) -> Self {
        if keep_going {
            Walk::Continue
        } else {
            Walk::Stop
        }
    }
}

/// Positions of the `each` loops running over one container
#[derive(Default)]
pub(crate) struct CursorRegistry {
    cursors: Vec<Weak<Cell<isize>>>,
}

impl CursorRegistry {
    fn register(&mut self) -> Rc<Cell<isize>> {
        self.cursors.retain(|c| c.strong_count() > 0);
        let cursor = Rc::new(Cell::new(0));
        self.cursors.push(Rc::downgrade(&cursor));
        cursor
    }

    fn shift(&self, by: isize, applies: impl Fn(isize) -> bool) {
        for cursor in self.cursors.iter().filter_map(Weak::upgrade) {
            if applies(cursor.get()) {
                cursor.set(cursor.get() + by);
            }
        }
    }
}

/// Cursor of one `each` loop, deregistered when the loop ends.
struct ChildCursor<'a> {
    owner: &'a Node,
    position: Rc<Cell<isize>>,
}

impl<'a> ChildCursor<'a> {
    fn new(owner: &'a Node) -> Self {
        let position = owner.0.borrow_mut().cursors.register();
        ChildCursor { owner, position }
    }
}

impl Drop for ChildCursor<'_> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.owner.0.try_borrow_mut() {
            let position = &self.position;
            inner
                .cursors
                .cursors
                .retain(|c| c.upgrade().map_or(false, |c| !Rc::ptr_eq(&c, position)));
        }
    }
}

/// Name filter of the `walk_*` helpers. A string written as `/body/flags`
/// is read as a regular expression.
#[derive(Debug, Clone, Default)]
pub enum Filter {
    #[default]
    Any,
    Exact(String),
    Pattern(Regex),
}

impl Filter {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Filter::Any => true,
            Filter::Exact(exact) => exact == text,
            Filter::Pattern(pattern) => pattern.is_match(text),
        }
    }

    fn parse_literal(text: &str) -> Option<Regex> {
        let captures = REGEXP_LITERAL.captures(text)?;
        let mut builder = RegexBuilder::new(&captures["body"]);
        for flag in captures["flags"].chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                _ => &mut builder,
            };
        }
        builder.build().ok()
    }
}

impl From<&str> for Filter {
    fn from(text: &str) -> Self {
        match Filter::parse_literal(text) {
            Some(pattern) if text.len() > 1 => Filter::Pattern(pattern),
            _ => Filter::Exact(text.to_owned()),
        }
    }
}

impl From<String> for Filter {
    fn from(text: String) -> Self {
        Filter::from(text.as_str())
    }
}

impl From<Regex> for Filter {
    fn from(pattern: Regex) -> Self {
        Filter::Pattern(pattern)
    }
}

/// Child addressed by position or by handle
#[derive(Debug, Clone, Copy)]
pub enum ChildRef<'a> {
    Index(usize),
    Node(&'a Node),
}

impl From<usize> for ChildRef<'_> {
    fn from(index: usize) -> Self {
        ChildRef::Index(index)
    }
}

impl<'a> From<&'a Node> for ChildRef<'a> {
    fn from(node: &'a Node) -> Self {
        ChildRef::Node(node)
    }
}

/// Restrictions for `replace_values`
#[derive(Debug, Clone, Default)]
pub struct ReplaceOptions {
    /// Only declarations with one of these properties
    pub props: Vec<String>,
    /// Skip values not containing this substring
    pub fast: Option<String>,
}

impl Node {
    /// True for nodes with a child list. At-rules get one on first
    /// insertion.
    pub fn is_container(&self) -> bool {
        self.0.borrow().nodes.is_some()
    }

    /// Snapshot of the children
    pub fn nodes(&self) -> Vec<Node> {
        self.0.borrow().nodes.clone().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().nodes.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn child(&self, index: usize) -> Option<Node> {
        self.0.borrow().nodes.as_ref()?.get(index).cloned()
    }

    pub fn first(&self) -> Option<Node> {
        self.child(0)
    }

    pub fn last(&self) -> Option<Node> {
        self.0.borrow().nodes.as_ref()?.last().cloned()
    }

    /// Position of a child. An index is returned as is when in range.
    pub fn index<'a>(&self, child: impl Into<ChildRef<'a>>) -> Option<usize> {
        let inner = self.0.borrow();
        let nodes = inner.nodes.as_ref()?;
        match child.into() {
            ChildRef::Index(index) => (index < nodes.len()).then_some(index),
            ChildRef::Node(node) => nodes.iter().position(|n| n == node),
        }
    }

    /// Call `callback` for every direct child. The loop follows the live
    /// child list, so the callback may add or remove children.
    pub fn each<R: Into<Walk>>(&self, mut callback: impl FnMut(&Node, usize) -> R) -> Walk {
        if self.is_empty() {
            return Walk::Continue;
        }

        let cursor = ChildCursor::new(self);
        loop {
            let index = cursor.position.get().max(0) as usize;
            let Some(child) = self.child(index) else {
                break;
            };
            if callback(&child, index).into() == Walk::Stop {
                return Walk::Stop;
            }
            cursor.position.set(cursor.position.get() + 1);
        }
        Walk::Continue
    }

    /// Call `callback` for every descendant, depth first.
    pub fn walk<R: Into<Walk>>(&self, mut callback: impl FnMut(&Node, usize) -> R) -> Walk {
        self.walk_dyn(&mut |node: &Node, index: usize| -> Walk { callback(node, index).into() })
    }

    fn walk_dyn(&self, callback: &mut dyn FnMut(&Node, usize) -> Walk) -> Walk {
        self.each(|child, index| {
            if callback(child, index) == Walk::Stop {
                return Walk::Stop;
            }
            if child.is_container() {
                child.walk_dyn(callback)
            } else {
                Walk::Continue
            }
        })
    }

    fn walk_type<R: Into<Walk>>(
        &self,
        node_type: NodeType,
        filter: Filter,
        field: fn(&Node) -> String,
        mut callback: impl FnMut(&Node, usize) -> R,
    ) -> Walk {
        self.walk(|child, index| {
            if child.node_type() == node_type && filter.matches(&field(child)) {
                callback(child, index).into()
            } else {
                Walk::Continue
            }
        })
    }

    pub fn walk_decls<R: Into<Walk>>(&self, callback: impl FnMut(&Node, usize) -> R) -> Walk {
        self.walk_decls_by(Filter::Any, callback)
    }

    /// Walk declarations whose property matches `prop`.
    pub fn walk_decls_by<R: Into<Walk>>(
        &self,
        prop: impl Into<Filter>,
        callback: impl FnMut(&Node, usize) -> R,
    ) -> Walk {
        self.walk_type(NodeType::Declaration, prop.into(), Node::prop, callback)
    }

    pub fn walk_rules<R: Into<Walk>>(&self, callback: impl FnMut(&Node, usize) -> R) -> Walk {
        self.walk_rules_by(Filter::Any, callback)
    }

    pub fn walk_rules_by<R: Into<Walk>>(
        &self,
        selector: impl Into<Filter>,
        callback: impl FnMut(&Node, usize) -> R,
    ) -> Walk {
        self.walk_type(NodeType::Rule, selector.into(), Node::selector, callback)
    }

    pub fn walk_at_rules<R: Into<Walk>>(&self, callback: impl FnMut(&Node, usize) -> R) -> Walk {
        self.walk_at_rules_by(Filter::Any, callback)
    }

    pub fn walk_at_rules_by<R: Into<Walk>>(
        &self,
        name: impl Into<Filter>,
        callback: impl FnMut(&Node, usize) -> R,
    ) -> Walk {
        self.walk_type(NodeType::AtRule, name.into(), Node::name, callback)
    }

    pub fn walk_comments<R: Into<Walk>>(&self, callback: impl FnMut(&Node, usize) -> R) -> Walk {
        self.walk_type(NodeType::Comment, Filter::Any, Node::text, callback)
    }

    /// Add a child as is: no cloning, no formatting copied from siblings.
    pub fn push(&self, child: Node) -> &Self {
        if let Some(old_parent) = child.parent() {
            old_parent.remove_child(&child);
        }
        child.set_parent(Some(self));
        self.0
            .borrow_mut()
            .nodes
            .get_or_insert_with(Vec::new)
            .push(child);
        self
    }

    pub fn append(&self, children: impl Into<NodeInput>) -> Result<&Self> {
        let last = self.last();
        let nodes = self.normalize(children.into(), last.as_ref(), false)?;
        self.0
            .borrow_mut()
            .nodes
            .get_or_insert_with(Vec::new)
            .extend(nodes);
        Ok(self)
    }

    pub fn prepend(&self, children: impl Into<NodeInput>) -> Result<&Self> {
        let first = self.first();
        let nodes = self.normalize(children.into(), first.as_ref(), true)?;
        let count = nodes.len() as isize;
        if count > 0 {
            let mut inner = self.0.borrow_mut();
            inner
                .nodes
                .get_or_insert_with(Vec::new)
                .splice(0..0, nodes);
            inner.cursors.shift(count, |_| true);
        }
        Ok(self)
    }

    /// Insert `add` before `exist`, or at the end when `exist` is not a
    /// child.
    pub fn insert_before<'a>(
        &self,
        exist: impl Into<ChildRef<'a>>,
        add: impl Into<NodeInput>,
    ) -> Result<&Self> {
        let exist = self.index(exist);
        let sample = exist.and_then(|i| self.child(i));
        let nodes = self.normalize(add.into(), sample.as_ref(), exist == Some(0))?;
        let count = nodes.len() as isize;
        if count > 0 {
            let mut inner = self.0.borrow_mut();
            let children = inner.nodes.get_or_insert_with(Vec::new);
            match exist {
                Some(at) => {
                    children.splice(at..at, nodes);
                    inner.cursors.shift(count, |cursor| at as isize <= cursor);
                }
                None => children.extend(nodes),
            }
        }
        Ok(self)
    }

    /// Insert `add` after `exist`, or at the start when `exist` is not a
    /// child.
    pub fn insert_after<'a>(
        &self,
        exist: impl Into<ChildRef<'a>>,
        add: impl Into<NodeInput>,
    ) -> Result<&Self> {
        let exist = self.index(exist);
        let sample = exist.and_then(|i| self.child(i));
        let nodes = self.normalize(add.into(), sample.as_ref(), false)?;
        let count = nodes.len() as isize;
        if count > 0 {
            let mut inner = self.0.borrow_mut();
            let children = inner.nodes.get_or_insert_with(Vec::new);
            match exist {
                Some(at) => {
                    children.splice(at + 1..at + 1, nodes);
                    inner.cursors.shift(count, |cursor| (at as isize) < cursor);
                }
                None => {
                    children.splice(0..0, nodes);
                    inner.cursors.shift(count, |_| true);
                }
            }
        }
        Ok(self)
    }

    pub fn remove_child<'a>(&self, child: impl Into<ChildRef<'a>>) -> &Self {
        let Some(at) = self.index(child) else {
            return self;
        };

        if self.node_type() == NodeType::Root && at == 0 && self.len() > 1 {
            if let (Some(first), Some(second)) = (self.child(0), self.child(1)) {
                let before = first.raws().before.clone();
                second.raws_mut().before = before;
            }
        }

        let removed = {
            let mut inner = self.0.borrow_mut();
            let removed = inner.nodes.as_mut().map(|nodes| nodes.remove(at));
            inner.cursors.shift(-1, |cursor| cursor >= at as isize);
            removed
        };
        if let Some(removed) = removed {
            removed.set_parent(None);
        }
        self
    }

    pub fn remove_all(&self) -> &Self {
        let children = {
            let mut inner = self.0.borrow_mut();
            std::mem::replace(&mut inner.nodes, Some(Vec::new())).unwrap_or_default()
        };
        for child in children {
            child.set_parent(None);
        }
        self
    }

    pub fn every(&self, mut condition: impl FnMut(&Node) -> bool) -> bool {
        self.nodes().iter().all(|child| condition(child))
    }

    pub fn some(&self, mut condition: impl FnMut(&Node) -> bool) -> bool {
        self.nodes().iter().any(|child| condition(child))
    }

    /// Replace `pattern` in every declaration value below this node.
    /// Regular expression replacements may refer to groups as `$1`.
    pub fn replace_values(
        &self,
        pattern: impl Into<Filter>,
        options: &ReplaceOptions,
        replacement: &str,
    ) -> &Self {
        let pattern = pattern.into();
        self.replace_each_value(options, |value| match &pattern {
            Filter::Any => replacement.to_owned(),
            Filter::Exact(exact) => value.replace(exact.as_str(), replacement),
            Filter::Pattern(regex) => regex.replace_all(value, replacement).into_owned(),
        })
    }

    /// Like `replace_values`, computing each replacement from the matched
    /// text.
    pub fn replace_values_with(
        &self,
        pattern: impl Into<Filter>,
        options: &ReplaceOptions,
        mut replacement: impl FnMut(&str) -> String,
    ) -> &Self {
        let pattern = pattern.into();
        self.replace_each_value(options, |value| match &pattern {
            Filter::Any => replacement(value),
            Filter::Exact(exact) if exact.is_empty() => value.to_owned(),
            Filter::Exact(exact) => {
                let mut replaced = String::with_capacity(value.len());
                let mut rest = value;
                while let Some(at) = rest.find(exact.as_str()) {
                    replaced.push_str(&rest[..at]);
                    replaced.push_str(&replacement(exact));
                    rest = &rest[at + exact.len()..];
                }
                replaced.push_str(rest);
                replaced
            }
            Filter::Pattern(regex) => regex
                .replace_all(value, |captures: &regex::Captures<'_>| {
                    replacement(&captures[0])
                })
                .into_owned(),
        })
    }

    fn replace_each_value(&self, options: &ReplaceOptions, mut replace: impl FnMut(&str) -> String) -> &Self {
        self.walk_decls(|decl, _| {
            let value = decl.value();
            if !options.props.is_empty() && !options.props.contains(&decl.prop()) {
                return;
            }
            if let Some(fast) = &options.fast {
                if !value.contains(fast.as_str()) {
                    return;
                }
            }
            decl.set_value(replace(&value));
        });
        self
    }

    /// Drop source positions of this subtree.
    pub fn clean_source(&self) {
        self.set_source(None);
        for child in self.nodes() {
            child.clean_source();
        }
    }

    /// Turn `input` into detached-ready children of this container. Nodes
    /// that already have a parent are cloned; a missing `before` is copied
    /// from `sample` with everything but whitespace removed.
    fn normalize(&self, input: NodeInput, sample: Option<&Node>, prepend: bool) -> Result<Vec<Node>> {
        let nodes = match input {
            NodeInput::Css(css) => {
                let parsed = crate::parse(&css, &ProcessOptions::default())?;
                parsed.clean_source();
                parsed.nodes()
            }
            NodeInput::Node(node) if node.node_type() == NodeType::Root => node.nodes(),
            NodeInput::Node(node) => vec![node],
            NodeInput::Nodes(nodes) => nodes,
            NodeInput::Props(props) => vec![props.into_node()?],
        };

        let is_root = self.node_type() == NodeType::Root;
        let mut processed = Vec::with_capacity(nodes.len());
        for node in nodes {
            let node = if node.parent().is_some() {
                node.clone_node()
            } else {
                node
            };
            if !is_root && node.raws().before.is_none() {
                if let Some(before) = sample.and_then(|s| s.raws().before.clone()) {
                    node.raws_mut().before = Some(only_spaces(&before));
                }
            }
            node.set_parent(Some(self));
            processed.push(node);
        }

        if is_root {
            if let Some(sample) = sample {
                self.normalize_root_spacing(&processed, sample, prepend);
            }
        }
        Ok(processed)
    }

    /// Roots keep the spacing between top-level nodes: a prepended node
    /// takes over the first position, appended nodes copy the sample.
    fn normalize_root_spacing(&self, nodes: &[Node], sample: &Node, prepend: bool) {
        if prepend {
            let before = self.child(1).and_then(|second| second.raws().before.clone());
            sample.raws_mut().before = before;
        } else if self.first().as_ref() != Some(sample) {
            let before = sample.raws().before.clone();
            for node in nodes {
                node.raws_mut().before = before.clone();
            }
        }
    }
}
