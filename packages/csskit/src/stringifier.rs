//! Stringifier
//!
//! Prints a node tree back to CSS. Formatting a node does not carry itself
//! is taken from the first node in the same tree that does, and from
//! defaults when the tree has no example.

use crate::node::{only_spaces, Node, NodeType, RawField};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static NOT_COLON_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\s:]").unwrap());

/// Which end of a block a chunk of output belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

/// Receives the printed CSS chunk by chunk. `node` is the node the chunk
/// was printed for; `boundary` is set for the opening and closing of
/// blocks and unset for whole nodes.
pub trait Builder {
    fn emit(&mut self, text: &str, node: Option<&Node>, boundary: Option<Boundary>);
}

impl Builder for String {
    fn emit(&mut self, text: &str, _node: Option<&Node>, _boundary: Option<Boundary>) {
        self.push_str(text);
    }
}

/// Formatting values inferred from the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKey {
    Before,
    After,
    Between,
    AfterName,
    Colon,
    Indent,
    BeforeDecl,
    BeforeRule,
    BeforeOpen,
    BeforeClose,
    BeforeComment,
    EmptyBody,
    CommentLeft,
    CommentRight,
}

impl RawKey {
    pub fn default_value(&self) -> Option<&'static str> {
        match self {
            RawKey::Colon => Some(": "),
            RawKey::Indent => Some("    "),
            RawKey::BeforeDecl => Some("\n"),
            RawKey::BeforeRule => Some("\n"),
            RawKey::BeforeOpen => Some(" "),
            RawKey::BeforeClose => Some("\n"),
            RawKey::BeforeComment => Some("\n"),
            RawKey::After => Some("\n"),
            RawKey::EmptyBody => Some(""),
            RawKey::CommentLeft => Some(" "),
            RawKey::CommentRight => Some(" "),
            RawKey::Before | RawKey::Between | RawKey::AfterName => None,
        }
    }
}

/// Keep everything up to the last line break.
fn strip_line_tail(value: String) -> String {
    match value.rfind('\n') {
        Some(last) => value[..=last].to_owned(),
        None => value,
    }
}

/// Infers missing raws. Answers are cached per tree for the lifetime of
/// the resolver, so one resolver should not outlive a print.
#[derive(Debug, Default)]
pub struct RawResolver {
    cache: HashMap<(usize, RawKey), Option<String>>,
    semicolons: HashMap<usize, bool>,
}

impl RawResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The node's own `own` raw, or a value for `detect` inferred from the
    /// tree.
    pub fn raw(&mut self, node: &Node, own: Option<RawField>, detect: RawKey) -> Option<String> {
        if let Some(own) = own {
            if let Some(value) = node.raws().get(own) {
                return Some(value.to_owned());
            }
        }

        let parent = node.parent();
        if detect == RawKey::Before {
            match &parent {
                None => return Some(String::new()),
                Some(parent)
                    if parent.node_type() == NodeType::Root
                        && parent.first().as_ref() == Some(node) =>
                {
                    return Some(String::new())
                }
                _ => {}
            }
        }
        if parent.is_none() {
            return detect.default_value().map(str::to_owned);
        }

        let root = node.root();
        let key = (root.id(), detect);
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        if matches!(detect, RawKey::Before | RawKey::After) {
            return Some(self.before_after(node, detect));
        }

        let value = match detect {
            RawKey::Colon => raw_colon(&root),
            RawKey::Indent => raw_indent(&root),
            RawKey::BeforeDecl => self.raw_before_decl(&root, node),
            RawKey::BeforeRule => raw_before_rule(&root),
            RawKey::BeforeOpen => raw_before_open(&root),
            RawKey::BeforeClose => raw_before_close(&root),
            RawKey::BeforeComment => self.raw_before_comment(&root, node),
            RawKey::EmptyBody => raw_empty_body(&root),
            _ => own.and_then(|own| find_own(&root, own)),
        }
        .or_else(|| detect.default_value().map(str::to_owned));

        self.cache.insert(key, value.clone());
        value
    }

    /// Whether the last declaration of `node` gets a `;`
    pub fn semicolon(&mut self, node: &Node) -> bool {
        if let Some(own) = node.raws().semicolon {
            return own;
        }
        if node.parent().is_none() {
            return false;
        }

        let root = node.root();
        if let Some(cached) = self.semicolons.get(&root.id()) {
            return *cached;
        }
        let mut value = None;
        root.walk(|child, _| {
            let ends_with_decl = child
                .last()
                .map_or(false, |last| last.node_type() == NodeType::Declaration);
            if ends_with_decl {
                if let Some(own) = child.raws().semicolon {
                    value = Some(own);
                    return false;
                }
            }
            true
        });
        let value = value.unwrap_or(false);
        self.semicolons.insert(root.id(), value);
        value
    }

    fn before_after(&mut self, node: &Node, detect: RawKey) -> String {
        let source = match node.node_type() {
            NodeType::Declaration => RawKey::BeforeDecl,
            NodeType::Comment => RawKey::BeforeComment,
            _ if detect == RawKey::Before => RawKey::BeforeRule,
            _ => RawKey::BeforeClose,
        };
        let mut value = self.raw(node, None, source).unwrap_or_default();

        let mut depth = 0;
        let mut ancestor = node.parent();
        while let Some(current) = ancestor {
            if current.node_type() == NodeType::Root {
                break;
            }
            depth += 1;
            ancestor = current.parent();
        }

        if value.contains('\n') {
            let indent = self.raw(node, None, RawKey::Indent).unwrap_or_default();
            value.push_str(&indent.repeat(depth));
        }
        value
    }

    fn raw_before_decl(&mut self, root: &Node, node: &Node) -> Option<String> {
        let mut value = None;
        root.walk_decls(|decl, _| {
            value = decl.raws().before.clone().map(strip_line_tail);
            value.is_none()
        });
        value.or_else(|| self.raw(node, None, RawKey::BeforeRule))
    }

    fn raw_before_comment(&mut self, root: &Node, node: &Node) -> Option<String> {
        let mut value = None;
        root.walk_comments(|comment, _| {
            value = comment.raws().before.clone().map(strip_line_tail);
            value.is_none()
        });
        value.or_else(|| self.raw(node, None, RawKey::BeforeDecl))
    }
}

fn find_own(root: &Node, own: RawField) -> Option<String> {
    let mut value = None;
    root.walk(|child, _| {
        value = child.raws().get(own).map(str::to_owned);
        value.is_none()
    });
    value
}

fn raw_colon(root: &Node) -> Option<String> {
    let mut value = None;
    root.walk_decls(|decl, _| {
        value = decl
            .raws()
            .between
            .as_deref()
            .map(|between| NOT_COLON_REGEXP.replace_all(between, "").into_owned());
        value.is_none()
    });
    value
}

fn raw_indent(root: &Node) -> Option<String> {
    if let Some(indent) = root.raws().indent.clone() {
        return Some(indent);
    }
    let mut value = None;
    root.walk(|child, _| {
        let Some(parent) = child.parent() else {
            return true;
        };
        if parent == *root || parent.parent().as_ref() != Some(root) {
            return true;
        }
        value = child.raws().before.as_deref().map(|before| {
            let last_line = before.rsplit('\n').next().unwrap_or_default();
            only_spaces(last_line)
        });
        value.is_none()
    });
    value
}

fn raw_before_rule(root: &Node) -> Option<String> {
    let mut value = None;
    root.walk(|child, _| {
        let first_in_root =
            child.parent().as_ref() == Some(root) && root.first().as_ref() == Some(child);
        if child.is_container() && !first_in_root {
            value = child.raws().before.clone().map(strip_line_tail);
        }
        value.is_none()
    });
    value
}

fn raw_before_close(root: &Node) -> Option<String> {
    let mut value = None;
    root.walk(|child, _| {
        if !child.is_empty() {
            value = child.raws().after.clone().map(strip_line_tail);
        }
        value.is_none()
    });
    value
}

fn raw_before_open(root: &Node) -> Option<String> {
    let mut value = None;
    root.walk(|child, _| {
        if child.node_type() != NodeType::Declaration {
            value = child.raws().between.clone();
        }
        value.is_none()
    });
    value
}

fn raw_empty_body(root: &Node) -> Option<String> {
    let mut value = None;
    root.walk(|child, _| {
        if child.is_container() && child.is_empty() {
            value = child.raws().after.clone();
        }
        value.is_none()
    });
    value
}

/// Prints nodes into a `Builder`
pub struct Stringifier<'b> {
    builder: &'b mut dyn Builder,
    raws: RawResolver,
}

impl<'b> Stringifier<'b> {
    pub fn new(builder: &'b mut dyn Builder) -> Self {
        Stringifier {
            builder,
            raws: RawResolver::new(),
        }
    }

    pub fn stringify(&mut self, node: &Node, semicolon: bool) {
        match node.node_type() {
            NodeType::Root => self.root(node),
            NodeType::Rule => self.rule(node),
            NodeType::AtRule => self.at_rule(node, semicolon),
            NodeType::Declaration => self.decl(node, semicolon),
            NodeType::Comment => self.comment(node),
        }
    }

    pub fn raw(&mut self, node: &Node, own: Option<RawField>, detect: RawKey) -> String {
        self.raws.raw(node, own, detect).unwrap_or_default()
    }

    fn root(&mut self, node: &Node) {
        self.body(node);
        let after = node.raws().after.clone();
        if let Some(after) = after {
            self.builder.emit(&after, None, None);
        }
    }

    fn comment(&mut self, node: &Node) {
        let left = self.raw(node, Some(RawField::Left), RawKey::CommentLeft);
        let right = self.raw(node, Some(RawField::Right), RawKey::CommentRight);
        let text = format!("/*{}{}{}*/", left, node.text(), right);
        self.builder.emit(&text, Some(node), None);
    }

    fn decl(&mut self, node: &Node, semicolon: bool) {
        let between = self.raw(node, Some(RawField::Between), RawKey::Colon);
        let mut text = format!("{}{}{}", node.prop(), between, raw_value(node, RawTarget::Value));
        if node.important() {
            match node.raws().important.as_deref() {
                Some(important) if !important.is_empty() => text.push_str(important),
                _ => text.push_str(" !important"),
            }
        }
        if semicolon {
            text.push(';');
        }
        self.builder.emit(&text, Some(node), None);
    }

    fn rule(&mut self, node: &Node) {
        let selector = raw_value(node, RawTarget::Selector);
        self.block(node, &selector);
    }

    fn at_rule(&mut self, node: &Node, semicolon: bool) {
        let mut name = format!("@{}", node.name());
        let params = raw_value(node, RawTarget::Params);
        match node.raws().after_name.as_deref() {
            Some(after_name) => name.push_str(after_name),
            None if !params.is_empty() => name.push(' '),
            None => {}
        }

        if node.is_container() {
            self.block(node, &format!("{}{}", name, params));
        } else {
            let between = node.raws().between.clone().unwrap_or_default();
            let end = if semicolon { ";" } else { "" };
            let text = format!("{}{}{}{}", name, params, between, end);
            self.builder.emit(&text, Some(node), None);
        }
    }

    fn body(&mut self, node: &Node) {
        let children = node.nodes();
        let mut last = children.len().saturating_sub(1);
        while last > 0 && children[last].node_type() == NodeType::Comment {
            last -= 1;
        }

        let semicolon = self.raws.semicolon(node);
        for (i, child) in children.iter().enumerate() {
            let before = self.raw(child, Some(RawField::Before), RawKey::Before);
            if !before.is_empty() {
                self.builder.emit(&before, None, None);
            }
            self.stringify(child, last != i || semicolon);
        }
    }

    fn block(&mut self, node: &Node, start: &str) {
        let between = self.raw(node, Some(RawField::Between), RawKey::BeforeOpen);
        self.builder
            .emit(&format!("{}{}{{", start, between), Some(node), Some(Boundary::Start));

        let after = if node.is_empty() {
            self.raw(node, Some(RawField::After), RawKey::EmptyBody)
        } else {
            self.body(node);
            self.raw(node, Some(RawField::After), RawKey::After)
        };
        if !after.is_empty() {
            self.builder.emit(&after, None, None);
        }
        self.builder.emit("}", Some(node), Some(Boundary::End));
    }
}

#[derive(Clone, Copy)]
enum RawTarget {
    Selector,
    Params,
    Value,
}

/// Field text, or the source spelling stored in raws while the field still
/// holds the value parsed from it.
fn raw_value(node: &Node, target: RawTarget) -> String {
    let (value, raws) = match target {
        RawTarget::Selector => (node.selector(), node.raws().selector.clone()),
        RawTarget::Params => (node.params(), node.raws().params.clone()),
        RawTarget::Value => (node.value(), node.raws().value.clone()),
    };
    match raws {
        Some(raw) if raw.value == value => raw.raw,
        _ => value,
    }
}
