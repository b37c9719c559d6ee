//! Node creation from plain fields
//!
//! `NodeProps` describes a node by its fields; the field set decides the
//! node type (`prop` for declarations, `selector` for rules, `name` for
//! at-rules, `text` for comments).

use super::{AtRule, Comment, Declaration, Node, NodeData, Raws, Rule};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct NodeProps {
    pub prop: Option<String>,
    pub value: Option<String>,
    pub important: Option<bool>,
    pub selector: Option<String>,
    pub selectors: Option<Vec<String>>,
    pub name: Option<String>,
    pub params: Option<String>,
    pub text: Option<String>,
    pub raws: Option<Raws>,
}

impl NodeProps {
    pub fn decl(prop: impl Into<String>, value: impl ToString) -> Self {
        NodeProps {
            prop: Some(prop.into()),
            value: Some(value.to_string()),
            ..Default::default()
        }
    }

    pub fn rule(selector: impl Into<String>) -> Self {
        NodeProps {
            selector: Some(selector.into()),
            ..Default::default()
        }
    }

    pub fn at_rule(name: impl Into<String>, params: impl Into<String>) -> Self {
        NodeProps {
            name: Some(name.into()),
            params: Some(params.into()),
            ..Default::default()
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        NodeProps {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn value(mut self, value: impl ToString) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn raws(mut self, raws: Raws) -> Self {
        self.raws = Some(raws);
        self
    }

    pub fn into_node(self) -> Result<Node> {
        let data = if let Some(prop) = self.prop.clone() {
            let value = self
                .value
                .clone()
                .ok_or(Error::NodeCreation("Value field is missed in node creation"))?;
            NodeData::Declaration(Declaration {
                prop,
                value,
                important: self.important.unwrap_or(false),
            })
        } else if self.selector.is_some() || self.selectors.is_some() {
            NodeData::Rule(Rule::default())
        } else if self.name.is_some() {
            NodeData::AtRule(AtRule::default())
        } else if self.text.is_some() {
            NodeData::Comment(Comment::default())
        } else {
            return Err(Error::NodeCreation("Unknown node type in node creation"));
        };

        let node = Node::new(data);
        self.apply_to(&node);
        Ok(node)
    }

    /// Overwrite the fields of `node` that are set here.
    pub fn apply_to(self, node: &Node) {
        if let Some(prop) = self.prop {
            node.set_prop(prop);
        }
        if let Some(value) = self.value {
            node.set_value(value);
        }
        if let Some(important) = self.important {
            node.set_important(important);
        }
        if let Some(selector) = self.selector {
            node.set_selector(selector);
        }
        if let Some(selectors) = self.selectors {
            node.set_selectors(&selectors);
        }
        if let Some(name) = self.name {
            node.set_name(name);
        }
        if let Some(params) = self.params {
            node.set_params(params);
        }
        if let Some(text) = self.text {
            node.set_text(text);
        }
        if let Some(raws) = self.raws {
            *node.raws_mut() = raws;
        }
    }
}

/// Anything a container accepts as new children
#[derive(Debug, Clone)]
pub enum NodeInput {
    Node(Node),
    Nodes(Vec<Node>),
    /// CSS parsed into nodes; source positions are dropped
    Css(String),
    Props(NodeProps),
}

impl From<Node> for NodeInput {
    fn from(node: Node) -> Self {
        NodeInput::Node(node)
    }
}

impl From<&Node> for NodeInput {
    fn from(node: &Node) -> Self {
        NodeInput::Node(node.clone())
    }
}

impl From<Vec<Node>> for NodeInput {
    fn from(nodes: Vec<Node>) -> Self {
        NodeInput::Nodes(nodes)
    }
}

impl From<&str> for NodeInput {
    fn from(css: &str) -> Self {
        NodeInput::Css(css.to_owned())
    }
}

impl From<String> for NodeInput {
    fn from(css: String) -> Self {
        NodeInput::Css(css)
    }
}

impl From<NodeProps> for NodeInput {
    fn from(props: NodeProps) -> Self {
        NodeInput::Props(props)
    }
}
