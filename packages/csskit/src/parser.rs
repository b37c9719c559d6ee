//! Parser
//!
//! Builds the node tree from the token stream. Everything between nodes
//! (whitespace, stray semicolons, comments inside values) is kept in raws so
//! printing the tree reproduces the input.

use crate::error::{CssSyntaxError, Error, Result};
use crate::input::Input;
use crate::node::{Node, NodeType, RawValue, Source};
use crate::source_map::Position;
use crate::tokenizer::{tokenize, Token, TokenKind};
use std::rc::Rc;

const SCSS_HINT: &str =
    "\nYou tried to parse SCSS with the standard CSS parser; try again with an SCSS-aware parser";
const LESS_HINT: &str =
    "\nYou tried to parse Less with the standard CSS parser; try again with a Less-aware parser";

pub struct Parser {
    input: Rc<Input>,
    ignore_errors: bool,
}

impl Parser {
    pub fn new(input: Rc<Input>, ignore_errors: bool) -> Self {
        Parser {
            input,
            ignore_errors,
        }
    }

    pub fn parse(self) -> Result<Node> {
        let result = TreeBuilder::new(&self.input, self.ignore_errors).and_then(TreeBuilder::build);
        result.map_err(|error| match error {
            Error::Syntax(mut error) => {
                if let Some(hint) = syntax_hint(self.input.file()) {
                    error.append_to_message(hint);
                }
                Error::Syntax(error)
            }
            other => other,
        })
    }
}

/// Hint for errors in files written in a CSS preprocessor syntax
fn syntax_hint(file: Option<&str>) -> Option<&'static str> {
    let file = file?.to_ascii_lowercase();
    if file.ends_with(".scss") {
        Some(SCSS_HINT)
    } else if file.ends_with(".less") {
        Some(LESS_HINT)
    } else {
        None
    }
}

#[derive(Clone, Copy)]
enum RawTarget {
    Selector,
    Params,
    Value,
}

struct TreeBuilder<'a> {
    input: &'a Rc<Input>,
    tokens: Vec<Token<'a>>,
    pos: usize,
    root: Node,
    current: Node,
    /// Whitespace waiting to become the `before` of the next node
    spaces: String,
    /// The last declaration in the current block ended with `;`
    semicolon: bool,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a Rc<Input>, ignore_errors: bool) -> Result<Self> {
        let tokens = tokenize(input, ignore_errors)?;
        let root = Node::new_root();
        root.set_source(Some(Source {
            input: input.clone(),
            start: Some(Position::new(1, 1)),
            end: None,
        }));
        Ok(TreeBuilder {
            input,
            tokens,
            pos: 0,
            current: root.clone(),
            root,
            spaces: String::new(),
            semicolon: false,
        })
    }

    fn build(mut self) -> Result<Node> {
        while self.pos < self.tokens.len() {
            let token = self.tokens[self.pos];
            match token.kind {
                TokenKind::Space | TokenKind::Semicolon => self.spaces.push_str(token.text),
                TokenKind::CloseCurly => self.end(&token)?,
                TokenKind::Comment => self.comment(&token),
                TokenKind::AtWord => self.at_rule(&token)?,
                TokenKind::OpenCurly => self.empty_rule(&token),
                _ => self.other()?,
            }
            self.pos += 1;
        }
        self.end_file()?;
        Ok(self.root)
    }

    fn error(&self, reason: &str, position: Option<Position>) -> Error {
        match position {
            Some(position) => self
                .input
                .error(reason, position.line, position.column, None)
                .into(),
            None => CssSyntaxError::new(reason)
                .with_css(self.input.css())
                .with_file(self.input.file().map(str::to_owned))
                .into(),
        }
    }

    fn init(&mut self, node: &Node, start: Option<Position>) {
        self.current.push(node.clone());
        node.set_source(Some(Source {
            input: self.input.clone(),
            start,
            end: None,
        }));
        node.raws_mut().before = Some(std::mem::take(&mut self.spaces));
        if node.node_type() != NodeType::Comment {
            self.semicolon = false;
        }
    }

    fn comment(&mut self, token: &Token<'a>) {
        let node = Node::new_comment("");
        self.init(&node, token.start);
        set_end(&node, token.end);

        let text = if token.text.len() > 4 {
            token.text.get(2..token.text.len() - 2).unwrap_or_default()
        } else {
            ""
        };
        let trim = |c: char| crate::chars::is_trim_space(c);
        let content = text.trim_matches(trim);
        let (left, right) = if content.is_empty() {
            (text, "")
        } else {
            let left_len = text.len() - text.trim_start_matches(trim).len();
            let right_len = text.len() - text.trim_end_matches(trim).len();
            (&text[..left_len], &text[text.len() - right_len..])
        };

        node.set_text(content);
        let mut raws = node.raws_mut();
        raws.left = Some(left.to_owned());
        raws.right = Some(right.to_owned());
    }

    fn empty_rule(&mut self, token: &Token<'a>) {
        let node = Node::new_rule("");
        self.init(&node, token.start);
        node.raws_mut().between = Some(String::new());
        self.current = node;
    }

    /// Declaration, rule or garbage: decided by the first `;`, `{` or `}`
    /// outside of brackets.
    fn other(&mut self) -> Result<()> {
        let start = self.pos;
        let length = self.tokens.len();
        let mut end = false;
        let mut colon = false;
        let mut bracket: Option<Token<'a>> = None;
        let mut brackets: Vec<TokenKind> = Vec::new();

        while self.pos < length {
            let token = self.tokens[self.pos];
            match token.kind {
                TokenKind::OpenParen | TokenKind::OpenSquare => {
                    bracket.get_or_insert(token);
                    brackets.push(if token.kind == TokenKind::OpenParen {
                        TokenKind::CloseParen
                    } else {
                        TokenKind::CloseSquare
                    });
                }
                kind if brackets.is_empty() => match kind {
                    TokenKind::Semicolon if colon => {
                        let tokens = self.tokens[start..=self.pos].to_vec();
                        return self.decl(tokens);
                    }
                    TokenKind::Semicolon => break,
                    TokenKind::OpenCurly => {
                        let tokens = self.tokens[start..=self.pos].to_vec();
                        self.rule(tokens);
                        return Ok(());
                    }
                    TokenKind::CloseCurly => {
                        self.pos -= 1;
                        end = true;
                        break;
                    }
                    TokenKind::Colon => colon = true,
                    _ => {}
                },
                kind if brackets.last() == Some(&kind) => {
                    brackets.pop();
                    if brackets.is_empty() {
                        bracket = None;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }

        if self.pos == length {
            self.pos -= 1;
            end = true;
        }

        if let Some(bracket) = bracket {
            return Err(self.error("Unclosed bracket", bracket.start));
        }

        if end && colon {
            while self.pos > start && self.tokens[self.pos].is_trivia() {
                self.pos -= 1;
            }
            let tokens = self.tokens[start..=self.pos].to_vec();
            return self.decl(tokens);
        }

        Err(self.error("Unknown word", self.tokens[start].start))
    }

    fn rule(&mut self, mut tokens: Vec<Token<'a>>) {
        tokens.pop();
        let node = Node::new_rule("");
        self.init(&node, tokens.first().and_then(|t| t.start));
        let between = spaces_from_end(&mut tokens);
        node.raws_mut().between = Some(between);
        set_raw(&node, RawTarget::Selector, &tokens);
        self.current = node;
    }

    fn decl(&mut self, mut tokens: Vec<Token<'a>>) -> Result<()> {
        let node = Node::new_decl("", "");
        self.init(&node, None);

        let Some(last) = tokens.last().copied() else {
            return Ok(());
        };
        if last.kind == TokenKind::Semicolon {
            self.semicolon = true;
            tokens.pop();
        }
        set_end(&node, last.end.or(last.start));

        let mut before = node.raws().before.clone().unwrap_or_default();
        while tokens.first().map_or(false, |t| t.kind != TokenKind::Word) {
            before.push_str(tokens.remove(0).text);
        }
        if let Some(source) = node.0.borrow_mut().source.as_mut() {
            source.start = tokens.first().and_then(|t| t.start);
        }

        let mut prop = String::new();
        while let Some(token) = tokens.first() {
            if matches!(
                token.kind,
                TokenKind::Colon | TokenKind::Space | TokenKind::Comment
            ) {
                break;
            }
            prop.push_str(tokens.remove(0).text);
        }

        let mut between = String::new();
        while !tokens.is_empty() {
            let token = tokens.remove(0);
            between.push_str(token.text);
            if token.kind == TokenKind::Colon {
                break;
            }
        }

        if prop.starts_with('_') || prop.starts_with('*') {
            before.push_str(&prop[..1]);
            prop.remove(0);
        }
        between.push_str(&spaces_from_start(&mut tokens));

        let mut important = false;
        let mut important_raw = None;
        for i in (1..tokens.len()).rev() {
            let token = tokens[i];
            if token.text.eq_ignore_ascii_case("!important") {
                important = true;
                let suffix = string_from(&mut tokens, i);
                let spelled = spaces_from_end(&mut tokens) + &suffix;
                if spelled != " !important" {
                    important_raw = Some(spelled);
                }
                break;
            } else if token.text.eq_ignore_ascii_case("important") {
                let mut cache = tokens.clone();
                let mut spelled = String::new();
                for j in (1..=i).rev() {
                    let kind = cache[j].kind;
                    if spelled.trim().starts_with('!') && kind != TokenKind::Space {
                        break;
                    }
                    if let Some(item) = cache.pop() {
                        spelled.insert_str(0, item.text);
                    }
                }
                if spelled.trim().starts_with('!') {
                    important = true;
                    important_raw = Some(spelled);
                    tokens = cache;
                }
            }
            if !token.is_trivia() {
                break;
            }
        }

        node.set_prop(prop);
        node.set_important(important);
        {
            let mut raws = node.raws_mut();
            raws.before = Some(before);
            raws.between = Some(between);
            raws.important = important_raw;
        }
        set_raw(&node, RawTarget::Value, &tokens);

        if node.value().contains(':') {
            self.check_missed_semicolon(&tokens)?;
        }
        Ok(())
    }

    fn at_rule(&mut self, token: &Token<'a>) -> Result<()> {
        let name = token.text.get(1..).unwrap_or_default();
        if name.is_empty() {
            return Err(self.error("At-rule without name", token.start));
        }
        let node = Node::new_at_rule(name, "");
        self.init(&node, token.start);

        let length = self.tokens.len();
        let mut open = false;
        let mut params: Vec<Token<'a>> = Vec::new();
        self.pos += 1;
        while self.pos < length {
            let token = self.tokens[self.pos];
            match token.kind {
                TokenKind::Semicolon => {
                    set_end(&node, token.start);
                    self.semicolon = true;
                    break;
                }
                TokenKind::OpenCurly => {
                    open = true;
                    break;
                }
                TokenKind::CloseCurly => {
                    self.end(&token)?;
                    break;
                }
                _ => params.push(token),
            }
            self.pos += 1;
        }
        let last = self.pos == length;

        let mut between = spaces_from_end(&mut params);
        if params.is_empty() {
            node.raws_mut().after_name = Some(String::new());
        } else {
            let after_name = spaces_from_start(&mut params);
            node.raws_mut().after_name = Some(after_name);
            set_raw(&node, RawTarget::Params, &params);
            if last {
                if let Some(token) = params.last() {
                    set_end(&node, token.end.or(token.start));
                }
                self.spaces = std::mem::take(&mut between);
            }
        }
        node.raws_mut().between = Some(between);

        if open {
            node.0.borrow_mut().nodes = Some(Vec::new());
            self.current = node;
        }
        Ok(())
    }

    fn close_block(&mut self) {
        let spaces = std::mem::take(&mut self.spaces);
        let has_children = !self.current.is_empty();
        let mut raws = self.current.raws_mut();
        if has_children {
            raws.semicolon = Some(self.semicolon);
        }
        raws.after = Some(raws.after.take().unwrap_or_default() + &spaces);
        drop(raws);
        self.semicolon = false;
    }

    fn end(&mut self, token: &Token<'a>) -> Result<()> {
        self.close_block();
        match self.current.parent() {
            Some(parent) => {
                set_end(&self.current, token.start);
                self.current = parent;
                Ok(())
            }
            None => Err(self.error("Unexpected }", token.start)),
        }
    }

    fn end_file(&mut self) -> Result<()> {
        if self.current.parent().is_some() {
            let start = self.current.source().and_then(|s| s.start);
            return Err(self.error("Unclosed block", start));
        }
        self.close_block();
        Ok(())
    }

    /// Index of the first top-level colon inside a value
    fn colon(&self, tokens: &[Token<'a>]) -> Result<Option<usize>> {
        let mut brackets = 0i32;
        let mut prev: Option<&Token<'a>> = None;
        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::OpenParen => brackets += 1,
                TokenKind::CloseParen => brackets -= 1,
                TokenKind::Colon if brackets == 0 => match prev {
                    None => return Err(self.error("Double colon", token.start)),
                    Some(prev) if prev.kind == TokenKind::Word && prev.text == "progid" => continue,
                    Some(_) => return Ok(Some(i)),
                },
                _ => {}
            }
            prev = Some(token);
        }
        Ok(None)
    }

    /// A colon inside a value usually means the `;` before the next
    /// declaration is missing.
    fn check_missed_semicolon(&self, tokens: &[Token<'a>]) -> Result<()> {
        let Some(colon) = self.colon(tokens)? else {
            return Ok(());
        };

        let mut founded = 0;
        let mut at = tokens[0];
        for token in tokens[..colon].iter().rev() {
            at = *token;
            if token.kind != TokenKind::Space {
                founded += 1;
                if founded == 2 {
                    break;
                }
            }
        }
        Err(self.error("Missed semicolon", at.start))
    }
}

fn set_end(node: &Node, end: Option<Position>) {
    if let Some(source) = node.0.borrow_mut().source.as_mut() {
        source.end = end;
    }
}

/// Store the cleaned text of `tokens` in a node field. Comments and a
/// trailing space are dropped from the field and kept as a raw.
fn set_raw(node: &Node, target: RawTarget, tokens: &[Token<'_>]) {
    let last = tokens.len().saturating_sub(1);
    let mut value = String::new();
    let mut clean = true;
    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Comment || (token.kind == TokenKind::Space && i == last) {
            clean = false;
        } else {
            value.push_str(token.text);
        }
    }

    let raw = (!clean).then(|| {
        let raw: String = tokens.iter().map(|t| t.text).collect();
        RawValue::new(value.clone(), raw)
    });

    match target {
        RawTarget::Selector => {
            node.raws_mut().selector = raw;
            node.set_selector(value);
        }
        RawTarget::Params => {
            node.raws_mut().params = raw;
            node.set_params(value);
        }
        RawTarget::Value => {
            node.raws_mut().value = raw;
            node.set_value(value);
        }
    }
}

fn spaces_from_end(tokens: &mut Vec<Token<'_>>) -> String {
    let mut spaces = String::new();
    while let Some(token) = tokens.last() {
        if !token.is_trivia() {
            break;
        }
        spaces.insert_str(0, token.text);
        tokens.pop();
    }
    spaces
}

fn spaces_from_start(tokens: &mut Vec<Token<'_>>) -> String {
    let count = tokens.iter().take_while(|t| t.is_trivia()).count();
    tokens.drain(..count).map(|t| t.text).collect()
}

/// Text of `tokens[from..]`, removed from the list
fn string_from(tokens: &mut Vec<Token<'_>>, from: usize) -> String {
    tokens.drain(from..).map(|t| t.text).collect()
}
