//! Tree builder and text helpers
//!
//! `extract_tree` turns one element into a `{tag, attributes, children}`
//! structure by walking direct children recursively. Text between children
//! is collapsed the way a browser renders whitespace.

use crate::core::attributes::{extract_attributes, AttributeMap};
use crate::core::scanner::is_whitespace;
use crate::core::tags::{parse_start_tag, tag_name};
use crate::element::boundary::{children, split_element};
use crate::element::Region;
use memchr::memchr;
use std::borrow::Cow;

/// Nesting depth beyond which elements are kept as raw text
pub const MAX_TREE_DEPTH: usize = 512;

/// An element or a run of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    Element {
        tag: String,
        attributes: AttributeMap<'a>,
        children: Vec<Node<'a>>,
    },
    Text(Cow<'a, str>),
}

impl Node<'_> {
    /// Detach from the source markup
    pub fn into_owned(self) -> Node<'static> {
        match self {
            Node::Element {
                tag,
                attributes,
                children,
            } => Node::Element {
                tag,
                attributes: attributes.into_owned(),
                children: children.into_iter().map(Node::into_owned).collect(),
            },
            Node::Text(text) => Node::Text(Cow::Owned(text.into_owned())),
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { tag, .. } => Some(tag),
            Node::Text(_) => None,
        }
    }
}

/// Browser-visible text of a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextValue<'a> {
    Text(Cow<'a, str>),
    List(Vec<TextValue<'a>>),
}

impl TextValue<'_> {
    pub fn into_owned(self) -> TextValue<'static> {
        match self {
            TextValue::Text(text) => TextValue::Text(Cow::Owned(text.into_owned())),
            TextValue::List(items) => TextValue::List(items.into_iter().map(TextValue::into_owned).collect()),
        }
    }
}

/// Either form of extraction, chosen by a `value_only` flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted<'a> {
    Tree(Node<'a>),
    Values(TextValue<'a>),
}

impl Extracted<'_> {
    pub fn into_owned(self) -> Extracted<'static> {
        match self {
            Extracted::Tree(node) => Extracted::Tree(node.into_owned()),
            Extracted::Values(value) => Extracted::Values(value.into_owned()),
        }
    }
}

/// Build the tree of one element
///
/// Markup that does not begin with a start tag becomes text. A void or
/// unterminated element has no children.
pub fn extract_tree(element: &str) -> Node<'_> {
    build(element, 0)
}

fn build(element: &str, depth: usize) -> Node<'_> {
    if depth > MAX_TREE_DEPTH {
        return Node::Text(Cow::Borrowed(element));
    }
    let Some(start) = parse_start_tag(element) else {
        return Node::Text(Cow::Borrowed(element));
    };
    let tag = tag_name(start.text).unwrap_or_default();
    let attributes = extract_attributes(start.text, false);

    let Some(parts) = split_element(element) else {
        return Node::Element {
            tag,
            attributes,
            children: Vec::new(),
        };
    };

    let content = parts.content;
    let mut nodes = Vec::new();
    let mut last = 0;
    for child in children(Region::new(0, content)) {
        push_text(&mut nodes, &content[last..child.offset]);
        nodes.push(build(child.element, depth + 1));
        last = child.offset + child.element.len();
    }
    push_text(&mut nodes, &content[last..]);

    Node::Element {
        tag,
        attributes,
        children: nodes,
    }
}

fn push_text<'a>(nodes: &mut Vec<Node<'a>>, text: &'a str) {
    let text = trim_html(text);
    if !text.is_empty() {
        nodes.push(Node::Text(text));
    }
}

/// Flatten a tree to its visible text
///
/// Text stays text, an element without children is "", a single child is
/// unwrapped and several children become a list.
pub fn text_values<'a>(node: &Node<'a>) -> TextValue<'a> {
    match node {
        Node::Text(text) => TextValue::Text(text.clone()),
        Node::Element { children, .. } => match children.as_slice() {
            [] => TextValue::Text(Cow::Borrowed("")),
            [only] => text_values(only),
            many => TextValue::List(many.iter().map(text_values).collect()),
        },
    }
}

/// Visible text of one element
pub fn extract_values(element: &str) -> TextValue<'_> {
    text_values(&extract_tree(element))
}

/// Tree or values of one element
pub fn extract(element: &str, value_only: bool) -> Extracted<'_> {
    let tree = extract_tree(element);
    if value_only {
        Extracted::Values(text_values(&tree))
    } else {
        Extracted::Tree(tree)
    }
}

/// Collapse every run of two or more whitespace bytes into one space;
/// whitespace-only text becomes empty
pub fn trim_html(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    if !bytes.is_empty() && bytes.iter().all(|&b| is_whitespace(b)) {
        return Cow::Borrowed("");
    }
    let has_run = bytes.windows(2).any(|w| is_whitespace(w[0]) && is_whitespace(w[1]));
    if !has_run {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.bytes().position(is_whitespace) {
        let run = rest[start..].bytes().take_while(|&b| is_whitespace(b)).count();
        out.push_str(&rest[..start]);
        if run > 1 {
            out.push(' ');
        } else {
            out.push_str(&rest[start..start + 1]);
        }
        rest = &rest[start + run..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Remove every `<...>` run; an unterminated tag swallows the rest
pub fn strip_tags(markup: &str) -> String {
    let bytes = markup.as_bytes();
    let mut out = String::with_capacity(markup.len());
    let mut pos = 0;
    while let Some(lt) = memchr(b'<', &bytes[pos..]).map(|i| pos + i) {
        out.push_str(&markup[pos..lt]);
        match memchr(b'>', &bytes[lt..]) {
            Some(gt) => pos = lt + gt + 1,
            None => return out,
        }
    }
    out.push_str(&markup[pos..]);
    out
}
