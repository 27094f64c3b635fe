//! Elixir Term Conversion Utilities
//!
//! Converts matches, trees, form fields and tables to Elixir terms.

use crate::core::attributes::AttributeMap;
use crate::element::{ElementParts, MatchedSet};
use crate::extract::{Extracted, FormValue, Node, Table, TextValue};
use rustler::{Encoder, Env, NewBinary, Term};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    element,
}

/// `{:ok, value}`
pub fn ok_tuple<'a>(env: Env<'a>, value: Term<'a>) -> Term<'a> {
    (ok(), value).encode(env)
}

/// `{:error, reason}`
pub fn error_tuple<'a>(env: Env<'a>, reason: impl ToString) -> Term<'a> {
    (error(), reason.to_string()).encode(env)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

/// Build a list from terms produced back to front
fn list_from_rev<'a>(env: Env<'a>, items: impl DoubleEndedIterator<Item = Term<'a>>) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for item in items.rev() {
        list = list.list_prepend(item);
    }
    list
}

/// Matches as `[{offset, markup}]` in offset order
pub fn matches_to_term<'a>(env: Env<'a>, set: &MatchedSet<'_>) -> Term<'a> {
    let items: Vec<Term<'a>> = set
        .iter()
        .map(|(offset, markup)| (offset, str_to_binary(env, markup)).encode(env))
        .collect();
    list_from_rev(env, items.into_iter())
}

/// `{start_tag, content, end_tag}`
pub fn parts_to_term<'a>(env: Env<'a>, parts: &ElementParts<'_>) -> Term<'a> {
    (
        str_to_binary(env, parts.start_tag),
        str_to_binary(env, parts.content),
        str_to_binary(env, parts.end_tag),
    )
        .encode(env)
}

/// Attributes as `[{name, value | nil}]`
pub fn attributes_to_term<'a>(env: Env<'a>, attrs: &AttributeMap<'_>) -> Term<'a> {
    let items: Vec<Term<'a>> = attrs
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Some(v) => str_to_binary(env, v),
                None => rustler::types::atom::nil().encode(env),
            };
            (str_to_binary(env, name), value).encode(env)
        })
        .collect();
    list_from_rev(env, items.into_iter())
}

/// Elements become `{:element, tag, attributes, children}`, text a binary
pub fn node_to_term<'a>(env: Env<'a>, node: &Node<'_>) -> Term<'a> {
    match node {
        Node::Element {
            tag,
            attributes,
            children,
        } => {
            let children: Vec<Term<'a>> = children.iter().map(|child| node_to_term(env, child)).collect();
            (
                element(),
                str_to_binary(env, tag),
                attributes_to_term(env, attributes),
                list_from_rev(env, children.into_iter()),
            )
                .encode(env)
        }
        Node::Text(text) => str_to_binary(env, text),
    }
}

/// Text as a binary, several values as a (nested) list
pub fn text_value_to_term<'a>(env: Env<'a>, value: &TextValue<'_>) -> Term<'a> {
    match value {
        TextValue::Text(text) => str_to_binary(env, text),
        TextValue::List(items) => {
            let items: Vec<Term<'a>> = items.iter().map(|item| text_value_to_term(env, item)).collect();
            list_from_rev(env, items.into_iter())
        }
    }
}

pub fn extracted_to_term<'a>(env: Env<'a>, extracted: &Extracted<'_>) -> Term<'a> {
    match extracted {
        Extracted::Tree(node) => node_to_term(env, node),
        Extracted::Values(value) => text_value_to_term(env, value),
    }
}

/// Tables as `[{offset, tree_or_values}]`
pub fn tables_to_term<'a>(env: Env<'a>, tables: &[Table]) -> Term<'a> {
    let items: Vec<Term<'a>> = tables
        .iter()
        .map(|table| (table.offset, extracted_to_term(env, &table.extracted)).encode(env))
        .collect();
    list_from_rev(env, items.into_iter())
}

/// Form fields as ordered `[{key, value}]`; nested maps nest the same way
pub fn form_to_term<'a>(env: Env<'a>, fields: &[(String, FormValue)]) -> Term<'a> {
    let items: Vec<Term<'a>> = fields
        .iter()
        .map(|(key, value)| (str_to_binary(env, key), form_value_to_term(env, value)).encode(env))
        .collect();
    list_from_rev(env, items.into_iter())
}

fn form_value_to_term<'a>(env: Env<'a>, value: &FormValue) -> Term<'a> {
    match value {
        FormValue::Value(Some(text)) => str_to_binary(env, text),
        FormValue::Value(None) => rustler::types::atom::nil().encode(env),
        FormValue::Map(entries) => form_to_term(env, entries),
    }
}
