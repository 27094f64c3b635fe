//! Consumers built on the query engine
//!
//! - `tree`: `{tag, attributes, children}` trees and flattened text values
//! - `form`: bracket-path form field maps
//! - `table`: one tree per table, nested tables promoted

pub mod form;
pub mod table;
pub mod tree;

pub use form::{extract_form, prepare_post_form, FormValue, FORM_CONTROLS};
pub use table::{extract_tables, Table};
pub use tree::{
    extract, extract_tree, extract_values, strip_tags, text_values, trim_html, Extracted, Node, TextValue,
    MAX_TREE_DEPTH,
};
