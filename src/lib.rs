//! RawQuery - CSS selector queries over raw markup text
//!
//! No DOM is built. Selectors compile to a step plan that searches the text
//! for tags and attributes, resolves element boundaries on demand and returns
//! matches keyed by their byte offset in the document.
//!
//! Layers:
//! - core: scanning, start-tag grammar, attribute extraction, the locator
//! - element: boundaries, direct children, `MatchedSet`
//! - selector: compiler, condition language, matching engine
//! - document: `Selection`, chainable queries on one document
//! - extract: trees, form fields, tables
//! - strategy: parallel batch queries
//!
//! With the `nif` feature the crate also loads as `Elixir.RawQuery.Native`.

pub mod core;
pub mod document;
pub mod element;
pub mod extract;
pub mod selector;
pub mod strategy;

#[cfg(feature = "nif")]
mod nif;
#[cfg(feature = "nif")]
mod resource;
#[cfg(feature = "nif")]
mod term;

pub use crate::core::attributes::{extract_attributes, AttributeMap};
pub use crate::core::tags::{is_known_tag, is_void_tag, tag_name};
pub use document::Selection;
pub use element::{split_element, ElementParts, MatchedSet, Region};
pub use extract::{MAX_TREE_DEPTH, Node, TextValue};
pub use selector::{
    compile, compile_cached, query, query_condition, query_str, CompiledSelector, Condition, ConditionError, Context,
    Scope, SelectorError, SELECTOR_CACHE_CAPACITY,
};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// NIF Initialization
// ============================================================================

#[cfg(feature = "nif")]
rustler::init!("Elixir.RawQuery.Native");
