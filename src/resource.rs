//! ResourceArc Wrappers
//!
//! Documents and compiled selectors kept on the Rust side between calls.
//! Both are immutable once built, so no locking is needed.

use crate::element::MatchedSet;
use crate::selector::CompiledSelector;
use rustler::ResourceArc;
use std::sync::Arc;

/// A parsed document: the markup text itself
///
/// Parsing only takes ownership of the text. Every query scans it again, and
/// match offsets index into it.
pub struct DocumentResource {
    pub source: String,
}

impl DocumentResource {
    pub fn new(source: String) -> Self {
        DocumentResource { source }
    }

    /// Elements starting at `offsets`; offsets that do not begin an element
    /// are dropped
    pub fn elements_at(&self, offsets: impl IntoIterator<Item = usize>) -> MatchedSet<'_> {
        MatchedSet::from_offsets(&self.source, offsets)
    }
}

#[rustler::resource_impl]
impl rustler::Resource for DocumentResource {}

/// Type alias for document ResourceArc
pub type DocumentRef = ResourceArc<DocumentResource>;

/// A compiled selector shared with the compile cache
pub struct SelectorResource {
    pub compiled: Arc<CompiledSelector>,
}

impl SelectorResource {
    pub fn new(compiled: Arc<CompiledSelector>) -> Self {
        SelectorResource { compiled }
    }
}

#[rustler::resource_impl]
impl rustler::Resource for SelectorResource {}

/// Type alias for selector ResourceArc
pub type SelectorRef = ResourceArc<SelectorResource>;
