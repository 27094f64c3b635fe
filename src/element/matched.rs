//! MatchedSet - an offset-keyed selection of elements
//!
//! Keys are absolute byte offsets of each element's `<` in the document;
//! values borrow the element markup from the document. Iteration is in
//! ascending offset order.

use super::boundary::element_at;
use std::collections::btree_map::{self, BTreeMap};

/// Ordered mapping of document offset to element markup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchedSet<'a> {
    elements: BTreeMap<usize, &'a str>,
}

impl<'a> MatchedSet<'a> {
    pub fn new() -> Self {
        MatchedSet {
            elements: BTreeMap::new(),
        }
    }

    /// Rebuild a selection from offsets of start tags in `doc`
    ///
    /// Offsets that do not begin a start tag are skipped.
    pub fn from_offsets(doc: &'a str, offsets: impl IntoIterator<Item = usize>) -> Self {
        offsets
            .into_iter()
            .filter_map(|offset| element_at(doc, offset).map(|markup| (offset, markup)))
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Insert unless the offset is already claimed; first claim wins
    pub fn insert(&mut self, offset: usize, markup: &'a str) -> bool {
        match self.elements.entry(offset) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(markup);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, offset: usize) -> Option<&'a str> {
        self.elements.get(&offset).copied()
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.elements.contains_key(&offset)
    }

    /// Lowest-offset element
    pub fn first(&self) -> Option<(usize, &'a str)> {
        self.elements.iter().next().map(|(&o, &m)| (o, m))
    }

    /// Element at position `index` in offset order
    pub fn nth(&self, index: usize) -> Option<(usize, &'a str)> {
        self.elements.iter().nth(index).map(|(&o, &m)| (o, m))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        self.elements.iter().map(|(&o, &m)| (o, m))
    }

    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.elements.keys().copied()
    }

    /// Merge `other` in; offsets already present keep their markup
    pub fn union(&mut self, other: MatchedSet<'a>) {
        for (offset, markup) in other.elements {
            self.insert(offset, markup);
        }
    }
}

impl<'a> FromIterator<(usize, &'a str)> for MatchedSet<'a> {
    fn from_iter<I: IntoIterator<Item = (usize, &'a str)>>(iter: I) -> Self {
        let mut set = MatchedSet::new();
        for (offset, markup) in iter {
            set.insert(offset, markup);
        }
        set
    }
}

impl<'a> IntoIterator for MatchedSet<'a> {
    type Item = (usize, &'a str);
    type IntoIter = btree_map::IntoIter<usize, &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}
