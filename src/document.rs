//! Selection - chainable, jQuery-style queries over one document
//!
//! A `Selection` is the document text plus either the whole document or a
//! set of matched elements. `find` on the whole document searches every
//! byte; `find` on matched elements searches inside them. An invalid selector
//! or a query with no hits gives an empty selection, and every accessor on an
//! empty selection returns `None`, so calls chain without checks:
//!
//! ```
//! use rawquery::Selection;
//!
//! let page = Selection::new("<ul><li class=\"a\">One</li><li>Two</li></ul>");
//! assert_eq!(page.find("ul li").eq(1).text().as_deref(), Some("Two"));
//! assert_eq!(page.find("li.a").attr("class").as_deref(), Some("a"));
//! assert!(page.find("li:hover").attr("class").is_none());
//! ```

use crate::core::attributes::extract_attributes;
use crate::element::MatchedSet;
use crate::extract::tree::strip_tags;
use crate::selector::{compile_cached, query, query_condition, CompiledSelector, Condition, Context};
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Current<'a> {
    /// Fresh document: acts as the single element `{0: source}`
    Whole,
    Matches(MatchedSet<'a>),
}

/// A document and the elements currently selected in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    source: &'a str,
    current: Current<'a>,
}

impl<'a> Selection<'a> {
    /// Select the whole document
    pub fn new(source: &'a str) -> Self {
        Selection {
            source,
            current: Current::Whole,
        }
    }

    /// Select elements of `source` found earlier
    pub fn from_matches(source: &'a str, matches: MatchedSet<'a>) -> Self {
        Selection {
            source,
            current: Current::Matches(matches),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Context for running a query against this selection
    pub fn context(&self) -> Context<'_, 'a> {
        match &self.current {
            Current::Whole => Context::Document,
            Current::Matches(set) => Context::Matches(set),
        }
    }

    /// Descendants matching `selector`; empty when the selector is invalid
    pub fn find(&self, selector: &str) -> Selection<'a> {
        match compile_cached(selector) {
            Ok(compiled) => self.find_compiled(&compiled),
            Err(_) => self.empty(),
        }
    }

    pub fn find_compiled(&self, selector: &CompiledSelector) -> Selection<'a> {
        let found = query(self.source, &self.context(), selector);
        Selection::from_matches(self.source, found)
    }

    /// Descendants whose attributes satisfy a condition expression such as
    /// `type = text OR name starts with q`; empty when it does not parse
    pub fn find_where(&self, condition: &str) -> Selection<'a> {
        match Condition::parse(condition) {
            Ok(condition) => {
                let found = query_condition(self.source, &self.context(), &condition);
                Selection::from_matches(self.source, found)
            }
            Err(_) => self.empty(),
        }
    }

    /// Reduce to the element at `index`; negative indexes count from the end
    pub fn eq(&self, index: isize) -> Selection<'a> {
        let len = self.len();
        let position = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs()).filter(|&i| i < len)
        };
        match (position, &self.current) {
            (None, _) => self.empty(),
            (Some(_), Current::Whole) => self.clone(),
            (Some(i), Current::Matches(set)) => match set.nth(i) {
                Some(entry) => Selection::from_matches(self.source, [entry].into_iter().collect()),
                None => self.empty(),
            },
        }
    }

    pub fn len(&self) -> usize {
        match &self.current {
            Current::Whole => 1,
            Current::Matches(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Selected elements keyed by offset; the whole document is `{0: source}`
    pub fn elements(&self) -> MatchedSet<'a> {
        match &self.current {
            Current::Whole => [(0, self.source)].into_iter().collect(),
            Current::Matches(set) => set.clone(),
        }
    }

    /// Markup of the first element
    pub fn html(&self) -> Option<&'a str> {
        match &self.current {
            Current::Whole => Some(self.source),
            Current::Matches(set) => set.first().map(|(_, markup)| markup),
        }
    }

    /// Text of the first element, tags removed
    pub fn text(&self) -> Option<String> {
        self.html().map(strip_tags)
    }

    /// Attribute of the first element; `None` when absent or valueless
    pub fn attr(&self, name: &str) -> Option<Cow<'a, str>> {
        extract_attributes(self.html()?, true).into_value(&name.to_ascii_lowercase())
    }

    fn empty(&self) -> Selection<'a> {
        Selection::from_matches(self.source, MatchedSet::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<div id=\"main\"><p class=\"lead\">Hello <b>world</b></p><p>Bye</p></div>";

    #[test]
    fn test_whole_document() {
        let page = Selection::new(PAGE);
        assert_eq!(page.len(), 1);
        assert_eq!(page.html(), Some(PAGE));
        assert_eq!(page.elements().get(0), Some(PAGE));
    }

    #[test]
    fn test_find_and_chain() {
        let page = Selection::new(PAGE);
        let paragraphs = page.find("#main").find("p");
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs.text().as_deref(), Some("Hello world"));
        assert_eq!(paragraphs.find("b").html(), Some("<b>world</b>"));
    }

    #[test]
    fn test_find_where() {
        let page = Selection::new(PAGE);
        let lead = page.find_where("class contains word lead OR id = nope");
        assert_eq!(lead.len(), 1);
        assert_eq!(lead.text().as_deref(), Some("Hello world"));
        assert_eq!(page.find("#main").find_where("class").len(), 1);
        assert!(page.find_where("class \"lead").is_empty());
    }

    #[test]
    fn test_eq() {
        let paragraphs = Selection::new(PAGE).find("p");
        assert_eq!(paragraphs.eq(1).html(), Some("<p>Bye</p>"));
        assert_eq!(paragraphs.eq(-1).html(), Some("<p>Bye</p>"));
        assert_eq!(paragraphs.eq(-2).attr("class").as_deref(), Some("lead"));
        assert!(paragraphs.eq(2).is_empty());
        assert!(paragraphs.eq(-3).is_empty());
        assert_eq!(Selection::new(PAGE).eq(0).html(), Some(PAGE));
    }

    #[test]
    fn test_empty_chains() {
        let page = Selection::new(PAGE);
        let none = page.find("p >");
        assert!(none.is_empty());
        assert!(none.find("b").is_empty());
        assert_eq!(none.html(), None);
        assert_eq!(none.text(), None);
        assert_eq!(none.attr("id"), None);
        assert!(page.find("table").eq(0).is_empty());
    }

    #[test]
    fn test_attr() {
        let page = Selection::new("<input NAME=\"q\" disabled>");
        let input = page.find("input");
        assert_eq!(input.attr("name").as_deref(), Some("q"));
        assert_eq!(input.attr("Name").as_deref(), Some("q"));
        assert_eq!(input.attr("disabled"), None);
    }

    #[test]
    fn test_offsets_survive_requery() {
        let page = Selection::new(PAGE);
        let bold = page.find("p").find("b");
        assert_eq!(bold.elements().first().map(|(offset, _)| offset), Some(37));
    }
}
