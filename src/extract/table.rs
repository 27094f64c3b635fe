//! Table extraction
//!
//! Every `table` inside the current elements is extracted on its own.
//! Nested tables are promoted to separate entries and cut out of the table
//! that contains them.

use super::tree::{extract, Extracted};
use crate::core::locator::{find_by_tag, Accept};
use crate::document::Selection;
use crate::element::boundary::expand;
use crate::element::{MatchedSet, Region};
use crate::selector::{query_str, Context};
use std::borrow::Cow;

/// One extracted table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Document offset of the `<table`
    pub offset: usize,
    pub extracted: Extracted<'static>,
}

/// Tables of the selection in document order, as trees or as values
pub fn extract_tables(selection: &Selection<'_>, value_only: bool) -> Vec<Table> {
    let mut tables = MatchedSet::new();
    for (offset, element) in selection.elements().iter() {
        let found = find_by_tag(Region::new(offset, element), "table", |_| Accept::Keep);
        for (at, start_tag) in found {
            tables.insert(at, expand(element, at - offset, start_tag));
        }
    }

    tables
        .iter()
        .map(|(offset, markup)| {
            let own = without_nested_tables(markup);
            Table {
                offset,
                extracted: extract(&own, value_only).into_owned(),
            }
        })
        .collect()
}

/// The table markup with every nested table removed
fn without_nested_tables(table: &str) -> Cow<'_, str> {
    let nested = query_str(table, &Context::Document, "table table");
    if nested.is_empty() {
        return Cow::Borrowed(table);
    }

    let mut out = String::with_capacity(table.len());
    let mut pos = 0;
    for (offset, markup) in nested.iter() {
        // inside a range already removed
        if offset < pos {
            continue;
        }
        out.push_str(&table[pos..offset]);
        pos = offset + markup.len();
    }
    out.push_str(&table[pos..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tree::{Node, TextValue};

    const PAGE: &str = "Some text.\n<table class=\"common\">\n  <tr><td>Messages</td></tr>\n  <tr><td>Todo</td></tr>\n  <tr><td><table><tr><td>inner</td></tr></table></td></tr>\n</table>\n<p>after</p>";

    fn values(list: &[&str]) -> TextValue<'static> {
        TextValue::List(list.iter().map(|s| TextValue::Text(Cow::Owned(s.to_string()))).collect())
    }

    #[test]
    fn test_nested_promoted_and_removed() {
        let tables = extract_tables(&Selection::new(PAGE), true);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].offset, 11);
        assert_eq!(tables[0].extracted, Extracted::Values(values(&["Messages", "Todo", ""])));
        assert_eq!(
            tables[1].extracted,
            Extracted::Values(TextValue::Text(Cow::Owned("inner".to_string())))
        );
    }

    #[test]
    fn test_tree_form() {
        let tables = extract_tables(&Selection::new("<table><tr><td>x</td></tr></table>"), false);
        let Extracted::Tree(Node::Element { tag, children, .. }) = &tables[0].extracted else {
            panic!("expected a tree");
        };
        assert_eq!(tag, "table");
        assert_eq!(children[0].tag(), Some("tr"));
    }

    #[test]
    fn test_scoped_to_selection() {
        let page = Selection::new(PAGE);
        assert!(extract_tables(&page.find("p"), false).is_empty());
        let inner = extract_tables(&page.find("td table"), true);
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].offset, PAGE.find("<table>").unwrap_or_default());
    }

    #[test]
    fn test_without_nested_tables() {
        let table = "<table><tr><td><table><tr><td><table></table></td></tr></table></td></tr></table>";
        assert_eq!(without_nested_tables(table), "<table><tr><td></td></tr></table>");
        assert!(matches!(without_nested_tables("<table></table>"), Cow::Borrowed(_)));
    }
}
