//! Matching Engine
//!
//! Runs a [`CompiledSelector`] against a context: either the whole document
//! (Raw scope, the first step searches every byte) or a previous selection
//! (Descendant scope, each step searches inside the content of every current
//! element). Steps of one alternative are applied in order, each step's hits
//! becoming the next step's context; alternatives run independently against
//! the original context and are unioned by offset, first claim winning.
//!
//! All state lives in the call. Queries never share a scan mode, so they are
//! safe to run concurrently on any number of documents.

use super::compiler::{compile_cached, Alternative, Combinator, CompiledSelector, Step};
use super::condition::{Atom, Condition, Operator};
use crate::core::attributes::{extract_attributes, split_words};
use crate::core::locator::{find_by_class, find_by_condition, find_by_id, find_by_tag, Accept};
use crate::element::boundary::{children, content_region, expand};
use crate::element::{MatchedSet, Region};
use log::trace;

/// Where the first step of an alternative searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The whole document
    Raw,
    /// Inside the content of each current element
    Descendant,
}

/// What a query runs against
#[derive(Debug, Clone, Copy)]
pub enum Context<'s, 'a> {
    Document,
    Matches(&'s MatchedSet<'a>),
}

impl Context<'_, '_> {
    pub fn scope(&self) -> Scope {
        match self {
            Context::Document => Scope::Raw,
            Context::Matches(_) => Scope::Descendant,
        }
    }
}

/// Search strategy for one step
enum Plan<'s> {
    Tag(&'s str),
    Id(&'s str),
    Class(Vec<&'s str>),
    Attribute(Condition),
    FilteredTag { tag: &'s str, condition: Condition },
}

impl<'s> Plan<'s> {
    fn for_step(step: &'s Step) -> Option<Plan<'s>> {
        let condition = || {
            Condition::all(
                step.predicates
                    .iter()
                    .map(|p| Atom::new(p.name.as_str(), p.operator, p.value.as_str()))
                    .collect(),
            )
        };

        if let Some(tag) = step.tag.as_deref() {
            if step.predicates.is_empty() {
                return Some(Plan::Tag(tag));
            }
            return Some(Plan::FilteredTag {
                tag,
                condition: condition(),
            });
        }

        match step.predicates.as_slice() {
            [] => None,
            [only] if only.name == "id" && only.operator == Operator::Equals => {
                Some(Plan::Id(&only.value))
            }
            // CSS semantics: `[class=a]` stays an exact match and `[class~="a b"]`
            // means any word, so only all-words predicates take the class search
            [only] if only.name == "class" && is_class_shortcut(only.operator, &only.value) => {
                Some(Plan::Class(split_words(&only.value).collect()))
            }
            _ => Some(Plan::Attribute(condition())),
        }
    }

    /// Bare start tags matching this plan within `region`
    fn search<'a>(&self, region: Region<'a>) -> MatchedSet<'a> {
        match self {
            Plan::Tag(tag) => find_by_tag(region, tag, |_| Accept::Keep),
            Plan::Id(id) => find_by_id(region, id),
            Plan::Class(classes) => find_by_class(region, classes),
            Plan::Attribute(condition) => find_by_condition(region, condition),
            Plan::FilteredTag { tag, condition } => find_by_tag(region, tag, |start_tag| {
                Accept::from(condition.evaluate(&extract_attributes(start_tag, true)))
            }),
        }
    }
}

/// `.a.b` (all words) or a single-word `~=`; several words under `~=` mean
/// "any", which the class search does not do
fn is_class_shortcut(operator: Operator, value: &str) -> bool {
    match operator {
        Operator::ContainsAllWords => true,
        Operator::ContainsAnyWord => split_words(value).count() == 1,
        _ => false,
    }
}

/// Elements matched by `step` under each parent region
fn match_step<'a>(parents: &[Region<'a>], step: &Step) -> MatchedSet<'a> {
    let mut found = MatchedSet::new();
    let Some(plan) = Plan::for_step(step) else {
        return found;
    };

    for &region in parents {
        match step.combinator {
            Combinator::Descendant => {
                for (offset, start_tag) in plan.search(region) {
                    let element = expand(region.text, offset - region.base, start_tag);
                    found.insert(offset, element);
                }
            }
            Combinator::Child => {
                for child in children(region) {
                    let head = Region::new(child.offset, child.start_tag);
                    if plan.search(head).contains(child.offset) {
                        found.insert(child.offset, child.element);
                    }
                }
            }
        }
    }
    found
}

fn content_regions<'a>(set: &MatchedSet<'a>) -> Vec<Region<'a>> {
    set.iter()
        .filter_map(|(offset, markup)| content_region(offset, markup))
        .collect()
}

fn parent_regions<'a>(doc: &'a str, context: &Context<'_, 'a>) -> Vec<Region<'a>> {
    match context {
        Context::Document => vec![Region::whole(doc)],
        Context::Matches(set) => content_regions(set),
    }
}

fn match_alternative<'a>(doc: &'a str, context: &Context<'_, 'a>, alternative: &Alternative) -> MatchedSet<'a> {
    let mut current: Option<MatchedSet<'a>> = match context {
        Context::Document => None,
        Context::Matches(set) => Some((*set).clone()),
    };

    for (index, step) in alternative.steps.iter().enumerate() {
        let parents: Vec<Region<'a>> = match &current {
            None => vec![Region::whole(doc)],
            Some(set) => content_regions(set),
        };
        let hits = match_step(&parents, step);
        trace!(
            target: "rawquery::engine",
            "step {index} over {} region(s): {} hit(s)",
            parents.len(),
            hits.len()
        );
        if hits.is_empty() {
            return hits;
        }
        current = Some(hits);
    }
    current.unwrap_or_default()
}

/// Run a compiled selector
pub fn query<'a>(doc: &'a str, context: &Context<'_, 'a>, selector: &CompiledSelector) -> MatchedSet<'a> {
    let mut result = MatchedSet::new();
    for alternative in &selector.alternatives {
        result.union(match_alternative(doc, context, alternative));
    }
    trace!(
        target: "rawquery::engine",
        "{:?} in {:?} scope: {} match(es)",
        selector.source(),
        context.scope(),
        result.len()
    );
    result
}

/// Elements satisfying an attribute condition, searched in every parent of
/// `context` the way a single descendant step is
pub fn query_condition<'a>(doc: &'a str, context: &Context<'_, 'a>, condition: &Condition) -> MatchedSet<'a> {
    let parents = parent_regions(doc, context);
    let mut found = MatchedSet::new();
    for region in parents {
        for (offset, start_tag) in find_by_condition(region, condition) {
            found.insert(offset, expand(region.text, offset - region.base, start_tag));
        }
    }
    trace!(
        target: "rawquery::engine",
        "condition in {:?} scope: {} match(es)",
        context.scope(),
        found.len()
    );
    found
}

/// Compile (cached) and run a selector; an invalid selector matches nothing
pub fn query_str<'a>(doc: &'a str, context: &Context<'_, 'a>, selector: &str) -> MatchedSet<'a> {
    match compile_cached(selector) {
        Ok(compiled) => query(doc, context, &compiled),
        Err(_) => MatchedSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tags::tag_name;

    fn find<'a>(doc: &'a str, selector: &str) -> Vec<(usize, &'a str)> {
        query_str(doc, &Context::Document, selector).iter().collect()
    }

    #[test]
    fn test_end_to_end_id() {
        let doc = "<ul class=\"nav\"><li id=\"x\">A</li><li>B</li></ul>";
        assert_eq!(find(doc, "li#x"), vec![(16, "<li id=\"x\">A</li>")]);
        assert_eq!(find(doc, "#x"), vec![(16, "<li id=\"x\">A</li>")]);
        assert!(find(doc, "p#x").is_empty());
    }

    #[test]
    fn test_child_excludes_grandchildren() {
        let doc = "<ul><li><span>a</span></li></ul>";
        assert_eq!(find(doc, "ul > li"), vec![(4, "<li><span>a</span></li>")]);
        assert!(find(doc, "ul > span").is_empty());
        assert_eq!(find(doc, "ul span"), vec![(8, "<span>a</span>")]);
        assert_eq!(find(doc, "ul > li > span"), vec![(8, "<span>a</span>")]);
    }

    #[test]
    fn test_child_with_predicates() {
        let doc = "<div><p class=\"x\">1</p><section><p class=\"x\">2</p></section><p>3</p></div>";
        assert_eq!(find(doc, "div > .x"), vec![(5, "<p class=\"x\">1</p>")]);
        assert_eq!(find(doc, "div>p"), vec![(5, "<p class=\"x\">1</p>"), (60, "<p>3</p>")]);
    }

    #[test]
    fn test_class_all_words() {
        let doc = "<div class=\"a b c\">1</div><div class=\"a\">2</div>";
        assert_eq!(find(doc, ".a.b"), vec![(0, "<div class=\"a b c\">1</div>")]);
        assert_eq!(find(doc, ".a").len(), 2);
    }

    #[test]
    fn test_contains_word() {
        let doc = "<div data-x=\"foo bar\">1</div>";
        assert_eq!(find(doc, "[data-x~=bar]").len(), 1);
        assert!(find(doc, "[data-x~=ba]").is_empty());
        assert_eq!(find(doc, "[data-x~=\"ba bar\"]").len(), 1);
    }

    #[test]
    fn test_comma_union() {
        let doc = "<p>1</p><b>2</b><p>3</p>";
        let both = find(doc, "p, b");
        let offsets: Vec<usize> = both.iter().map(|(o, _)| *o).collect();
        assert_eq!(offsets, vec![0, 8, 16]);
        assert_eq!(find(doc, "p, p").len(), 2);
    }

    #[test]
    fn test_invalid_selector_is_empty() {
        let doc = "<div>x</div>";
        assert!(find(doc, "div]").is_empty());
        assert!(find(doc, "div:first").is_empty());
    }

    #[test]
    fn test_tag_hits_report_their_name() {
        let doc = "<TABLE><tr><td>1</td></tr></TABLE><table></table>";
        let hits = find(doc, "table");
        assert_eq!(hits.len(), 2);
        for (_, markup) in hits {
            assert_eq!(tag_name(markup).as_deref(), Some("table"));
        }
    }

    #[test]
    fn test_nested_same_tag_descendants() {
        let doc = "<div id=\"o\"><div>a</div><div><div>b</div></div></div>";
        let inner = find(doc, "#o div");
        let offsets: Vec<usize> = inner.iter().map(|(o, _)| *o).collect();
        assert_eq!(offsets, vec![12, 24, 29]);
        assert_eq!(inner[1].1, "<div><div>b</div></div>");
    }

    #[test]
    fn test_tag_with_conditions() {
        let doc = "<form><input type=\"text\" name=\"q\"><input type=\"submit\" disabled></form>";
        assert_eq!(find(doc, "input[type=text]"), vec![(6, "<input type=\"text\" name=\"q\">")]);
        assert_eq!(find(doc, "[disabled]").len(), 1);
        assert_eq!(find(doc, "input[name][type^=T]").len(), 1);
        assert!(find(doc, "form[disabled]").is_empty());
    }

    #[test]
    fn test_requery_within_matches() {
        let doc = "<p><b>1</b></p><div><b>2</b></div><b>3</b>";
        let divs = query_str(doc, &Context::Document, "div");
        let inside = query_str(doc, &Context::Matches(&divs), "b");
        assert_eq!(inside.iter().collect::<Vec<_>>(), vec![(20, "<b>2</b>")]);
        // the current elements themselves are not candidates
        assert!(query_str(doc, &Context::Matches(&divs), "div").is_empty());
    }

    #[test]
    fn test_alternatives_restart_from_context() {
        let doc = "<ul><li>1</li></ul><ol><li>2</li></ol>";
        let hits = find(doc, "ul li, ol");
        let offsets: Vec<usize> = hits.iter().map(|(o, _)| *o).collect();
        assert_eq!(offsets, vec![4, 19]);
    }

    #[test]
    fn test_void_elements_have_no_descendants() {
        let doc = "<p><img src=\"a\"><br></p>";
        assert_eq!(find(doc, "p img"), vec![(3, "<img src=\"a\">")]);
        assert!(find(doc, "img br").is_empty());
    }

    #[test]
    fn test_unclosed_element_degrades_to_start_tag() {
        let doc = "<div><p>one</div>";
        assert_eq!(find(doc, "div p"), vec![(5, "<p>")]);
    }

    #[test]
    fn test_alternatives_restart_from_matches() {
        let doc = "<div><p>1</p><b>2</b></div><p>3</p><b>4</b>";
        let divs = query_str(doc, &Context::Document, "div");
        let hits = query_str(doc, &Context::Matches(&divs), "p, b");
        assert_eq!(hits.iter().collect::<Vec<_>>(), vec![(5, "<p>1</p>"), (13, "<b>2</b>")]);
    }

    #[test]
    fn test_class_predicates_keep_css_semantics() {
        let doc = "<div class=\"a b\">1</div><div class=\"b c\">2</div>";
        // exact value, not a word match
        assert!(find(doc, "[class=a]").is_empty());
        assert_eq!(find(doc, "[class=\"a b\"]").len(), 1);
        // any of the words
        assert_eq!(find(doc, "[class~=\"a c\"]").len(), 2);
    }

    #[test]
    fn test_query_condition() {
        let doc = "<ul><li data-k=\"x\">1</li><li title=\"a y\">2</li></ul><p data-k=\"x\">3</p>";
        let cond = Condition::parse("data-k = x OR title contains word y").unwrap();
        let all = query_condition(doc, &Context::Document, &cond);
        assert_eq!(all.offsets().collect::<Vec<_>>(), vec![4, 25, 52]);
        assert_eq!(all.get(25), Some("<li title=\"a y\">2</li>"));

        let lists = query_str(doc, &Context::Document, "ul");
        let inside = query_condition(doc, &Context::Matches(&lists), &cond);
        assert_eq!(inside.offsets().collect::<Vec<_>>(), vec![4, 25]);
    }
}
