//! Boundary Resolver
//!
//! Finds where an element ends without building a tree. From just after the
//! start tag, the next nested `<name` is compared with the next `</name>`:
//! a nested start that comes first consumes that end tag, and the search
//! repeats past both. The first end tag with no nested start before it
//! closes the element.
//!
//! Limitation: this pairing is only correct for balanced markup in which
//! tag-like text does not appear outside tags (comments, scripts). An element
//! whose end tag is never found is treated as void: the start tag alone.

use super::span::Region;
use crate::core::scanner::{find_ignore_ascii_case, is_whitespace, rfind_ignore_ascii_case, Scanner};
use crate::core::tags::{is_void_tag, parse_start_tag};

/// An element split into its three parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementParts<'a> {
    pub start_tag: &'a str,
    pub content: &'a str,
    pub end_tag: &'a str,
}

/// A direct child found by [`children`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Child<'a> {
    /// Absolute offset of the child's `<`
    pub offset: usize,
    pub start_tag: &'a str,
    /// Start tag through matching end tag (start tag alone when void)
    pub element: &'a str,
}

/// Exclusive end offset of the element whose start tag sits at `lt`
///
/// `start_tag` must be the text of `haystack` at `lt`. Offsets are relative
/// to `haystack`.
pub fn resolve_end(haystack: &str, lt: usize, start_tag: &str) -> usize {
    let void_end = lt + start_tag.len();
    let Some(tag) = parse_start_tag(start_tag) else {
        return void_end;
    };
    if is_void_tag(tag.name) {
        return void_end;
    }

    let bytes = haystack.as_bytes();
    let open = format!("<{}", tag.name);
    let close = format!("</{}>", tag.name);
    let mut open_from = lt + open.len();
    let mut close_from = open_from;

    loop {
        let Some(close_at) = find_ignore_ascii_case(bytes, close.as_bytes(), close_from) else {
            return void_end;
        };
        match next_nested_open(bytes, open.as_bytes(), open_from) {
            Some(open_at) if open_at < close_at => {
                open_from = open_at + open.len();
                close_from = close_at + close.len();
            }
            _ => return close_at + close.len(),
        }
    }
}

/// Next `<name` that really starts a tag of that name (`<a` is not `<abbr`)
fn next_nested_open(bytes: &[u8], open: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    loop {
        let at = find_ignore_ascii_case(bytes, open, pos)?;
        match bytes.get(at + open.len()) {
            Some(&b) if is_whitespace(b) || b == b'>' || b == b'/' => return Some(at),
            _ => pos = at + 1,
        }
    }
}

/// Expand the start tag at `lt` into its whole element
pub fn expand<'a>(haystack: &'a str, lt: usize, start_tag: &str) -> &'a str {
    let end = resolve_end(haystack, lt, start_tag);
    &haystack[lt..end]
}

/// The element whose start tag begins at `offset`, if one does
pub fn element_at(doc: &str, offset: usize) -> Option<&str> {
    let tag = parse_start_tag(doc.get(offset..)?)?;
    Some(expand(doc, offset, tag.text))
}

/// Split an element into start tag, content and end tag
///
/// The end tag is the right-most `</name>` of the markup. Returns `None` when
/// the markup does not begin with a start tag or has no end tag (void).
pub fn split_element(markup: &str) -> Option<ElementParts<'_>> {
    let tag = parse_start_tag(markup)?;
    let close = format!("</{}>", tag.name);
    let at = rfind_ignore_ascii_case(markup.as_bytes(), close.as_bytes())?;
    if at < tag.len() {
        return None;
    }
    Some(ElementParts {
        start_tag: tag.text,
        content: &markup[tag.len()..at],
        end_tag: &markup[at..],
    })
}

/// Region holding the content of the element at `offset`
pub fn content_region(offset: usize, element: &str) -> Option<Region<'_>> {
    let parts = split_element(element)?;
    Some(Region::new(offset + parts.start_tag.len(), parts.content))
}

/// Direct children within `content`
///
/// A child starts at `<` followed by an ASCII letter; each child is expanded
/// with [`resolve_end`] inside `content` and the walk resumes after it, so
/// grandchildren are never reported.
pub fn children(content: Region<'_>) -> Vec<Child<'_>> {
    let text = content.text;
    let bytes = content.bytes();
    let mut scanner = Scanner::new(bytes);
    let mut found = Vec::new();

    while let Some(lt) = scanner.find_tag_start() {
        if !bytes.get(lt + 1).is_some_and(u8::is_ascii_alphabetic) {
            scanner.set_position(lt + 1);
            continue;
        }
        let Some(tag) = parse_start_tag(&text[lt..]) else {
            break;
        };
        let end = resolve_end(text, lt, tag.text);
        found.push(Child {
            offset: content.absolute(lt),
            start_tag: tag.text,
            element: &text[lt..end],
        });
        scanner.set_position(end);
    }
    found
}
