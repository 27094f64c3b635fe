//! Raw-Text Locator
//!
//! Finds start tags carrying a literal tag name or attribute name inside a
//! [`Region`], without tokenizing the markup. Every hit is re-based to an
//! absolute document offset and stored as a bare start tag; expanding it to
//! the whole element is the caller's job.
//!
//! The search is literal: an attribute name that also occurs inside another
//! attribute's value (`<div title=" id">`) can produce a false positive when
//! it is preceded by whitespace. Callers that need exact semantics filter the
//! start tag through [`extract_attributes`].

use super::attributes::{extract_attributes, split_words};
use super::scanner::{find_ignore_ascii_case, is_inside_start_tag, is_whitespace};
use super::tags::{is_name_byte, is_valid_attribute_name, is_valid_start_tag, parse_start_tag};
use crate::element::{MatchedSet, Region};
use crate::selector::condition::Condition;
use memchr::{memchr, memrchr};

/// Decision of a locator filter for one candidate start tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Skip,
    Keep,
    /// Keep this start tag and end the scan
    KeepAndStop,
}

impl From<bool> for Accept {
    fn from(keep: bool) -> Self {
        if keep {
            Accept::Keep
        } else {
            Accept::Skip
        }
    }
}

/// Start tags named `name` within `region`
///
/// A hit `<name` must be followed by whitespace or `>` and must sit inside a
/// start tag. The scan resumes right after the literal.
pub fn find_by_tag<'a, F>(region: Region<'a>, name: &str, mut filter: F) -> MatchedSet<'a>
where
    F: FnMut(&'a str) -> Accept,
{
    let mut found = MatchedSet::new();
    if name.is_empty() || !name.bytes().all(is_name_byte) {
        return found;
    }

    let text = region.text;
    let bytes = region.bytes();
    let needle = format!("<{name}");
    let mut pos = 0;

    while let Some(hit) = find_ignore_ascii_case(bytes, needle.as_bytes(), pos) {
        pos = hit + needle.len();
        let follows = bytes.get(pos).copied();
        if !follows.is_some_and(|b| is_whitespace(b) || b == b'>') {
            continue;
        }
        if !is_inside_start_tag(bytes, hit + 1) {
            continue;
        }
        let Some(tag) = parse_start_tag(&text[hit..]) else {
            continue;
        };
        match filter(tag.text) {
            Accept::Skip => {}
            Accept::Keep => {
                found.insert(region.absolute(hit), tag.text);
            }
            Accept::KeepAndStop => {
                found.insert(region.absolute(hit), tag.text);
                break;
            }
        }
    }
    found
}

/// Start tags of known elements carrying the attribute `name`
///
/// A hit must be preceded by whitespace and sit inside a start tag; it is
/// expanded backward to the nearest `<` and forward to the nearest `>`, and
/// the result must be exactly one start tag of a known element.
pub fn find_by_attribute<'a, F>(region: Region<'a>, name: &str, mut filter: F) -> MatchedSet<'a>
where
    F: FnMut(&'a str) -> Accept,
{
    let mut found = MatchedSet::new();
    if !is_valid_attribute_name(name) {
        return found;
    }

    let text = region.text;
    let bytes = region.bytes();
    let mut pos = 0;

    while let Some(hit) = find_ignore_ascii_case(bytes, name.as_bytes(), pos) {
        pos = hit + name.len();
        if hit == 0 || !is_whitespace(bytes[hit - 1]) {
            continue;
        }
        if !is_inside_start_tag(bytes, hit) {
            continue;
        }
        let (Some(lt), Some(gt)) = (memrchr(b'<', &bytes[..hit]), memchr(b'>', &bytes[hit..])) else {
            continue;
        };
        let start_tag = &text[lt..=hit + gt];
        if !is_valid_start_tag(start_tag) || found.contains(region.absolute(lt)) {
            continue;
        }
        match filter(start_tag) {
            Accept::Skip => {}
            Accept::Keep => {
                found.insert(region.absolute(lt), start_tag);
            }
            Accept::KeepAndStop => {
                found.insert(region.absolute(lt), start_tag);
                break;
            }
        }
    }
    found
}

/// First start tag whose `id` equals `id`
pub fn find_by_id<'a>(region: Region<'a>, id: &str) -> MatchedSet<'a> {
    find_by_attribute(region, "id", |start_tag| {
        if extract_attributes(start_tag, true).value("id") == Some(id) {
            Accept::KeepAndStop
        } else {
            Accept::Skip
        }
    })
}

/// Start tags whose `class` holds every one of `classes`
pub fn find_by_class<'a>(region: Region<'a>, classes: &[&str]) -> MatchedSet<'a> {
    find_by_attribute(region, "class", |start_tag| {
        let attrs = extract_attributes(start_tag, true);
        let Some(value) = attrs.value("class") else {
            return Accept::Skip;
        };
        let present: Vec<&str> = split_words(value).collect();
        Accept::from(!classes.is_empty() && classes.iter().all(|c| present.contains(c)))
    })
}

/// Start tags satisfying `condition`
///
/// Scans for the anchor field of each OR group and keeps the start tags the
/// whole condition accepts. The always-true empty condition names no
/// attribute and finds nothing.
pub fn find_by_condition<'a>(region: Region<'a>, condition: &Condition) -> MatchedSet<'a> {
    let mut found = MatchedSet::new();
    for field in condition.anchor_fields() {
        found.union(find_by_attribute(region, field, |start_tag| {
            Accept::from(condition.evaluate(&extract_attributes(start_tag, true)))
        }));
    }
    found
}
