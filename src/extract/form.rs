//! Form field extraction
//!
//! Collects `name -> value` pairs from form controls. Names written as
//! bracket paths (`user[address][]`) become nested maps; an empty segment
//! appends at the next numeric key. When two fields share a name their values
//! merge recursively, so a radio group keeps every option.

use crate::core::attributes::extract_attributes;
use crate::core::tags::tag_name;
use crate::document::Selection;
use crate::element::split_element;

/// Controls read when no selector is given
pub const FORM_CONTROLS: &str = "input, textarea, select, button";

/// A field value or a nested map of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// `None` for controls without a value
    Value(Option<String>),
    /// Ordered entries; numeric keys are decimal strings
    Map(Vec<(String, FormValue)>),
}

impl FormValue {
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        match self {
            FormValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            FormValue::Value(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::Value(value) => value.as_deref(),
            FormValue::Map(_) => None,
        }
    }

    fn into_entries(self) -> Vec<(String, FormValue)> {
        match self {
            FormValue::Map(entries) => entries,
            FormValue::Value(None) => Vec::new(),
            value => vec![("0".to_string(), value)],
        }
    }
}

/// Form fields of the current elements, in document order
///
/// `selector` replaces [`FORM_CONTROLS`]. Elements without a `name` are
/// skipped.
pub fn extract_form(selection: &Selection<'_>, selector: Option<&str>) -> Vec<(String, FormValue)> {
    let controls = selection.find(selector.unwrap_or(FORM_CONTROLS));
    let mut fields = Vec::new();

    for (_, element) in controls.elements().iter() {
        let attrs = extract_attributes(element, false);
        let Some(name) = attrs.value("name") else {
            continue;
        };
        let value = match tag_name(element).as_deref() {
            Some("select") => select_value(element),
            Some("textarea") => FormValue::Value(split_element(element).map(|parts| parts.content.to_string())),
            _ => FormValue::Value(attrs.value("value").map(str::to_string)),
        };
        let field = nest(name, value);
        merge_recursive(&mut fields, field);
    }
    fields
}

/// Form fields to submit with `trigger`: every field except the submit
/// buttons other than the one named `trigger`
pub fn prepare_post_form(selection: &Selection<'_>, trigger: &str) -> Vec<(String, FormValue)> {
    let mut submits = extract_form(selection, Some("[type=submit]"));
    submits.retain(|(name, _)| name != trigger);
    let mut fields = extract_form(selection, None);
    fields.retain(|entry| !submits.contains(entry));
    fields
}

/// `value` of each `option`; `None` when no option carries one
fn select_value(select: &str) -> FormValue {
    let options = Selection::new(select).find("option");
    let values: Vec<(String, FormValue)> = options
        .elements()
        .iter()
        .filter_map(|(_, option)| {
            let attrs = extract_attributes(option, false);
            attrs.get("value").map(|value| FormValue::Value(Some(value.unwrap_or("").to_string())))
        })
        .enumerate()
        .map(|(i, value)| (i.to_string(), value))
        .collect();
    if values.is_empty() {
        FormValue::Value(None)
    } else {
        FormValue::Map(values)
    }
}

/// Split `a[b][]` into `["a", "b", ""]`
fn path_segments(name: &str) -> Vec<&str> {
    name.trim_end_matches(']')
        .split('[')
        .map(|segment| segment.strip_suffix(']').unwrap_or(segment))
        .collect()
}

/// Build the single-field entry list for `name = value`
fn nest(name: &str, value: FormValue) -> Vec<(String, FormValue)> {
    let segments = path_segments(name);
    let mut value = value;
    for (depth, segment) in segments.iter().enumerate().rev() {
        // fresh path: an empty segment is index 0
        let key = if segment.is_empty() { "0".to_string() } else { segment.to_string() };
        if depth == 0 {
            return vec![(key, value)];
        }
        value = FormValue::Map(vec![(key, value)]);
    }
    Vec::new()
}

fn is_index(key: &str) -> bool {
    key == "0" || (!key.is_empty() && !key.starts_with('0') && key.bytes().all(|b| b.is_ascii_digit()))
}

fn next_index(entries: &[(String, FormValue)]) -> usize {
    entries
        .iter()
        .filter_map(|(k, _)| if is_index(k) { k.parse::<usize>().ok() } else { None })
        .max()
        .map_or(0, |max| max + 1)
}

/// Merge `other` into `target`: numeric keys append, named keys present on
/// both sides merge, scalars turning into lists
fn merge_recursive(target: &mut Vec<(String, FormValue)>, other: Vec<(String, FormValue)>) {
    for (key, value) in other {
        if is_index(&key) {
            let index = next_index(target);
            target.push((index.to_string(), value));
            continue;
        }
        match target.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                let mut merged = std::mem::replace(existing, FormValue::Value(None)).into_entries();
                merge_recursive(&mut merged, value.into_entries());
                *existing = FormValue::Map(merged);
            }
            None => target.push((key, value)),
        }
    }
}
