//! Attribute Extraction
//!
//! Tokenizes the attribute list of a start tag into an ordered map. Values are
//! borrowed from the markup; names are lowercased (borrowed when already
//! lowercase). Entities are not decoded.

use super::scanner::is_whitespace;
use super::tags::{is_valid_attribute_name, parse_start_tag};
use std::borrow::Cow;

/// Ordered attribute map: lowercase name -> value, or no value at all
///
/// A name written without `=` (`<input disabled>`) is present with no value,
/// which is distinct from an empty value (`disabled=""`). The first occurrence
/// of a duplicated name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap<'a> {
    entries: Vec<(Cow<'a, str>, Option<Cow<'a, str>>)>,
}

impl<'a> AttributeMap<'a> {
    pub fn new() -> Self {
        AttributeMap { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert unless the name is already present
    ///
    /// Returns `false` when an earlier occurrence kept its place.
    pub fn insert(&mut self, name: Cow<'a, str>, value: Option<Cow<'a, str>>) -> bool {
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, value));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Look up an attribute
    ///
    /// Outer `None`: the attribute is absent. Inner `None`: present without a
    /// value.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref())
    }

    /// Attribute value, `None` when absent or written without a value
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).flatten()
    }

    /// Consume the map, keeping one value with the markup's lifetime
    pub fn into_value(self, name: &str) -> Option<Cow<'a, str>> {
        self.entries
            .into_iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(n, v)| (n.as_ref(), v.as_deref()))
    }

    /// Keep only the entries whose name passes `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(n, _)| keep(n));
    }

    /// Detach from the source markup
    pub fn into_owned(self) -> AttributeMap<'static> {
        AttributeMap {
            entries: self
                .entries
                .into_iter()
                .map(|(n, v)| (Cow::Owned(n.into_owned()), v.map(|v| Cow::Owned(v.into_owned()))))
                .collect(),
        }
    }
}

#[derive(Clone, Copy)]
enum State {
    /// Reading a name; whitespace without `=` ends it with no value
    Name,
    /// Seen `=`, skipping whitespace until the value starts
    CheckQuote,
    /// Reading a value; `quote` is `None` for unquoted tokens
    Value { quote: Option<u8>, start: usize },
}

/// Extract the attributes of the start tag that begins `markup`
///
/// `markup` may be a bare start tag or a whole element. Text that does not
/// begin with a start tag yields an empty map. With `validate`, names holding
/// quotes, `>`, `/`, `=` or whitespace are dropped.
pub fn extract_attributes(markup: &str, validate: bool) -> AttributeMap<'_> {
    let Some(tag) = parse_start_tag(markup) else {
        return AttributeMap::new();
    };

    let text = tag.attribute_text().trim_end();
    // `<br />`: the self-closing slash is not an attribute
    let text = text.strip_suffix('/').unwrap_or(text).trim_end();

    let mut attrs = parse_attribute_list(text);
    if validate {
        attrs.retain(is_valid_attribute_name);
    }
    attrs
}

fn parse_attribute_list(text: &str) -> AttributeMap<'_> {
    let bytes = text.as_bytes();
    let mut attrs = AttributeMap::new();
    let mut name: Option<(usize, usize)> = None;
    let mut state = State::Name;

    for (i, &b) in bytes.iter().enumerate() {
        match state {
            State::Name => {
                if b == b'=' {
                    state = State::CheckQuote;
                } else if is_whitespace(b) {
                    register(&mut attrs, text, name.take(), None);
                } else {
                    name = Some(match name {
                        Some((start, _)) => (start, i + 1),
                        None => (i, i + 1),
                    });
                }
            }
            State::CheckQuote => {
                if b == b'"' || b == b'\'' {
                    state = State::Value { quote: Some(b), start: i + 1 };
                } else if !is_whitespace(b) {
                    state = State::Value { quote: None, start: i };
                }
            }
            State::Value { quote, start } => {
                let closes = match quote {
                    Some(q) => b == q,
                    None => is_whitespace(b),
                };
                if closes {
                    register(&mut attrs, text, name.take(), Some(&text[start..i]));
                    state = State::Name;
                }
            }
        }
    }

    match state {
        State::Name => register(&mut attrs, text, name, None),
        State::CheckQuote => register(&mut attrs, text, name, Some("")),
        State::Value { start, .. } => register(&mut attrs, text, name, Some(&text[start..])),
    }
    attrs
}

/// Whitespace-separated words of an attribute value (`class`, `rel`, ...)
pub fn split_words(value: &str) -> impl Iterator<Item = &str> {
    value.split(|c: char| c.is_ascii() && is_whitespace(c as u8)).filter(|w| !w.is_empty())
}

fn register<'a>(
    attrs: &mut AttributeMap<'a>,
    text: &'a str,
    name: Option<(usize, usize)>,
    value: Option<&'a str>,
) {
    if let Some((start, end)) = name {
        attrs.insert(lowercase_name(&text[start..end]), value.map(Cow::Borrowed));
    }
}

fn lowercase_name(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_attributes() {
        let attrs = extract_attributes("<div id=\"test\" class='foo bar'>", false);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.value("id"), Some("test"));
        assert_eq!(attrs.value("class"), Some("foo bar"));
    }

    #[test]
    fn test_unquoted_and_bare() {
        let attrs = extract_attributes("<input type=text disabled name=q>", false);
        assert_eq!(attrs.get("type"), Some(Some("text")));
        assert_eq!(attrs.get("disabled"), Some(None));
        assert_eq!(attrs.get("name"), Some(Some("q")));
        assert_eq!(attrs.get("value"), None);
    }

    #[test]
    fn test_trailing_bare_name() {
        let attrs = extract_attributes("<input type=\"checkbox\" checked>", false);
        assert_eq!(attrs.get("checked"), Some(None));
    }

    #[test]
    fn test_empty_value_is_not_absent() {
        let attrs = extract_attributes("<option value=\"\" selected>", false);
        assert_eq!(attrs.get("value"), Some(Some("")));
        assert_eq!(attrs.get("selected"), Some(None));
    }

    #[test]
    fn test_names_lowercased_first_wins() {
        let attrs = extract_attributes("<a HREF=\"/one\" href=\"/two\">", false);
        assert_eq!(attrs.len(), 1);
        let (name, value) = attrs.iter().next().unwrap();
        assert_eq!(name, "href");
        assert_eq!(value, Some("/one"));
    }

    #[test]
    fn test_quote_inside_other_quote() {
        let attrs = extract_attributes("<a title=\"it's\" alt='say \"hi\"'>", false);
        assert_eq!(attrs.value("title"), Some("it's"));
        assert_eq!(attrs.value("alt"), Some("say \"hi\""));
    }

    #[test]
    fn test_self_closing() {
        let attrs = extract_attributes("<img src=\"a.png\" />", false);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.value("src"), Some("a.png"));
    }

    #[test]
    fn test_validation_drops_bad_names() {
        let raw = extract_attributes("<div a\"b=1 ok=2>", false);
        assert!(raw.contains("a\"b"));
        let checked = extract_attributes("<div a\"b=1 ok=2>", true);
        assert_eq!(checked.len(), 1);
        assert_eq!(checked.value("ok"), Some("2"));
    }

    #[test]
    fn test_not_a_start_tag() {
        assert!(extract_attributes("text <div id=x>", false).is_empty());
        assert!(extract_attributes("<div>", false).is_empty());
    }

    #[test]
    fn test_split_words() {
        let words: Vec<&str> = split_words("  nav\tmain\n item ").collect();
        assert_eq!(words, vec!["nav", "main", "item"]);
        assert_eq!(split_words("   ").count(), 0);
    }

    #[test]
    fn test_into_owned() {
        let owned = {
            let markup = String::from("<p Lang=en>");
            extract_attributes(&markup, false).into_owned()
        };
        assert_eq!(owned.value("lang"), Some("en"));
    }
}
