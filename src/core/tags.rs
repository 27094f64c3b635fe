//! Start-tag grammar and tag tables
//!
//! A start tag is `<` followed by a name of `[A-Za-z0-9_]+`, then anything up
//! to the first `>`. Names compare case-insensitively and are reported in
//! lowercase. The tag tables are soft validity checks, not a parser.

use memchr::memchr;

/// Elements that never have content or an end tag
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Tag names accepted by the attribute search
const KNOWN_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio",
    "b", "base", "bdi", "bdo", "blockquote", "body", "br", "button",
    "canvas", "caption", "cite", "code", "col", "colgroup", "command",
    "datalist", "dd", "del", "details", "dfn", "div", "dl", "dt",
    "em", "embed",
    "fieldset", "figcaption", "figure", "footer", "form", "frameset", "frame",
    "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html",
    "i", "iframe", "img", "input", "ins",
    "kbd", "keygen",
    "label", "legend", "li", "link",
    "map", "mark", "menu", "meta", "meter",
    "nav", "noscript",
    "object", "ol", "optgroup", "option", "output",
    "p", "param", "pre", "progress",
    "q",
    "rp", "rt", "ruby",
    "s", "samp", "script", "section", "select", "small", "source", "span", "strong", "style",
    "sub", "summary", "sup",
    "table", "tbody", "td", "textarea", "tfoot", "th", "thead", "time", "title", "tr", "track",
    "u", "ul",
    "var", "video",
    "wbr",
];

/// Attribute names may not contain these bytes (or whitespace)
const FORBIDDEN_NAME_BYTES: &[u8] = b"\"'>/=";

/// A start tag found at the beginning of some markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTag<'a> {
    /// Tag name as written (original case)
    pub name: &'a str,
    /// Whole start tag, `<` through `>`
    pub text: &'a str,
}

impl<'a> StartTag<'a> {
    /// Byte length of the start tag
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Start tags are never empty; present for API symmetry with `len`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Raw attribute list between the name and the closing `>`
    pub fn attribute_text(&self) -> &'a str {
        let after_name = 1 + self.name.len();
        &self.text[after_name..self.text.len() - 1]
    }
}

/// Check if byte may appear in a tag name
#[inline]
pub fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Match the start-tag grammar at offset 0 of `markup`
pub fn parse_start_tag(markup: &str) -> Option<StartTag<'_>> {
    let bytes = markup.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }
    let name_end = 1 + bytes[1..].iter().take_while(|&&b| is_name_byte(b)).count();
    if name_end == 1 {
        return None;
    }
    let gt = name_end + memchr(b'>', &bytes[name_end..])?;
    Some(StartTag {
        name: &markup[1..name_end],
        text: &markup[..=gt],
    })
}

/// Lowercase tag name of a start tag (or of an element beginning with one)
pub fn tag_name(start_tag: &str) -> Option<String> {
    parse_start_tag(start_tag).map(|tag| tag.name.to_ascii_lowercase())
}

/// Check if the tag name belongs to a void element
pub fn is_void_tag(name: &str) -> bool {
    VOID_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(name))
}

/// Check if the tag name is in the known-tag table
pub fn is_known_tag(name: &str) -> bool {
    KNOWN_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(name))
}

/// The text is exactly one start tag of a known element
pub fn is_valid_start_tag(text: &str) -> bool {
    match parse_start_tag(text) {
        Some(tag) => tag.len() == text.len() && is_known_tag(tag.name),
        None => false,
    }
}

/// Attribute names may not contain quotes, `>`, `/`, `=` or whitespace
pub fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .bytes()
            .any(|b| FORBIDDEN_NAME_BYTES.contains(&b) || super::scanner::is_whitespace(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_tag() {
        let tag = parse_start_tag("<DIV class=\"a\">text</DIV>").unwrap();
        assert_eq!(tag.name, "DIV");
        assert_eq!(tag.text, "<DIV class=\"a\">");
        assert_eq!(tag.attribute_text(), " class=\"a\"");
    }

    #[test]
    fn test_parse_start_tag_rejects() {
        assert!(parse_start_tag("text<div>").is_none());
        assert!(parse_start_tag("</div>").is_none());
        assert!(parse_start_tag("<div").is_none());
        assert!(parse_start_tag("< div>").is_none());
    }

    #[test]
    fn test_tag_name_lowercase() {
        assert_eq!(tag_name("<LI id=x>"), Some("li".to_string()));
        assert_eq!(tag_name("<h1>"), Some("h1".to_string()));
        assert_eq!(tag_name("plain"), None);
    }

    #[test]
    fn test_tables() {
        assert!(is_void_tag("br"));
        assert!(is_void_tag("IMG"));
        assert!(!is_void_tag("div"));
        assert!(is_known_tag("Table"));
        assert!(!is_known_tag("widget"));
    }

    #[test]
    fn test_valid_start_tag() {
        assert!(is_valid_start_tag("<a href=\"x\">"));
        assert!(!is_valid_start_tag("<a href=\"x\">text"));
        assert!(!is_valid_start_tag("<widget>"));
    }

    #[test]
    fn test_valid_attribute_name() {
        assert!(is_valid_attribute_name("data-id"));
        assert!(!is_valid_attribute_name("a=b"));
        assert!(!is_valid_attribute_name("a b"));
        assert!(!is_valid_attribute_name("/"));
        assert!(!is_valid_attribute_name(""));
    }
}
