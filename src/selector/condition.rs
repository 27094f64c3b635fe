//! Condition Evaluator
//!
//! A small boolean language over an [`AttributeMap`]:
//!
//! ```text
//! type = "text" AND name starts with q OR class contains word search
//! ```
//!
//! Atoms are `<field> <operator> <value>`; ` AND ` binds tighter than ` OR `.
//! Every operator has a symbolic form and one or more worded aliases. Values
//! may be quoted with `'` or `"` (quotes removed, backslash escapes undone).
//! A field written alone tests that the attribute exists.

use crate::core::attributes::{split_words, AttributeMap};
use crate::core::scanner::find_ignore_ascii_case;
use std::fmt;
use thiserror::Error;

/// Comparison operator of a condition atom or bracket predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    /// `|=`: equal, or followed by `-` and a word character
    Prefix,
    /// `~=`: any word of the value is a word of the attribute
    ContainsAnyWord,
    /// `~~=`: every word of the value is a word of the attribute
    ContainsAllWords,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    /// Bare field: the attribute is present
    Exists,
}

/// Alias table. Lookup picks the longest alias that matches.
const ALIASES: &[(&str, Operator)] = &[
    ("=", Operator::Equals),
    ("equals", Operator::Equals),
    ("is", Operator::Equals),
    ("!=", Operator::NotEquals),
    ("is not", Operator::NotEquals),
    ("<", Operator::Less),
    ("is less than", Operator::Less),
    (">", Operator::Greater),
    ("is greater than", Operator::Greater),
    ("<=", Operator::LessOrEqual),
    ("is less than or equals", Operator::LessOrEqual),
    (">=", Operator::GreaterOrEqual),
    ("is greater than or equals", Operator::GreaterOrEqual),
    ("|=", Operator::Prefix),
    ("contains prefix", Operator::Prefix),
    ("~=", Operator::ContainsAnyWord),
    ("contains word", Operator::ContainsAnyWord),
    ("contains any word", Operator::ContainsAnyWord),
    ("~~=", Operator::ContainsAllWords),
    ("contains all word", Operator::ContainsAllWords),
    ("contains all words", Operator::ContainsAllWords),
    ("!*=", Operator::NotContains),
    ("does not contain", Operator::NotContains),
    ("*=", Operator::Contains),
    ("contains", Operator::Contains),
    ("!^=", Operator::NotStartsWith),
    ("does not start with", Operator::NotStartsWith),
    ("^=", Operator::StartsWith),
    ("starts with", Operator::StartsWith),
    ("!$=", Operator::NotEndsWith),
    ("does not end with", Operator::NotEndsWith),
    ("$=", Operator::EndsWith),
    ("ends with", Operator::EndsWith),
];

/// Bytes that can start a symbolic operator
const OPERATOR_BYTES: &[u8] = b"=!<>|~*^$";

impl Operator {
    /// Symbolic form
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessOrEqual => "<=",
            Operator::GreaterOrEqual => ">=",
            Operator::Prefix => "|=",
            Operator::ContainsAnyWord => "~=",
            Operator::ContainsAllWords => "~~=",
            Operator::Contains => "*=",
            Operator::NotContains => "!*=",
            Operator::StartsWith => "^=",
            Operator::NotStartsWith => "!^=",
            Operator::EndsWith => "$=",
            Operator::NotEndsWith => "!$=",
            Operator::Exists => "",
        }
    }

    /// Operator for an exact symbolic form (`~=`, `!^=`, ...)
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        ALIASES
            .iter()
            .find(|(alias, _)| alias.starts_with(|c: char| !c.is_ascii_alphabetic()) && *alias == symbol)
            .map(|&(_, op)| op)
    }

    /// Longest alias at the start of `text`, with its length
    ///
    /// Worded aliases must end at whitespace, a quote or the end of `text`.
    fn match_alias(text: &str) -> Option<(Operator, usize)> {
        let bytes = text.as_bytes();
        ALIASES
            .iter()
            .filter(|(alias, _)| {
                let n = alias.len();
                if bytes.len() < n || !bytes[..n].eq_ignore_ascii_case(alias.as_bytes()) {
                    return false;
                }
                let worded = alias.as_bytes()[0].is_ascii_alphabetic();
                !worded
                    || bytes
                        .get(n)
                        .is_none_or(|&b| b.is_ascii_whitespace() || b == b'"' || b == b'\'')
            })
            .max_by_key(|(alias, _)| alias.len())
            .map(|&(alias, op)| (op, alias.len()))
    }

    /// Compare an attribute value against the expected value
    pub fn apply(&self, actual: &str, expected: &str) -> bool {
        match self {
            Operator::Equals => actual == expected,
            Operator::NotEquals => actual != expected,
            Operator::Less => actual < expected,
            Operator::Greater => actual > expected,
            Operator::LessOrEqual => actual <= expected,
            Operator::GreaterOrEqual => actual >= expected,
            Operator::Prefix => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .and_then(|rest| rest.strip_prefix('-'))
                        .and_then(|rest| rest.chars().next())
                        .is_some_and(|c| c.is_alphanumeric() || c == '_')
            }
            Operator::ContainsAnyWord => {
                let words: Vec<&str> = split_words(actual).collect();
                split_words(expected).any(|w| words.contains(&w))
            }
            Operator::ContainsAllWords => {
                let words: Vec<&str> = split_words(actual).collect();
                let mut wanted = split_words(expected).peekable();
                wanted.peek().is_some() && wanted.all(|w| words.contains(&w))
            }
            Operator::Contains => contains_ignore_case(actual, expected),
            Operator::NotContains => !contains_ignore_case(actual, expected),
            Operator::StartsWith => starts_with_ignore_case(actual, expected),
            Operator::NotStartsWith => !starts_with_ignore_case(actual, expected),
            Operator::EndsWith => ends_with_ignore_case(actual, expected),
            Operator::NotEndsWith => !ends_with_ignore_case(actual, expected),
            Operator::Exists => true,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Exists => f.write_str("exists"),
            op => f.write_str(op.symbol()),
        }
    }
}

fn contains_ignore_case(actual: &str, expected: &str) -> bool {
    find_ignore_ascii_case(actual.as_bytes(), expected.as_bytes(), 0).is_some()
}

fn starts_with_ignore_case(actual: &str, expected: &str) -> bool {
    let (a, e) = (actual.as_bytes(), expected.as_bytes());
    a.len() >= e.len() && a[..e.len()].eq_ignore_ascii_case(e)
}

fn ends_with_ignore_case(actual: &str, expected: &str) -> bool {
    let (a, e) = (actual.as_bytes(), expected.as_bytes());
    a.len() >= e.len() && a[a.len() - e.len()..].eq_ignore_ascii_case(e)
}

/// Condition parse failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("empty condition between AND/OR")]
    MissingField,
    #[error("unknown operator after `{field}`: `{text}`")]
    UnknownOperator { field: String, text: String },
    #[error("unterminated quote in condition `{0}`")]
    UnterminatedQuote(String),
}

/// `<field> <operator> <value>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl Atom {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Atom {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Absent attribute: false for every operator. Present without a value
    /// compares as "".
    pub fn evaluate(&self, attrs: &AttributeMap<'_>) -> bool {
        match attrs.get(&self.field) {
            None => false,
            Some(actual) => self.operator.apply(actual.unwrap_or(""), &self.value),
        }
    }

    fn parse(text: &str) -> Result<Atom, ConditionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConditionError::MissingField);
        }
        let field_end = text
            .bytes()
            .position(|b| b.is_ascii_whitespace() || OPERATOR_BYTES.contains(&b))
            .unwrap_or(text.len());
        if field_end == 0 {
            return Err(ConditionError::MissingField);
        }
        let field = &text[..field_end];
        let rest = text[field_end..].trim_start();
        if rest.is_empty() {
            return Ok(Atom::new(field.to_ascii_lowercase(), Operator::Exists, ""));
        }

        let Some((operator, len)) = Operator::match_alias(rest) else {
            return Err(ConditionError::UnknownOperator {
                field: field.to_string(),
                text: rest.to_string(),
            });
        };
        let value = unquote(rest[len..].trim())?;
        Ok(Atom::new(field.to_ascii_lowercase(), operator, value))
    }
}

/// Strip matching quotes and undo backslash escapes; bare values pass as-is
fn unquote(value: &str) -> Result<String, ConditionError> {
    let Some(quote) = value.chars().next().filter(|&c| c == '"' || c == '\'') else {
        return Ok(value.to_string());
    };
    let inner = &value[1..];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            c if c == quote => return Ok(out),
            c => out.push(c),
        }
    }
    Err(ConditionError::UnterminatedQuote(value.to_string()))
}

/// Split on `sep` outside quoted values
fn split_unquoted<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if bytes[i..].starts_with(sep.as_bytes()) => {
                parts.push(&text[start..i]);
                i += sep.len();
                start = i;
                continue;
            }
            None => {}
        }
        i += 1;
    }
    parts.push(&text[start..]);
    parts
}

/// OR of AND groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Condition {
    groups: Vec<Vec<Atom>>,
}

impl Condition {
    /// Parse a condition expression; blank text is the always-true condition
    pub fn parse(expr: &str) -> Result<Condition, ConditionError> {
        if expr.trim().is_empty() {
            return Ok(Condition::default());
        }
        let groups = split_unquoted(expr, " OR ")
            .into_iter()
            .map(|group| {
                split_unquoted(group, " AND ")
                    .into_iter()
                    .map(Atom::parse)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Condition { groups })
    }

    /// A single AND group
    pub fn all(atoms: Vec<Atom>) -> Condition {
        if atoms.is_empty() {
            return Condition::default();
        }
        Condition { groups: vec![atoms] }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Attribute names a search has to scan for: the first field of each
    /// group, first occurrence order
    ///
    /// A group only holds when all its attributes are present, so every
    /// match carries at least one of these names.
    pub fn anchor_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for atom in self.groups.iter().filter_map(|group| group.first()) {
            if !fields.contains(&atom.field.as_str()) {
                fields.push(&atom.field);
            }
        }
        fields
    }

    pub fn evaluate(&self, attrs: &AttributeMap<'_>) -> bool {
        self.is_empty()
            || self
                .groups
                .iter()
                .any(|group| group.iter().all(|atom| atom.evaluate(attrs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attributes::extract_attributes;

    fn check(tag: &str, expr: &str) -> bool {
        let attrs = extract_attributes(tag, true);
        Condition::parse(expr).unwrap().evaluate(&attrs)
    }

    #[test]
    fn test_symbolic_and_worded() {
        let tag = "<input type=\"text\" name=\"query\">";
        assert!(check(tag, "type = text"));
        assert!(check(tag, "type is 'text'"));
        assert!(check(tag, "type equals \"text\""));
        assert!(check(tag, "type is not password"));
        assert!(!check(tag, "type != text"));
        assert!(check(tag, "name starts with QU"));
        assert!(check(tag, "name ends with ery"));
        assert!(check(tag, "name contains uer"));
        assert!(check(tag, "name does not contain xyz"));
        assert!(!check(tag, "name does not start with q"));
    }

    #[test]
    fn test_field_glued_to_operator() {
        assert!(check("<a id=x>", "id=x"));
        assert!(check("<a id=x>", "id!=y"));
    }

    #[test]
    fn test_and_or_precedence() {
        let tag = "<a href=\"/home\" rel=\"nofollow\">";
        assert!(check(tag, "href = /nope OR href = /home AND rel = nofollow"));
        assert!(!check(tag, "href = /nope OR href = /home AND rel = follow"));
        assert!(check(tag, "href = /nope AND rel = x OR rel ^= no"));
    }

    #[test]
    fn test_absent_field_is_false() {
        assert!(!check("<a>", "title != x"));
        assert!(!check("<a>", "title does not contain x"));
        assert!(!check("<a>", "title"));
    }

    #[test]
    fn test_exists_and_valueless() {
        assert!(check("<input disabled>", "disabled"));
        assert!(check("<input disabled>", "disabled = ''"));
        assert!(!check("<input disabled>", "disabled = disabled"));
    }

    #[test]
    fn test_empty_condition_is_true() {
        assert!(check("<p>", ""));
        assert!(check("<p>", "   "));
    }

    #[test]
    fn test_word_operators() {
        let tag = "<div data-x=\"foo bar\">";
        assert!(check(tag, "data-x ~= bar"));
        assert!(!check(tag, "data-x ~= ba"));
        assert!(check(tag, "data-x contains any word 'baz bar'"));
        assert!(check(tag, "data-x ~~= 'bar foo'"));
        assert!(!check(tag, "data-x contains all words 'bar baz'"));
        assert!(!check(tag, "data-x ~~= ''"));
    }

    #[test]
    fn test_prefix() {
        assert!(Operator::Prefix.apply("en", "en"));
        assert!(Operator::Prefix.apply("en-US", "en"));
        assert!(!Operator::Prefix.apply("en-", "en"));
        assert!(!Operator::Prefix.apply("english", "en"));
    }

    #[test]
    fn test_relational_is_lexical() {
        assert!(Operator::Less.apply("10", "9"));
        assert!(Operator::GreaterOrEqual.apply("b", "a"));
        assert!(check("<td colspan=\"2\">", "colspan is less than or equals 2"));
    }

    #[test]
    fn test_quoted_separators_do_not_split() {
        let tag = "<a title=\"cats AND dogs\">";
        assert!(check(tag, "title = 'cats AND dogs'"));
        assert!(check(tag, "title = \"x\" OR title *= ' and '"));
    }

    #[test]
    fn test_escapes() {
        let tag = "<a title='say \"hi\"'>";
        assert!(check(tag, "title = \"say \\\"hi\\\"\""));
    }

    #[test]
    fn test_longest_alias_wins() {
        let atom = Atom::parse("class contains word nav").unwrap();
        assert_eq!(atom.operator, Operator::ContainsAnyWord);
        assert_eq!(atom.value, "nav");
        let atom = Atom::parse("class contains wordy").unwrap();
        assert_eq!(atom.operator, Operator::Contains);
        assert_eq!(atom.value, "wordy");
        let atom = Atom::parse("size !*= x").unwrap();
        assert_eq!(atom.operator, Operator::NotContains);
    }

    #[test]
    fn test_errors() {
        assert_eq!(Condition::parse("a = 1 AND "), Err(ConditionError::MissingField));
        assert!(matches!(
            Condition::parse("a resembles b"),
            Err(ConditionError::UnknownOperator { .. })
        ));
        assert!(matches!(
            Condition::parse("a = 'open"),
            Err(ConditionError::UnterminatedQuote(_))
        ));
    }

    #[test]
    fn test_anchor_fields() {
        let cond = Condition::parse("id = a OR class ~= b AND id != c OR id ^= d").unwrap();
        assert_eq!(cond.anchor_fields(), vec!["id", "class"]);
        let cond = Condition::parse("lang AND title *= x").unwrap();
        assert_eq!(cond.anchor_fields(), vec!["lang"]);
        assert!(Condition::default().anchor_fields().is_empty());
    }

    #[test]
    fn test_from_symbol() {
        assert_eq!(Operator::from_symbol("~~="), Some(Operator::ContainsAllWords));
        assert_eq!(Operator::from_symbol("!$="), Some(Operator::NotEndsWith));
        assert_eq!(Operator::from_symbol("is"), None);
        assert_eq!(Operator::from_symbol("=="), None);
    }
}
