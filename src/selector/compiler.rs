//! Selector Compiler
//!
//! Turns a CSS-like selector string into a [`CompiledSelector`]: a list of
//! comma-separated alternatives, each a list of compound steps joined by
//! descendant (whitespace) or child (`>`) combinators.
//!
//! Supported per step: one tag name, `#id`, `.class` (chained classes must
//! all be present) and `[name]` / `[name<op>value]` with the operators of
//! [`Operator::from_symbol`]. Pseudo-classes and sibling combinators are
//! rejected.

use super::condition::Operator;
use super::lexer::{is_reserved, CharKind, Lexeme, Lexer};
use log::{debug, trace};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock, Mutex};
use thiserror::Error;

/// Number of compiled selectors kept by [`compile_cached`]
pub const SELECTOR_CACHE_CAPACITY: usize = 256;

const OPERATOR_CHARS: &str = "=!<>|~*^$";

/// Relation of a step to the step before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    /// Whitespace: anywhere inside
    #[default]
    Descendant,
    /// `>`: direct child only
    Child,
}

/// `[name<op>value]`, `#id` or `.class`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePredicate {
    /// Lowercase attribute name
    pub name: String,
    pub operator: Operator,
    pub value: String,
}

impl AttributePredicate {
    pub fn new(name: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        AttributePredicate {
            name: name.into().to_ascii_lowercase(),
            operator,
            value: value.into(),
        }
    }
}

/// One compound selector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Lowercase tag name
    pub tag: Option<String>,
    pub combinator: Combinator,
    pub predicates: Vec<AttributePredicate>,
}

impl Step {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.predicates.is_empty()
    }
}

/// Steps of one comma-separated alternative
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alternative {
    pub steps: Vec<Step>,
}

/// A validated selector plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSelector {
    source: String,
    pub alternatives: Vec<Alternative>,
}

impl CompiledSelector {
    /// The selector text this plan was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Why a selector is invalid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("selector may not start with `{0}`")]
    LeadingPunctuation(char),
    #[error("selector may not end with `{0}`")]
    TrailingPunctuation(char),
    #[error("one step names two tags: `{first}` and `{second}`")]
    ConflictingTagNames { first: String, second: String },
    #[error("unknown attribute operator `{0}`")]
    UnknownOperator(String),
    #[error("unterminated `[`")]
    UnterminatedBracket,
    #[error("unexpected `{ch}` at character {position}")]
    UnexpectedToken { ch: char, position: usize },
    #[error("`{0}` must be followed by a name")]
    EmptyShorthand(char),
    #[error("empty alternative between commas")]
    EmptyAlternative,
    #[error("`>` is not followed by a step")]
    DanglingCombinator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shorthand {
    Id,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between the parts of a compound step
    Compound,
    TagName,
    Shorthand(Shorthand),
    AttrName,
    AttrOperator,
    AttrValue { quote: Option<char> },
    /// Closing quote seen, expecting `]`
    AfterValue,
}

struct Builder {
    state: State,
    alternatives: Vec<Alternative>,
    steps: Vec<Step>,
    step: Step,
    classes: Vec<String>,
    pending: Combinator,
    buffer: String,
    attr_name: String,
    attr_op: String,
    attr_value: String,
    position: usize,
}

impl Builder {
    fn new() -> Self {
        Builder {
            state: State::Compound,
            alternatives: Vec::new(),
            steps: Vec::new(),
            step: Step::default(),
            classes: Vec::new(),
            pending: Combinator::Descendant,
            buffer: String::new(),
            attr_name: String::new(),
            attr_op: String::new(),
            attr_value: String::new(),
            position: 0,
        }
    }

    fn unexpected(&self, lx: Lexeme) -> SelectorError {
        SelectorError::UnexpectedToken {
            ch: lx.ch,
            position: self.position,
        }
    }

    fn feed(&mut self, lx: Lexeme) -> Result<(), SelectorError> {
        match self.state {
            State::Compound => self.feed_compound(lx),
            State::TagName => {
                if lx.kind == CharKind::Literal {
                    self.buffer.push(lx.ch);
                    Ok(())
                } else {
                    self.finish_tag()?;
                    self.feed_compound(lx)
                }
            }
            State::Shorthand(kind) => {
                if lx.kind == CharKind::Literal {
                    self.buffer.push(lx.ch);
                    Ok(())
                } else {
                    self.finish_shorthand(kind)?;
                    self.feed_compound(lx)
                }
            }
            State::AttrName => match lx.kind {
                CharKind::Literal => {
                    self.attr_name.push(lx.ch);
                    Ok(())
                }
                CharKind::Space => {
                    if !self.attr_name.is_empty() {
                        self.state = State::AttrOperator;
                    }
                    Ok(())
                }
                CharKind::Punct if self.attr_name.is_empty() => Err(self.unexpected(lx)),
                CharKind::Punct if lx.ch == ']' => self.finish_predicate(),
                CharKind::Punct if OPERATOR_CHARS.contains(lx.ch) => {
                    self.attr_op.push(lx.ch);
                    self.state = State::AttrOperator;
                    Ok(())
                }
                CharKind::Punct => Err(self.unexpected(lx)),
            },
            State::AttrOperator => match lx.kind {
                CharKind::Space => Ok(()),
                CharKind::Punct if lx.ch == ']' => self.finish_predicate(),
                CharKind::Punct if OPERATOR_CHARS.contains(lx.ch) => {
                    self.attr_op.push(lx.ch);
                    Ok(())
                }
                _ if self.attr_op.is_empty() => Err(self.unexpected(lx)),
                CharKind::Punct if lx.ch == '"' || lx.ch == '\'' => {
                    self.state = State::AttrValue { quote: Some(lx.ch) };
                    Ok(())
                }
                _ => {
                    self.attr_value.push(lx.ch);
                    self.state = State::AttrValue { quote: None };
                    Ok(())
                }
            },
            State::AttrValue { quote: Some(q) } => {
                if lx.is_punct(q) {
                    self.state = State::AfterValue;
                } else {
                    self.attr_value.push(lx.ch);
                }
                Ok(())
            }
            State::AttrValue { quote: None } => match lx.kind {
                CharKind::Space => {
                    self.state = State::AfterValue;
                    Ok(())
                }
                CharKind::Punct if lx.ch == ']' => self.finish_predicate(),
                _ => {
                    self.attr_value.push(lx.ch);
                    Ok(())
                }
            },
            State::AfterValue => match lx.kind {
                CharKind::Space => Ok(()),
                CharKind::Punct if lx.ch == ']' => self.finish_predicate(),
                _ => Err(self.unexpected(lx)),
            },
        }
    }

    fn feed_compound(&mut self, lx: Lexeme) -> Result<(), SelectorError> {
        self.state = State::Compound;
        match lx.kind {
            CharKind::Literal => {
                self.buffer.clear();
                self.buffer.push(lx.ch);
                self.state = State::TagName;
                Ok(())
            }
            CharKind::Space => self.end_step(),
            CharKind::Punct => match lx.ch {
                '#' => self.open_shorthand(Shorthand::Id),
                '.' => self.open_shorthand(Shorthand::Class),
                '[' => {
                    self.attr_name.clear();
                    self.attr_op.clear();
                    self.attr_value.clear();
                    self.state = State::AttrName;
                    Ok(())
                }
                '>' => {
                    self.end_step()?;
                    if self.pending == Combinator::Child {
                        return Err(self.unexpected(lx));
                    }
                    self.pending = Combinator::Child;
                    Ok(())
                }
                ',' => self.end_alternative(),
                _ => Err(self.unexpected(lx)),
            },
        }
    }

    fn open_shorthand(&mut self, kind: Shorthand) -> Result<(), SelectorError> {
        self.buffer.clear();
        self.state = State::Shorthand(kind);
        Ok(())
    }

    fn finish_tag(&mut self) -> Result<(), SelectorError> {
        let name = std::mem::take(&mut self.buffer).to_ascii_lowercase();
        self.state = State::Compound;
        match &self.step.tag {
            Some(first) if *first != name => Err(SelectorError::ConflictingTagNames {
                first: first.clone(),
                second: name,
            }),
            _ => {
                self.step.tag = Some(name);
                Ok(())
            }
        }
    }

    fn finish_shorthand(&mut self, kind: Shorthand) -> Result<(), SelectorError> {
        let value = std::mem::take(&mut self.buffer);
        self.state = State::Compound;
        match (kind, value.is_empty()) {
            (Shorthand::Id, true) => Err(SelectorError::EmptyShorthand('#')),
            (Shorthand::Class, true) => Err(SelectorError::EmptyShorthand('.')),
            (Shorthand::Id, false) => {
                self.step
                    .predicates
                    .push(AttributePredicate::new("id", Operator::Equals, value));
                Ok(())
            }
            (Shorthand::Class, false) => {
                self.classes.push(value);
                Ok(())
            }
        }
    }

    fn finish_predicate(&mut self) -> Result<(), SelectorError> {
        let operator = if self.attr_op.is_empty() {
            Operator::Exists
        } else {
            Operator::from_symbol(&self.attr_op)
                .ok_or_else(|| SelectorError::UnknownOperator(self.attr_op.clone()))?
        };
        let predicate = AttributePredicate::new(
            std::mem::take(&mut self.attr_name),
            operator,
            std::mem::take(&mut self.attr_value),
        );
        self.attr_op.clear();
        self.step.predicates.push(predicate);
        self.state = State::Compound;
        Ok(())
    }

    fn end_step(&mut self) -> Result<(), SelectorError> {
        match self.classes.len() {
            0 => {}
            1 => {
                let class = self.classes.remove(0);
                self.step
                    .predicates
                    .push(AttributePredicate::new("class", Operator::ContainsAnyWord, class));
            }
            _ => {
                let classes = std::mem::take(&mut self.classes).join(" ");
                self.step
                    .predicates
                    .push(AttributePredicate::new("class", Operator::ContainsAllWords, classes));
            }
        }
        if self.step.is_empty() {
            return Ok(());
        }
        let mut step = std::mem::take(&mut self.step);
        step.combinator = std::mem::take(&mut self.pending);
        self.steps.push(step);
        Ok(())
    }

    fn end_alternative(&mut self) -> Result<(), SelectorError> {
        self.end_step()?;
        if self.pending == Combinator::Child {
            return Err(SelectorError::DanglingCombinator);
        }
        if self.steps.is_empty() {
            return Err(SelectorError::EmptyAlternative);
        }
        self.alternatives.push(Alternative {
            steps: std::mem::take(&mut self.steps),
        });
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Alternative>, SelectorError> {
        match self.state {
            State::Compound => {}
            State::TagName => self.finish_tag()?,
            State::Shorthand(kind) => self.finish_shorthand(kind)?,
            State::AttrName | State::AttrOperator | State::AttrValue { .. } | State::AfterValue => {
                return Err(SelectorError::UnterminatedBracket)
            }
        }
        self.end_alternative()?;
        Ok(self.alternatives)
    }
}

/// Compile a selector
pub fn compile(selector: &str) -> Result<CompiledSelector, SelectorError> {
    let trimmed = selector.trim();
    let (Some(first), Some(last)) = (trimmed.chars().next(), trimmed.chars().last()) else {
        return Err(SelectorError::Empty);
    };
    if is_reserved(last) && last != ']' {
        return Err(SelectorError::TrailingPunctuation(last));
    }
    if is_reserved(first) && !matches!(first, '#' | '.' | '[') {
        return Err(SelectorError::LeadingPunctuation(first));
    }

    let mut builder = Builder::new();
    for (position, lx) in Lexer::new(trimmed).enumerate() {
        builder.position = position;
        builder.feed(lx)?;
    }
    let alternatives = builder.finish()?;

    Ok(CompiledSelector {
        source: trimmed.to_string(),
        alternatives,
    })
}

const CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(SELECTOR_CACHE_CAPACITY) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

static CACHE: LazyLock<Mutex<LruCache<String, Arc<CompiledSelector>>>> =
    LazyLock::new(|| Mutex::new(LruCache::new(CACHE_CAPACITY)));

/// Compile through a process-wide LRU cache of valid selectors
///
/// Compiled plans are immutable, so sharing them across queries and threads
/// is safe. A poisoned cache is bypassed.
pub fn compile_cached(selector: &str) -> Result<Arc<CompiledSelector>, SelectorError> {
    if let Ok(mut cache) = CACHE.lock() {
        if let Some(hit) = cache.get(selector) {
            trace!(target: "rawquery::selector", "cache hit for {selector:?}");
            return Ok(Arc::clone(hit));
        }
    }

    let compiled = match compile(selector) {
        Ok(compiled) => Arc::new(compiled),
        Err(err) => {
            debug!(target: "rawquery::selector", "invalid selector {selector:?}: {err}");
            return Err(err);
        }
    };
    trace!(
        target: "rawquery::selector",
        "compiled {selector:?} into {} alternative(s)",
        compiled.alternatives.len()
    );

    if let Ok(mut cache) = CACHE.lock() {
        cache.put(selector.to_string(), Arc::clone(&compiled));
    }
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(selector: &str) -> Vec<Step> {
        let compiled = compile(selector).unwrap();
        assert_eq!(compiled.alternatives.len(), 1);
        compiled.alternatives.into_iter().next().unwrap().steps
    }

    #[test]
    fn test_tag_and_id() {
        let steps = steps("LI#x");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].tag.as_deref(), Some("li"));
        assert_eq!(
            steps[0].predicates,
            vec![AttributePredicate::new("id", Operator::Equals, "x")]
        );
    }

    #[test]
    fn test_classes() {
        let one = steps(".a");
        assert_eq!(
            one[0].predicates,
            vec![AttributePredicate::new("class", Operator::ContainsAnyWord, "a")]
        );
        let two = steps("div.a.b");
        assert_eq!(two[0].tag.as_deref(), Some("div"));
        assert_eq!(
            two[0].predicates,
            vec![AttributePredicate::new("class", Operator::ContainsAllWords, "a b")]
        );
    }

    #[test]
    fn test_brackets() {
        let steps = steps("input[type=text][disabled][ name ^= \"q \" ][data-x~='a]b']");
        let preds = &steps[0].predicates;
        assert_eq!(preds[0], AttributePredicate::new("type", Operator::Equals, "text"));
        assert_eq!(preds[1], AttributePredicate::new("disabled", Operator::Exists, ""));
        assert_eq!(preds[2], AttributePredicate::new("name", Operator::StartsWith, "q "));
        assert_eq!(preds[3], AttributePredicate::new("data-x", Operator::ContainsAnyWord, "a]b"));
    }

    #[test]
    fn test_unquoted_value_with_punctuation() {
        let steps = steps("a[href=/home.html]");
        assert_eq!(
            steps[0].predicates,
            vec![AttributePredicate::new("href", Operator::Equals, "/home.html")]
        );
    }

    #[test]
    fn test_combinators() {
        for selector in ["ul > li span", "ul>li span", "ul >li  span"] {
            let steps = steps(selector);
            let shape: Vec<(Option<&str>, Combinator)> =
                steps.iter().map(|s| (s.tag.as_deref(), s.combinator)).collect();
            assert_eq!(
                shape,
                vec![
                    (Some("ul"), Combinator::Descendant),
                    (Some("li"), Combinator::Child),
                    (Some("span"), Combinator::Descendant),
                ]
            );
        }
    }

    #[test]
    fn test_alternatives() {
        let compiled = compile("a, b.c,d").unwrap();
        let tags: Vec<Option<&str>> = compiled
            .alternatives
            .iter()
            .map(|alt| alt.steps[0].tag.as_deref())
            .collect();
        assert_eq!(tags, vec![Some("a"), Some("b"), Some("d")]);
        assert_eq!(compiled.source(), "a, b.c,d");
    }

    #[test]
    fn test_escaped_punctuation() {
        let steps = steps("#a\\.b");
        assert_eq!(steps[0].predicates[0].value, "a.b");
    }

    #[test]
    fn test_invalid() {
        assert_eq!(compile("   "), Err(SelectorError::Empty));
        assert_eq!(compile("div]"), Err(SelectorError::UnexpectedToken { ch: ']', position: 3 }));
        assert_eq!(compile("div >"), Err(SelectorError::TrailingPunctuation('>')));
        assert_eq!(compile(">li"), Err(SelectorError::LeadingPunctuation('>')));
        assert_eq!(compile("div[title"), Err(SelectorError::UnterminatedBracket));
        assert_eq!(compile("[title='x]"), Err(SelectorError::UnterminatedBracket));
        assert_eq!(compile("a[x=*1]"), Err(SelectorError::UnknownOperator("=*".into())));
        assert_eq!(compile("a,,b"), Err(SelectorError::EmptyAlternative));
        assert_eq!(compile("a > > b"), Err(SelectorError::UnexpectedToken { ch: '>', position: 4 }));
        assert!(matches!(compile("a:hover"), Err(SelectorError::UnexpectedToken { ch: ':', .. })));
        assert!(matches!(compile("a + b"), Err(SelectorError::UnexpectedToken { ch: '+', .. })));
        assert_eq!(compile("#.a"), Err(SelectorError::EmptyShorthand('#')));
    }

    #[test]
    fn test_conflicting_tags() {
        assert_eq!(
            compile("div[x]span"),
            Err(SelectorError::ConflictingTagNames {
                first: "div".into(),
                second: "span".into()
            })
        );
        assert!(compile("div[x]DIV").is_ok());
    }

    #[test]
    fn test_cache_shares_plans() {
        let first = compile_cached("table tr > td.cell").unwrap();
        let second = compile_cached("table tr > td.cell").unwrap();
        assert_eq!(first, second);
        assert!(compile_cached("td]").is_err());
    }
}
