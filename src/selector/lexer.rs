//! Selector Lexer
//!
//! Classifies selector characters as literal, reserved punctuation or
//! whitespace. A backslash before reserved punctuation turns it into a
//! literal (`#a\.b` is the id `a.b`).

/// Punctuation with meaning in a selector
pub const RESERVED: &str = "!\"#$%&'()*+,./:;<=>?@[\\]^`{|}~";

/// Character class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharKind {
    Literal,
    Punct,
    Space,
}

/// One classified character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: CharKind,
    pub ch: char,
}

impl Lexeme {
    #[inline]
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == CharKind::Punct && self.ch == ch
    }
}

#[inline]
pub fn is_reserved(ch: char) -> bool {
    RESERVED.contains(ch)
}

/// Classify a single unescaped character
pub fn classify(ch: char) -> CharKind {
    if is_reserved(ch) {
        CharKind::Punct
    } else if ch.is_whitespace() {
        CharKind::Space
    } else {
        CharKind::Literal
    }
}

/// Selector lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    /// Get the remaining input
    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Peek at current character
    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Advance by one character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Lexeme> {
        let ch = self.advance()?;
        if ch == '\\' {
            if let Some(next) = self.peek().filter(|&c| is_reserved(c)) {
                self.advance();
                return Some(Lexeme {
                    kind: CharKind::Literal,
                    ch: next,
                });
            }
        }
        Some(Lexeme {
            kind: classify(ch),
            ch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(CharKind, char)> {
        Lexer::new(input).map(|l| (l.kind, l.ch)).collect()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify('a'), CharKind::Literal);
        assert_eq!(classify('-'), CharKind::Literal);
        assert_eq!(classify('_'), CharKind::Literal);
        assert_eq!(classify('#'), CharKind::Punct);
        assert_eq!(classify(']'), CharKind::Punct);
        assert_eq!(classify('\t'), CharKind::Space);
    }

    #[test]
    fn test_escape_reserved() {
        assert_eq!(
            kinds("a\\.b"),
            vec![
                (CharKind::Literal, 'a'),
                (CharKind::Literal, '.'),
                (CharKind::Literal, 'b'),
            ]
        );
    }

    #[test]
    fn test_backslash_before_literal() {
        assert_eq!(
            kinds("\\a"),
            vec![(CharKind::Punct, '\\'), (CharKind::Literal, 'a')]
        );
    }

    #[test]
    fn test_non_ascii_literal() {
        let lexemes: Vec<Lexeme> = Lexer::new("#é").collect();
        assert!(lexemes[0].is_punct('#'));
        assert_eq!(lexemes[1].kind, CharKind::Literal);
        assert_eq!(lexemes[1].ch, 'é');
    }
}
