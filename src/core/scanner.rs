//! SIMD-accelerated markup scanning using memchr
//!
//! All searches work on raw bytes and return absolute byte offsets into the
//! scanned input. Delimiters are ASCII, so every offset returned for `<`, `>`
//! or an ASCII-led needle is a valid `str` boundary.

use memchr::{memchr, memchr2, memrchr2};

/// Cursor over a haystack for repeated literal searches
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Move the cursor; positions past the end clamp to the end
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    /// Find next occurrence of a specific byte
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Find next '<' (tag start) using SIMD
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        self.find_byte(b'<')
    }
}

/// ASCII case-insensitive substring search starting at `from`
///
/// Candidates are located with `memchr2` on both cases of the needle's first
/// byte, then verified with `eq_ignore_ascii_case`.
pub fn find_ignore_ascii_case(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    let Some(&first) = needle.first() else {
        return Some(from);
    };
    if haystack.len() - from < needle.len() {
        return None;
    }

    let lower = first.to_ascii_lowercase();
    let upper = first.to_ascii_uppercase();
    let last_start = haystack.len() - needle.len();
    let mut pos = from;

    while pos <= last_start {
        let hit = pos + memchr2(lower, upper, &haystack[pos..=last_start])?;
        if haystack[hit..hit + needle.len()].eq_ignore_ascii_case(needle) {
            return Some(hit);
        }
        pos = hit + 1;
    }
    None
}

/// Right-most ASCII case-insensitive occurrence of `needle`
pub fn rfind_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Check whether `pos` lies inside a start tag
///
/// Scanning backward, the nearer of `<`/`>` must be `<`; scanning forward,
/// the nearer of `<`/`>` must be `>`. An opening `<` followed by `/` is an
/// end tag, so offsets in content and inside end tags are both rejected.
pub fn is_inside_start_tag(input: &[u8], pos: usize) -> bool {
    if pos >= input.len() {
        return false;
    }
    let opened = match memrchr2(b'<', b'>', &input[..pos]) {
        Some(i) => input[i] == b'<' && input.get(i + 1) != Some(&b'/'),
        None => false,
    };
    if !opened {
        return false;
    }
    match memchr2(b'<', b'>', &input[pos + 1..]) {
        Some(i) => input[pos + 1 + i] == b'>',
        None => false,
    }
}

/// Check if byte is ASCII whitespace, vertical tab and form feed included
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}
