//! Region - a real slice of the document plus its absolute offset
//!
//! Every search runs over a `Region`, so hit offsets can be re-based to
//! absolute document offsets without rebuilding any markup.

/// A contiguous piece of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region<'a> {
    /// Byte offset of `text` within the whole document
    pub base: usize,
    /// The slice itself
    pub text: &'a str,
}

impl<'a> Region<'a> {
    /// Create a new region
    #[inline]
    pub const fn new(base: usize, text: &'a str) -> Self {
        Self { base, text }
    }

    /// The whole document
    #[inline]
    pub const fn whole(doc: &'a str) -> Self {
        Self { base: 0, text: doc }
    }

    /// Raw bytes of the region
    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    /// Convert an offset relative to this region into a document offset
    #[inline]
    pub const fn absolute(&self, relative: usize) -> usize {
        self.base + relative
    }
}
