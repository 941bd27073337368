//! Chunk representation.
//!
//! Chunks are bounded spans of a normalised document produced by the
//! chunk splitter. Each chunk keeps its byte position in the source so the
//! map-reduce stage can preserve order and callers can audit coverage.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A contiguous span of the source document, possibly overlapping its
/// predecessor.
///
/// # Examples
///
/// ```
/// use precis::core::Chunk;
///
/// let chunk = Chunk::new("Hello, world!".to_string(), 0..13, 0, 4);
/// assert_eq!(chunk.size(), 13);
/// assert_eq!(chunk.fresh_range(), 0..13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk content (exactly the source bytes in `byte_range`).
    pub content: String,

    /// Byte range in the source document.
    pub byte_range: Range<usize>,

    /// Sequential index within the document (0-based).
    pub index: usize,

    /// Estimated token count of `content`.
    pub token_count: usize,

    /// Number of leading bytes shared with the previous chunk.
    pub overlap: usize,

    /// Set when the chunk holds a single unit that could not be split
    /// below the budget.
    pub oversized: bool,
}

impl Chunk {
    /// Creates a new chunk with no overlap.
    ///
    /// # Arguments
    ///
    /// * `content` - Chunk content.
    /// * `byte_range` - Byte range in the source document.
    /// * `index` - Sequential index within the document.
    /// * `token_count` - Estimated token count of `content`.
    #[must_use]
    pub const fn new(
        content: String,
        byte_range: Range<usize>,
        index: usize,
        token_count: usize,
    ) -> Self {
        Self {
            content,
            byte_range,
            index,
            token_count,
            overlap: 0,
            oversized: false,
        }
    }

    /// Sets the number of leading bytes shared with the previous chunk.
    #[must_use]
    pub const fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    /// Flags the chunk as exceeding the budget.
    #[must_use]
    pub const fn with_oversized(mut self, oversized: bool) -> Self {
        self.oversized = oversized;
        self
    }

    /// Returns the size of the chunk in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Checks if the chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the start byte offset in the source document.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.byte_range.start
    }

    /// Returns the end byte offset in the source document.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.byte_range.end
    }

    /// Returns whether this chunk repeats the tail of the previous one.
    #[must_use]
    pub const fn has_overlap(&self) -> bool {
        self.overlap > 0
    }

    /// Byte range not shared with the previous chunk.
    ///
    /// Concatenating the fresh ranges of all chunks in order yields the
    /// source document.
    #[must_use]
    pub const fn fresh_range(&self) -> Range<usize> {
        (self.byte_range.start + self.overlap)..self.byte_range.end
    }

    /// Returns a preview of the chunk content (first N characters).
    ///
    /// # Arguments
    ///
    /// * `max_len` - Maximum number of characters to include.
    #[must_use]
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let end = crate::io::find_char_boundary(&self.content, max_len);
            &self.content[..end]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_creation() {
        let chunk = Chunk::new("Hello, world!".to_string(), 0..13, 0, 4);
        assert_eq!(chunk.content, "Hello, world!");
        assert_eq!(chunk.byte_range, 0..13);
        assert_eq!(chunk.index, 0);
        assert_eq!(chunk.token_count, 4);
        assert!(!chunk.has_overlap());
        assert!(!chunk.oversized);
    }

    #[test]
    fn test_chunk_offsets() {
        let chunk = Chunk::new("world".to_string(), 7..12, 1, 1);
        assert_eq!(chunk.start(), 7);
        assert_eq!(chunk.end(), 12);
        assert_eq!(chunk.size(), 5);
        assert!(!chunk.is_empty());
    }

    #[test]
    fn test_fresh_range_skips_overlap() {
        let chunk = Chunk::new("lo world".to_string(), 3..11, 1, 2).with_overlap(3);
        assert!(chunk.has_overlap());
        assert_eq!(chunk.fresh_range(), 6..11);
    }

    #[test]
    fn test_oversized_flag() {
        let chunk = Chunk::new("🦀".to_string(), 0..4, 0, 3).with_oversized(true);
        assert!(chunk.oversized);
    }

    #[test]
    fn test_chunk_preview() {
        let chunk = Chunk::new("Hello, world!".to_string(), 0..13, 0, 4);
        assert_eq!(chunk.preview(5), "Hello");
        assert_eq!(chunk.preview(100), "Hello, world!");
    }

    #[test]
    fn test_chunk_preview_unicode() {
        let chunk = Chunk::new("Hello 世界".to_string(), 0..12, 0, 3);
        // '世' starts at byte 6; cutting at 7 backs up to 6
        assert_eq!(chunk.preview(7), "Hello ");
    }

    #[test]
    fn test_chunk_serialization() {
        let chunk = Chunk::new("Test".to_string(), 0..4, 0, 1);
        let json = serde_json::to_string(&chunk).unwrap();
        let deserialized: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!(chunk, deserialized);
    }
}
