//! Recursive token-budget chunking.
//!
//! Splits on the coarsest separator first (paragraph, line, sentence, word,
//! grapheme) and only descends into pieces that are still over budget. The
//! resulting leaves are merged greedily back up to the budget, repeating a
//! few tokens of trailing context at the start of each following chunk.
//!
//! Separators stay attached to the end of the piece they terminate, so the
//! leaves tile the input exactly and chunk byte ranges can be trusted.

use crate::chunking::traits::{Chunker, SplitConfig};
use crate::core::Chunk;
use crate::error::Result;
use crate::tokens::TokenCounter;
use rayon::prelude::*;
use std::ops::Range;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

/// Piece count above which token estimation runs on the rayon pool.
const PARALLEL_THRESHOLD: usize = 256;

/// Split points, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// Blank line (`\n\n`).
    Paragraph,
    /// Single newline.
    Line,
    /// Unicode sentence boundary.
    Sentence,
    /// Space.
    Word,
    /// Extended grapheme cluster; the finest unit that is never cut.
    Grapheme,
}

impl Separator {
    /// Separators in the order they are tried.
    pub const PRIORITY: [Self; 5] = [
        Self::Paragraph,
        Self::Line,
        Self::Sentence,
        Self::Word,
        Self::Grapheme,
    ];

    /// Splits `text` into pieces that concatenate back to `text`.
    #[must_use]
    pub fn split(self, text: &str) -> Vec<&str> {
        match self {
            Self::Paragraph => text.split_inclusive("\n\n").collect(),
            Self::Line => text.split_inclusive('\n').collect(),
            Self::Sentence => text.split_sentence_bounds().collect(),
            Self::Word => text.split_inclusive(' ').collect(),
            Self::Grapheme => text.graphemes(true).collect(),
        }
    }

    /// Returns the next finer separator, if any.
    #[must_use]
    pub const fn finer(self) -> Option<Self> {
        match self {
            Self::Paragraph => Some(Self::Line),
            Self::Line => Some(Self::Sentence),
            Self::Sentence => Some(Self::Word),
            Self::Word => Some(Self::Grapheme),
            Self::Grapheme => None,
        }
    }
}

/// An unsplittable (or small enough) span of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Leaf {
    range: Range<usize>,
    tokens: usize,
}

/// Chunker that measures every piece with a [`TokenCounter`].
///
/// # Examples
///
/// ```
/// use precis::chunking::{Chunker, RecursiveChunker, SplitConfig};
/// use precis::tokens::WordCounter;
///
/// let text = "First paragraph here.\n\nSecond paragraph here.";
/// let chunker = RecursiveChunker::new(WordCounter, SplitConfig::with_budget(3));
/// let chunks = chunker.chunk(text).unwrap();
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[0].content, "First paragraph here.\n\n");
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker<C> {
    counter: C,
    config: SplitConfig,
    parallel_threshold: usize,
}

impl<C: TokenCounter> RecursiveChunker<C> {
    /// Creates a chunker with the given length function and budget.
    pub const fn new(counter: C, config: SplitConfig) -> Self {
        Self {
            counter,
            config,
            parallel_threshold: PARALLEL_THRESHOLD,
        }
    }

    /// Sets the piece count above which estimation runs in parallel.
    #[must_use]
    pub const fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Returns the split configuration.
    pub const fn config(&self) -> SplitConfig {
        self.config
    }

    fn count_pieces(&self, pieces: &[&str]) -> Vec<usize> {
        if pieces.len() >= self.parallel_threshold {
            pieces.par_iter().map(|p| self.counter.count(p)).collect()
        } else {
            pieces.iter().map(|p| self.counter.count(p)).collect()
        }
    }

    /// Collects leaves for `text`, which starts at `offset` in the document.
    fn collect_leaves(&self, text: &str, offset: usize, separator: Separator, out: &mut Vec<Leaf>) {
        let pieces = separator.split(text);
        let counts = self.count_pieces(&pieces);

        let mut pos = offset;
        for (piece, tokens) in pieces.into_iter().zip(counts) {
            let next_separator = separator.finer().filter(|_| tokens > self.config.budget);
            match next_separator {
                Some(finer) => self.collect_leaves(piece, pos, finer, out),
                None => out.push(Leaf {
                    range: pos..pos + piece.len(),
                    tokens,
                }),
            }
            pos += piece.len();
        }
    }

    /// Merges leaves into chunks no larger than the budget.
    fn merge(&self, text: &str, leaves: &[Leaf]) -> Vec<Chunk> {
        let budget = self.config.budget;
        let mut chunks = Vec::new();

        let mut start = 0;
        // Index of the first leaf not yet covered by an earlier chunk.
        let mut fresh = 0;

        while fresh < leaves.len() {
            let mut end = start;
            let mut sum = 0;
            while end < leaves.len() && (end <= fresh || sum + leaves[end].tokens <= budget) {
                sum += leaves[end].tokens;
                end += 1;
            }

            // Piece sums only approximate the joint encoding; confirm it.
            let mut tokens = self.counter.count(&text[span(leaves, start, end)]);
            while tokens > budget && end - start > 1 {
                if end - 1 > fresh {
                    end -= 1;
                } else {
                    start += 1;
                }
                tokens = self.counter.count(&text[span(leaves, start, end)]);
            }

            let range = span(leaves, start, end);
            let overlap = leaves[fresh].range.start - range.start;
            let oversized = tokens > budget;
            if oversized {
                warn!(
                    index = chunks.len(),
                    tokens, budget, "unsplittable unit exceeds chunk budget"
                );
            }

            chunks.push(
                Chunk::new(text[range.clone()].to_string(), range, chunks.len(), tokens)
                    .with_overlap(overlap)
                    .with_oversized(oversized),
            );

            if end >= leaves.len() {
                break;
            }

            start = self.carry_overlap(leaves, start, end);
            fresh = end;
        }

        chunks
    }

    /// Picks the trailing leaves of `[start, end)` to repeat in the next chunk.
    ///
    /// Returns the index of the first carried leaf, or `end` if none fit.
    fn carry_overlap(&self, leaves: &[Leaf], start: usize, end: usize) -> usize {
        let SplitConfig { budget, overlap } = self.config;

        let mut next = end;
        let mut carried = 0;
        while next > start + 1 && carried + leaves[next - 1].tokens <= overlap {
            next -= 1;
            carried += leaves[next].tokens;
        }

        // The first fresh leaf must still fit after the carried context.
        while next < end && carried + leaves[end].tokens > budget {
            carried -= leaves[next].tokens;
            next += 1;
        }

        next
    }
}

fn span(leaves: &[Leaf], start: usize, end: usize) -> Range<usize> {
    leaves[start].range.start..leaves[end - 1].range.end
}

impl<C: TokenCounter> Chunker for RecursiveChunker<C> {
    fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        self.config.validate()?;

        let total = self.counter.count(text);
        if total <= self.config.budget {
            return Ok(vec![Chunk::new(text.to_string(), 0..text.len(), 0, total)]);
        }

        let mut leaves = Vec::new();
        self.collect_leaves(text, 0, Separator::Paragraph, &mut leaves);
        let chunks = self.merge(text, &leaves);

        debug!(
            total_tokens = total,
            budget = self.config.budget,
            overlap = self.config.overlap,
            leaves = leaves.len(),
            chunks = chunks.len(),
            "split document"
        );

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "recursive"
    }

    fn description(&self) -> &'static str {
        "Recursive paragraph/line/sentence/word/grapheme splitting to a token budget"
    }
}
