//! Chunker trait definition.
//!
//! Defines the interface for splitting a normalised document into
//! token-bounded chunks.

use crate::core::Chunk;
use crate::error::{ChunkingError, Result};

/// Trait for chunking text into token-bounded segments.
///
/// Implementations must be `Send + Sync` so a chunker can be shared by
/// concurrent requests. Output must be deterministic for the same input and
/// must cover the whole input in order.
///
/// # Examples
///
/// ```
/// use precis::chunking::{Chunker, RecursiveChunker, SplitConfig};
/// use precis::tokens::WordCounter;
///
/// let chunker = RecursiveChunker::new(WordCounter, SplitConfig::new(50, 5));
/// let text = "Hello, world! ".repeat(100);
/// let chunks = chunker.chunk(&text).unwrap();
/// assert!(chunks.len() > 1);
/// ```
pub trait Chunker: Send + Sync {
    /// Chunks the input text.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunker configuration is invalid.
    fn chunk(&self, text: &str) -> Result<Vec<Chunk>>;

    /// Returns the name of the chunking strategy.
    fn name(&self) -> &'static str;

    /// Returns a description of the chunking strategy.
    fn description(&self) -> &'static str {
        "No description available"
    }
}

/// Token budget and overlap for a chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    /// Maximum estimated tokens per chunk.
    pub budget: usize,

    /// Tokens of trailing context repeated at the start of the next chunk.
    pub overlap: usize,
}

impl SplitConfig {
    /// Creates a new split configuration.
    #[must_use]
    pub const fn new(budget: usize, overlap: usize) -> Self {
        Self { budget, overlap }
    }

    /// Creates a configuration with no overlap.
    #[must_use]
    pub const fn with_budget(budget: usize) -> Self {
        Self { budget, overlap: 0 }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the budget is zero or the overlap is not smaller
    /// than the budget.
    pub fn validate(&self) -> Result<()> {
        if self.budget == 0 {
            return Err(ChunkingError::InvalidConfig {
                reason: "budget must be > 0".to_string(),
            }
            .into());
        }
        if self.overlap >= self.budget {
            return Err(ChunkingError::OverlapTooLarge {
                overlap: self.overlap,
                budget: self.budget,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self::new(super::DEFAULT_CHUNK_BUDGET, super::DEFAULT_OVERLAP)
    }
}
