//! Chunking for documents that exceed a single request.
//!
//! Text is split on the coarsest natural boundary that keeps every piece
//! within a token budget, then packed back into chunks of up to that budget
//! with a small overlap between neighbours:
//!
//! - **Recursive**: paragraph, line, sentence, word, then grapheme splits,
//!   measured with any [`TokenCounter`](crate::tokens::TokenCounter)

pub mod recursive;
pub mod traits;

pub use recursive::{RecursiveChunker, Separator};
pub use traits::{Chunker, SplitConfig};

use crate::error::Result;
use crate::tokens::TokenEstimator;

/// Default chunk budget in model tokens.
///
/// Matches the stuff ceiling so a single chunk always fits one request.
pub const DEFAULT_CHUNK_BUDGET: usize = 15_000;

/// Default overlap in model tokens.
pub const DEFAULT_OVERLAP: usize = 10;

/// Creates a chunker that measures pieces with the tokenizer of `model`.
///
/// # Errors
///
/// Returns [`crate::Error::Config`] if the model has no known tokenizer, or
/// a chunking error if `config` is invalid.
pub fn chunker_for_model(
    model: &str,
    config: SplitConfig,
) -> Result<RecursiveChunker<TokenEstimator>> {
    config.validate()?;
    let estimator = TokenEstimator::for_model(model)?;
    Ok(RecursiveChunker::new(estimator, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChunkingError, Error};

    #[test]
    fn test_chunker_for_model() {
        let chunker = chunker_for_model("gpt-3.5-turbo", SplitConfig::default()).unwrap();
        assert_eq!(chunker.name(), "recursive");
        assert_eq!(chunker.config().budget, DEFAULT_CHUNK_BUDGET);
    }

    #[test]
    fn test_chunker_for_unknown_model() {
        let err = chunker_for_model("mystery", SplitConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_chunker_for_model_rejects_bad_config() {
        let err = chunker_for_model("gpt-3.5-turbo", SplitConfig::new(10, 10)).unwrap_err();
        assert!(matches!(
            err,
            Error::Chunking(ChunkingError::OverlapTooLarge { .. })
        ));
    }

    #[test]
    fn test_default_overlap_below_budget() {
        assert!(DEFAULT_OVERLAP < DEFAULT_CHUNK_BUDGET);
    }
}
