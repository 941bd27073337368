//! Token estimation for budget checks.
//!
//! Budgets are expressed in model tokens, so every length measurement in the
//! crate goes through a [`TokenCounter`]. The production implementation,
//! [`TokenEstimator`], encodes with the BPE vocabulary of the target model
//! family so the count matches what the provider bills.

mod estimator;

pub use estimator::TokenEstimator;

/// Trait for token counters.
///
/// Implementations must be deterministic for a given input and thread-safe
/// (`Send + Sync`) so chunk pieces can be measured in parallel.
pub trait TokenCounter: Send + Sync {
    /// Returns the number of tokens `text` occupies. `""` counts as zero.
    fn count(&self, text: &str) -> usize;

    /// Returns a short name for logs and CLI output.
    fn name(&self) -> &str;
}

impl<T: TokenCounter + ?Sized> TokenCounter for std::sync::Arc<T> {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Counts whitespace-separated words as tokens.
///
/// Cheap and predictable; useful for tests and for dry runs where the exact
/// provider tokenizer does not matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn name(&self) -> &str {
        "words"
    }
}
