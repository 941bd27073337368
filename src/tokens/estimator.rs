//! BPE token estimator backed by `tiktoken-rs`.

use super::TokenCounter;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use tiktoken_rs::CoreBPE;
use tiktoken_rs::tokenizer::{Tokenizer, get_tokenizer};

/// Loaded vocabularies, one per tokenizer family.
///
/// Building a `CoreBPE` parses the whole vocabulary, so it is done once per
/// process and shared.
static VOCABULARIES: OnceLock<Mutex<HashMap<String, Arc<CoreBPE>>>> = OnceLock::new();

fn vocabulary(tokenizer: Tokenizer) -> Result<Arc<CoreBPE>> {
    let cache = VOCABULARIES.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache
        .lock()
        .map_err(|_| Error::config("tokenizer cache poisoned"))?;

    let key = format!("{tokenizer:?}");
    if let Some(bpe) = guard.get(&key) {
        return Ok(Arc::clone(bpe));
    }

    let bpe = tiktoken_rs::get_bpe_from_tokenizer(tokenizer)
        .map_err(|e| Error::config(format!("failed to load {tokenizer:?} vocabulary: {e}")))?;
    let bpe = Arc::new(bpe);
    guard.insert(key, Arc::clone(&bpe));
    Ok(bpe)
}

/// Counts tokens exactly as the target model family's tokenizer would.
///
/// Text is encoded as ordinary text: strings that look like special tokens
/// (`<|endoftext|>`) are counted by their constituent pieces, which never
/// under-counts relative to the provider.
///
/// # Examples
///
/// ```
/// use precis::tokens::{TokenCounter, TokenEstimator};
///
/// let estimator = TokenEstimator::for_model("gpt-3.5-turbo").unwrap();
/// assert_eq!(estimator.count(""), 0);
/// assert!(estimator.count("Hello, world!") > 0);
/// ```
#[derive(Clone)]
pub struct TokenEstimator {
    model: String,
    tokenizer: Tokenizer,
    bpe: Arc<CoreBPE>,
}

impl fmt::Debug for TokenEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEstimator")
            .field("model", &self.model)
            .field("tokenizer", &self.tokenizer)
            .finish_non_exhaustive()
    }
}

impl TokenEstimator {
    /// Creates an estimator for the given model identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the model has no known tokenizer.
    pub fn for_model(model: &str) -> Result<Self> {
        let tokenizer =
            get_tokenizer(model).ok_or_else(|| Error::config(format!("unknown model: {model}")))?;
        let bpe = vocabulary(tokenizer)?;

        Ok(Self {
            model: model.to_string(),
            tokenizer,
            bpe,
        })
    }

    /// Returns the model identifier this estimator was built for.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the tokenizer family name (e.g. `Cl100kBase`).
    #[must_use]
    pub fn encoding(&self) -> String {
        format!("{:?}", self.tokenizer)
    }

    /// Counts the tokens in `text`.
    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_ordinary(text).len()
    }
}

impl TokenCounter for TokenEstimator {
    fn count(&self, text: &str) -> usize {
        Self::count(self, text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
