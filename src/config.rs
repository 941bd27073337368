//! Summariser and provider configuration.
//!
//! Configuration is plain data: defaults, optionally overlaid by a JSON file,
//! then by individual CLI flags. [`SummariserConfig::validate`] is the single
//! place that decides whether a combination of settings is usable.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::agent::strategy::Thresholds;
use crate::chunking::{DEFAULT_CHUNK_BUDGET, DEFAULT_OVERLAP, SplitConfig};
use crate::error::{Error, Result};
use crate::io::read_file;
use crate::tokens::TokenEstimator;

/// Model used for map, combine, reflect and ordinary stuff calls.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-1106";

/// Model used for stuff calls above the large-context threshold.
pub const LARGE_CONTEXT_MODEL: &str = "gpt-3.5-turbo-16k";

/// Largest normalised input summarised in a single call.
pub const DEFAULT_STUFF_TOKEN_CEILING: usize = 15_000;

/// Default number of map calls in flight.
pub const DEFAULT_MAP_CONCURRENCY: usize = 4;

/// Default per-call timeout for the provider.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for the summarisation orchestrator.
///
/// # Examples
///
/// ```
/// use precis::config::SummariserConfig;
///
/// let config: SummariserConfig =
///     serde_json::from_str(r#"{"stuff_token_ceiling": 3000}"#).unwrap();
/// assert_eq!(config.stuff_token_ceiling, 3000);
/// assert_eq!(config.default_model, "gpt-3.5-turbo-1106");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummariserConfig {
    /// Model for map, combine and reflect calls, and for small stuff calls.
    pub default_model: String,
    /// Model for stuff calls above `large_context_threshold`.
    pub large_context_model: String,
    /// Inputs at or below this many tokens are summarised in one call.
    pub stuff_token_ceiling: usize,
    /// Token budget per map chunk.
    pub map_reduce_chunk_budget: usize,
    /// Tokens of trailing context repeated between chunks.
    pub chunk_overlap_tokens: usize,
    /// Inputs above this many tokens are refused outright.
    pub absolute_token_ceiling: Option<usize>,
    /// Sampling temperature for every call.
    pub temperature: f32,
    /// Maximum map calls in flight.
    pub map_concurrency: usize,
    /// Stuff inputs above this many tokens use `large_context_model`.
    pub large_context_threshold: Option<usize>,
}

impl Default for SummariserConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            large_context_model: LARGE_CONTEXT_MODEL.to_string(),
            stuff_token_ceiling: DEFAULT_STUFF_TOKEN_CEILING,
            map_reduce_chunk_budget: DEFAULT_CHUNK_BUDGET,
            chunk_overlap_tokens: DEFAULT_OVERLAP,
            absolute_token_ceiling: None,
            temperature: 0.0,
            map_concurrency: DEFAULT_MAP_CONCURRENCY,
            large_context_threshold: None,
        }
    }
}

impl SummariserConfig {
    /// Loads a configuration from a JSON file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or
    /// [`Error::Config`] if it is not a valid configuration object.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = read_file(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// Checks that the settings can be used together.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for zero budgets or concurrency, an overlap
    /// that is not below the chunk budget, a temperature outside `0.0..=2.0`,
    /// or a model with no known tokenizer. The two token ceilings are
    /// independent; an absolute ceiling below the stuff ceiling is only
    /// logged.
    pub fn validate(&self) -> Result<()> {
        if self.stuff_token_ceiling == 0 {
            return Err(Error::config("stuff_token_ceiling must be > 0"));
        }
        if self.map_reduce_chunk_budget == 0 {
            return Err(Error::config("map_reduce_chunk_budget must be > 0"));
        }
        if self.chunk_overlap_tokens >= self.map_reduce_chunk_budget {
            return Err(Error::config(format!(
                "chunk_overlap_tokens ({}) must be less than map_reduce_chunk_budget ({})",
                self.chunk_overlap_tokens, self.map_reduce_chunk_budget
            )));
        }
        if let Some(ceiling) = self.absolute_token_ceiling
            && ceiling < self.stuff_token_ceiling
        {
            warn!(
                absolute_token_ceiling = ceiling,
                stuff_token_ceiling = self.stuff_token_ceiling,
                "absolute ceiling below stuff ceiling; inputs above it are refused before stuffing"
            );
        }
        if self.map_concurrency == 0 {
            return Err(Error::config("map_concurrency must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::config(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }

        TokenEstimator::for_model(&self.default_model)?;
        TokenEstimator::for_model(&self.large_context_model)?;
        Ok(())
    }

    /// Returns the thresholds that drive strategy selection.
    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            stuff_token_ceiling: self.stuff_token_ceiling,
            absolute_token_ceiling: self.absolute_token_ceiling,
            large_context_threshold: self.large_context_threshold,
            default_model: self.default_model.clone(),
            large_context_model: self.large_context_model.clone(),
        }
    }

    /// Returns the chunk splitter settings for the map phase.
    #[must_use]
    pub const fn split_config(&self) -> SplitConfig {
        SplitConfig::new(self.map_reduce_chunk_budget, self.chunk_overlap_tokens)
    }
}

/// Settings for the OpenAI-compatible completion client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenAiSettings {
    /// API base URL; the provider default when unset.
    pub api_base: Option<String>,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_base: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
