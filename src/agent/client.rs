//! The completion capability the summariser depends on.
//!
//! A [`CompletionClient`] executes one prompt against a named model and
//! reports what it cost. Provider specifics (HTTP, auth, retries) live in
//! implementations such as [`OpenAiClient`](super::OpenAiClient).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ProviderError;

/// Generated text plus the usage it incurred.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Generated text.
    pub text: String,
    /// Token usage and cost estimate for the call.
    pub usage: UsageRecord,
}

/// Token usage for one completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    /// Model that served the call.
    pub model: String,
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated.
    pub completion_tokens: u32,
    /// Prompt plus completion tokens.
    pub total_tokens: u32,
    /// Estimated cost in US dollars; zero for unpriced models.
    pub cost_usd: f64,
}

impl UsageRecord {
    /// Builds a record and prices it from the static table.
    #[must_use]
    pub fn new(model: impl Into<String>, prompt_tokens: u32, completion_tokens: u32) -> Self {
        let model = model.into();
        let cost_usd = estimate_cost(&model, prompt_tokens, completion_tokens);
        Self {
            model,
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
            cost_usd,
        }
    }
}

/// USD per 1K (prompt, completion) tokens. More specific prefixes first.
const PRICES: &[(&str, f64, f64)] = &[
    ("gpt-3.5-turbo-16k", 0.003, 0.004),
    ("gpt-3.5-turbo-1106", 0.001, 0.002),
    ("gpt-3.5-turbo-0125", 0.0005, 0.0015),
    ("gpt-3.5-turbo", 0.0015, 0.002),
    ("gpt-4o-mini", 0.000_15, 0.0006),
    ("gpt-4o", 0.0025, 0.01),
    ("gpt-4-turbo", 0.01, 0.03),
    ("gpt-4-32k", 0.06, 0.12),
    ("gpt-4", 0.03, 0.06),
];

/// Returns the (prompt, completion) price per 1K tokens for `model`.
#[must_use]
pub fn price_per_1k(model: &str) -> Option<(f64, f64)> {
    PRICES
        .iter()
        .find(|(prefix, _, _)| model.starts_with(prefix))
        .map(|&(_, prompt, completion)| (prompt, completion))
}

/// Estimates the cost of a call in US dollars.
#[must_use]
pub fn estimate_cost(model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
    price_per_1k(model).map_or(0.0, |(prompt, completion)| {
        (f64::from(prompt_tokens) * prompt + f64::from(completion_tokens) * completion) / 1000.0
    })
}

/// Executes prompts against a language model.
///
/// Implementations must be safe to call concurrently; the map phase issues
/// several calls at once.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Runs `prompt` against `model`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the call fails or times out.
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<Completion, ProviderError>;

    /// Returns a short provider name for logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<Completion, ProviderError> {
        (**self).complete(prompt, model, temperature).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
