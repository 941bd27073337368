//! Completion client for OpenAI-compatible chat APIs.

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::debug;

use super::client::{Completion, CompletionClient, UsageRecord};
use crate::config::OpenAiSettings;
use crate::error::ProviderError;

/// [`CompletionClient`] backed by `async-openai`.
///
/// The API key is read from `OPENAI_API_KEY`. Every request is bounded by the
/// configured timeout. The client's built-in retry of HTTP 429 responses is
/// switched off, so a rate limit surfaces as [`ProviderError::RateLimited`].
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    timeout: Duration,
}

impl OpenAiClient {
    /// Creates a client from provider settings.
    #[must_use]
    pub fn new(settings: &OpenAiSettings) -> Self {
        let mut config = OpenAIConfig::new();
        if let Some(base) = &settings.api_base {
            config = config.with_api_base(base);
        }

        Self {
            client: Client::with_config(config).with_backoff(no_retry()),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Backoff policy that gives up on the first transient error.
fn no_retry() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<Completion, ProviderError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .temperature(temperature)
            .messages([message.into()])
            .build()?;

        debug!(model, prompt_bytes = prompt.len(), "sending chat completion");

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| ProviderError::Timeout {
                seconds: self.timeout.as_secs(),
            })??;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse)?;

        let usage = response.usage.map_or_else(
            || UsageRecord::new(response.model.as_str(), 0, 0),
            |u| UsageRecord::new(response.model.as_str(), u.prompt_tokens, u.completion_tokens),
        );

        Ok(Completion { text, usage })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
