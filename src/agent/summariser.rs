//! The summarisation orchestrator.
//!
//! Normalises the input, counts its tokens, then either summarises it in one
//! call (stuff), splits it and summarises every chunk before combining the
//! partial summaries (map-reduce), or refuses it. An optional reflection pass
//! checks a summary against its source.

use futures_util::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use tracing::{debug, info};

use super::client::CompletionClient;
use super::prompt::{build_map_prompt, build_reflect_prompt, build_stuff_prompt};
use super::strategy::{Strategy, Thresholds, select_strategy};
use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::SummariserConfig;
use crate::core::Chunk;
use crate::error::{Error, Result};
use crate::text::normalize;
use crate::tokens::TokenEstimator;

/// Bytes of chunk text shown in a plan.
const PREVIEW_BYTES: usize = 60;

/// The completion call a usage record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Whole text in one call.
    Stuff,
    /// One chunk of a long text.
    Map,
    /// Joined map outputs.
    Combine,
    /// Self-reflection over a summary.
    Reflect,
}

impl Stage {
    /// Returns the name logged with usage records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stuff => "stuff",
            Self::Map => "map",
            Self::Combine => "combine",
            Self::Reflect => "reflect",
        }
    }
}

/// One chunk as it would be sent in the map phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkPlan {
    /// Position in the chunk sequence.
    pub index: usize,
    /// Start byte in the normalised text.
    pub start: usize,
    /// End byte (exclusive) in the normalised text.
    pub end: usize,
    /// Estimated tokens.
    pub tokens: usize,
    /// Bytes shared with the previous chunk.
    pub overlap: usize,
    /// True if the chunk exceeds the budget.
    pub oversized: bool,
    /// Leading text of the chunk.
    pub preview: String,
}

impl From<&Chunk> for ChunkPlan {
    fn from(chunk: &Chunk) -> Self {
        Self {
            index: chunk.index,
            start: chunk.start(),
            end: chunk.end(),
            tokens: chunk.token_count,
            overlap: chunk.overlap,
            oversized: chunk.oversized,
            preview: chunk.preview(PREVIEW_BYTES).to_string(),
        }
    }
}

/// What [`Summariser::summarise`] would do with a text, without calling the
/// model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Tokens in the normalised text.
    pub tokens: usize,
    /// Bytes in the normalised text.
    pub normalised_bytes: usize,
    /// Chosen strategy.
    pub strategy: Strategy,
    /// Map-phase chunks; empty unless the strategy is map-reduce.
    pub chunks: Vec<ChunkPlan>,
}

/// Adaptive summariser over a [`CompletionClient`].
///
/// # Examples
///
/// ```no_run
/// use precis::agent::{OpenAiClient, Summariser};
/// use precis::config::{OpenAiSettings, SummariserConfig};
///
/// # async fn run() -> precis::Result<()> {
/// let client = OpenAiClient::new(&OpenAiSettings::default());
/// let summariser = Summariser::new(client, SummariserConfig::default())?;
/// let summary = summariser.summarise("<p>Some long article...</p>").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Summariser<C> {
    client: C,
    config: SummariserConfig,
    thresholds: Thresholds,
    estimator: TokenEstimator,
    chunker: RecursiveChunker<TokenEstimator>,
}

impl<C: CompletionClient> Summariser<C> {
    /// Creates a summariser.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not validate.
    pub fn new(client: C, config: SummariserConfig) -> Result<Self> {
        config.validate()?;
        let estimator = TokenEstimator::for_model(&config.default_model)?;
        let chunker = RecursiveChunker::new(estimator.clone(), config.split_config());

        Ok(Self {
            client,
            thresholds: config.thresholds(),
            config,
            estimator,
            chunker,
        })
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &SummariserConfig {
        &self.config
    }

    /// Returns the completion client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Returns the token estimator for the default model.
    pub const fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    /// Works out the strategy and chunk boundaries for `text`.
    ///
    /// # Errors
    ///
    /// Returns a chunking error if the splitter rejects its configuration.
    pub fn plan(&self, text: &str) -> Result<Plan> {
        let normalised = normalize(text);
        let tokens = self.estimator.count(&normalised);
        let strategy = select_strategy(tokens, &self.thresholds);

        let chunks = if strategy == Strategy::MapReduce {
            self.chunker
                .chunk(&normalised)?
                .iter()
                .map(ChunkPlan::from)
                .collect()
        } else {
            Vec::new()
        };

        Ok(Plan {
            tokens,
            normalised_bytes: normalised.len(),
            strategy,
            chunks,
        })
    }

    /// Summarises `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TextTooLong`] if the normalised text exceeds the
    /// absolute ceiling (no model call is made), or [`Error::Provider`] if any
    /// completion call fails.
    pub async fn summarise(&self, text: &str) -> Result<String> {
        let normalised = normalize(text);
        self.summarise_normalised(&normalised).await
    }

    /// Refines `summary` so that it only keeps what `text` states.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if the completion call fails.
    pub async fn reflect(&self, text: &str, summary: &str) -> Result<String> {
        let normalised = normalize(text);
        self.reflect_normalised(&normalised, summary).await
    }

    /// Summarises `text`, then refines the summary against it.
    ///
    /// # Errors
    ///
    /// Fails as [`summarise`](Self::summarise) does, or if the reflection
    /// call fails.
    pub async fn summarise_with_reflection(&self, text: &str) -> Result<String> {
        let normalised = normalize(text);
        let summary = self.summarise_normalised(&normalised).await?;
        self.reflect_normalised(&normalised, &summary).await
    }

    async fn summarise_normalised(&self, text: &str) -> Result<String> {
        let tokens = self.estimator.count(text);
        let strategy = select_strategy(tokens, &self.thresholds);
        debug!(tokens, strategy = strategy.name(), "selected strategy");

        match strategy {
            Strategy::Refuse { tokens, ceiling } => Err(Error::TextTooLong { tokens, ceiling }),
            Strategy::Stuff { model } => {
                let prompt = build_stuff_prompt(text)?;
                self.call(Stage::Stuff, &prompt, &model).await
            }
            Strategy::MapReduce => self.map_reduce(text).await,
        }
    }

    async fn map_reduce(&self, text: &str) -> Result<String> {
        let chunks = self.chunker.chunk(text)?;
        debug!(
            chunks = chunks.len(),
            budget = self.config.map_reduce_chunk_budget,
            overlap = self.config.chunk_overlap_tokens,
            "split text for map phase"
        );

        let prompts = chunks
            .iter()
            .map(|chunk| build_map_prompt(&chunk.content))
            .collect::<Result<Vec<_>>>()?;
        let model = self.config.default_model.as_str();

        // Ordered and bounded; the first error drops every in-flight call.
        let partials: Vec<String> = stream::iter(prompts.iter().enumerate())
            .map(|(index, prompt)| async move {
                debug!(chunk = index, "map call");
                self.call(Stage::Map, prompt, model).await
            })
            .buffered(self.config.map_concurrency)
            .try_collect()
            .await?;

        // The combined input is not re-checked against the stuff ceiling.
        let prompt = build_stuff_prompt(&partials.join("\n"))?;
        self.call(Stage::Combine, &prompt, model).await
    }

    async fn reflect_normalised(&self, text: &str, summary: &str) -> Result<String> {
        let prompt = build_reflect_prompt(text, summary)?;
        self.call(Stage::Reflect, &prompt, &self.config.default_model)
            .await
    }

    async fn call(&self, stage: Stage, prompt: &str, model: &str) -> Result<String> {
        let completion = self
            .client
            .complete(prompt, model, self.config.temperature)
            .await?;

        let usage = &completion.usage;
        info!(
            stage = stage.as_str(),
            provider = self.client.name(),
            model = %usage.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            cost_usd = usage.cost_usd,
            "completion usage"
        );

        Ok(completion.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::client::{Completion, UsageRecord};
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every prompt with a fixed label and records the calls.
    #[derive(Default, Debug)]
    struct Recorder {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for Recorder {
        async fn complete(
            &self,
            prompt: &str,
            model: &str,
            _temperature: f32,
        ) -> std::result::Result<Completion, ProviderError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push((prompt.to_string(), model.to_string()));
            Ok(Completion {
                text: format!("summary {}", calls.len()),
                usage: UsageRecord::new(model, 10, 5),
            })
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    fn small_config() -> SummariserConfig {
        SummariserConfig {
            stuff_token_ceiling: 50,
            map_reduce_chunk_budget: 40,
            chunk_overlap_tokens: 0,
            ..SummariserConfig::default()
        }
    }

    fn long_text() -> String {
        (0..6)
            .map(|i| format!("Paragraph {i} {}", "word ".repeat(25).trim_end()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SummariserConfig {
            map_concurrency: 0,
            ..SummariserConfig::default()
        };
        let err = Summariser::new(Recorder::default(), config).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_plan_short_text_is_stuff() {
        let summariser = Summariser::new(Recorder::default(), small_config()).unwrap();
        let plan = summariser.plan("<p>Short &amp; sweet.</p>").unwrap();
        assert_eq!(
            plan.strategy,
            Strategy::Stuff {
                model: "gpt-3.5-turbo-1106".to_string()
            }
        );
        assert!(plan.chunks.is_empty());
        assert_eq!(plan.normalised_bytes, "Short & sweet.".len());
        assert!(summariser.client().calls().is_empty());
    }

    #[test]
    fn test_plan_long_text_lists_chunks() {
        let summariser = Summariser::new(Recorder::default(), small_config()).unwrap();
        let plan = summariser.plan(&long_text()).unwrap();
        assert_eq!(plan.strategy, Strategy::MapReduce);
        assert!(plan.chunks.len() >= 2);
        assert!(plan.chunks.iter().all(|c| c.tokens <= 40));
        assert!(plan.chunks[0].preview.starts_with("Paragraph 0"));
    }

    #[tokio::test]
    async fn test_stuff_makes_one_call() {
        let summariser = Summariser::new(Recorder::default(), small_config()).unwrap();
        let summary = summariser.summarise("<b>Hello</b> world").await.unwrap();

        assert_eq!(summary, "summary 1");
        let calls = summariser.client().calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains("TEXT:Hello world\n"));
        assert_eq!(calls[0].1, "gpt-3.5-turbo-1106");
    }

    #[tokio::test]
    async fn test_map_reduce_calls_per_chunk_plus_combine() {
        let summariser = Summariser::new(Recorder::default(), small_config()).unwrap();
        let text = long_text();
        let chunks = summariser.plan(&text).unwrap().chunks.len();

        summariser.summarise(&text).await.unwrap();

        let calls = summariser.client().calls();
        assert_eq!(calls.len(), chunks + 1);
        let combine = &calls[chunks].0;
        assert!(combine.contains("Do not repeat"));
        assert!(combine.contains("summary 1\n"));
    }

    #[tokio::test]
    async fn test_refusal_makes_no_calls() {
        let config = SummariserConfig {
            absolute_token_ceiling: Some(60),
            ..small_config()
        };
        let summariser = Summariser::new(Recorder::default(), config).unwrap();
        let err = summariser.summarise(&long_text()).await.unwrap_err();

        assert!(err.is_refusal());
        assert!(matches!(err, Error::TextTooLong { ceiling: 60, .. }));
        assert!(summariser.client().calls().is_empty());
    }

    #[tokio::test]
    async fn test_reflect_sends_text_and_summary() {
        let summariser = Summariser::new(Recorder::default(), small_config()).unwrap();
        let refined = summariser
            .reflect("<i>Source</i> text", "- a point")
            .await
            .unwrap();

        assert_eq!(refined, "summary 1");
        let calls = summariser.client().calls();
        assert!(calls[0].0.contains("TEXT:Source text\n"));
        assert!(calls[0].0.contains("SUMMARY:- a point\n"));
    }

    #[tokio::test]
    async fn test_summarise_with_reflection_chains_calls() {
        let summariser = Summariser::new(Recorder::default(), small_config()).unwrap();
        let result = summariser
            .summarise_with_reflection("Short text.")
            .await
            .unwrap();

        assert_eq!(result, "summary 2");
        let calls = summariser.client().calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].0.contains("SUMMARY:summary 1\n"));
        assert!(calls[1].0.contains("TEXT:Short text.\n"));
    }

    #[tokio::test]
    async fn test_large_context_model_for_big_stuff() {
        let config = SummariserConfig {
            large_context_threshold: Some(3),
            ..small_config()
        };
        let summariser = Summariser::new(Recorder::default(), config).unwrap();
        summariser
            .summarise("one two three four five six")
            .await
            .unwrap();

        assert_eq!(summariser.client().calls()[0].1, "gpt-3.5-turbo-16k");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Stuff.as_str(), "stuff");
        assert_eq!(Stage::Map.as_str(), "map");
        assert_eq!(Stage::Combine.as_str(), "combine");
        assert_eq!(Stage::Reflect.as_str(), "reflect");
    }
}
