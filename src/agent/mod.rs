//! Adaptive summarisation over a language model.
//!
//! - [`prompt`]: the versioned map, stuff and self-reflect templates
//! - [`client`]: the [`CompletionClient`] capability and usage records
//! - [`openai`]: a client for OpenAI-compatible chat APIs
//! - [`strategy`]: the pure stuff / map-reduce / refuse decision
//! - [`summariser`]: the orchestrator tying them together

pub mod client;
pub mod openai;
pub mod prompt;
pub mod strategy;
pub mod summariser;

pub use client::{Completion, CompletionClient, UsageRecord, estimate_cost, price_per_1k};
pub use openai::OpenAiClient;
pub use prompt::{PromptTemplate, TemplateId, render};
pub use strategy::{Strategy, Thresholds, select_strategy};
pub use summariser::{ChunkPlan, Plan, Stage, Summariser};
