//! # precis
//!
//! Adaptive summarisation of long web text with a large language model.
//!
//! Input is normalised (markup stripped, entities and escapes decoded) and
//! measured in model tokens. Texts that fit are summarised in a single call;
//! longer texts are split on natural boundaries, each chunk is summarised
//! concurrently, and the partial summaries are combined. An optional
//! self-reflection pass checks the summary against its source.
//!
//! ## Features
//!
//! - **Normalisation**: tag stripping, HTML5 entity decoding, escape handling
//! - **Token estimation**: BPE counts with the target model's vocabulary
//! - **Chunking**: recursive paragraph / line / sentence / word / grapheme splits
//! - **Orchestration**: stuff, map-reduce or refuse, with bounded concurrency

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for memory-mapped I/O (memmap2)
#![warn(unsafe_code)]

pub mod agent;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod text;
pub mod tokens;

// Re-export commonly used types at crate root
pub use error::{Error, ProviderError, Result};

// Re-export core domain types
pub use core::Chunk;

// Re-export the summarisation surface
pub use agent::{
    Completion, CompletionClient, OpenAiClient, Plan, Strategy, Summariser, UsageRecord,
    select_strategy,
};
pub use config::{OpenAiSettings, SummariserConfig};

// Re-export building blocks
pub use chunking::{Chunker, RecursiveChunker, SplitConfig};
pub use text::normalize;
pub use tokens::{TokenCounter, TokenEstimator, WordCounter};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
