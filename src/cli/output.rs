//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::agent::{Plan, Strategy};
use crate::config::SummariserConfig;
use crate::error::Error;
use crate::io::truncate_graphemes;
use serde::Serialize;
use std::fmt::Write;

/// Graphemes of chunk preview shown per line in text plans.
const PLAN_PREVIEW_GRAPHEMES: usize = 40;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Token count for one document.
#[derive(Debug, Clone, Serialize)]
pub struct TokenReport {
    /// Model whose tokenizer was used.
    pub model: String,
    /// Tokenizer family.
    pub encoding: String,
    /// Tokens counted.
    pub tokens: usize,
    /// Bytes counted.
    pub bytes: usize,
    /// Whether the text was normalised first.
    pub normalised: bool,
}

/// Formats a summary.
#[must_use]
pub fn format_summary(summary: &str, reflected: bool, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{}\n", summary.trim_end()),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct SummaryOutput<'a> {
                summary: &'a str,
                reflected: bool,
            }
            format_json(&SummaryOutput { summary, reflected })
        }
    }
}

/// Formats a token count.
#[must_use]
pub fn format_tokens(report: &TokenReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!(
            "{} tokens ({} bytes, {} / {})\n",
            report.tokens, report.bytes, report.model, report.encoding
        ),
        OutputFormat::Json => format_json(report),
    }
}

/// Formats normalised text.
#[must_use]
pub fn format_normalized(text: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => text.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct NormalizedOutput<'a> {
                text: &'a str,
                bytes: usize,
            }
            format_json(&NormalizedOutput {
                text,
                bytes: text.len(),
            })
        }
    }
}

/// Formats a summarisation plan.
#[must_use]
pub fn format_plan(plan: &Plan, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_plan_text(plan),
        OutputFormat::Json => format_json(plan),
    }
}

fn format_plan_text(plan: &Plan) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Tokens:    {}", plan.tokens);
    let _ = writeln!(output, "Bytes:     {}", plan.normalised_bytes);

    match &plan.strategy {
        Strategy::Stuff { model } => {
            let _ = writeln!(output, "Strategy:  stuff ({model})");
        }
        Strategy::MapReduce => {
            let _ = writeln!(
                output,
                "Strategy:  map_reduce ({} chunks, {} calls)",
                plan.chunks.len(),
                plan.chunks.len() + 1
            );
        }
        Strategy::Refuse { tokens, ceiling } => {
            let _ = writeln!(output, "Strategy:  refuse ({tokens} > {ceiling})");
        }
    }

    if plan.chunks.is_empty() {
        return output;
    }

    output.push('\n');
    let _ = writeln!(
        output,
        "{:<6} {:<20} {:<8} {:<8} Preview",
        "Index", "Bytes", "Tokens", "Overlap"
    );
    output.push_str(&"-".repeat(70));
    output.push('\n');

    for chunk in &plan.chunks {
        let flag = if chunk.oversized { "!" } else { "" };
        let preview = truncate_graphemes(&chunk.preview, PLAN_PREVIEW_GRAPHEMES).replace('\n', " ");
        let _ = writeln!(
            output,
            "{:<6} {:<20} {:<8} {:<8} {preview}",
            chunk.index,
            format!("{}..{}", chunk.start, chunk.end),
            format!("{}{flag}", chunk.tokens),
            chunk.overlap,
        );
    }

    output
}

/// Formats the effective configuration.
#[must_use]
pub fn format_config(config: &SummariserConfig, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let optional = |v: Option<usize>| v.map_or_else(|| "none".to_string(), |v| v.to_string());
            let mut output = String::new();
            let _ = writeln!(output, "default_model:           {}", config.default_model);
            let _ = writeln!(output, "large_context_model:     {}", config.large_context_model);
            let _ = writeln!(output, "stuff_token_ceiling:     {}", config.stuff_token_ceiling);
            let _ = writeln!(output, "map_reduce_chunk_budget: {}", config.map_reduce_chunk_budget);
            let _ = writeln!(output, "chunk_overlap_tokens:    {}", config.chunk_overlap_tokens);
            let _ = writeln!(
                output,
                "absolute_token_ceiling:  {}",
                optional(config.absolute_token_ceiling)
            );
            let _ = writeln!(
                output,
                "large_context_threshold: {}",
                optional(config.large_context_threshold)
            );
            let _ = writeln!(output, "temperature:             {}", config.temperature);
            let _ = writeln!(output, "map_concurrency:         {}", config.map_concurrency);
            output
        }
        OutputFormat::Json => format_json(config),
    }
}

/// Formats an error for output.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
                kind: &'static str,
            }
            format_json(&ErrorOutput {
                error: error.to_string(),
                kind: error_kind(error),
            })
        }
    }
}

const fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::Config { .. } => "config",
        Error::Provider(_) => "provider",
        Error::TextTooLong { .. } => "text_too_long",
        Error::Chunking(_) => "chunking",
        Error::Io(_) => "io",
        Error::Command(_) => "command",
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
