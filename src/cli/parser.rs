//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DEFAULT_TIMEOUT_SECS, OpenAiSettings, SummariserConfig};
use crate::error::Result;

/// precis: adaptive summarisation of long web text.
///
/// Short inputs are summarised in one model call; long inputs are split,
/// summarised chunk by chunk and combined.
#[derive(Parser, Debug)]
#[command(name = "precis")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Configuration overrides.
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags layered over the configuration file.
#[derive(Args, Debug, Default, Clone)]
pub struct SettingsArgs {
    /// JSON configuration file.
    #[arg(short, long, env = "PRECIS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Model for map, combine, reflect and ordinary stuff calls.
    #[arg(short, long, env = "PRECIS_MODEL", global = true)]
    pub model: Option<String>,

    /// Model for stuff calls above the large-context threshold.
    #[arg(long, env = "PRECIS_LARGE_CONTEXT_MODEL", global = true)]
    pub large_context_model: Option<String>,

    /// Largest input (tokens) summarised in a single call.
    #[arg(long, env = "PRECIS_STUFF_CEILING", global = true)]
    pub stuff_ceiling: Option<usize>,

    /// Token budget per map chunk.
    #[arg(long, env = "PRECIS_CHUNK_BUDGET", global = true)]
    pub chunk_budget: Option<usize>,

    /// Tokens repeated between neighbouring chunks.
    #[arg(long, env = "PRECIS_CHUNK_OVERLAP", global = true)]
    pub chunk_overlap: Option<usize>,

    /// Refuse inputs above this many tokens.
    #[arg(long, env = "PRECIS_MAX_TOKENS", global = true)]
    pub max_tokens: Option<usize>,

    /// Use the large-context model for stuff inputs above this many tokens.
    #[arg(long, env = "PRECIS_LARGE_CONTEXT_THRESHOLD", global = true)]
    pub large_context_threshold: Option<usize>,

    /// Maximum map calls in flight.
    #[arg(long, env = "PRECIS_CONCURRENCY", global = true)]
    pub concurrency: Option<usize>,

    /// Sampling temperature.
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// API base URL of the OpenAI-compatible provider.
    #[arg(long, env = "OPENAI_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// Per-call timeout in seconds.
    #[arg(long, env = "PRECIS_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout: u64,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarise a document.
    ///
    /// Reads from stdin when no file is given.
    #[command(alias = "summarize")]
    Summarise {
        /// Path to the document.
        file: Option<PathBuf>,

        /// Refine the summary against the source afterwards.
        #[arg(short, long)]
        reflect: bool,
    },

    /// Refine an existing summary against its source.
    Reflect {
        /// The summary to refine.
        #[arg(short, long)]
        summary: String,

        /// Path to the source document (stdin when omitted).
        file: Option<PathBuf>,
    },

    /// Count model tokens in a document.
    Tokens {
        /// Path to the document.
        file: Option<PathBuf>,

        /// Count the text as-is instead of after normalisation.
        #[arg(long)]
        raw: bool,
    },

    /// Strip markup and escapes, printing the normalised text.
    #[command(alias = "normalise")]
    Normalize {
        /// Path to the document.
        file: Option<PathBuf>,
    },

    /// Show the strategy and chunk plan without calling the model.
    Plan {
        /// Path to the document.
        file: Option<PathBuf>,
    },

    /// Print the effective configuration.
    Config,
}

impl SettingsArgs {
    /// Builds the effective configuration: defaults, then the config file,
    /// then individual flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the result
    /// does not validate.
    pub fn summariser_config(&self) -> Result<SummariserConfig> {
        let mut config = match &self.config {
            Some(path) => SummariserConfig::from_json_file(path)?,
            None => SummariserConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overlays the flags that were given onto `config`.
    pub fn apply(&self, config: &mut SummariserConfig) {
        if let Some(model) = &self.model {
            config.default_model.clone_from(model);
        }
        if let Some(model) = &self.large_context_model {
            config.large_context_model.clone_from(model);
        }
        if let Some(ceiling) = self.stuff_ceiling {
            config.stuff_token_ceiling = ceiling;
        }
        if let Some(budget) = self.chunk_budget {
            config.map_reduce_chunk_budget = budget;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.chunk_overlap_tokens = overlap;
        }
        if let Some(max) = self.max_tokens {
            config.absolute_token_ceiling = Some(max);
        }
        if let Some(threshold) = self.large_context_threshold {
            config.large_context_threshold = Some(threshold);
        }
        if let Some(concurrency) = self.concurrency {
            config.map_concurrency = concurrency;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
    }

    /// Returns the provider settings.
    #[must_use]
    pub fn openai_settings(&self) -> OpenAiSettings {
        OpenAiSettings {
            api_base: self.api_base.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use clap::CommandFactory;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_summarise_with_flags() {
        let cli = Cli::try_parse_from([
            "precis",
            "summarise",
            "doc.html",
            "--reflect",
            "--max-tokens",
            "40000",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.format, "json");
        assert_eq!(cli.settings.max_tokens, Some(40_000));
        assert!(matches!(
            cli.command,
            Commands::Summarise { ref file, reflect: true }
                if file.as_deref() == Some(Path::new("doc.html"))
        ));
    }

    #[test]
    fn test_summarize_alias() {
        let cli = Cli::try_parse_from(["precis", "summarize"]).unwrap();
        assert!(matches!(cli.command, Commands::Summarise { file: None, .. }));
    }

    #[test]
    fn test_reflect_requires_summary() {
        assert!(Cli::try_parse_from(["precis", "reflect", "doc.txt"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let args = SettingsArgs {
            model: Some("gpt-4".to_string()),
            chunk_budget: Some(2_000),
            chunk_overlap: Some(20),
            max_tokens: Some(50_000),
            concurrency: Some(8),
            ..SettingsArgs::default()
        };
        let mut config = SummariserConfig::default();
        args.apply(&mut config);

        assert_eq!(config.default_model, "gpt-4");
        assert_eq!(config.map_reduce_chunk_budget, 2_000);
        assert_eq!(config.chunk_overlap_tokens, 20);
        assert_eq!(config.absolute_token_ceiling, Some(50_000));
        assert_eq!(config.map_concurrency, 8);
        assert_eq!(config.large_context_model, "gpt-3.5-turbo-16k");
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("precis.json");
        std::fs::write(&path, r#"{"stuff_token_ceiling": 3000, "map_concurrency": 2}"#).unwrap();

        let args = SettingsArgs {
            config: Some(path),
            concurrency: Some(6),
            ..SettingsArgs::default()
        };
        let config = args.summariser_config().unwrap();

        assert_eq!(config.stuff_token_ceiling, 3_000);
        assert_eq!(config.map_concurrency, 6);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = SettingsArgs {
            chunk_budget: Some(10),
            chunk_overlap: Some(10),
            ..SettingsArgs::default()
        };
        assert!(matches!(
            args.summariser_config().unwrap_err(),
            Error::Config { .. }
        ));
    }

    #[test]
    fn test_openai_settings() {
        let args = SettingsArgs {
            api_base: Some("http://localhost:8080/v1".to_string()),
            timeout: 15,
            ..SettingsArgs::default()
        };
        let settings = args.openai_settings();
        assert_eq!(settings.api_base.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(settings.timeout_secs, 15);
    }
}
