//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Only `summarise` and
//! `reflect` reach the completion provider; the rest work offline.

use std::path::Path;

use crate::agent::{OpenAiClient, Summariser};
use crate::cli::output::{
    OutputFormat, TokenReport, format_config, format_normalized, format_plan, format_summary,
    format_tokens,
};
use crate::cli::parser::{Cli, Commands, SettingsArgs};
use crate::error::{CommandError, Result};
use crate::io::read_input;
use crate::text::normalize;
use crate::tokens::TokenEstimator;

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let settings = &cli.settings;

    match &cli.command {
        Commands::Summarise { file, reflect } => {
            cmd_summarise(settings, file.as_deref(), *reflect, format)
        }
        Commands::Reflect { summary, file } => {
            cmd_reflect(settings, summary, file.as_deref(), format)
        }
        Commands::Tokens { file, raw } => cmd_tokens(settings, file.as_deref(), *raw, format),
        Commands::Normalize { file } => cmd_normalize(file.as_deref(), format),
        Commands::Plan { file } => cmd_plan(settings, file.as_deref(), format),
        Commands::Config => cmd_config(settings, format),
    }
}

fn summariser(settings: &SettingsArgs) -> Result<Summariser<OpenAiClient>> {
    let config = settings.summariser_config()?;
    let client = OpenAiClient::new(&settings.openai_settings());
    Summariser::new(client, config)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CommandError::ExecutionFailed(format!("failed to start runtime: {e}")).into())
}

fn cmd_summarise(
    settings: &SettingsArgs,
    file: Option<&Path>,
    reflect: bool,
    format: OutputFormat,
) -> Result<String> {
    let summariser = summariser(settings)?;
    let text = read_input(file)?;

    let summary = runtime()?.block_on(async {
        if reflect {
            summariser.summarise_with_reflection(&text).await
        } else {
            summariser.summarise(&text).await
        }
    })?;

    Ok(format_summary(&summary, reflect, format))
}

fn cmd_reflect(
    settings: &SettingsArgs,
    summary: &str,
    file: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    if summary.trim().is_empty() {
        return Err(CommandError::InvalidArgument("summary must not be empty".to_string()).into());
    }

    let summariser = summariser(settings)?;
    let text = read_input(file)?;
    let refined = runtime()?.block_on(summariser.reflect(&text, summary))?;

    Ok(format_summary(&refined, true, format))
}

fn cmd_tokens(
    settings: &SettingsArgs,
    file: Option<&Path>,
    raw: bool,
    format: OutputFormat,
) -> Result<String> {
    let config = settings.summariser_config()?;
    let estimator = TokenEstimator::for_model(&config.default_model)?;

    let input = read_input(file)?;
    let text = if raw { input } else { normalize(&input) };

    let report = TokenReport {
        model: estimator.model().to_string(),
        encoding: estimator.encoding(),
        tokens: estimator.count(&text),
        bytes: text.len(),
        normalised: !raw,
    };
    Ok(format_tokens(&report, format))
}

fn cmd_normalize(file: Option<&Path>, format: OutputFormat) -> Result<String> {
    let text = read_input(file)?;
    Ok(format_normalized(&normalize(&text), format))
}

fn cmd_plan(settings: &SettingsArgs, file: Option<&Path>, format: OutputFormat) -> Result<String> {
    let summariser = summariser(settings)?;
    let text = read_input(file)?;
    let plan = summariser.plan(&text)?;
    Ok(format_plan(&plan, format))
}

fn cmd_config(settings: &SettingsArgs, format: OutputFormat) -> Result<String> {
    let config = settings.summariser_config()?;
    Ok(format_config(&config, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    fn write_doc(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("doc.html");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_cmd_normalize() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "<p>Fish &amp; chips</p>\\n");
        let output = cmd_normalize(Some(&path), OutputFormat::Text).unwrap();
        assert_eq!(output, "Fish & chips\n");
    }

    #[test]
    fn test_cmd_tokens() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "<b>hello world</b>");
        let settings = SettingsArgs::default();

        let output = cmd_tokens(&settings, Some(&path), false, OutputFormat::Text).unwrap();
        assert!(output.starts_with("2 tokens (11 bytes"));

        let raw = cmd_tokens(&settings, Some(&path), true, OutputFormat::Text).unwrap();
        assert!(!raw.starts_with("2 tokens"));
    }

    #[test]
    fn test_cmd_plan_stuff() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "A short page.");
        let output = cmd_plan(&SettingsArgs::default(), Some(&path), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["strategy"]["strategy"], "stuff");
        assert_eq!(value["strategy"]["model"], "gpt-3.5-turbo-1106");
    }

    #[test]
    fn test_cmd_plan_refuse() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, &"word ".repeat(300));
        let settings = SettingsArgs {
            stuff_ceiling: Some(50),
            chunk_budget: Some(40),
            max_tokens: Some(100),
            ..SettingsArgs::default()
        };
        let output = cmd_plan(&settings, Some(&path), OutputFormat::Text).unwrap();
        assert!(output.contains("refuse"));
    }

    #[test]
    fn test_cmd_config_reports_overrides() {
        let settings = SettingsArgs {
            max_tokens: Some(40_000),
            ..SettingsArgs::default()
        };
        let output = cmd_config(&settings, OutputFormat::Text).unwrap();
        assert!(output.contains("absolute_token_ceiling:  40000"));
    }

    #[test]
    fn test_cmd_reflect_rejects_empty_summary() {
        let err = cmd_reflect(&SettingsArgs::default(), "  ", None, OutputFormat::Text).unwrap_err();
        assert!(matches!(err, Error::Command(CommandError::InvalidArgument(_))));
    }

    #[test]
    fn test_cmd_missing_file() {
        let err = cmd_normalize(Some(Path::new("/nonexistent/doc.html")), OutputFormat::Text)
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
