//! Binary tests for commands that never reach the provider.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "PRECIS_CONFIG",
    "PRECIS_MODEL",
    "PRECIS_LARGE_CONTEXT_MODEL",
    "PRECIS_STUFF_CEILING",
    "PRECIS_CHUNK_BUDGET",
    "PRECIS_CHUNK_OVERLAP",
    "PRECIS_MAX_TOKENS",
    "PRECIS_LARGE_CONTEXT_THRESHOLD",
    "PRECIS_CONCURRENCY",
    "PRECIS_TIMEOUT",
    "RUST_LOG",
];

fn precis() -> Command {
    let mut cmd = Command::cargo_bin("precis").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_normalize_from_stdin() {
    precis()
        .arg("normalize")
        .write_stdin("<p>Fish &amp; chips&nbsp;today</p>")
        .assert()
        .success()
        .stdout("Fish & chips today");
}

#[test]
fn test_tokens_counts_normalised_text() {
    precis()
        .arg("tokens")
        .write_stdin("<b>hello world</b>")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("2 tokens (11 bytes, gpt-3.5-turbo-1106"));
}

#[test]
fn test_tokens_json() {
    precis()
        .args(["--format", "json", "tokens", "--raw"])
        .write_stdin("hello world")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tokens\": 2"))
        .stdout(predicate::str::contains("\"normalised\": false"));
}

#[test]
fn test_plan_for_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("page.html");
    let body = (0..10)
        .map(|i| format!("<p>Paragraph {i}.{}</p>", " word".repeat(60)))
        .collect::<Vec<_>>()
        .join("\\n\\n");
    std::fs::write(&path, body).unwrap();

    precis()
        .args(["plan", "--stuff-ceiling", "200", "--chunk-budget", "150"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Strategy:  map_reduce"))
        .stdout(predicate::str::contains("Paragraph 0"));
}

#[test]
fn test_config_merges_file_and_flags() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("precis.json");
    std::fs::write(&path, r#"{"map_concurrency": 2, "absolute_token_ceiling": 30000}"#).unwrap();

    precis()
        .args(["--format", "json", "config", "--concurrency", "6"])
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"map_concurrency\": 6"))
        .stdout(predicate::str::contains("\"absolute_token_ceiling\": 30000"));
}

#[test]
fn test_invalid_config_fails() {
    precis()
        .args(["config", "--chunk-budget", "10", "--chunk-overlap", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn test_unknown_model_fails() {
    precis()
        .args(["tokens", "--model", "not-a-model"])
        .write_stdin("text")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown model: not-a-model"));
}

#[test]
fn test_refusal_exits_with_distinct_code() {
    precis()
        .args([
            "summarise",
            "--stuff-ceiling",
            "10",
            "--chunk-budget",
            "10",
            "--chunk-overlap",
            "1",
            "--max-tokens",
            "20",
        ])
        .write_stdin("word ".repeat(100))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("text too long"));
}

#[test]
fn test_refusal_json_error_on_stdout() {
    precis()
        .args([
            "--format",
            "json",
            "summarise",
            "--stuff-ceiling",
            "10",
            "--chunk-budget",
            "10",
            "--chunk-overlap",
            "1",
            "--max-tokens",
            "20",
        ])
        .write_stdin("word ".repeat(100))
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"kind\": \"text_too_long\""));
}

#[test]
fn test_missing_file_fails() {
    precis()
        .args(["normalize", "/nonexistent/page.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}
