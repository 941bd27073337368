//! Error types for precis operations.
//!
//! This module provides the error hierarchy using `thiserror` for
//! normalisation, token estimation, chunking, completion calls and the CLI.
//!
//! [`Error::TextTooLong`] is a deliberate refusal rather than a failure; use
//! [`Error::is_refusal`] to tell it apart from provider or configuration
//! failures.

use thiserror::Error;

/// Result type alias for precis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (unknown model, bad template variables, bad thresholds).
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// The completion provider failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The input exceeds the absolute token ceiling and was refused.
    #[error("text too long: {tokens} tokens exceeds the ceiling of {ceiling}")]
    TextTooLong {
        /// Estimated token count of the normalised input.
        tokens: usize,
        /// Configured absolute ceiling.
        ceiling: usize,
    },

    /// Chunking-related errors (splitter configuration).
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),
}

impl Error {
    /// Builds a configuration error from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true for the deliberate "text too long" refusal.
    #[must_use]
    pub const fn is_refusal(&self) -> bool {
        matches!(self, Self::TextTooLong { .. })
    }
}

/// Failures reported by a completion client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider answered with an API error (auth, invalid request, ...).
    #[error("API error: {0}")]
    Api(String),

    /// The request never completed (network, TLS, decoding).
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider rejected the call for rate or quota reasons.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The call did not complete within the client's timeout.
    #[error("completion timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed, in seconds.
        seconds: u64,
    },

    /// The provider returned no choices or no message content.
    #[error("provider returned an empty completion")]
    EmptyResponse,
}

/// Chunking-specific errors.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid chunk configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Overlap exceeds chunk budget.
    #[error("overlap {overlap} must be less than chunk budget {budget}")]
    OverlapTooLarge {
        /// Overlap in tokens.
        overlap: usize,
        /// Budget in tokens.
        budget: usize,
    },
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),

    /// Output format error.
    #[error("output format error: {0}")]
    OutputFormat(String),
}

// Implement From traits for standard library and third-party errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::config(format!("invalid JSON: {err}"))
    }
}

impl From<async_openai::error::OpenAIError> for ProviderError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        use async_openai::error::OpenAIError;

        match err {
            OpenAIError::ApiError(api) => {
                let code = api.code.clone().unwrap_or_default();
                let kind = api.r#type.clone().unwrap_or_default();
                if code.contains("rate_limit")
                    || code.contains("insufficient_quota")
                    || kind.contains("rate_limit")
                {
                    Self::RateLimited(api.message)
                } else {
                    Self::Api(api.message)
                }
            }
            OpenAIError::Reqwest(e) => Self::Transport(e.to_string()),
            OpenAIError::JSONDeserialize(e) => Self::Transport(e.to_string()),
            other => Self::Api(other.to_string()),
        }
    }
}

impl From<async_openai::error::OpenAIError> for Error {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::Provider(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("unknown model: gpt-9");
        assert_eq!(err.to_string(), "configuration error: unknown model: gpt-9");
    }

    #[test]
    fn test_text_too_long_display() {
        let err = Error::TextTooLong {
            tokens: 10_001,
            ceiling: 10_000,
        };
        assert_eq!(
            err.to_string(),
            "text too long: 10001 tokens exceeds the ceiling of 10000"
        );
    }

    #[test]
    fn test_refusal_is_distinguishable() {
        let refusal = Error::TextTooLong {
            tokens: 2,
            ceiling: 1,
        };
        assert!(refusal.is_refusal());

        let failure: Error = ProviderError::Timeout { seconds: 30 }.into();
        assert!(!failure.is_refusal());
        assert!(!Error::config("x").is_refusal());
    }

    #[test]
    fn test_provider_error_variants() {
        let err = ProviderError::Api("invalid key".to_string());
        assert!(err.to_string().contains("invalid key"));

        let err = ProviderError::Transport("connection reset".to_string());
        assert!(err.to_string().contains("transport"));

        let err = ProviderError::RateLimited("slow down".to_string());
        assert!(err.to_string().contains("rate limited"));

        let err = ProviderError::Timeout { seconds: 60 };
        assert_eq!(err.to_string(), "completion timed out after 60s");

        assert_eq!(
            ProviderError::EmptyResponse.to_string(),
            "provider returned an empty completion"
        );
    }

    #[test]
    fn test_chunking_error_display() {
        let err = ChunkingError::OverlapTooLarge {
            overlap: 100,
            budget: 50,
        };
        assert_eq!(
            err.to_string(),
            "overlap 100 must be less than chunk budget 50"
        );

        let err = ChunkingError::InvalidConfig {
            reason: "budget must be > 0".to_string(),
        };
        assert!(err.to_string().contains("budget must be > 0"));
    }

    #[test]
    fn test_io_error_variants() {
        let err = IoError::FileNotFound {
            path: "/tmp/test.txt".to_string(),
        };
        assert_eq!(err.to_string(), "file not found: /tmp/test.txt");

        let err = IoError::ReadFailed {
            path: "/tmp/test".to_string(),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("permission denied"));

        let err = IoError::MmapFailed {
            path: "/tmp/big".to_string(),
            reason: "out of memory".to_string(),
        };
        assert!(err.to_string().contains("memory mapping"));
    }

    #[test]
    fn test_command_error_variants() {
        let err = CommandError::InvalidArgument("--bad".to_string());
        assert!(err.to_string().contains("invalid argument"));

        let err = CommandError::ExecutionFailed("timeout".to_string());
        assert!(err.to_string().contains("execution failed"));

        let err = CommandError::OutputFormat("json error".to_string());
        assert!(err.to_string().contains("output format"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_provider() {
        let err: Error = ProviderError::EmptyResponse.into();
        assert!(matches!(err, Error::Provider(ProviderError::EmptyResponse)));
    }

    #[test]
    fn test_error_from_chunking() {
        let err: Error = ChunkingError::InvalidConfig {
            reason: "zero".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Chunking(_)));
    }

    #[test]
    fn test_from_serde_json_error_is_config() {
        let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_from_openai_api_error() {
        use async_openai::error::{ApiError, OpenAIError};

        let api: ApiError = serde_json::from_value(serde_json::json!({
            "message": "Rate limit reached",
            "type": "requests",
            "param": null,
            "code": "rate_limit_exceeded"
        }))
        .unwrap();
        let err: ProviderError = OpenAIError::ApiError(api).into();
        assert!(matches!(err, ProviderError::RateLimited(_)));

        let api: ApiError = serde_json::from_value(serde_json::json!({
            "message": "Incorrect API key provided",
            "type": "invalid_request_error",
            "param": null,
            "code": "invalid_api_key"
        }))
        .unwrap();
        let err: ProviderError = OpenAIError::ApiError(api).into();
        assert_eq!(
            err,
            ProviderError::Api("Incorrect API key provided".to_string())
        );
    }
}
