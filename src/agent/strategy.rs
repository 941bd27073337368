//! Strategy selection.
//!
//! A pure function of the normalised token count and the configured
//! thresholds, kept separate from the orchestrator so the branch boundaries
//! can be tested without a completion client.

use serde::Serialize;

/// Token thresholds and models that drive [`select_strategy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thresholds {
    /// Inputs at or below this many tokens are stuffed into one call.
    pub stuff_token_ceiling: usize,
    /// Inputs above this many tokens are refused.
    pub absolute_token_ceiling: Option<usize>,
    /// Stuff inputs above this many tokens use the large-context model.
    pub large_context_threshold: Option<usize>,
    /// Model for ordinary stuff calls.
    pub default_model: String,
    /// Model for stuff calls above the large-context threshold.
    pub large_context_model: String,
}

/// How a text of a given size is summarised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    /// One call with the whole text.
    Stuff {
        /// Model to call.
        model: String,
    },
    /// Split, summarise every chunk, then combine.
    MapReduce,
    /// Too long to summarise at all.
    Refuse {
        /// Estimated tokens in the input.
        tokens: usize,
        /// Ceiling that was exceeded.
        ceiling: usize,
    },
}

impl Strategy {
    /// Returns the short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Stuff { .. } => "stuff",
            Self::MapReduce => "map_reduce",
            Self::Refuse { .. } => "refuse",
        }
    }
}

/// Chooses the strategy for a normalised text of `tokens` tokens.
///
/// # Examples
///
/// ```
/// use precis::agent::strategy::{Strategy, Thresholds, select_strategy};
///
/// let thresholds = Thresholds {
///     stuff_token_ceiling: 100,
///     absolute_token_ceiling: Some(1000),
///     large_context_threshold: None,
///     default_model: "gpt-3.5-turbo".into(),
///     large_context_model: "gpt-3.5-turbo-16k".into(),
/// };
/// assert!(matches!(select_strategy(100, &thresholds), Strategy::Stuff { .. }));
/// assert_eq!(select_strategy(101, &thresholds), Strategy::MapReduce);
/// assert!(matches!(select_strategy(1001, &thresholds), Strategy::Refuse { .. }));
/// ```
#[must_use]
pub fn select_strategy(tokens: usize, thresholds: &Thresholds) -> Strategy {
    if let Some(ceiling) = thresholds.absolute_token_ceiling
        && tokens > ceiling
    {
        return Strategy::Refuse { tokens, ceiling };
    }

    if tokens > thresholds.stuff_token_ceiling {
        return Strategy::MapReduce;
    }

    let large = thresholds
        .large_context_threshold
        .is_some_and(|threshold| tokens > threshold);
    let model = if large {
        &thresholds.large_context_model
    } else {
        &thresholds.default_model
    };

    Strategy::Stuff {
        model: model.clone(),
    }
}
