//! Text preparation ahead of summarisation.

pub mod normalize;

pub use normalize::{decode_entities, normalize, strip_tags, unescape_whitespace};
