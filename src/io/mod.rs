//! Document input and UTF-8 helpers.
//!
//! Large files are memory mapped; stdin is used when no path is given.

pub mod reader;
pub mod unicode;

pub use reader::{FileReader, read_file, read_from, read_input};
pub use unicode::{find_char_boundary, truncate_graphemes};
