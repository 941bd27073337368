//! CLI layer for precis.
//!
//! Provides the command-line interface using clap, with commands for
//! summarising, reflecting, counting tokens and inspecting the chunk plan.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, SettingsArgs};
