//! Command-line interface for cover-guard.
//!
//! Checks a library once, watches it for changes, or shows the effective
//! configuration.

mod commands;

pub use commands::{Cli, Commands, OutputFormat, run_command};
