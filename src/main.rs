//! cover-guard command-line entry point.

use clap::Parser;
use cover_guard::cli;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Used when `RUST_LOG` is unset. Modules log under short targets such as
/// `tracker::debounce`, so those prefixes are listed next to the crate name.
const DEFAULT_FILTER: &str = "cover_guard=info,tracker=info,scanner=info,report=info,service=info,cli=info";

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Logs go to stderr so reports on stdout stay machine-readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run_command(&args)
}
