//! CLI command definitions and dispatch.
//!
//! Each subcommand lives in its own submodule:
//! - `check`: one-shot scan and report
//! - `watch`: initial scan, then live tracking of file changes
//! - `config`: show or initialise the configuration file

mod check;
mod config;
mod watch;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

pub use check::cmd_check;
pub use config::cmd_config;
pub use watch::cmd_watch;

use crate::config::{self as app_config, Config};
use crate::cover::{FsStat, ImageThumbnailer, LoftyExtractor};
use crate::scanner::{self, AlbumIdentity};
use crate::tracker::FingerprintCache;

/// Warns when the tracks of an album carry different embedded covers
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(long, global = true, env = "COVER_GUARD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory once and report albums with differing covers
    Check {
        /// Library root to scan
        path: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write a PNG thumbnail of every differing cover into this directory
        #[arg(long)]
        thumbnails: Option<PathBuf>,
    },
    /// Scan a directory, then keep reporting as files change
    Watch {
        /// Library root to watch
        path: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file if it doesn't exist yet
        #[arg(long)]
        init: bool,
    },
}

/// Run the parsed command line.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Check {
            path,
            format,
            thumbnails,
        } => {
            let config = load_config(cli.config.as_deref());
            cmd_check(&config, path, *format, thumbnails.as_deref())
        }
        Commands::Watch { path, format } => {
            let config = load_config(cli.config.as_deref());
            let rt = Runtime::new()?;
            cmd_watch(&rt, &config, path, *format)
        }
        Commands::Config { init } => cmd_config(cli.config.as_deref(), *init),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => app_config::load_from(path),
        None => app_config::load(),
    }
}

/// Fingerprint cache reading real files, with thumbnails enabled.
pub(crate) fn library_cache(config: &Config) -> FingerprintCache {
    FingerprintCache::new(LoftyExtractor, FsStat)
        .with_thumbnailer(ImageThumbnailer::new(&config.thumbnail))
}

/// Album identity of `path`, logging files that can't be attributed.
pub(crate) fn identify(path: &Path, config: &Config) -> Option<AlbumIdentity> {
    match scanner::read_album_identity(path, config.library.fallback_to_album_tag) {
        Ok(Some(identity)) => Some(identity),
        Ok(None) => {
            debug!(target: "cli", path = %path.display(), "File has no album identity");
            None
        }
        Err(e) => {
            warn!(target: "cli", path = %path.display(), error = %e, "Failed to read tags");
            None
        }
    }
}
