//! Configuration inspection.

use std::path::{Path, PathBuf};

use crate::config::{self, Config, ConfigError};
use crate::error::Result;

/// Print the config file location and the effective settings.
pub fn cmd_config(path: Option<&Path>, init: bool) -> anyhow::Result<()> {
    let path: PathBuf = match path {
        Some(path) => path.to_path_buf(),
        None => config::config_path().ok_or(ConfigError::NoConfigDir)?,
    };
    let effective = config::load_from(&path);

    if init {
        if write_if_missing(&effective, &path)? {
            eprintln!("Wrote default configuration to {}", path.display());
        } else {
            eprintln!("Config file already exists: {}", path.display());
        }
    }

    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}

/// Save `effective` to `path` unless a file is already there.
fn write_if_missing(effective: &Config, path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    config::save_to(effective, path)?;
    Ok(true)
}
