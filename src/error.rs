//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`
//! ([`ConfigError`](crate::config::ConfigError),
//! [`WatchError`](crate::scanner::WatchError),
//! [`RenderError`](crate::report::RenderError)). The command layer collects
//! them into [`Error`], and the binary hands that to `anyhow`.
//!
//! Note that the tracker itself never returns errors: every I/O-adjacent
//! failure is converted into a [`CoverStatus`](crate::tracker::CoverStatus)
//! or logged where it happens.

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tag reading error
    #[error("Metadata error for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// File watcher error
    #[error("Watch error: {0}")]
    Watch(#[from] crate::scanner::WatchError),

    /// Report rendering error
    #[error("Render error: {0}")]
    Render(#[from] crate::report::RenderError),

    /// File or directory not found
    #[error("Not found: {0}")]
    NotFound(PathBuf),
}

impl Error {
    /// Create a metadata error.
    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("/music/album");
        assert!(err.to_string().contains("/music/album"));
    }

    #[test]
    fn test_metadata_error() {
        let err = Error::metadata("/music/song.flac", "no tags");
        let msg = err.to_string();
        assert!(msg.contains("song.flac"));
        assert!(msg.contains("no tags"));
    }

    #[test]
    fn test_module_errors_convert() {
        let err = Error::from(crate::scanner::WatchError::Watch("gone".into()));
        assert!(err.to_string().starts_with("Watch error:"));

        let err = Error::from(std::io::Error::other("disk gone"));
        assert!(err.to_string().contains("disk gone"));
    }
}
