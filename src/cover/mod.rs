//! Access to embedded cover art and the file facts the tracker depends on.
//!
//! The tracker never talks to the file system or a tag library directly.
//! It goes through three small capabilities so hosts and tests can swap them:
//!
//! - [`PictureExtractor`]: raw bytes of the first embedded front cover
//! - [`FileStat`]: modification time and size of a file
//! - [`ThumbnailRenderer`]: a small PNG preview of a cover picture
//!
//! Production implementations are [`LoftyExtractor`], [`FsStat`] and
//! [`ImageThumbnailer`].

mod embedded;
mod thumbnail;

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use embedded::LoftyExtractor;
pub use thumbnail::ImageThumbnailer;

/// Identity of a file's content as far as the cache is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileStamp {
    /// Last modification time
    pub modified: SystemTime,
    /// Size in bytes
    pub size: u64,
}

impl FileStamp {
    /// Build a stamp from file metadata.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> io::Result<Self> {
        Ok(Self {
            modified: metadata.modified()?,
            size: metadata.len(),
        })
    }
}

/// A scaled-down PNG rendition of a cover picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// PNG encoded image data
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Extracts the first embedded front-cover picture of an audio file.
///
/// Implementations must not panic on malformed files; any failure is
/// returned as an error and the caller reports the file as unreadable.
pub trait PictureExtractor: Send + Sync {
    /// Raw bytes of the front cover, or `None` if the file has no picture.
    fn front_cover(&self, path: &Path) -> Result<Option<Vec<u8>>, CoverError>;
}

/// Reads the stamp of a file.
pub trait FileStat: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<FileStamp>;
}

/// Derives a display thumbnail from raw picture bytes.
pub trait ThumbnailRenderer: Send + Sync {
    fn render(&self, picture: &[u8]) -> Result<Thumbnail, CoverError>;
}

/// [`FileStat`] backed by `std::fs::metadata`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStat;

impl FileStat for FsStat {
    fn stat(&self, path: &Path) -> io::Result<FileStamp> {
        let metadata = std::fs::metadata(path)?;
        FileStamp::from_metadata(&metadata)
    }
}

/// Errors raised while reading or converting cover pictures.
#[derive(Debug, thiserror::Error)]
pub enum CoverError {
    #[error("Failed to read tags from {path}: {message}")]
    Tags { path: PathBuf, message: String },

    #[error("Picture is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("Picture is {width}x{height}, limit is {limit} pixels per side")]
    Dimensions { width: u32, height: u32, limit: u32 },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CoverError {
    /// Create a tag reading error.
    pub fn tags(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Tags {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
