//! Identifiers and cover status values shared by the tracker components.

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt::{self, Write};

/// Opaque, stable album identifier (usually a MusicBrainz release id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AlbumId(String);

impl AlbumId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlbumId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AlbumId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Partition of the fingerprint cache; one per album.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlbumScope(AlbumId);

impl AlbumScope {
    pub fn album(id: &AlbumId) -> Self {
        Self(id.clone())
    }
}

/// SHA-256 of the raw bytes of an embedded picture.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoverDigest([u8; 32]);

impl CoverDigest {
    /// Hash picture bytes.
    pub fn of(picture: &[u8]) -> Self {
        let hash = Sha256::digest(picture);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }

    /// Lowercase hex string (64 characters).
    pub fn to_hex(&self) -> String {
        let mut hex = String::with_capacity(64);
        for byte in &self.0 {
            let _ = write!(hex, "{byte:02x}");
        }
        hex
    }

    /// First 12 hex characters, for file names and compact output.
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }
}

impl fmt::Debug for CoverDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CoverDigest({})", self.short())
    }
}

impl fmt::Display for CoverDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for CoverDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// What the tracker knows about one file's front cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "digest", rename_all = "snake_case")]
pub enum CoverStatus {
    /// The file embeds a picture with this digest
    Digest(CoverDigest),
    /// The file was read and has no embedded picture
    NoCover,
    /// The file or its tags could not be read
    ReadError,
}

impl CoverStatus {
    pub fn digest(&self) -> Option<&CoverDigest> {
        match self {
            CoverStatus::Digest(digest) => Some(digest),
            _ => None,
        }
    }

    pub fn is_digest(&self) -> bool {
        matches!(self, CoverStatus::Digest(_))
    }
}

impl fmt::Display for CoverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverStatus::Digest(digest) => write!(f, "cover {}", digest.short()),
            CoverStatus::NoCover => f.write_str("no cover"),
            CoverStatus::ReadError => f.write_str("read error"),
        }
    }
}
