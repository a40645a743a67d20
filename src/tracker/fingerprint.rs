//! Incremental cover fingerprint cache.
//!
//! Each album gets its own partition mapping file paths to the cover status
//! computed for them, together with the [`FileStamp`] the file had at that
//! moment. An entry is only served while the file's current stamp matches
//! exactly; anything else forces a fresh extraction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::types::{AlbumScope, CoverDigest, CoverStatus};
use crate::cover::{FileStamp, FileStat, PictureExtractor, Thumbnail, ThumbnailRenderer};

struct CacheEntry {
    status: CoverStatus,
    stamp: FileStamp,
    thumbnail: Option<Thumbnail>,
}

/// Per-album cache of cover digests.
pub struct FingerprintCache {
    scopes: HashMap<AlbumScope, HashMap<PathBuf, CacheEntry>>,
    extractor: Box<dyn PictureExtractor>,
    stat: Box<dyn FileStat>,
    thumbnailer: Option<Box<dyn ThumbnailRenderer>>,
}

impl FingerprintCache {
    pub fn new(
        extractor: impl PictureExtractor + 'static,
        stat: impl FileStat + 'static,
    ) -> Self {
        Self {
            scopes: HashMap::new(),
            extractor: Box::new(extractor),
            stat: Box::new(stat),
            thumbnailer: None,
        }
    }

    /// Enable thumbnail derivation.
    pub fn with_thumbnailer(mut self, thumbnailer: impl ThumbnailRenderer + 'static) -> Self {
        self.thumbnailer = Some(Box::new(thumbnailer));
        self
    }

    /// Resolve the cover status of `path`, extracting only when the cached
    /// entry is missing or stale.
    ///
    /// A failing stat yields [`CoverStatus::ReadError`] and leaves the cache
    /// untouched, so the next call tries again.
    pub fn resolve_digest(&mut self, path: &Path, scope: &AlbumScope) -> CoverStatus {
        let stamp = match self.stat.stat(path) {
            Ok(stamp) => stamp,
            Err(e) => {
                debug!(target: "tracker::fingerprint", path = %path.display(), error = %e, "Stat failed");
                return CoverStatus::ReadError;
            }
        };

        if let Some(entry) = self.entry(scope, path) {
            if entry.stamp == stamp {
                return entry.status;
            }
        }

        let status = self.extract_status(path);
        self.store(scope, path, status, stamp);
        status
    }

    /// Thumbnail of the front cover of `path`, derived at most once per
    /// distinct file content.
    pub fn thumbnail(&mut self, path: &Path, scope: &AlbumScope) -> Option<Thumbnail> {
        self.thumbnailer.as_ref()?;
        let stamp = self.stat.stat(path).ok()?;

        if let Some(entry) = self.entry(scope, path) {
            if entry.stamp == stamp {
                if let Some(thumbnail) = &entry.thumbnail {
                    return Some(thumbnail.clone());
                }
            }
        }

        let status = self.resolve_digest(path, scope);
        if !status.is_digest() {
            return None;
        }

        let picture = match self.extractor.front_cover(path) {
            Ok(Some(picture)) if !picture.is_empty() => picture,
            _ => return None,
        };
        let thumbnail = match self.thumbnailer.as_ref()?.render(&picture) {
            Ok(thumbnail) => thumbnail,
            Err(e) => {
                warn!(target: "tracker::fingerprint", path = %path.display(), error = %e, "Thumbnail generation failed");
                return None;
            }
        };

        if let Some(entry) = self.entry_mut(scope, path) {
            if entry.stamp == stamp && entry.status == status {
                entry.thumbnail = Some(thumbnail.clone());
            }
        }
        Some(thumbnail)
    }

    /// Drop every entry of a partition. Returns whether it existed.
    pub fn purge_scope(&mut self, scope: &AlbumScope) -> bool {
        self.scopes.remove(scope).is_some()
    }

    /// Drop the entry of one file. Empty partitions are removed too.
    pub fn forget(&mut self, scope: &AlbumScope, path: &Path) -> bool {
        let Some(entries) = self.scopes.get_mut(scope) else {
            return false;
        };
        let removed = entries.remove(path).is_some();
        if entries.is_empty() {
            self.scopes.remove(scope);
        }
        removed
    }

    pub fn contains(&self, scope: &AlbumScope, path: &Path) -> bool {
        self.entry(scope, path).is_some()
    }

    pub fn has_scope(&self, scope: &AlbumScope) -> bool {
        self.scopes.contains_key(scope)
    }

    /// Number of cached files across all partitions.
    pub fn len(&self) -> usize {
        self.scopes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, scope: &AlbumScope, path: &Path) -> Option<&CacheEntry> {
        self.scopes.get(scope)?.get(path)
    }

    fn entry_mut(&mut self, scope: &AlbumScope, path: &Path) -> Option<&mut CacheEntry> {
        self.scopes.get_mut(scope)?.get_mut(path)
    }

    fn extract_status(&self, path: &Path) -> CoverStatus {
        match self.extractor.front_cover(path) {
            Ok(Some(picture)) if !picture.is_empty() => {
                CoverStatus::Digest(CoverDigest::of(&picture))
            }
            Ok(_) => CoverStatus::NoCover,
            Err(e) => {
                warn!(target: "tracker::fingerprint", path = %path.display(), error = %e, "Failed to read embedded cover");
                CoverStatus::ReadError
            }
        }
    }

    fn store(&mut self, scope: &AlbumScope, path: &Path, status: CoverStatus, stamp: FileStamp) {
        let entries = self.scopes.entry(scope.clone()).or_default();
        match entries.get_mut(path) {
            Some(entry) => {
                // A thumbnail belongs to exactly one digest
                if entry.status != status {
                    entry.thumbnail = None;
                }
                entry.status = status;
                entry.stamp = stamp;
            }
            None => {
                entries.insert(
                    path.to_path_buf(),
                    CacheEntry {
                        status,
                        stamp,
                        thumbnail: None,
                    },
                );
            }
        }
    }
}

impl std::fmt::Debug for FingerprintCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintCache")
            .field("scopes", &self.scopes.len())
            .field("entries", &self.len())
            .field("thumbnails", &self.thumbnailer.is_some())
            .finish()
    }
}
