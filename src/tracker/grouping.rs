//! Grouping of an album's files by cover status, and the verdict on whether
//! that grouping means the album carries differing covers.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::fingerprint::FingerprintCache;
use super::types::{AlbumScope, CoverDigest, CoverStatus};

/// Files sharing one cover status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverGroup {
    pub status: CoverStatus,
    pub paths: Vec<PathBuf>,
}

/// Files of one album bucketed by cover status.
///
/// Groups keep first-seen order and paths keep insertion order. A path is
/// expected to be pushed once; [`build_grouping`] guarantees that for the
/// unique path lists the album table hands out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CoverGrouping {
    groups: Vec<CoverGroup>,
}

impl CoverGrouping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the group for `status`, creating it if needed.
    pub fn push(&mut self, status: CoverStatus, path: PathBuf) {
        match self.groups.iter_mut().find(|g| g.status == status) {
            Some(group) => group.paths.push(path),
            None => self.groups.push(CoverGroup {
                status,
                paths: vec![path],
            }),
        }
    }

    pub fn groups(&self) -> &[CoverGroup] {
        &self.groups
    }

    pub fn get(&self, status: &CoverStatus) -> Option<&[PathBuf]> {
        self.groups
            .iter()
            .find(|g| g.status == *status)
            .map(|g| g.paths.as_slice())
    }

    pub fn contains(&self, status: &CoverStatus) -> bool {
        self.get(status).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of files across all groups.
    pub fn total_files(&self) -> usize {
        self.groups.iter().map(|g| g.paths.len()).sum()
    }

    /// Number of distinct real cover digests.
    pub fn distinct_covers(&self) -> usize {
        self.groups.iter().filter(|g| g.status.is_digest()).count()
    }

    /// Cover groups, largest first. Equal sizes keep first-seen order.
    pub fn covers(&self) -> Vec<(&CoverDigest, &[PathBuf])> {
        let mut covers: Vec<_> = self
            .groups
            .iter()
            .filter_map(|g| g.status.digest().map(|d| (d, g.paths.as_slice())))
            .collect();
        covers.sort_by_key(|(_, paths)| std::cmp::Reverse(paths.len()));
        covers
    }

    /// Files without an embedded cover.
    pub fn without_cover(&self) -> &[PathBuf] {
        self.get(&CoverStatus::NoCover).unwrap_or_default()
    }

    /// Files that could not be read.
    pub fn read_errors(&self) -> &[PathBuf] {
        self.get(&CoverStatus::ReadError).unwrap_or_default()
    }

    /// Whether `other` holds the same files under the same statuses,
    /// regardless of ordering.
    pub fn same_shape(&self, other: &CoverGrouping) -> bool {
        self.groups.len() == other.groups.len()
            && self.groups.iter().all(|group| {
                other.get(&group.status).is_some_and(|paths| {
                    let mut ours: Vec<&Path> = group.paths.iter().map(PathBuf::as_path).collect();
                    let mut theirs: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
                    ours.sort();
                    theirs.sort();
                    ours == theirs
                })
            })
    }

    pub fn is_differing(&self) -> bool {
        is_differing(self)
    }
}

impl FromIterator<(CoverStatus, PathBuf)> for CoverGrouping {
    fn from_iter<I: IntoIterator<Item = (CoverStatus, PathBuf)>>(iter: I) -> Self {
        let mut grouping = CoverGrouping::new();
        for (status, path) in iter {
            grouping.push(status, path);
        }
        grouping
    }
}

/// Resolve every path through the cache and bucket it by cover status.
pub fn build_grouping(
    paths: &[PathBuf],
    scope: &AlbumScope,
    cache: &mut FingerprintCache,
) -> CoverGrouping {
    paths
        .iter()
        .map(|path| (cache.resolve_digest(path, scope), path.clone()))
        .collect()
}

/// Whether a grouping means the album's tracks don't share one cover.
///
/// More than one real cover differs. A single real cover next to files
/// without any cover also differs, since applying album art would silently
/// fill the gaps. Read errors never count as a mismatch on their own.
pub fn is_differing(grouping: &CoverGrouping) -> bool {
    let real = grouping.distinct_covers();
    real > 1 || (real == 1 && grouping.contains(&CoverStatus::NoCover))
}
