//! Test utilities and fixtures for cover-guard tests.
//!
//! Provides in-memory stand-ins for the tracker's collaborators so tests can
//! control file contents and stamps without touching the disk:
//!
//! ```ignore
//! let media = FakeMedia::new();
//! media.put("/music/a/01.flac", FakePicture::Cover(b"front".to_vec()));
//! let mut cache = media.cache();
//! ```

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, UNIX_EPOCH};

use crate::cover::{
    CoverError, FileStamp, FileStat, PictureExtractor, Thumbnail, ThumbnailRenderer,
};
use crate::report::{Presenter, RenderError, WarningView};
use crate::tracker::{AlbumId, CoverDigest, CoverGrouping, CoverStatus, FingerprintCache};

/// Picture content of a fake audio file.
#[derive(Debug, Clone)]
pub enum FakePicture {
    Cover(Vec<u8>),
    NoCover,
    /// Tags can't be parsed
    Corrupt,
}

#[derive(Debug)]
struct FakeFile {
    picture: FakePicture,
    stamp: FileStamp,
}

#[derive(Debug, Default)]
struct FakeState {
    files: HashMap<PathBuf, FakeFile>,
    failing_stat: HashSet<PathBuf>,
    clock: u64,
    extractions: usize,
}

impl FakeState {
    fn next_stamp(&mut self, size: u64) -> FileStamp {
        self.clock += 1;
        FileStamp {
            modified: UNIX_EPOCH + Duration::from_secs(self.clock),
            size,
        }
    }
}

/// In-memory file system implementing [`PictureExtractor`] and [`FileStat`].
///
/// Clones share state, so a test can keep one handle while the cache owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct FakeMedia {
    state: Arc<Mutex<FakeState>>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file. Every call produces a new stamp.
    pub fn put(&self, path: impl Into<PathBuf>, picture: FakePicture) {
        let mut state = self.state.lock();
        let size = match &picture {
            FakePicture::Cover(data) => 1000 + data.len() as u64,
            _ => 1000,
        };
        let stamp = state.next_stamp(size);
        state.files.insert(path.into(), FakeFile { picture, stamp });
    }

    /// Bump the modification time without changing content.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock();
        let size = match state.files.get(path.as_ref()) {
            Some(file) => file.stamp.size,
            None => return,
        };
        let stamp = state.next_stamp(size);
        if let Some(file) = state.files.get_mut(path.as_ref()) {
            file.stamp = stamp;
        }
    }

    /// Replace the picture and grow the file while keeping its mtime, like a
    /// tagger that restores timestamps after writing.
    pub fn rewrite_keeping_mtime(&self, path: impl AsRef<Path>, picture: FakePicture) {
        let mut state = self.state.lock();
        if let Some(file) = state.files.get_mut(path.as_ref()) {
            file.picture = picture;
            file.stamp.size += 1;
        }
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.state.lock().files.remove(path.as_ref());
    }

    /// Make stat calls for `path` fail (or succeed again).
    pub fn fail_stat(&self, path: impl Into<PathBuf>, failing: bool) {
        let mut state = self.state.lock();
        let path = path.into();
        if failing {
            state.failing_stat.insert(path);
        } else {
            state.failing_stat.remove(&path);
        }
    }

    /// Number of picture extractions performed so far.
    pub fn extractions(&self) -> usize {
        self.state.lock().extractions
    }

    /// A fingerprint cache reading from this fake file system.
    pub fn cache(&self) -> FingerprintCache {
        FingerprintCache::new(self.clone(), self.clone())
    }
}

impl PictureExtractor for FakeMedia {
    fn front_cover(&self, path: &Path) -> Result<Option<Vec<u8>>, CoverError> {
        let mut state = self.state.lock();
        state.extractions += 1;
        match state.files.get(path).map(|f| &f.picture) {
            Some(FakePicture::Cover(data)) => Ok(Some(data.clone())),
            Some(FakePicture::NoCover) => Ok(None),
            Some(FakePicture::Corrupt) => Err(CoverError::tags(path, "corrupt tag")),
            None => Err(CoverError::Io(io::Error::from(io::ErrorKind::NotFound))),
        }
    }
}

impl FileStat for FakeMedia {
    fn stat(&self, path: &Path) -> io::Result<FileStamp> {
        let state = self.state.lock();
        if state.failing_stat.contains(path) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        state
            .files
            .get(path)
            .map(|f| f.stamp)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}

/// Thumbnailer that echoes the picture bytes and counts calls.
#[derive(Debug, Clone, Default)]
pub struct FakeThumbnailer {
    renders: Arc<AtomicUsize>,
}

impl FakeThumbnailer {
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl ThumbnailRenderer for FakeThumbnailer {
    fn render(&self, picture: &[u8]) -> Result<Thumbnail, CoverError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(Thumbnail {
            png: picture.to_vec(),
            width: 1,
            height: 1,
        })
    }
}

/// What a [`RecordingPresenter`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterCall {
    Render(Vec<AlbumId>),
    Close,
}

/// Presenter that records every call, optionally failing renders.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    calls: Arc<Mutex<Vec<PresenterCall>>>,
    fail: bool,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A presenter whose renders always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<PresenterCall> {
        self.calls.lock().clone()
    }

    pub fn last(&self) -> Option<PresenterCall> {
        self.calls.lock().last().cloned()
    }
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, view: &WarningView) -> Result<(), RenderError> {
        self.calls
            .lock()
            .push(PresenterCall::Render(view.keys().cloned().collect()));
        if self.fail {
            return Err(RenderError::Unavailable("presenter offline".to_string()));
        }
        Ok(())
    }

    fn close(&mut self) {
        self.calls.lock().push(PresenterCall::Close);
    }
}

/// Digest status for arbitrary picture bytes.
pub fn digest(picture: &[u8]) -> CoverStatus {
    CoverStatus::Digest(CoverDigest::of(picture))
}

/// Build a grouping from `(status, paths)` pairs, in order.
pub fn grouping(groups: &[(CoverStatus, &[&str])]) -> CoverGrouping {
    groups
        .iter()
        .flat_map(|(status, paths)| paths.iter().map(move |p| (*status, PathBuf::from(p))))
        .collect()
}
