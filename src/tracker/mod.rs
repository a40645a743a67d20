//! Per-album cover consistency tracking.
//!
//! [`CoverTracker`] owns every piece of tracking state and is driven by three
//! host events:
//!
//! - [`CoverTracker::on_file_added`] when a file is attached to an album
//! - [`CoverTracker::on_debounce_elapsed`] when a scheduled wakeup fires
//! - [`CoverTracker::on_album_removed`] when an album goes away
//!
//! ```text
//! file added ──► AlbumTable ──► FingerprintCache ──► Debouncer ──► Scheduler
//!                                                                     │
//!   Presenter ◄── WarningBoard ◄── build_grouping ◄── debounce elapsed┘
//! ```
//!
//! All operations take `&mut self` and complete synchronously, so a
//! single-threaded host gets per-album atomicity for free. Multi-threaded
//! hosts share the tracker through [`SharedTracker`], one lock for all state.

mod aggregate;
mod albums;
mod debounce;
mod fingerprint;
mod grouping;
mod types;

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

pub use aggregate::{AggregateEntry, DismissalPolicy, WarningBoard, WarningState, WarningView};
pub use albums::{AlbumEntry, AlbumTable};
pub use debounce::{Debouncer, ManualScheduler, Scheduler};
pub use fingerprint::FingerprintCache;
pub use grouping::{CoverGroup, CoverGrouping, build_grouping, is_differing};
pub use types::{AlbumId, AlbumScope, CoverDigest, CoverStatus};

use crate::config::TrackerConfig;
use crate::cover::Thumbnail;
use crate::report::Presenter;

/// Tracker behind one lock, for hosts that call in from several threads.
pub type SharedTracker = Arc<Mutex<CoverTracker>>;

/// Session object owning the fingerprint cache, album table, pending
/// debounce marks, aggregate table and dismissals.
pub struct CoverTracker {
    cache: FingerprintCache,
    albums: AlbumTable,
    debounce: Debouncer,
    board: WarningBoard,
    scheduler: Box<dyn Scheduler>,
    presenter: Box<dyn Presenter>,
    /// Whether the presenter currently shows something
    showing: bool,
}

impl CoverTracker {
    pub fn new(
        cache: FingerprintCache,
        config: &TrackerConfig,
        scheduler: impl Scheduler + 'static,
        presenter: impl Presenter + 'static,
    ) -> Self {
        Self {
            cache,
            albums: AlbumTable::new(),
            debounce: Debouncer::new(config.debounce()),
            board: WarningBoard::new(config.dismissal),
            scheduler: Box::new(scheduler),
            presenter: Box::new(presenter),
            showing: false,
        }
    }

    /// Wrap the tracker for shared use across threads.
    pub fn into_shared(self) -> SharedTracker {
        Arc::new(Mutex::new(self))
    }

    /// A file was attached to an album.
    ///
    /// Records the path, warms the fingerprint cache and schedules one
    /// recompute for the album unless one is already pending. A path that was
    /// tracked under another album (a retagged file) leaves that album first.
    pub fn on_file_added(&mut self, album_id: &AlbumId, path: &Path, display_name: Option<&str>) {
        if self.albums.album_of(path).is_some_and(|previous| previous != album_id) {
            self.on_file_removed(path);
        }

        if self.albums.record(album_id, path, display_name) {
            debug!(target: "tracker::albums", album = %album_id, path = %path.display(), "Tracking file");
        }

        let status = self.cache.resolve_digest(path, &AlbumScope::album(album_id));
        trace!(target: "tracker::fingerprint", album = %album_id, path = %path.display(), %status, "Resolved cover");

        if self.debounce.request(album_id, self.scheduler.as_ref()) {
            debug!(
                target: "tracker::debounce",
                album = %album_id,
                delay_ms = self.debounce.window().as_millis() as u64,
                "Scheduled cover check"
            );
        }
    }

    /// A tracked file disappeared from disk.
    ///
    /// The file stops counting towards its album. An album left without any
    /// file goes through [`on_album_removed`](Self::on_album_removed),
    /// otherwise it is rechecked. Unknown paths are ignored.
    pub fn on_file_removed(&mut self, path: &Path) {
        let Some((album_id, emptied)) = self.albums.forget_file(path) else {
            return;
        };
        self.cache.forget(&AlbumScope::album(&album_id), path);
        debug!(target: "tracker::albums", album = %album_id, path = %path.display(), "File no longer tracked");

        if emptied {
            self.on_album_removed(&album_id);
        } else {
            self.rescan(&album_id);
        }
    }

    /// Ask for a fresh recompute of an album without adding a file, e.g.
    /// after one of its files changed or vanished on disk.
    pub fn rescan(&mut self, album_id: &AlbumId) {
        if !self.albums.contains(album_id) {
            return;
        }
        self.debounce.request(album_id, self.scheduler.as_ref());
    }

    /// A scheduled wakeup fired.
    ///
    /// The pending mark is consumed before any work, so the album can always
    /// be rescheduled. Albums removed in the meantime recompute to nothing.
    pub fn on_debounce_elapsed(&mut self, album_id: &AlbumId) {
        if !self.debounce.take(album_id) {
            trace!(target: "tracker::debounce", album = %album_id, "No pending check");
            return;
        }

        let (files, name) = self.albums.snapshot(album_id);
        let grouping = build_grouping(&files, &AlbumScope::album(album_id), &mut self.cache);
        for group in grouping.groups() {
            debug!(
                target: "tracker::debounce",
                album = %album_id,
                status = %group.status,
                files = group.paths.len(),
                "Cover group"
            );
        }

        let state = self.board.update(album_id, &grouping, name.as_deref());
        debug!(target: "tracker::debounce", album = %album_id, ?state, "Album checked");
        self.publish();
    }

    /// An album was removed from the host. Safe for unknown albums.
    pub fn on_album_removed(&mut self, album_id: &AlbumId) {
        let cached = self.cache.purge_scope(&AlbumScope::album(album_id));
        let tracked = self.albums.remove(album_id).is_some();
        let pending = self.debounce.forget(album_id);
        let warned = self.board.remove_album(album_id);

        if cached || tracked || pending || warned {
            info!(target: "tracker::lifecycle", album = %album_id, "Album removed, state purged");
        }
        self.publish();
    }

    /// Hide an album's warning. Returns whether it had one.
    pub fn dismiss(&mut self, album_id: &AlbumId) -> bool {
        let existed = self.board.dismiss(album_id);
        self.publish();
        existed
    }

    pub fn visible_set(&self) -> Vec<AlbumId> {
        self.board.visible_set()
    }

    pub fn view(&self) -> WarningView {
        self.board.view()
    }

    pub fn state(&self, album_id: &AlbumId) -> WarningState {
        self.board.state(album_id)
    }

    pub fn album(&self, album_id: &AlbumId) -> Option<&AlbumEntry> {
        self.albums.get(album_id)
    }

    pub fn album_of(&self, path: &Path) -> Option<&AlbumId> {
        self.albums.album_of(path)
    }

    pub fn is_pending(&self, album_id: &AlbumId) -> bool {
        self.debounce.is_pending(album_id)
    }

    pub fn cache(&self) -> &FingerprintCache {
        &self.cache
    }

    /// Current grouping of an album, straight from the cache.
    pub fn grouping(&mut self, album_id: &AlbumId) -> CoverGrouping {
        let (files, _) = self.albums.snapshot(album_id);
        build_grouping(&files, &AlbumScope::album(album_id), &mut self.cache)
    }

    /// Thumbnail of one of an album's files.
    pub fn thumbnail(&mut self, album_id: &AlbumId, path: &Path) -> Option<Thumbnail> {
        self.cache.thumbnail(path, &AlbumScope::album(album_id))
    }

    /// Push the visible set to the presenter, or close it when empty.
    fn publish(&mut self) {
        let view = self.board.view();
        if view.is_empty() {
            if self.showing {
                self.presenter.close();
                self.showing = false;
            }
            return;
        }

        self.showing = true;
        if let Err(e) = self.presenter.render(&view) {
            error!(target: "tracker::aggregate", albums = view.len(), error = %e, "Failed to render cover warnings");
        }
    }
}

impl std::fmt::Debug for CoverTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverTracker")
            .field("cache", &self.cache)
            .field("albums", &self.albums.len())
            .field("pending", &self.debounce.pending_count())
            .field("warnings", &self.board.len())
            .field("showing", &self.showing)
            .finish()
    }
}
