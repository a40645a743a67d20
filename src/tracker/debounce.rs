//! Debouncing of per-album recomputes.
//!
//! The first file-added event of a burst marks the album pending and asks
//! the injected [`Scheduler`] for a single-shot wakeup. Further events for a
//! pending album do nothing. Timers are never cancelled or extended; when one
//! fires, the host hands the album id back to the tracker, which consumes the
//! pending mark and recomputes from the files known at that moment.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::types::AlbumId;

/// Single-shot delayed wakeups.
///
/// When `delay` has elapsed the host must call
/// [`CoverTracker::on_debounce_elapsed`](super::CoverTracker::on_debounce_elapsed)
/// with `album_id` on the same control flow as every other tracker call.
pub trait Scheduler: Send + Sync {
    fn schedule_after(&self, delay: Duration, album_id: AlbumId);
}

/// Pending recompute marks.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: HashSet<AlbumId>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashSet::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule a recompute unless one is already pending.
    /// Returns `true` if a timer was requested.
    pub fn request(&mut self, album_id: &AlbumId, scheduler: &dyn Scheduler) -> bool {
        if !self.pending.insert(album_id.clone()) {
            return false;
        }
        scheduler.schedule_after(self.window, album_id.clone());
        true
    }

    /// Consume the pending mark of a fired timer.
    /// Returns `false` if nothing was pending for the album.
    pub fn take(&mut self, album_id: &AlbumId) -> bool {
        self.pending.remove(album_id)
    }

    /// Drop the pending mark of a removed album.
    pub fn forget(&mut self, album_id: &AlbumId) -> bool {
        self.pending.remove(album_id)
    }

    pub fn is_pending(&self, album_id: &AlbumId) -> bool {
        self.pending.contains(album_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

/// Scheduler whose timers fire only when the host drains them.
///
/// Used by one-shot scans, where there is no event loop to wait on, and by
/// tests. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<Vec<(Duration, AlbumId)>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every scheduled album, in scheduling order.
    pub fn drain(&self) -> Vec<AlbumId> {
        self.queue.lock().drain(..).map(|(_, id)| id).collect()
    }

    /// Delays requested so far, without draining.
    pub fn delays(&self) -> Vec<Duration> {
        self.queue.lock().iter().map(|(delay, _)| *delay).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, album_id: AlbumId) {
        self.queue.lock().push((delay, album_id));
    }
}
