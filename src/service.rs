//! Event loop hosting a [`CoverTracker`].
//!
//! The service owns the tracker and applies [`TrackerEvent`]s one at a time
//! from an unbounded tokio channel. Debounce timers are tokio sleep tasks
//! that post [`TrackerEvent::DebounceElapsed`] back into the same channel,
//! so every tracker call happens on the loop.
//!
//! ```rust,ignore
//! let (service, handle) = TrackerService::new(cache, &config.tracker, presenter);
//! let task = tokio::spawn(service.run());
//! handle.file_added(album_id, path, Some("Back in Black".into()));
//! handle.shutdown();
//! let tracker = task.await?;
//! ```

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::TrackerConfig;
use crate::report::Presenter;
use crate::tracker::{AlbumId, CoverTracker, FingerprintCache, Scheduler};

/// Input of the tracker loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    FileAdded {
        album_id: AlbumId,
        path: PathBuf,
        display_name: Option<String>,
    },
    FileRemoved(PathBuf),
    AlbumRemoved(AlbumId),
    Dismiss(AlbumId),
    DebounceElapsed(AlbumId),
    /// Stop the loop and hand the tracker back
    Shutdown,
}

/// [`Scheduler`] backed by tokio sleep tasks.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<TrackerEvent>,
}

impl TokioScheduler {
    pub fn new(tx: mpsc::UnboundedSender<TrackerEvent>) -> Self {
        Self { tx }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, album_id: AlbumId) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!(target: "service", album = %album_id, "No tokio runtime, cover check not scheduled");
            return;
        };
        let tx = self.tx.clone();
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // The loop may already be gone
            let _ = tx.send(TrackerEvent::DebounceElapsed(album_id));
        });
    }
}

/// Cloneable sender side of a [`TrackerService`].
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    tx: mpsc::UnboundedSender<TrackerEvent>,
}

impl TrackerHandle {
    /// Queue an event. Returns `false` once the service has stopped.
    pub fn send(&self, event: TrackerEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn file_added(&self, album_id: AlbumId, path: PathBuf, display_name: Option<String>) -> bool {
        self.send(TrackerEvent::FileAdded {
            album_id,
            path,
            display_name,
        })
    }

    pub fn file_removed(&self, path: PathBuf) -> bool {
        self.send(TrackerEvent::FileRemoved(path))
    }

    pub fn album_removed(&self, album_id: AlbumId) -> bool {
        self.send(TrackerEvent::AlbumRemoved(album_id))
    }

    pub fn dismiss(&self, album_id: AlbumId) -> bool {
        self.send(TrackerEvent::Dismiss(album_id))
    }

    pub fn shutdown(&self) -> bool {
        self.send(TrackerEvent::Shutdown)
    }
}

/// Single-consumer loop owning the tracker.
pub struct TrackerService {
    tracker: CoverTracker,
    rx: mpsc::UnboundedReceiver<TrackerEvent>,
}

impl TrackerService {
    pub fn new(
        cache: FingerprintCache,
        config: &TrackerConfig,
        presenter: impl Presenter + 'static,
    ) -> (Self, TrackerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler::new(tx.clone());
        let tracker = CoverTracker::new(cache, config, scheduler, presenter);
        (Self { tracker, rx }, TrackerHandle { tx })
    }

    /// Apply events until [`TrackerEvent::Shutdown`], then return the tracker.
    ///
    /// The scheduler keeps a sender alive, so the loop only ends on an
    /// explicit shutdown.
    pub async fn run(mut self) -> CoverTracker {
        info!(target: "service", "Cover tracker started");
        while let Some(event) = self.rx.recv().await {
            if event == TrackerEvent::Shutdown {
                break;
            }
            self.apply(event);
        }
        info!(target: "service", "Cover tracker stopped");
        self.tracker
    }

    fn apply(&mut self, event: TrackerEvent) {
        debug!(target: "service", ?event, "Event");
        match event {
            TrackerEvent::FileAdded {
                album_id,
                path,
                display_name,
            } => {
                self.tracker
                    .on_file_added(&album_id, &path, display_name.as_deref());
            }
            TrackerEvent::FileRemoved(path) => self.tracker.on_file_removed(&path),
            TrackerEvent::AlbumRemoved(album_id) => self.tracker.on_album_removed(&album_id),
            TrackerEvent::Dismiss(album_id) => {
                self.tracker.dismiss(&album_id);
            }
            TrackerEvent::DebounceElapsed(album_id) => self.tracker.on_debounce_elapsed(&album_id),
            TrackerEvent::Shutdown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeMedia, FakePicture, PresenterCall, RecordingPresenter};
    use crate::tracker::WarningState;

    fn config() -> TrackerConfig {
        TrackerConfig {
            debounce_ms: 20,
            ..TrackerConfig::default()
        }
    }

    fn added(album: &str, path: &str) -> TrackerEvent {
        TrackerEvent::FileAdded {
            album_id: AlbumId::from(album),
            path: PathBuf::from(path),
            display_name: Some(album.to_uppercase()),
        }
    }

    #[tokio::test]
    async fn test_burst_produces_single_render() {
        let media = FakeMedia::new();
        media.put("/a/1.flac", FakePicture::Cover(b"A".to_vec()));
        media.put("/a/2.flac", FakePicture::Cover(b"B".to_vec()));
        media.put("/a/3.flac", FakePicture::NoCover);
        let presenter = RecordingPresenter::new();
        let (service, handle) = TrackerService::new(media.cache(), &config(), presenter.clone());
        let task = tokio::spawn(service.run());

        for path in ["/a/1.flac", "/a/2.flac", "/a/3.flac"] {
            assert!(handle.send(added("a", path)));
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.shutdown();
        let tracker = task.await.unwrap();

        assert_eq!(presenter.calls(), vec![PresenterCall::Render(vec![AlbumId::from("a")])]);
        assert_eq!(tracker.state(&AlbumId::from("a")), WarningState::Differing);
        assert_eq!(tracker.album(&AlbumId::from("a")).unwrap().label(), "A");
    }

    #[tokio::test]
    async fn test_dismiss_and_removal_through_handle() {
        let media = FakeMedia::new();
        media.put("/a/1.flac", FakePicture::Cover(b"A".to_vec()));
        media.put("/a/2.flac", FakePicture::Cover(b"B".to_vec()));
        let presenter = RecordingPresenter::new();
        let (service, handle) = TrackerService::new(media.cache(), &config(), presenter.clone());
        let task = tokio::spawn(service.run());

        handle.send(added("a", "/a/1.flac"));
        handle.send(added("a", "/a/2.flac"));
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.dismiss(AlbumId::from("a"));
        handle.album_removed(AlbumId::from("a"));
        handle.shutdown();
        let tracker = task.await.unwrap();

        assert!(tracker.album(&AlbumId::from("a")).is_none());
        assert!(tracker.visible_set().is_empty());
        assert_eq!(presenter.last(), Some(PresenterCall::Close));
    }

    #[tokio::test]
    async fn test_retagged_file_moves_album() {
        let media = FakeMedia::new();
        media.put("/m/1.flac", FakePicture::Cover(b"A".to_vec()));
        let (service, handle) = TrackerService::new(media.cache(), &config(), RecordingPresenter::new());
        let task = tokio::spawn(service.run());

        handle.send(added("old", "/m/1.flac"));
        handle.send(added("new", "/m/1.flac"));
        handle.shutdown();
        let tracker = task.await.unwrap();

        assert_eq!(tracker.album_of(std::path::Path::new("/m/1.flac")), Some(&AlbumId::from("new")));
        assert!(tracker.album(&AlbumId::from("old")).is_none());
    }

    #[test]
    fn test_send_after_shutdown_fails() {
        let media = FakeMedia::new();
        let (service, handle) = TrackerService::new(media.cache(), &config(), RecordingPresenter::new());
        drop(service);
        assert!(!handle.file_removed(PathBuf::from("/a/1.flac")));
    }
}
