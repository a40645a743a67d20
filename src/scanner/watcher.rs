//! File system watching for a music library.
//!
//! Wraps `notify-debouncer-full` and reduces its events to the few the
//! tracker cares about, delivered on a crossbeam channel:
//!
//! ```rust,ignore
//! let (watcher, rx) = FileWatcher::new(vec!["/music".into()], Duration::from_millis(500))?;
//! while let Ok(event) = rx.recv() {
//!     match event {
//!         WatchEvent::Created(path) | WatchEvent::Modified(path) => { /* re-add */ }
//!         WatchEvent::Removed(path) => { /* forget */ }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! Dropping the [`FileWatcher`] stops the underlying watcher.

use crossbeam_channel::{Receiver, Sender, bounded};
use notify::{
    EventKind, RecommendedWatcher, RecursiveMode,
    event::{CreateKind, ModifyKind, RemoveKind, RenameMode},
};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::is_audio_file;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// An audio file appeared
    Created(PathBuf),
    /// An audio file's contents or metadata changed
    Modified(PathBuf),
    /// An audio file went away
    Removed(PathBuf),
    /// A directory appeared and may hold audio files
    DirCreated(PathBuf),
    /// The backend reported an error
    Error(String),
}

/// Handle to a running file watcher.
#[derive(Debug)]
pub struct FileWatcher {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    running: Arc<AtomicBool>,
}

impl FileWatcher {
    /// Watch `paths` recursively, coalescing raw events over `window`.
    pub fn new(paths: Vec<PathBuf>, window: Duration) -> Result<(Self, Receiver<WatchEvent>), WatchError> {
        let (tx, rx) = bounded(256);
        let running = Arc::new(AtomicBool::new(true));
        let running_cb = Arc::clone(&running);

        let debouncer = new_debouncer(window, None, move |result: DebounceEventResult| {
            if !running_cb.load(Ordering::Relaxed) {
                return;
            }
            forward_events(result, &tx);
        })
        .map_err(|e| WatchError::Init(e.to_string()))?;

        let mut watcher = Self { debouncer, running };
        for path in paths {
            watcher.watch(&path)?;
        }
        Ok((watcher, rx))
    }

    pub fn watch(&mut self, path: &Path) -> Result<(), WatchError> {
        tracing::info!(target: "scanner::watcher", path = %path.display(), "Watching directory");
        self.debouncer
            .watch(path, RecursiveMode::Recursive)
            .map_err(|e| WatchError::Watch(e.to_string()))
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        tracing::debug!(target: "scanner::watcher", "File watcher stopped");
    }
}

fn forward_events(result: DebounceEventResult, tx: &Sender<WatchEvent>) {
    match result {
        Ok(events) => {
            for event in events {
                for watch_event in classify(&event.kind, &event.paths) {
                    tracing::debug!(target: "scanner::watcher", ?watch_event, "File event");
                    let _ = tx.try_send(watch_event);
                }
            }
        }
        Err(errors) => {
            for error in errors {
                tracing::warn!(target: "scanner::watcher", error = %error, "Watch error");
                let _ = tx.try_send(WatchEvent::Error(error.to_string()));
            }
        }
    }
}

/// Map a raw notify event to the [`WatchEvent`]s it implies.
///
/// A debounced rename arrives as one `RenameMode::Both` event with
/// `paths == [from, to]`: the old path leaves and the new one appears.
/// Removed files can't be stat'ed any more, so only the extension decides.
fn classify(kind: &EventKind, paths: &[PathBuf]) -> Vec<WatchEvent> {
    if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = kind {
        let mut events = Vec::with_capacity(2);
        if let [from, to, ..] = paths {
            if is_audio_file(from) {
                events.push(WatchEvent::Removed(from.clone()));
            }
            if to.is_dir() {
                events.push(WatchEvent::DirCreated(to.clone()));
            } else if is_audio_file(to) {
                events.push(WatchEvent::Created(to.clone()));
            }
        }
        return events;
    }

    paths.iter().filter_map(|path| classify_path(kind, path)).collect()
}

fn classify_path(kind: &EventKind, path: &Path) -> Option<WatchEvent> {
    let path_buf = path.to_path_buf();
    match kind {
        EventKind::Create(CreateKind::Folder) => Some(WatchEvent::DirCreated(path_buf)),
        EventKind::Create(_) if is_audio_file(path) => Some(WatchEvent::Created(path_buf)),
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Metadata(_) | ModifyKind::Any)
            if is_audio_file(path) =>
        {
            Some(WatchEvent::Modified(path_buf))
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) if is_audio_file(path) => {
            Some(WatchEvent::Removed(path_buf))
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) if is_audio_file(path) => {
            Some(WatchEvent::Created(path_buf))
        }
        EventKind::Remove(RemoveKind::File | RemoveKind::Any) if is_audio_file(path) => {
            Some(WatchEvent::Removed(path_buf))
        }
        _ => None,
    }
}

/// Errors that can occur during file watching.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {0}")]
    Init(String),
    #[error("Failed to watch path: {0}")]
    Watch(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{DataChange, MetadataKind};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn one(kind: EventKind, path: &Path) -> Vec<WatchEvent> {
        classify(&kind, &[path.to_path_buf()])
    }

    #[test]
    fn test_classify_audio_events() {
        let song = Path::new("/m/a/song.flac");
        assert_eq!(
            one(EventKind::Create(CreateKind::File), song),
            vec![WatchEvent::Created(song.to_path_buf())]
        );
        assert_eq!(
            one(EventKind::Modify(ModifyKind::Data(DataChange::Content)), song),
            vec![WatchEvent::Modified(song.to_path_buf())]
        );
        assert_eq!(
            one(EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)), song),
            vec![WatchEvent::Modified(song.to_path_buf())]
        );
        assert_eq!(
            one(EventKind::Remove(RemoveKind::File), song),
            vec![WatchEvent::Removed(song.to_path_buf())]
        );
        assert_eq!(
            one(EventKind::Modify(ModifyKind::Name(RenameMode::From)), song),
            vec![WatchEvent::Removed(song.to_path_buf())]
        );
    }

    #[test]
    fn test_classify_ignores_other_files() {
        let image = Path::new("/m/a/cover.jpg");
        assert_eq!(one(EventKind::Create(CreateKind::File), image), vec![]);
        assert_eq!(one(EventKind::Remove(RemoveKind::File), image), vec![]);
        assert_eq!(
            one(EventKind::Create(CreateKind::Folder), Path::new("/m/b")),
            vec![WatchEvent::DirCreated(PathBuf::from("/m/b"))]
        );
    }

    #[test]
    fn test_classify_rename_both_ways() {
        let from = PathBuf::from("/m/a/old.flac");
        let to = PathBuf::from("/m/a/new.flac");
        let rename = EventKind::Modify(ModifyKind::Name(RenameMode::Both));

        assert_eq!(
            classify(&rename, &[from.clone(), to.clone()]),
            vec![WatchEvent::Removed(from.clone()), WatchEvent::Created(to.clone())]
        );

        // Renamed away from an audio extension: only the removal counts
        let text = PathBuf::from("/m/a/old.txt");
        assert_eq!(
            classify(&rename, &[from.clone(), text.clone()]),
            vec![WatchEvent::Removed(from)]
        );
        assert_eq!(classify(&rename, &[text, to.clone()]), vec![WatchEvent::Created(to)]);
    }

    #[test]
    fn test_watcher_creation() {
        let dir = tempdir().unwrap();
        let (watcher, _rx) = FileWatcher::new(vec![dir.path().to_path_buf()], Duration::from_millis(50)).unwrap();
        drop(watcher);
    }

    #[test]
    fn test_watching_missing_directory_fails() {
        let result = FileWatcher::new(vec![PathBuf::from("/definitely/not/here")], Duration::from_millis(50));
        assert!(matches!(result, Err(WatchError::Watch(_))));
    }

    #[test]
    fn test_watcher_detects_new_file() {
        let dir = tempdir().unwrap();
        let (watcher, rx) = FileWatcher::new(vec![dir.path().to_path_buf()], Duration::from_millis(50)).unwrap();

        let file_path = dir.path().join("new_song.mp3");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"fake mp3 content").unwrap();
        file.sync_all().unwrap();

        let event = rx.recv_timeout(Duration::from_secs(2));
        drop(watcher);

        // Some platforms are slow to deliver, so only check what did arrive
        if let Ok(WatchEvent::Created(path) | WatchEvent::Modified(path)) = event {
            assert_eq!(path.file_name().unwrap(), "new_song.mp3");
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_watcher_reports_rename() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("old.flac");
        let new = dir.path().join("new.flac");
        std::fs::write(&old, b"fake flac content").unwrap();

        let (watcher, rx) = FileWatcher::new(vec![dir.path().to_path_buf()], Duration::from_millis(50)).unwrap();
        std::fs::rename(&old, &new).unwrap();

        let mut events = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(3);
        while !(events.contains(&WatchEvent::Removed(old.clone())) && events.contains(&WatchEvent::Created(new.clone()))) {
            let left = deadline.saturating_duration_since(std::time::Instant::now());
            match rx.recv_timeout(left) {
                Ok(event) => events.push(event),
                Err(_) => break,
            }
        }
        drop(watcher);

        assert!(events.contains(&WatchEvent::Removed(old)), "events: {events:?}");
        assert!(events.contains(&WatchEvent::Created(new)), "events: {events:?}");
    }
}
