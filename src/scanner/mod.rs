//! Finding audio files and the albums they belong to.

pub mod identity;
mod watcher;

pub use identity::{AlbumIdentity, read_album_identity};
pub use watcher::{FileWatcher, WatchError, WatchEvent};

use futures::stream::Stream;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use walkdir::WalkDir;

/// Whether `path` has a supported audio extension (case-insensitive).
pub fn is_audio_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    matches!(
        ext.as_deref(),
        Some("mp3" | "flac" | "ogg" | "opus" | "wav" | "m4a")
    )
}

/// Recursively list the audio files under `root`, sorted by path.
pub fn scan_dir(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_audio_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Stream the audio files under `root` as the traversal finds them.
///
/// The walk runs on a blocking task and stops once the stream is dropped.
pub fn scan(root: PathBuf) -> impl Stream<Item = PathBuf> {
    let (tx, rx) = mpsc::channel(100);

    tokio::task::spawn_blocking(move || {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !is_audio_file(entry.path()) {
                continue;
            }
            // Receiver dropped, nobody is listening any more
            if tx.blocking_send(entry.into_path()).is_err() {
                break;
            }
        }
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|path| (path, rx))
    })
}
