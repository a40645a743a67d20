//! Presentation of cover warnings.
//!
//! The tracker hands a full [`WarningView`] to a [`Presenter`] every time the
//! visible set changes. This module provides the text and JSON renderings of
//! that view and the built-in presenters that print them.

mod console;

pub use console::{ConsolePresenter, JsonPresenter};
pub use crate::tracker::WarningView;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::tracker::{AggregateEntry, AlbumId, CoverStatus, CoverTracker};

/// Errors raised while presenting warnings.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Presenter unavailable: {0}")]
    Unavailable(String),
}

/// Receives the visible warnings.
///
/// `render` always gets the complete set of visible albums, never a delta.
/// `close` is called once the set becomes empty.
pub trait Presenter: Send {
    fn render(&mut self, view: &WarningView) -> Result<(), RenderError>;

    fn close(&mut self) {}
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn render(&mut self, view: &WarningView) -> Result<(), RenderError> {
        (**self).render(view)
    }

    fn close(&mut self) {
        (**self).close();
    }
}

/// Presenter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn render(&mut self, _view: &WarningView) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Human-readable report of every album in `view`.
pub fn format_report(view: &WarningView, max_rows: usize) -> String {
    let mut out = String::new();
    if view.is_empty() {
        out.push_str("All albums have consistent covers.\n");
        return out;
    }

    let _ = writeln!(out, "Albums with differing covers: {}", view.len());
    for entry in view.values() {
        out.push('\n');
        out.push_str(&format_album(entry, max_rows));
    }
    out
}

/// Report block for a single album.
pub fn format_album(entry: &AggregateEntry, max_rows: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", entry.label(), entry.album_id);

    for (digest, paths) in entry.grouping.covers() {
        let _ = writeln!(out, "  {} with cover {}:", files(paths.len()), digest.short());
        push_rows(&mut out, paths, max_rows);
    }

    let mut bare = entry.grouping.without_cover().to_vec();
    if !bare.is_empty() {
        bare.sort();
        let _ = writeln!(out, "  {} without cover:", files(bare.len()));
        push_rows(&mut out, &bare, max_rows);
    }

    let mut unreadable = entry.grouping.read_errors().to_vec();
    if !unreadable.is_empty() {
        unreadable.sort();
        let _ = writeln!(out, "  {} could not be read:", files(unreadable.len()));
        push_rows(&mut out, &unreadable, max_rows);
    }
    out
}

fn files(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{count} files")
    }
}

fn push_rows(out: &mut String, paths: &[PathBuf], max_rows: usize) {
    for path in paths.iter().take(max_rows) {
        let _ = writeln!(out, "    {}", basename(path));
    }
    if paths.len() > max_rows {
        let _ = writeln!(out, "    ... ({} more)", paths.len() - max_rows);
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Serializable snapshot of the visible warnings.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub albums: Vec<JsonAlbum>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonAlbum {
    pub album_id: AlbumId,
    pub name: Option<String>,
    pub total_files: usize,
    pub groups: Vec<JsonGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    #[serde(flatten)]
    pub status: CoverStatus,
    pub files: Vec<PathBuf>,
}

impl JsonReport {
    pub fn from_view(view: &WarningView) -> Self {
        Self::at(view, Utc::now())
    }

    pub fn at(view: &WarningView, generated_at: DateTime<Utc>) -> Self {
        let albums = view
            .values()
            .map(|entry| JsonAlbum {
                album_id: entry.album_id.clone(),
                name: entry.display_name.clone(),
                total_files: entry.grouping.total_files(),
                groups: entry
                    .grouping
                    .groups()
                    .iter()
                    .map(|g| JsonGroup {
                        status: g.status,
                        files: g.paths.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            albums,
        }
    }

    pub fn to_json(&self) -> Result<String, RenderError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write one PNG thumbnail per distinct cover of every album in `view`.
///
/// Files land in `dir/<album id>/<digest>.png`, with path separators in the
/// album id replaced. Returns the number of thumbnails written. Covers whose
/// thumbnail can't be derived are skipped.
pub fn export_thumbnails(
    tracker: &mut CoverTracker,
    view: &WarningView,
    dir: &Path,
) -> Result<usize, RenderError> {
    let mut written = 0;
    for entry in view.values() {
        let album_dir = dir.join(sanitize(entry.album_id.as_str()));
        for (digest, paths) in entry.grouping.covers() {
            let Some(path) = paths.first() else {
                continue;
            };
            let Some(thumbnail) = tracker.thumbnail(&entry.album_id, path) else {
                warn!(target: "report::thumbnails", path = %path.display(), "No thumbnail available");
                continue;
            };

            std::fs::create_dir_all(&album_dir)?;
            let target = album_dir.join(format!("{}.png", digest.short()));
            std::fs::write(&target, &thumbnail.png)?;
            debug!(target: "report::thumbnails", path = %target.display(), "Thumbnail written");
            written += 1;
        }
    }
    Ok(written)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}
