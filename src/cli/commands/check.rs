//! One-shot library check.

use std::io::{self, Write};
use std::path::Path;
use tracing::info;

use super::{OutputFormat, identify, library_cache};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::report::{self, JsonReport, NullPresenter, WarningView};
use crate::scanner;
use crate::tracker::{CoverTracker, ManualScheduler};

/// Scan `path`, then print every album whose tracks carry different covers.
pub fn cmd_check(
    config: &Config,
    path: &Path,
    format: OutputFormat,
    thumbnails: Option<&Path>,
) -> anyhow::Result<()> {
    let (mut tracker, view) = check_library(config, path)?;
    write_report(&mut io::stdout().lock(), &view, format, config.report.max_visible_rows)?;

    if let Some(dir) = thumbnails {
        let written = report::export_thumbnails(&mut tracker, &view, dir)?;
        eprintln!("Wrote {} thumbnails to {}", written, dir.display());
    }
    Ok(())
}

/// Write the check result in the requested format.
fn write_report(out: &mut impl Write, view: &WarningView, format: OutputFormat, max_rows: usize) -> Result<()> {
    match format {
        OutputFormat::Text => out.write_all(report::format_report(view, max_rows).as_bytes())?,
        OutputFormat::Json => writeln!(out, "{}", JsonReport::from_view(view).to_json()?)?,
    }
    out.flush()?;
    Ok(())
}

/// Feed every audio file under `path` to a fresh tracker and run the
/// pending checks right away.
pub(crate) fn check_library(config: &Config, path: &Path) -> Result<(CoverTracker, WarningView)> {
    if !path.is_dir() {
        return Err(Error::not_found(path));
    }

    let scheduler = ManualScheduler::new();
    let mut tracker = CoverTracker::new(
        library_cache(config),
        &config.tracker,
        scheduler.clone(),
        NullPresenter,
    );

    let files = scanner::scan_dir(path);
    let mut attributed = 0usize;
    for file in &files {
        if let Some(identity) = identify(file, config) {
            tracker.on_file_added(&identity.album_id, file, Some(&identity.display_name));
            attributed += 1;
        }
    }

    let albums = scheduler.drain();
    for album in &albums {
        tracker.on_debounce_elapsed(album);
    }

    let view = tracker.view();
    info!(
        target: "cli::check",
        files = files.len(),
        attributed,
        albums = albums.len(),
        differing = view.len(),
        "Check complete"
    );
    Ok((tracker, view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_missing_directory_is_not_found() {
        let err = check_library(&Config::default(), Path::new("/no/such/library")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_unreadable_files_are_skipped() {
        let dir = tempdir().unwrap();
        for name in ["01.mp3", "02.flac"] {
            let mut file = File::create(dir.path().join(name)).unwrap();
            file.write_all(b"garbage").unwrap();
        }
        File::create(dir.path().join("cover.jpg")).unwrap();

        let (tracker, view) = check_library(&Config::default(), dir.path()).unwrap();
        assert!(view.is_empty());
        assert!(tracker.cache().is_empty());
    }

    #[test]
    fn test_write_report_formats() {
        let view = WarningView::default();

        let mut text = Vec::new();
        write_report(&mut text, &view, OutputFormat::Text, 10).unwrap();
        assert_eq!(String::from_utf8(text).unwrap(), "All albums have consistent covers.\n");

        let mut json = Vec::new();
        write_report(&mut json, &view, OutputFormat::Json, 10).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["albums"], serde_json::json!([]));
    }

    #[test]
    fn test_write_failure_is_io_error() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = write_report(&mut Closed, &WarningView::default(), OutputFormat::Text, 10).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
