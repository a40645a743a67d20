//! Files seen so far for each album.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::types::AlbumId;

/// Tracking state of one album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumEntry {
    pub album_id: AlbumId,
    pub display_name: Option<String>,
    files: Vec<PathBuf>,
}

impl AlbumEntry {
    /// Tracked files in arrival order, without duplicates.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Display name, or the id when the album has no name.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.album_id.as_str())
    }
}

#[derive(Debug, Default)]
pub struct AlbumTable {
    albums: HashMap<AlbumId, AlbumEntry>,
    /// Reverse index: which album each tracked file belongs to
    owners: HashMap<PathBuf, AlbumId>,
}

impl AlbumTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `path` belongs to `album_id`.
    ///
    /// Creates the album on first sight and backfills the display name if it
    /// was unknown. Returns `true` when the path was not tracked before.
    ///
    /// A path already tracked under another album stays there; call
    /// [`forget_file`](Self::forget_file) first to move it.
    pub fn record(&mut self, album_id: &AlbumId, path: &Path, display_name: Option<&str>) -> bool {
        let name = display_name.filter(|n| !n.trim().is_empty());
        let entry = self
            .albums
            .entry(album_id.clone())
            .or_insert_with(|| AlbumEntry {
                album_id: album_id.clone(),
                display_name: None,
                files: Vec::new(),
            });

        if entry.display_name.is_none() {
            entry.display_name = name.map(str::to_owned);
        }

        if self.owners.contains_key(path) {
            return false;
        }
        entry.files.push(path.to_path_buf());
        self.owners.insert(path.to_path_buf(), album_id.clone());
        true
    }

    /// Stop tracking `path`. Returns the album it belonged to and whether
    /// that album has no files left.
    pub fn forget_file(&mut self, path: &Path) -> Option<(AlbumId, bool)> {
        let album_id = self.owners.remove(path)?;
        let emptied = match self.albums.get_mut(&album_id) {
            Some(entry) => {
                entry.files.retain(|f| f != path);
                entry.files.is_empty()
            }
            None => true,
        };
        Some((album_id, emptied))
    }

    pub fn get(&self, album_id: &AlbumId) -> Option<&AlbumEntry> {
        self.albums.get(album_id)
    }

    /// Current files and name of an album; empty for unknown albums.
    pub fn snapshot(&self, album_id: &AlbumId) -> (Vec<PathBuf>, Option<String>) {
        match self.albums.get(album_id) {
            Some(entry) => (entry.files.clone(), entry.display_name.clone()),
            None => (Vec::new(), None),
        }
    }

    pub fn remove(&mut self, album_id: &AlbumId) -> Option<AlbumEntry> {
        let entry = self.albums.remove(album_id)?;
        for file in &entry.files {
            self.owners.remove(file);
        }
        Some(entry)
    }

    /// The album a file was recorded under, if any.
    pub fn album_of(&self, path: &Path) -> Option<&AlbumId> {
        self.owners.get(path)
    }

    pub fn contains(&self, album_id: &AlbumId) -> bool {
        self.albums.contains_key(album_id)
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deduplicates_paths() {
        let mut table = AlbumTable::new();
        let id = AlbumId::from("a");

        assert!(table.record(&id, Path::new("/a/1.flac"), Some("Album")));
        assert!(table.record(&id, Path::new("/a/2.flac"), Some("Album")));
        assert!(!table.record(&id, Path::new("/a/1.flac"), Some("Album")));

        let entry = table.get(&id).unwrap();
        assert_eq!(entry.files(), &[PathBuf::from("/a/1.flac"), PathBuf::from("/a/2.flac")]);
    }

    #[test]
    fn test_name_is_backfilled_once() {
        let mut table = AlbumTable::new();
        let id = AlbumId::from("a");

        table.record(&id, Path::new("/a/1.flac"), None);
        assert_eq!(table.get(&id).unwrap().label(), "a");

        table.record(&id, Path::new("/a/2.flac"), Some("  "));
        assert_eq!(table.get(&id).unwrap().display_name, None);

        table.record(&id, Path::new("/a/3.flac"), Some("Highway to Hell"));
        table.record(&id, Path::new("/a/4.flac"), Some("Other Name"));
        assert_eq!(table.get(&id).unwrap().label(), "Highway to Hell");
    }

    #[test]
    fn test_snapshot_of_unknown_album_is_empty() {
        let table = AlbumTable::new();
        let (files, name) = table.snapshot(&AlbumId::from("missing"));
        assert!(files.is_empty());
        assert!(name.is_none());
    }

    #[test]
    fn test_forget_file_reports_emptied_album() {
        let mut table = AlbumTable::new();
        let id = AlbumId::from("a");
        table.record(&id, Path::new("/a/1.flac"), None);
        table.record(&id, Path::new("/a/2.flac"), None);

        assert_eq!(table.forget_file(Path::new("/a/1.flac")), Some((id.clone(), false)));
        assert_eq!(table.forget_file(Path::new("/a/1.flac")), None);
        assert_eq!(table.forget_file(Path::new("/a/2.flac")), Some((id.clone(), true)));
        assert!(table.get(&id).unwrap().files().is_empty());
    }

    #[test]
    fn test_path_stays_with_first_album_until_forgotten() {
        let mut table = AlbumTable::new();
        let (a, b) = (AlbumId::from("a"), AlbumId::from("b"));
        let path = Path::new("/m/1.flac");

        assert!(table.record(&a, path, None));
        assert!(!table.record(&b, path, None));
        assert_eq!(table.album_of(path), Some(&a));
        assert!(table.get(&b).unwrap().files().is_empty());

        assert_eq!(table.forget_file(path), Some((a.clone(), true)));
        assert!(table.record(&b, path, None));
        assert_eq!(table.album_of(path), Some(&b));
        assert!(table.get(&a).unwrap().files().is_empty());
    }

    #[test]
    fn test_remove_clears_reverse_index() {
        let mut table = AlbumTable::new();
        let id = AlbumId::from("a");
        table.record(&id, Path::new("/a/1.flac"), None);
        table.record(&id, Path::new("/a/2.flac"), None);
        table.remove(&id);

        assert!(table.album_of(Path::new("/a/2.flac")).is_none());
        assert_eq!(table.forget_file(Path::new("/a/2.flac")), None);
        assert!(table.record(&id, Path::new("/a/1.flac"), None));
    }

    #[test]
    fn test_album_of_and_remove() {
        let mut table = AlbumTable::new();
        let id = AlbumId::from("a");
        table.record(&id, Path::new("/a/1.flac"), None);

        assert_eq!(table.album_of(Path::new("/a/1.flac")), Some(&id));
        assert!(table.remove(&id).is_some());
        assert!(table.album_of(Path::new("/a/1.flac")).is_none());
        assert!(table.remove(&id).is_none());
        assert!(table.is_empty());
    }
}
