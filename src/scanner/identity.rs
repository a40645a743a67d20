//! Which album a file belongs to, read from its tags.

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::tracker::AlbumId;

/// Display name used when a file carries no album tag.
pub const UNKNOWN_ALBUM: &str = "<unknown>";

/// Album membership of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumIdentity {
    pub album_id: AlbumId,
    pub display_name: String,
}

/// Read the album identity of an audio file.
///
/// The MusicBrainz release id is the album id. Without one, and when
/// `fallback_to_album_tag` is set, the id becomes `"<album artist>/<album>"`.
/// Returns `Ok(None)` for files that can't be attributed to an album.
pub fn read_album_identity(path: &Path, fallback_to_album_tag: bool) -> Result<Option<AlbumIdentity>> {
    let tagged_file = Probe::open(path)
        .map_err(|e| Error::metadata(path, e.to_string()))?
        .read()
        .map_err(|e| Error::metadata(path, e.to_string()))?;

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        debug!(target: "scanner::identity", path = %path.display(), "No tags, skipping");
        return Ok(None);
    };

    let identity = identity_from_tags(AlbumTags::from_tag(tag), fallback_to_album_tag);
    if identity.is_none() {
        debug!(target: "scanner::identity", path = %path.display(), "No album id, skipping");
    }
    Ok(identity)
}

/// The tag fields album identity is derived from.
#[derive(Debug, Clone, Default)]
struct AlbumTags {
    release_id: Option<String>,
    album: Option<String>,
    album_artist: Option<String>,
    artist: Option<String>,
}

impl AlbumTags {
    fn from_tag(tag: &Tag) -> Self {
        Self {
            release_id: tag.get_string(&ItemKey::MusicBrainzReleaseId).map(str::to_owned),
            album: tag.album().map(|s| s.to_string()),
            album_artist: tag.get_string(&ItemKey::AlbumArtist).map(str::to_owned),
            artist: tag.artist().map(|s| s.to_string()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn identity_from_tags(tags: AlbumTags, fallback_to_album_tag: bool) -> Option<AlbumIdentity> {
    let album = non_blank(tags.album);
    let display_name = album.clone().unwrap_or_else(|| UNKNOWN_ALBUM.to_string());

    if let Some(release_id) = non_blank(tags.release_id) {
        return Some(AlbumIdentity {
            album_id: AlbumId::new(release_id),
            display_name,
        });
    }

    if !fallback_to_album_tag {
        return None;
    }
    let album = album?;
    let artist = non_blank(tags.album_artist)
        .or_else(|| non_blank(tags.artist))
        .unwrap_or_else(|| "Unknown Artist".to_string());

    Some(AlbumIdentity {
        album_id: AlbumId::new(format!("{artist}/{album}")),
        display_name,
    })
}
