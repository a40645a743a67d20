//! Extract cover art embedded in audio file tags.
//!
//! Uses lofty to read picture data from:
//! - ID3v2 tags (MP3)
//! - FLAC picture blocks and Vorbis comments (FLAC, OGG, Opus)
//! - MP4 atoms (M4A/AAC)

use lofty::file::TaggedFileExt;
use lofty::picture::PictureType;
use lofty::probe::Probe;
use std::path::Path;

use super::{CoverError, PictureExtractor};

/// [`PictureExtractor`] backed by lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyExtractor;

impl PictureExtractor for LoftyExtractor {
    /// Return the front cover of the primary tag.
    ///
    /// Falls back to the first picture of any type, then to the other tags
    /// of the file, so a track whose only picture is mislabelled still
    /// counts as having a cover.
    fn front_cover(&self, path: &Path) -> Result<Option<Vec<u8>>, CoverError> {
        let tagged_file = Probe::open(path)
            .map_err(|e| CoverError::tags(path, e))?
            .read()
            .map_err(|e| CoverError::tags(path, e))?;

        let primary = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());

        if let Some(tag) = primary {
            let pictures = tag.pictures();
            let picture = pictures
                .iter()
                .find(|p| p.pic_type() == PictureType::CoverFront)
                .or_else(|| pictures.first());
            if let Some(picture) = picture {
                return Ok(Some(picture.data().to_vec()));
            }
        }

        let fallback = tagged_file
            .tags()
            .iter()
            .flat_map(|tag| tag.pictures())
            .next()
            .map(|p| p.data().to_vec());

        Ok(fallback)
    }
}
