//! Read artwork stored in audio file tags (ID3v2, Vorbis comments, MP4 atoms).

use std::path::Path;

use lofty::file::TaggedFileExt;
use lofty::picture::{MimeType, PictureType};
use lofty::probe::Probe;

use super::{CoverArt, CoverOrigin};

/// Front cover from the file's tags, else the first picture of any type.
///
/// Returns None if the file can't be read or carries no picture.
pub fn extract_embedded_cover(path: &Path) -> Option<CoverArt> {
    let tagged_file = Probe::open(path).ok()?.read().ok()?;

    let pictures: Vec<_> = tagged_file.tags().iter().flat_map(|tag| tag.pictures()).collect();
    let picture = pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())?;

    let mime_type = match picture.mime_type() {
        Some(MimeType::Png) => "image/png",
        Some(MimeType::Gif) => "image/gif",
        Some(MimeType::Bmp) => "image/bmp",
        Some(MimeType::Tiff) => "image/tiff",
        _ => "image/jpeg",
    };

    Some(CoverArt {
        data: picture.data().to_vec(),
        mime_type: mime_type.to_string(),
        origin: CoverOrigin::Embedded,
    })
}
