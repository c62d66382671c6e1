//! Artwork from the filesystem and from remote URLs.
//!
//! Local artwork is always checked before any network lookup:
//!
//! 1. **Embedded tags** - a picture stored in the audio file itself
//! 2. **Sidecar files** - `<track>.jpg`, `cover.jpg`, `folder.png`, ... next to the file
//!
//! Remote covers are normally passed around as URLs; [`download`] turns one
//! into bytes for callers that need the image itself.

mod embedded;
mod sidecar;

use std::path::{Path, PathBuf};

use reqwest::header::CONTENT_TYPE;

pub use embedded::extract_embedded_cover;
pub use sidecar::{find_sidecar_cover, mime_for_extension};

use crate::search::domain::SearchError;
use crate::search::http;

/// Where a cover image came from
#[derive(Debug, Clone, PartialEq)]
pub enum CoverOrigin {
    /// Embedded in the audio file's tags
    Embedded,
    /// A sidecar image file
    Sidecar(PathBuf),
    /// Downloaded from a provider URL
    Remote(String),
}

/// Raw image data with its type
#[derive(Debug, Clone)]
pub struct CoverArt {
    pub data: Vec<u8>,
    /// MIME type (image/jpeg, image/png, ...)
    pub mime_type: String,
    pub origin: CoverOrigin,
}

impl CoverArt {
    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

/// Embedded artwork first, then sidecar files.
///
/// Synchronous and filesystem-only; call from `spawn_blocking` in async code.
pub fn extract_local(audio_path: &Path) -> Option<CoverArt> {
    extract_embedded_cover(audio_path).or_else(|| find_sidecar_cover(audio_path))
}

/// Download an image, taking the MIME type from the response when present.
pub async fn download(client: &reqwest::Client, url: &str) -> Result<CoverArt, SearchError> {
    let response = http::check_status(client.get(url).send().await?)?;

    let header_mime = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_lowercase())
        .filter(|v| v.starts_with("image/"));

    let mime_type = header_mime.unwrap_or_else(|| {
        let ext = url
            .rsplit('/')
            .next()
            .and_then(|name| name.split('?').next())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        mime_for_extension(&ext).to_string()
    });

    let data = response.bytes().await?.to_vec();
    if data.is_empty() {
        return Err(SearchError::InvalidResponse(format!("empty image body from {}", url)));
    }

    Ok(CoverArt {
        data,
        mime_type,
        origin: CoverOrigin::Remote(url.to_string()),
    })
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        _ => "jpg",
    }
}
