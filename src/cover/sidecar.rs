//! Cover images stored next to the audio file.

use std::path::{Path, PathBuf};

use super::{CoverArt, CoverOrigin};

/// Folder-level cover names, in priority order (lowercase)
const COVER_STEMS: &[&str] = &["cover", "folder", "album", "front", "artwork", "albumart"];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

fn lowercase_stem(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_lowercase)
}

/// Image named after the track (`song.mp3` -> `song.jpg`), then a folder
/// cover. Names are matched case-insensitively.
pub fn find_sidecar_cover(audio_path: &Path) -> Option<CoverArt> {
    let parent = audio_path.parent()?;
    let track_stem = lowercase_stem(audio_path)?;

    let images: Vec<PathBuf> = std::fs::read_dir(parent)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_image(p))
        .collect();

    let priority = std::iter::once(track_stem.as_str()).chain(COVER_STEMS.iter().copied());
    for stem in priority {
        let mut matches: Vec<&PathBuf> = images
            .iter()
            .filter(|p| lowercase_stem(p).as_deref() == Some(stem))
            .collect();
        // deterministic pick when several extensions exist
        matches.sort();
        if let Some(path) = matches.first() {
            return load_sidecar(path);
        }
    }
    None
}

fn load_sidecar(path: &Path) -> Option<CoverArt> {
    let data = std::fs::read(path).ok()?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
    Some(CoverArt {
        data,
        mime_type: mime_for_extension(ext).to_string(),
        origin: CoverOrigin::Sidecar(path.to_path_buf()),
    })
}
