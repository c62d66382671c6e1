//! Sidecar output for backfilled metadata.
//!
//! Files are written to a temporary name first and renamed into place so
//! a crashed run never leaves half an image behind.

use std::path::{Path, PathBuf};

use super::lrc_path;
use crate::cover::{self, CoverArt};
use crate::error::{Result, ResultExt};

fn write_atomic(target: &Path, data: &[u8]) -> Result<()> {
    let mut temp = target.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    std::fs::write(&temp, data).with_context(format!("writing {}", temp.display()))?;
    std::fs::rename(&temp, target).with_context(format!("renaming to {}", target.display()))?;
    Ok(())
}

/// Write `<stem>.lrc` next to the audio file.
pub fn write_lyrics(audio_path: &Path, lyrics: &str) -> Result<PathBuf> {
    let target = lrc_path(audio_path);
    let mut text = lyrics.trim_end().to_string();
    text.push('\n');
    write_atomic(&target, text.as_bytes())?;
    tracing::debug!("Wrote lyrics to {:?}", target);
    Ok(target)
}

/// Write `<stem>.<ext>` next to the audio file, extension from the MIME type.
pub fn write_cover(audio_path: &Path, art: &CoverArt) -> Result<PathBuf> {
    let target = audio_path.with_extension(art.extension());
    write_atomic(&target, &art.data)?;
    tracing::debug!("Wrote cover to {:?}", target);
    Ok(target)
}

/// Fetch a remote cover and write it next to the audio file.
pub async fn download_cover(client: &reqwest::Client, audio_path: &Path, url: &str) -> Result<PathBuf> {
    let art = cover::download(client, url)
        .await
        .with_context(format!("downloading cover {}", url))?;
    write_cover(audio_path, &art)
}
