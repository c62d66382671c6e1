//! Audio files on disk: discovery, tag reading and sidecar output.
//!
//! The backfill job walks a directory, reads each file's tags into a
//! [`Query`], and works out what is missing by looking for sidecar files
//! next to the track:
//!
//! - lyrics: `<stem>.lrc`
//! - artwork: any image [`cover::find_sidecar_cover`] would pick up
//!
//! Embedded artwork is not checked here; the resolver does that itself
//! before going to the network.

mod tags;
mod writer;

use std::path::{Path, PathBuf};

use futures::stream::{Stream, StreamExt};
use tokio::sync::mpsc;
use walkdir::WalkDir;

pub use tags::{TrackTags, read_tags};
pub use writer::{download_cover, write_cover, write_lyrics};

use crate::cover;
use crate::error::{Error, Result};
use crate::search::{Needs, Query, TrackRequest};

/// Extensions treated as audio (compared case-insensitively).
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "opus", "m4a", "wav", "ape", "wma"];

/// Check if a path has an audio file extension
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Sidecar lyrics path for an audio file.
pub fn lrc_path(audio_path: &Path) -> PathBuf {
    audio_path.with_extension("lrc")
}

/// Scans the given root directory recursively for audio files.
///
/// A single file path yields just that file when it is audio.
pub fn scan(root: PathBuf) -> impl Stream<Item = PathBuf> {
    let (tx, rx) = mpsc::channel(100);

    // Spawn a blocking task to perform the synchronous file system traversal
    tokio::task::spawn_blocking(move || {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_audio_file(entry.path()) {
                // Receiver dropped: stop walking
                if tx.blocking_send(entry.path().to_path_buf()).is_err() {
                    break;
                }
            }
        }
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|path| (path, rx))
    })
}

/// One audio file and what it is missing.
#[derive(Debug, Clone)]
pub struct LibraryTrack {
    pub path: PathBuf,
    pub query: Query,
    pub has_lyrics_file: bool,
    pub has_cover_file: bool,
}

impl LibraryTrack {
    /// Read tags and inspect sidecars. Blocking.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::not_found(path));
        }
        let tags = read_tags(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            query: tags.to_query(),
            has_lyrics_file: lrc_path(path).is_file(),
            has_cover_file: cover::find_sidecar_cover(path).is_some(),
        })
    }

    /// Stable id used to key batch results.
    pub fn id(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub fn needs(&self) -> Needs {
        Needs {
            cover: !self.has_cover_file,
            lyrics: !self.has_lyrics_file,
        }
    }

    pub fn to_request(&self) -> TrackRequest {
        TrackRequest {
            id: self.id(),
            query: self.query.clone(),
            needs: self.needs(),
            path: Some(self.path.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScanEvent {
    Found(LibraryTrack),
    Error(PathBuf, String),
}

/// Scan a directory and load every audio file found.
pub fn scan_library(root: PathBuf) -> impl Stream<Item = ScanEvent> {
    scan(root)
        .map(|path| async move {
            let loaded = {
                let path = path.clone();
                tokio::task::spawn_blocking(move || LibraryTrack::load(&path)).await
            };
            match loaded {
                Ok(Ok(track)) => ScanEvent::Found(track),
                Ok(Err(e)) => ScanEvent::Error(path, e.to_string()),
                Err(e) => ScanEvent::Error(path, e.to_string()),
            }
        })
        .buffer_unordered(10)
}
