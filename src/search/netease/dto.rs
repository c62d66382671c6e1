//! NetEase Cloud Music API Data Transfer Objects
//!
//! The API answers `null` for many list fields, so lists are modeled as
//! `Option<Vec<_>>`. Do not use these types outside the netease module.

use serde::{Deserialize, Serialize};

/// `cloudsearch/pc` response with `type=1` (songs)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SongSearchResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub result: Option<SongResult>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SongResult {
    #[serde(default)]
    pub songs: Option<Vec<Song>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Song {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Alternative titles
    #[serde(default)]
    pub alia: Option<Vec<String>>,
    #[serde(default)]
    pub ar: Option<Vec<Artist>>,
    #[serde(default)]
    pub al: Option<Album>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Artist {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// Album as embedded in songs and returned by album endpoints
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pic_url: Option<String>,
}

/// `song/lyric` response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LyricResponse {
    #[serde(default)]
    pub lrc: Option<LyricBlock>,
    /// Translation
    #[serde(default)]
    pub tlyric: Option<LyricBlock>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LyricBlock {
    #[serde(default)]
    pub lyric: Option<String>,
}

/// `album/{id}` response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AlbumResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub album: Option<Album>,
}

/// `cloudsearch/pc` response with `type=100` (artists)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArtistSearchResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub result: Option<ArtistResult>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArtistResult {
    #[serde(default)]
    pub artists: Option<Vec<ArtistHit>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistHit {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Square portrait
    #[serde(default, rename = "img1v1Url")]
    pub img1v1_url: Option<String>,
}

/// `artist/albums/{id}` response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistAlbumsResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub hot_albums: Option<Vec<Album>>,
}

impl SongSearchResponse {
    pub fn into_songs(self) -> Vec<Song> {
        self.result.and_then(|r| r.songs).unwrap_or_default()
    }
}

impl LyricResponse {
    /// Original and translated LRC text, empty when absent.
    pub fn into_streams(self) -> (String, String) {
        let text = |block: Option<LyricBlock>| block.and_then(|b| b.lyric).unwrap_or_default();
        (text(self.lrc), text(self.tlyric))
    }
}
