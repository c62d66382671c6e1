//! Adapter layer: Convert KuGou DTOs to domain models

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::dto;
use crate::lyrics;
use crate::search::domain::{Candidate, SearchError, Source};

#[derive(Debug, Clone, PartialEq)]
pub struct KugouHit {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub hash: String,
    pub album_id: String,
}

pub fn to_hit(song: dto::Song) -> KugouHit {
    KugouHit {
        title: song.songname.trim().to_string(),
        artist: song.singername.trim().to_string(),
        album: song.album_name.trim().to_string(),
        hash: song.hash,
        album_id: song.album_id,
    }
}

/// Decode a Base64 lyric payload into normalized LRC.
pub fn decode_lyrics(content: &str) -> Result<String, SearchError> {
    let bytes = STANDARD
        .decode(content.trim())
        .map_err(|e| SearchError::Decode(format!("lyrics base64: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| SearchError::Decode(format!("lyrics utf-8: {}", e)))?;
    Ok(lyrics::normalize(text.trim_start_matches('\u{feff}')))
}

pub fn to_candidate(hit: &KugouHit, rank: usize, lyrics: String, cover: Option<String>) -> Candidate {
    let mut candidate = Candidate::new(Source::Kugou, &hit.title, &hit.artist, &hit.album);
    candidate.platform_rank = rank;
    candidate.lyrics = lyrics;
    candidate.cover = cover;
    candidate
}
