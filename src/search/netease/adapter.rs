//! Adapter layer: Convert NetEase DTOs to domain models

use super::dto;
use crate::lyrics::MergedLyrics;
use crate::search::domain::{Candidate, Source};
use crate::similarity::association;

/// A search result reduced to what scoring and detail fetching need.
#[derive(Debug, Clone, PartialEq)]
pub struct NeteaseHit {
    pub song_id: u64,
    pub title: String,
    pub aliases: Vec<String>,
    pub artist: String,
    pub album: String,
    pub album_id: Option<u64>,
    pub picture: Option<String>,
}

impl NeteaseHit {
    /// Song name followed by its aliases.
    pub fn titles(&self) -> Vec<&str> {
        std::iter::once(self.title.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .collect()
    }
}

pub fn to_hit(song: dto::Song) -> NeteaseHit {
    let artist = song
        .ar
        .unwrap_or_default()
        .iter()
        .map(|a| a.name.trim())
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let (album, album_id, picture) = match song.al {
        Some(al) => (
            al.name.trim().to_string(),
            (al.id != 0).then_some(al.id),
            al.pic_url.filter(|u| !u.trim().is_empty()),
        ),
        None => (String::new(), None, None),
    };

    NeteaseHit {
        song_id: song.id,
        title: song.name.trim().to_string(),
        aliases: song
            .alia
            .unwrap_or_default()
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .collect(),
        artist,
        album,
        album_id,
        picture,
    }
}

pub fn to_candidate(hit: &NeteaseHit, rank: usize, lyrics: MergedLyrics, cover: Option<String>) -> Candidate {
    let mut candidate = Candidate::new(Source::Netease, &hit.title, &hit.artist, &hit.album);
    candidate.platform_rank = rank;
    candidate.lyrics = lyrics.text;
    candidate.has_translation = lyrics.has_translation;
    candidate.cover = cover;
    candidate
}

/// Pick the album whose name matches exactly, else the most similar one.
pub fn pick_album<'a>(albums: &'a [dto::Album], wanted: &str) -> Option<&'a dto::Album> {
    if let Some(exact) = albums.iter().find(|a| a.name == wanted) {
        return Some(exact);
    }

    let mut best: Option<(&dto::Album, f64)> = None;
    for album in albums {
        let similarity = association(wanted, &album.name);
        if similarity > best.map_or(0.0, |(_, s)| s) {
            best = Some((album, similarity));
        }
    }
    best.map(|(album, _)| album)
}

/// Artwork-only candidate (no title, no lyrics).
pub fn artwork_candidate(artist: &str, album: &str, cover: String) -> Candidate {
    let mut candidate = Candidate::new(Source::Netease, "", artist, album);
    candidate.cover = Some(cover);
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(id: u64, name: &str) -> dto::Album {
        dto::Album {
            id,
            name: name.to_string(),
            pic_url: None,
        }
    }

    #[test]
    fn test_to_hit_collects_aliases_and_picture() {
        let song = dto::Song {
            id: 7,
            name: "分裂".into(),
            alia: Some(vec!["离开".into(), " ".into()]),
            ar: Some(vec![dto::Artist { id: 1, name: "周杰伦".into() }]),
            al: Some(dto::Album {
                id: 9,
                name: "八度空间".into(),
                pic_url: Some("http://pic".into()),
            }),
        };
        let hit = to_hit(song);
        assert_eq!(hit.titles(), vec!["分裂", "离开"]);
        assert_eq!(hit.album_id, Some(9));
        assert_eq!(hit.picture.as_deref(), Some("http://pic"));
    }

    #[test]
    fn test_to_hit_without_album() {
        let hit = to_hit(dto::Song {
            id: 1,
            name: "x".into(),
            ..Default::default()
        });
        assert_eq!(hit.album, "");
        assert!(hit.album_id.is_none());
        assert!(hit.picture.is_none());
        assert_eq!(hit.artist, "");
    }

    #[test]
    fn test_pick_album_prefers_exact_name() {
        let albums = vec![album(1, "范特西 Plus"), album(2, "范特西")];
        assert_eq!(pick_album(&albums, "范特西").map(|a| a.id), Some(2));
    }

    #[test]
    fn test_pick_album_falls_back_to_most_similar() {
        let albums = vec![album(1, "叶惠美"), album(2, "范特西 Plus")];
        assert_eq!(pick_album(&albums, "范特西").map(|a| a.id), Some(2));
        assert!(pick_album(&[], "范特西").is_none());
    }
}
