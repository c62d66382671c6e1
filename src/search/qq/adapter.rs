//! Adapter layer: Convert QQ Music DTOs to domain models

use super::dto;
use crate::search::domain::{Candidate, Source};
use crate::lyrics::MergedLyrics;

/// Ids shorter than this are placeholders and never resolve to an image.
const MIN_IMAGE_ID_LEN: usize = 4;

/// A search result reduced to what scoring and detail fetching need.
#[derive(Debug, Clone, PartialEq)]
pub struct QqHit {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub song_mid: String,
    pub album_mid: String,
    pub image_ids: Vec<String>,
}

/// Flatten one search result.
pub fn to_hit(song: dto::Song) -> QqHit {
    let artist = song
        .singer
        .iter()
        .map(|s| s.name.trim())
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    QqHit {
        title: song.name.trim().to_string(),
        artist,
        album: song.album.title.trim().to_string(),
        song_mid: song.mid,
        album_mid: song.album.mid,
        image_ids: song.vs,
    }
}

/// Album cover URL for the hit, if the album mid looks usable.
pub fn album_cover_url(photo_base: &str, hit: &QqHit) -> Option<String> {
    (hit.album_mid.len() >= MIN_IMAGE_ID_LEN)
        .then(|| format!("{}/T002R300x300M000{}.jpg", photo_base, hit.album_mid))
}

/// Fallback image URLs built from the alternate image ids, in listed order.
pub fn fallback_cover_urls(photo_base: &str, hit: &QqHit) -> Vec<String> {
    hit.image_ids
        .iter()
        .map(|v| v.trim())
        .filter(|v| v.len() >= MIN_IMAGE_ID_LEN)
        .map(|v| format!("{}/T062R300x300M000{}.jpg", photo_base, v))
        .collect()
}

/// Build the domain candidate once details are resolved.
pub fn to_candidate(hit: &QqHit, rank: usize, lyrics: MergedLyrics, cover: Option<String>) -> Candidate {
    let mut candidate = Candidate::new(Source::Qq, &hit.title, &hit.artist, &hit.album);
    candidate.platform_rank = rank;
    candidate.lyrics = lyrics.text;
    candidate.has_translation = lyrics.has_translation;
    candidate.cover = cover;
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> dto::Song {
        dto::Song {
            mid: "songmid".into(),
            name: " 晴天 ".into(),
            album: dto::Album {
                mid: "000MkMni19ClKG".into(),
                title: "叶惠美".into(),
            },
            singer: vec![
                dto::Singer { name: "周杰伦".into() },
                dto::Singer { name: "".into() },
                dto::Singer { name: "Lara".into() },
            ],
            vs: vec!["".into(), "abc".into(), "Q00012ab".into()],
        }
    }

    #[test]
    fn test_to_hit_joins_singers() {
        let hit = to_hit(song());
        assert_eq!(hit.title, "晴天");
        assert_eq!(hit.artist, "周杰伦 Lara");
        assert_eq!(hit.album, "叶惠美");
    }

    #[test]
    fn test_cover_urls() {
        let hit = to_hit(song());
        assert_eq!(
            album_cover_url("https://y.qq.com/music/photo_new", &hit).as_deref(),
            Some("https://y.qq.com/music/photo_new/T002R300x300M000000MkMni19ClKG.jpg")
        );
        assert_eq!(
            fallback_cover_urls("http://img", &hit),
            vec!["http://img/T062R300x300M000Q00012ab.jpg".to_string()]
        );
    }

    #[test]
    fn test_short_album_mid_has_no_cover_url() {
        let mut hit = to_hit(song());
        hit.album_mid = "ab".into();
        assert!(album_cover_url("http://img", &hit).is_none());
    }

    #[test]
    fn test_to_candidate_carries_details() {
        let hit = to_hit(song());
        let lyrics = MergedLyrics {
            text: "[00:01.00]line".into(),
            has_translation: true,
        };
        let c = to_candidate(&hit, 2, lyrics, Some("http://img/x.jpg".into()));
        assert_eq!(c.source, Source::Qq);
        assert_eq!(c.platform_rank, 2);
        assert!(c.has_translation);
        assert!(c.has_cover());
    }
}
