//! Internal domain models for metadata search.
//!
//! These types are OUR types - they don't change when provider APIs change.
//! Every provider response gets converted into these types via adapters.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// A metadata lookup request built from a track's known tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Query {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl Query {
    /// Build a query, trimming every field.
    pub fn new(title: impl AsRef<str>, artist: impl AsRef<str>, album: impl AsRef<str>) -> Self {
        Self {
            title: title.as_ref().trim().to_string(),
            artist: artist.as_ref().trim().to_string(),
            album: album.as_ref().trim().to_string(),
        }
    }

    /// True when no field carries any text.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.artist.trim().is_empty() && self.album.trim().is_empty()
    }

    /// Reject an empty query before any network activity.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        Ok(())
    }

    /// Non-empty fields joined by a space, used as the provider keyword.
    pub fn keyword(&self) -> String {
        [&self.title, &self.artist, &self.album]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Same query with the album constraint dropped.
    pub fn without_album(&self) -> Self {
        Self {
            album: String::new(),
            ..self.clone()
        }
    }

    pub fn has_album(&self) -> bool {
        !self.album.trim().is_empty()
    }
}

/// Which catalog a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Catalog A
    Qq,
    /// Catalog B
    Netease,
    /// Catalog C
    Kugou,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Qq, Source::Netease, Source::Kugou];

    /// Stable lowercase tag used in logs, config and CLI arguments.
    pub fn tag(self) -> &'static str {
        match self {
            Source::Qq => "qq",
            Source::Netease => "netease",
            Source::Kugou => "kugou",
        }
    }

    /// Catalog letter (A/B/C).
    pub fn letter(self) -> char {
        match self {
            Source::Qq => 'A',
            Source::Netease => 'B',
            Source::Kugou => 'C',
        }
    }

    /// Parse a tag or catalog letter, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "qq" | "a" => Some(Source::Qq),
            "netease" | "163" | "b" => Some(Source::Netease),
            "kugou" | "c" => Some(Source::Kugou),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One track-metadata result returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// LRC text (`[mm:ss.xx]line`), possibly bilingual, or empty
    pub lyrics: String,
    /// Reachability-checked image URL
    pub cover: Option<String>,
    /// Content-derived id, stable for the same (title, artist, album)
    pub id: String,
    pub source: Source,
    /// Zero-based position in the provider's own retained list
    pub platform_rank: usize,
    pub has_translation: bool,
}

impl Candidate {
    /// Create a candidate with no lyrics or cover yet.
    pub fn new(
        source: Source,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let artist = artist.into();
        let album = album.into();
        let id = candidate_id(&title, &artist, &album);
        Self {
            title,
            artist,
            album,
            lyrics: String::new(),
            cover: None,
            id,
            source,
            platform_rank: 0,
            has_translation: false,
        }
    }

    pub fn has_cover(&self) -> bool {
        self.cover.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    pub fn has_lyrics(&self) -> bool {
        !self.lyrics.trim().is_empty()
    }

    /// Short preview of the lyrics for log lines.
    pub fn lyrics_preview(&self) -> String {
        let preview: String = self.lyrics.chars().take(20).collect();
        if self.lyrics.chars().count() > 20 {
            format!("{}...", preview)
        } else {
            preview
        }
    }
}

/// A candidate with its composite score. Never persisted.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub score: f64,
    pub candidate: Candidate,
}

/// Deterministic id for a (title, artist, album) triple.
pub fn candidate_id(title: &str, artist: &str, album: &str) -> String {
    let digest = Sha256::digest(format!("title:{};artists:{};album:{}", title, artist, album));
    let hex = format!("{:x}", digest);
    hex[..32].to_string()
}

/// Errors that can occur while searching a provider
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    #[error("No query provided")]
    EmptyQuery,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Failed to decode payload: {0}")]
    Decode(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl SearchError {
    /// Transport or parse failure, as opposed to a caller mistake.
    pub fn is_remote(&self) -> bool {
        !matches!(self, SearchError::EmptyQuery)
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout(e.to_string())
        } else if e.is_decode() {
            SearchError::Parse(e.to_string())
        } else {
            SearchError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_rejected() {
        let query = Query::new("  ", "", "\t");
        assert!(query.is_empty());
        assert!(matches!(query.validate(), Err(SearchError::EmptyQuery)));
    }

    #[test]
    fn test_only_caller_mistakes_are_local() {
        assert!(!SearchError::EmptyQuery.is_remote());
        assert!(SearchError::Timeout("qq".into()).is_remote());
        assert!(SearchError::Http { status: 500, url: "http://x".into() }.is_remote());
    }

    #[test]
    fn test_keyword_skips_empty_fields() {
        let query = Query::new("可能", "程响", "");
        assert_eq!(query.keyword(), "可能 程响");
    }

    #[test]
    fn test_without_album() {
        let query = Query::new("Song", "Artist", "Album");
        let loose = query.without_album();
        assert_eq!(loose.album, "");
        assert_eq!(loose.title, "Song");
        assert!(query.has_album());
        assert!(!loose.has_album());
    }

    #[test]
    fn test_candidate_id_is_stable() {
        let a = Candidate::new(Source::Qq, "Song", "Artist", "Album");
        let b = Candidate::new(Source::Kugou, "Song", "Artist", "Album");
        let c = Candidate::new(Source::Qq, "Song", "Artist", "Other");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 32);
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(Source::parse("QQ"), Some(Source::Qq));
        assert_eq!(Source::parse("b"), Some(Source::Netease));
        assert_eq!(Source::parse("kugou"), Some(Source::Kugou));
        assert_eq!(Source::parse("spotify"), None);
        assert_eq!(Source::Netease.letter(), 'B');
    }

    #[test]
    fn test_lyrics_preview_truncates() {
        let mut c = Candidate::new(Source::Qq, "a", "b", "c");
        c.lyrics = "[00:01.00]一二三四五六七八九十一二三".to_string();
        assert!(c.lyrics_preview().ends_with("..."));
        assert!(c.has_lyrics());
        assert!(!c.has_cover());
    }
}
