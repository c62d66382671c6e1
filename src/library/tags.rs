//! Tag reading via lofty.

use std::path::Path;

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::Accessor;

use crate::error::{Error, Result};
use crate::search::Query;

/// The tags a search needs. Empty strings mean "not tagged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl TrackTags {
    pub fn to_query(&self) -> Query {
        Query::new(&self.title, &self.artist, &self.album)
    }

    /// Fill a missing title (and artist) from a `Artist - Title` file name.
    fn fill_from_file_name(&mut self, path: &Path) {
        if !self.title.trim().is_empty() {
            return;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return;
        };
        match stem.split_once(" - ") {
            Some((artist, title)) if self.artist.trim().is_empty() => {
                self.artist = artist.trim().to_string();
                self.title = title.trim().to_string();
            }
            _ => self.title = stem.trim().to_string(),
        }
    }
}

/// Read title, artist and album from an audio file.
pub fn read_tags(path: &Path) -> Result<TrackTags> {
    let tagged_file = Probe::open(path)
        .map_err(|e| Error::tags(path, e.to_string()))?
        .read()
        .map_err(|e| Error::tags(path, e.to_string()))?;

    // Primary tag, or fall back to the first available tag
    let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

    let mut tags = TrackTags {
        title: tag.and_then(|t| t.title().map(|s| s.to_string())).unwrap_or_default(),
        artist: tag.and_then(|t| t.artist().map(|s| s.to_string())).unwrap_or_default(),
        album: tag.and_then(|t| t.album().map(|s| s.to_string())).unwrap_or_default(),
    };
    tags.fill_from_file_name(path);
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_non_audio_file_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "This is just some text, not music.").unwrap();
        assert!(matches!(read_tags(file.path()), Err(Error::Tags { .. })));
    }

    #[test]
    fn test_read_non_existent_file_returns_error() {
        assert!(read_tags(Path::new("non_existent_file.mp3")).is_err());
    }

    #[test]
    fn test_file_name_fills_missing_title_and_artist() {
        let mut tags = TrackTags::default();
        tags.fill_from_file_name(Path::new("/music/Queen - Bohemian Rhapsody.mp3"));
        assert_eq!(tags.artist, "Queen");
        assert_eq!(tags.title, "Bohemian Rhapsody");
    }

    #[test]
    fn test_file_name_keeps_tagged_artist() {
        let mut tags = TrackTags {
            artist: "周杰伦".into(),
            ..TrackTags::default()
        };
        tags.fill_from_file_name(Path::new("/music/01 - 晴天.flac"));
        assert_eq!(tags.artist, "周杰伦");
        assert_eq!(tags.title, "01 - 晴天");
    }

    #[test]
    fn test_tagged_title_wins() {
        let mut tags = TrackTags {
            title: "Yesterday".into(),
            ..TrackTags::default()
        };
        tags.fill_from_file_name(Path::new("/music/Someone - Else.mp3"));
        assert_eq!(tags.title, "Yesterday");
        assert!(tags.artist.is_empty());
        assert_eq!(tags.to_query(), Query::new("Yesterday", "", ""));
    }
}
