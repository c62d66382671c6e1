//! NetEase Cloud Music HTTP client

use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;

use super::adapter::{self, NeteaseHit};
use super::dto;
use crate::lyrics::{self, MergedLyrics};
use crate::search::domain::{Candidate, Query, SearchError, Source};
use crate::search::http;
use crate::search::options::ProviderOptions;
use crate::search::traits::Provider;

const ORIGIN: &str = "https://music.163.com";

/// Search type codes of the cloudsearch endpoint
const TYPE_SONG: &str = "1";
const TYPE_ARTIST: &str = "100";

/// NetEase Cloud Music API client
pub struct NeteaseClient {
    http_client: reqwest::Client,
    base_url: String,
    options: ProviderOptions,
}

impl NeteaseClient {
    pub fn new(options: ProviderOptions) -> Result<Self, SearchError> {
        Self::with_base_url(options, ORIGIN)
    }

    /// Create a client for testing with custom base URL
    pub fn with_base_url(options: ProviderOptions, base_url: impl Into<String>) -> Result<Self, SearchError> {
        let http_client = http::build_client(Some(ORIGIN), Some(ORIGIN), options.request_timeout)?;
        Ok(Self {
            http_client,
            base_url: base_url.into(),
            options,
        })
    }

    async fn cloudsearch<T: serde::de::DeserializeOwned>(
        &self,
        keyword: &str,
        search_type: &str,
        limit: usize,
    ) -> Result<T, SearchError> {
        let url = format!("{}/api/cloudsearch/pc", self.base_url);
        let limit = limit.to_string();
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("s", keyword),
                ("type", search_type),
                ("offset", "0"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        http::read_json(response).await
    }

    async fn fetch_lyrics(&self, song_id: u64) -> Result<MergedLyrics, SearchError> {
        let url = format!("{}/api/song/lyric?id={}&lv=1&tv=1", self.base_url, song_id);
        let response: dto::LyricResponse = http::get_json(&self.http_client, &url).await?;
        let (original, translation) = response.into_streams();
        Ok(lyrics::merge_bilingual(&original, &translation))
    }

    async fn album_picture(&self, album_id: u64) -> Result<Option<String>, SearchError> {
        let url = format!("{}/api/album/{}?ext=true", self.base_url, album_id);
        let response: dto::AlbumResponse = http::get_json(&self.http_client, &url).await?;
        Ok(response
            .album
            .and_then(|a| a.pic_url)
            .filter(|u| !u.trim().is_empty()))
    }

    /// Search picture first, album endpoint as fallback.
    async fn resolve_cover(&self, hit: &NeteaseHit) -> Option<String> {
        if let Some(ref picture) = hit.picture {
            return Some(picture.clone());
        }
        let album_id = hit.album_id?;
        match self.album_picture(album_id).await {
            Ok(picture) => picture,
            Err(e) => {
                tracing::warn!(album_id, "album picture unavailable: {}", e);
                None
            }
        }
    }

    async fn fetch_detail(&self, hit: &NeteaseHit, rank: usize) -> Candidate {
        let started = Instant::now();
        let (lyrics, cover) = tokio::join!(self.fetch_lyrics(hit.song_id), self.resolve_cover(hit));
        let lyrics = lyrics.unwrap_or_else(|e| {
            tracing::warn!(song = %hit.title, "lyrics unavailable: {}", e);
            MergedLyrics::default()
        });
        tracing::debug!(
            song = %hit.title,
            rank,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{} candidate detail",
            Source::Netease
        );
        adapter::to_candidate(hit, rank, lyrics, cover)
    }

    async fn search_tracks(&self, query: &Query) -> Result<Vec<Candidate>, SearchError> {
        let response: dto::SongSearchResponse = self
            .cloudsearch(&query.keyword(), TYPE_SONG, self.options.fetch_limit)
            .await?;

        let scoring = self.options.scoring;
        let scored = response
            .into_songs()
            .into_iter()
            .map(adapter::to_hit)
            .map(|hit| {
                let score = scoring.score(query, &hit.titles(), &hit.artist, &hit.album);
                (score, hit)
            })
            .collect();
        let kept = scoring.select(scored, self.options.keep);
        tracing::debug!(query = %query.keyword(), kept = kept.len(), "netease search");

        let details = kept
            .iter()
            .enumerate()
            .map(|(rank, (_, hit))| self.fetch_detail(hit, rank));
        Ok(join_all(details).await)
    }

    async fn find_artist(&self, artist: &str) -> Result<Option<dto::ArtistHit>, SearchError> {
        let response: dto::ArtistSearchResponse = self
            .cloudsearch(&artist.to_lowercase(), TYPE_ARTIST, 1)
            .await?;
        Ok(response
            .result
            .and_then(|r| r.artists)
            .and_then(|artists| artists.into_iter().next()))
    }

    /// Artwork lookup for title-less queries.
    async fn search_artwork(&self, query: &Query) -> Result<Vec<Candidate>, SearchError> {
        if query.artist.is_empty() {
            tracing::debug!("netease artwork lookup needs an artist");
            return Ok(Vec::new());
        }
        let Some(artist) = self.find_artist(&query.artist).await? else {
            return Ok(Vec::new());
        };

        if !query.has_album() {
            return Ok(artist
                .img1v1_url
                .filter(|u| !u.trim().is_empty())
                .map(|url| vec![adapter::artwork_candidate(&artist.name, "", url)])
                .unwrap_or_default());
        }

        let url = format!(
            "{}/api/artist/albums/{}?offset=0&total=true&limit=300",
            self.base_url, artist.id
        );
        let response: dto::ArtistAlbumsResponse = http::get_json(&self.http_client, &url).await?;
        let albums = response.hot_albums.unwrap_or_default();
        let Some(album) = adapter::pick_album(&albums, &query.album) else {
            return Ok(Vec::new());
        };

        let picture = match album.pic_url.clone().filter(|u| !u.trim().is_empty()) {
            Some(picture) => Some(picture),
            None => self.album_picture(album.id).await?,
        };
        Ok(picture
            .map(|url| vec![adapter::artwork_candidate(&artist.name, &album.name, url)])
            .unwrap_or_default())
    }
}

#[async_trait]
impl Provider for NeteaseClient {
    fn source(&self) -> Source {
        Source::Netease
    }

    async fn try_search(&self, query: &Query) -> Result<Vec<Candidate>, SearchError> {
        query.validate()?;
        if query.title.is_empty() {
            return self.search_artwork(query).await;
        }
        self.search_tracks(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options() -> ProviderOptions {
        ProviderOptions {
            request_timeout: Duration::from_secs(5),
            ..ProviderOptions::for_source(Source::Netease)
        }
    }

    async fn client(server: &MockServer) -> NeteaseClient {
        NeteaseClient::with_base_url(options(), server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_alias_match_with_album_fallback_cover() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cloudsearch/pc"))
            .and(query_param("type", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "result": {"songs": [{
                    "id": 185809,
                    "name": "分裂",
                    "alia": ["离开"],
                    "ar": [{"id": 6452, "name": "周杰伦"}],
                    "al": {"id": 18903, "name": "八度空间", "picUrl": null}
                }]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/song/lyric"))
            .and(query_param("id", "185809"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "lrc": {"lyric": "[00:10.00]离开\n[00:20.00]分裂"},
                "tlyric": {"lyric": ""}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/album/18903"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "album": {"id": 18903, "name": "八度空间", "picUrl": "http://img/18903.jpg"}
            })))
            .mount(&server)
            .await;

        let results = client(&server)
            .await
            .try_search(&Query::new("离开", "周杰伦", ""))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        let c = &results[0];
        assert_eq!(c.source, Source::Netease);
        assert_eq!(c.title, "分裂");
        assert_eq!(c.cover.as_deref(), Some("http://img/18903.jpg"));
        assert_eq!(c.lyrics, "[00:10.00]离开\n[00:20.00]分裂");
        assert!(!c.has_translation);
    }

    #[tokio::test]
    async fn test_artist_only_returns_portrait() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cloudsearch/pc"))
            .and(query_param("type", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "result": {"artistCount": 1, "artists": [
                    {"id": 6452, "name": "周杰伦", "img1v1Url": "http://img/portrait.jpg"}
                ]}
            })))
            .mount(&server)
            .await;

        let results = client(&server)
            .await
            .try_search(&Query::new("", "周杰伦", ""))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].cover.as_deref(), Some("http://img/portrait.jpg"));
        assert!(!results[0].has_lyrics());
    }

    #[tokio::test]
    async fn test_artist_and_album_returns_album_picture() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cloudsearch/pc"))
            .and(query_param("type", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"artists": [{"id": 6452, "name": "周杰伦"}]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/artist/albums/6452"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "hotAlbums": [
                    {"id": 1, "name": "叶惠美", "picUrl": "http://img/1.jpg"},
                    {"id": 2, "name": "范特西", "picUrl": null}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/album/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "album": {"id": 2, "name": "范特西", "picUrl": "http://img/2.jpg"}
            })))
            .mount(&server)
            .await;

        let results = client(&server)
            .await
            .try_search(&Query::new("", "周杰伦", "范特西"))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].album, "范特西");
        assert_eq!(results[0].cover.as_deref(), Some("http://img/2.jpg"));
    }

    #[tokio::test]
    async fn test_album_only_query_returns_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let results = client(&server)
            .await
            .try_search(&Query::new("", "", "范特西"))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_search_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cloudsearch/pc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
            .mount(&server)
            .await;

        let result = client(&server)
            .await
            .try_search(&Query::new("可能", "程响", ""))
            .await;
        assert!(matches!(result, Err(SearchError::Parse(_))));
    }
}
