//! KuGou HTTP client

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::future::join_all;
use rand::Rng;

use super::adapter::{self, KugouHit};
use super::dto;
use crate::search::domain::{Candidate, Query, SearchError, Source};
use crate::search::http;
use crate::search::options::ProviderOptions;
use crate::search::traits::Provider;

const DFID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const DEVICE_ID_LEN: usize = 23;

/// Base URLs of the endpoints the client talks to.
#[derive(Debug, Clone)]
pub struct KugouEndpoints {
    pub search_url: String,
    pub lyric_search_url: String,
    pub lyric_download_url: String,
    pub play_data_url: String,
}

impl Default for KugouEndpoints {
    fn default() -> Self {
        Self {
            search_url: "http://mobilecdn.kugou.com/api/v3/search/song".to_string(),
            lyric_search_url: "https://krcs.kugou.com/search".to_string(),
            lyric_download_url: "http://lyrics.kugou.com/download".to_string(),
            play_data_url: "https://wwwapi.kugou.com/yy/index.php".to_string(),
        }
    }
}

/// KuGou API client
pub struct KugouClient {
    http_client: reqwest::Client,
    endpoints: KugouEndpoints,
    options: ProviderOptions,
}

fn random_id(charset: &[u8]) -> String {
    let mut rng = rand::rng();
    (0..DEVICE_ID_LEN)
        .map(|_| charset[rng.random_range(0..charset.len())] as char)
        .collect()
}

fn timestamp_millis() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}

impl KugouClient {
    pub fn new(options: ProviderOptions) -> Result<Self, SearchError> {
        Self::with_endpoints(options, KugouEndpoints::default())
    }

    pub fn with_endpoints(options: ProviderOptions, endpoints: KugouEndpoints) -> Result<Self, SearchError> {
        let http_client = http::build_client(None, None, options.request_timeout)?;
        Ok(Self {
            http_client,
            endpoints,
            options,
        })
    }

    async fn search_songs(&self, keyword: &str) -> Result<Vec<dto::Song>, SearchError> {
        let page_size = self.options.fetch_limit.to_string();
        let response = self
            .http_client
            .get(&self.endpoints.search_url)
            .query(&[
                ("format", "json"),
                ("keyword", keyword),
                ("page", "1"),
                ("pagesize", page_size.as_str()),
                ("showtype", "1"),
            ])
            .send()
            .await?;
        let parsed: dto::SearchResponse = http::read_json(response).await?;
        Ok(parsed.into_songs())
    }

    /// Hash -> lyric candidate -> Base64 download -> normalized LRC.
    async fn fetch_lyrics(&self, hash: &str) -> Result<String, SearchError> {
        if hash.is_empty() {
            return Ok(String::new());
        }
        let response = self
            .http_client
            .get(&self.endpoints.lyric_search_url)
            .query(&[
                ("ver", "1"),
                ("man", "yes"),
                ("client", "mobi"),
                ("keyword", ""),
                ("duration", ""),
                ("hash", hash),
                ("album_audio_id", ""),
            ])
            .send()
            .await?;
        let found: dto::LyricSearchResponse = http::read_json(response).await?;
        let Some(first) = found.candidates.into_iter().next() else {
            return Ok(String::new());
        };

        let response = self
            .http_client
            .get(&self.endpoints.lyric_download_url)
            .query(&[
                ("ver", "1"),
                ("client", "pc"),
                ("id", first.id.as_str()),
                ("accesskey", first.accesskey.as_str()),
                ("fmt", "lrc"),
                ("charset", "utf8"),
            ])
            .send()
            .await?;
        let download: dto::LyricDownloadResponse = http::read_json(response).await?;
        if download.content.is_empty() {
            return Ok(String::new());
        }
        adapter::decode_lyrics(&download.content)
    }

    async fn fetch_cover(&self, hit: &KugouHit) -> Result<Option<String>, SearchError> {
        let dfid = random_id(DFID_CHARSET);
        let mid = random_id(MID_CHARSET);
        let now = timestamp_millis();
        let response = self
            .http_client
            .get(&self.endpoints.play_data_url)
            .query(&[
                ("r", "play/getdata"),
                ("hash", hit.hash.as_str()),
                ("dfid", dfid.as_str()),
                ("mid", mid.as_str()),
                ("album_id", hit.album_id.as_str()),
                ("_", now.as_str()),
            ])
            .send()
            .await?;
        let parsed: dto::PlayDataResponse = http::read_json(response).await?;
        Ok(parsed.image().map(str::to_string))
    }

    async fn fetch_detail(&self, hit: &KugouHit, rank: usize) -> Candidate {
        let started = Instant::now();
        let (lyrics, cover) = tokio::join!(self.fetch_lyrics(&hit.hash), self.fetch_cover(hit));
        let lyrics = lyrics.unwrap_or_else(|e| {
            tracing::warn!(song = %hit.title, "lyrics unavailable: {}", e);
            String::new()
        });
        let cover = cover.unwrap_or_else(|e| {
            tracing::warn!(song = %hit.title, "cover unavailable: {}", e);
            None
        });
        tracing::debug!(
            song = %hit.title,
            rank,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{} candidate detail",
            Source::Kugou
        );
        adapter::to_candidate(hit, rank, lyrics, cover)
    }
}

#[async_trait]
impl Provider for KugouClient {
    fn source(&self) -> Source {
        Source::Kugou
    }

    async fn try_search(&self, query: &Query) -> Result<Vec<Candidate>, SearchError> {
        query.validate()?;

        let songs = self.search_songs(&query.keyword()).await?;
        let scoring = self.options.scoring;
        let scored = songs
            .into_iter()
            .map(adapter::to_hit)
            .map(|hit| {
                let score = scoring.score(query, &[hit.title.as_str()], &hit.artist, &hit.album);
                (score, hit)
            })
            .collect();
        let kept = scoring.select(scored, self.options.keep);
        tracing::debug!(query = %query.keyword(), kept = kept.len(), "kugou search");

        let details = kept
            .iter()
            .enumerate()
            .map(|(rank, (_, hit))| self.fetch_detail(hit, rank));
        Ok(join_all(details).await)
    }
}
