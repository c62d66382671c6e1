//! QQ Music HTTP client

use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;

use super::adapter::{self, QqHit};
use super::dto;
use crate::lyrics::{self, MergedLyrics};
use crate::search::domain::{Candidate, Query, SearchError, Source};
use crate::search::http;
use crate::search::options::ProviderOptions;
use crate::search::traits::Provider;

const ORIGIN: &str = "https://y.qq.com/";

/// Base URLs of the endpoints the client talks to.
#[derive(Debug, Clone)]
pub struct QqEndpoints {
    pub search_url: String,
    pub lyric_url: String,
    /// Prefix of cover image URLs (without trailing slash)
    pub photo_base: String,
}

impl Default for QqEndpoints {
    fn default() -> Self {
        Self {
            search_url: "https://u.y.qq.com/cgi-bin/musicu.fcg".to_string(),
            lyric_url: "https://i.y.qq.com/lyric/fcgi-bin/fcg_query_lyric_new.fcg".to_string(),
            photo_base: "https://y.qq.com/music/photo_new".to_string(),
        }
    }
}

/// QQ Music API client
pub struct QqClient {
    http_client: reqwest::Client,
    endpoints: QqEndpoints,
    options: ProviderOptions,
}

impl QqClient {
    /// Create a client against the public endpoints.
    pub fn new(options: ProviderOptions) -> Result<Self, SearchError> {
        Self::with_endpoints(options, QqEndpoints::default())
    }

    /// Create a client against custom endpoints (used by tests).
    pub fn with_endpoints(options: ProviderOptions, endpoints: QqEndpoints) -> Result<Self, SearchError> {
        let http_client = http::build_client(Some(ORIGIN), Some(ORIGIN), options.request_timeout)?;
        Ok(Self {
            http_client,
            endpoints,
            options,
        })
    }

    /// Raw keyword search.
    async fn search_songs(&self, keyword: &str) -> Result<Vec<dto::Song>, SearchError> {
        let body = dto::search_request(keyword, self.options.fetch_limit);
        let response = self
            .http_client
            .post(&self.endpoints.search_url)
            .json(&body)
            .send()
            .await?;
        let parsed: dto::SearchResponse = http::read_json(response).await?;
        Ok(parsed.into_songs())
    }

    /// Fetch and merge the original and translated lyric streams.
    async fn fetch_lyrics(&self, song_mid: &str) -> Result<MergedLyrics, SearchError> {
        if song_mid.is_empty() {
            return Ok(MergedLyrics::default());
        }
        let response = self
            .http_client
            .get(&self.endpoints.lyric_url)
            .query(&[
                ("songmid", song_mid),
                ("g_tk", "5381"),
                ("format", "json"),
                ("inCharset", "utf8"),
                ("outCharset", "utf-8"),
                ("nobase64", "1"),
            ])
            .send()
            .await?;
        let parsed: dto::LyricResponse = http::read_json(response).await?;
        Ok(lyrics::merge_bilingual(&parsed.lyric, &parsed.trans))
    }

    /// Album cover first, then the alternate images in listed order.
    async fn resolve_cover(&self, hit: &QqHit) -> Option<String> {
        if let Some(url) = adapter::album_cover_url(&self.endpoints.photo_base, hit) {
            if http::probe(&self.http_client, &url, self.options.cover_probe_timeout).await {
                return Some(url);
            }
            tracing::debug!(album_mid = %hit.album_mid, "album cover unreachable, trying alternates");
        }

        let fallbacks = adapter::fallback_cover_urls(&self.endpoints.photo_base, hit);
        if fallbacks.is_empty() {
            return None;
        }
        http::first_reachable(&self.http_client, &fallbacks, self.options.fallback_probe_timeout).await
    }

    async fn fetch_detail(&self, hit: &QqHit, rank: usize) -> Candidate {
        let started = Instant::now();
        let (lyrics, cover) = tokio::join!(self.fetch_lyrics(&hit.song_mid), self.resolve_cover(hit));
        let lyrics = lyrics.unwrap_or_else(|e| {
            tracing::warn!(song = %hit.title, "lyrics unavailable: {}", e);
            MergedLyrics::default()
        });
        tracing::debug!(
            song = %hit.title,
            rank,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{} candidate detail",
            Source::Qq
        );
        adapter::to_candidate(hit, rank, lyrics, cover)
    }
}

#[async_trait]
impl Provider for QqClient {
    fn source(&self) -> Source {
        Source::Qq
    }

    async fn try_search(&self, query: &Query) -> Result<Vec<Candidate>, SearchError> {
        query.validate()?;
        if query.title.is_empty() {
            tracing::debug!("qq search needs a title, skipping");
            return Ok(Vec::new());
        }

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
        tracing::debug!(query = %query.keyword(), kept = kept.len(), "qq search");

        let details = kept
            .iter()
            .enumerate()
            .map(|(rank, (_, hit))| self.fetch_detail(hit, rank));
        Ok(join_all(details).await)
    }
}
