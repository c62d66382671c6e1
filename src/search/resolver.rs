//! Per-track resolution with widen-and-retry, and batch backfill.
//!
//! A track arrives with a needs descriptor (cover, lyrics). Local artwork is
//! checked first; whatever is still missing is looked up by querying the
//! providers one after another, stopping as soon as the accumulated
//! candidates cover every need. If the strict query falls short and an
//! album was given, the same providers are asked again without the album.
//! Cover and lyrics may come from different providers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::aggregator::Aggregator;
use super::domain::{Candidate, Query, SearchError};
use crate::cover::{self, CoverArt};

/// Default number of tracks resolved concurrently in a batch
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Which attributes a track is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Needs {
    pub cover: bool,
    pub lyrics: bool,
}

impl Needs {
    pub fn all() -> Self {
        Self {
            cover: true,
            lyrics: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.cover && !self.lyrics
    }

    /// True when the candidates together provide every needed attribute.
    pub fn satisfied_by(&self, candidates: &[Candidate]) -> bool {
        (!self.cover || candidates.iter().any(Candidate::has_cover))
            && (!self.lyrics || candidates.iter().any(Candidate::has_lyrics))
    }
}

/// How many times to retry and how to loosen the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait after an attempt that produced no candidates at all
    pub backoff_ms: u64,
    /// Retry without the album when the strict query falls short
    pub loosen_album: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 1000,
            loosen_album: true,
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Queries tried within one attempt, strictest first.
    pub fn ladder(&self, query: &Query) -> Vec<Query> {
        let mut rungs = vec![query.clone()];
        if self.loosen_album && query.has_album() {
            let loose = query.without_album();
            if !loose.is_empty() {
                rungs.push(loose);
            }
        }
        rungs
    }
}

/// One track to resolve.
#[derive(Debug, Clone)]
pub struct TrackRequest {
    pub id: String,
    pub query: Query,
    pub needs: Needs,
    /// Audio file, checked for local artwork before any network call
    pub path: Option<PathBuf>,
}

/// Where a resolved cover lives.
#[derive(Debug, Clone)]
pub enum ResolvedCover {
    /// Reachable image URL from a provider
    Remote(String),
    /// Artwork already present on disk or in the file
    Local(CoverArt),
}

/// Outcome for one attribute of a track.
#[derive(Debug, Clone)]
pub enum AttributeOutcome<T> {
    Filled {
        value: T,
        /// Provider tag, or `local`
        source: String,
    },
    NotNeeded,
    Missing,
}

impl<T> AttributeOutcome<T> {
    pub fn is_filled(&self) -> bool {
        matches!(self, AttributeOutcome::Filled { .. })
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, AttributeOutcome::Missing)
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            AttributeOutcome::Filled { source, .. } => Some(source),
            _ => None,
        }
    }

    fn from_need(needed: bool) -> Self {
        if needed {
            AttributeOutcome::Missing
        } else {
            AttributeOutcome::NotNeeded
        }
    }
}

/// What happened to one track.
#[derive(Debug, Clone)]
pub struct TrackResolution {
    pub id: String,
    pub cover: AttributeOutcome<ResolvedCover>,
    pub lyrics: AttributeOutcome<String>,
    /// Network attempts made (0 when nothing was needed or the query was empty)
    pub attempts: u32,
}

impl TrackResolution {
    /// Some needed attribute could not be filled.
    pub fn has_failures(&self) -> bool {
        self.cover.is_missing() || self.lyrics.is_missing()
    }
}

/// Progress of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchProgress {
    pub processed: usize,
    /// Tracks with at least one needed attribute left missing
    pub failed: usize,
}

/// Resolves single queries and tracks using an [`Aggregator`]'s providers.
pub struct Resolver {
    aggregator: Arc<Aggregator>,
    retry: RetryPolicy,
    concurrency: usize,
    local_first: bool,
}

impl Resolver {
    pub fn new(aggregator: Arc<Aggregator>, retry: RetryPolicy) -> Self {
        Self {
            aggregator,
            retry,
            concurrency: DEFAULT_CONCURRENCY,
            local_first: true,
        }
    }

    /// Bound on tracks resolved at once by [`Resolver::resolve_batch`].
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Whether to look for artwork on disk before asking providers.
    pub fn with_local_first(mut self, local_first: bool) -> Self {
        self.local_first = local_first;
        self
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Single best-effort resolution across all providers.
    pub async fn resolve(&self, query: &Query) -> Result<Option<Candidate>, SearchError> {
        self.aggregator.search_song_best(query).await
    }

    async fn local_cover(&self, request: &TrackRequest) -> Option<CoverArt> {
        if !self.local_first {
            return None;
        }
        let path = request.path.clone()?;
        match tokio::task::spawn_blocking(move || cover::extract_local(&path)).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(track = %request.id, "local cover lookup failed: {}", e);
                None
            }
        }
    }

    /// Query providers in order until `needs` are met or the ladder runs out.
    ///
    /// Returns whether any provider failed during the attempt.
    async fn run_attempt(&self, query: &Query, needs: Needs, found: &mut Vec<Candidate>) -> bool {
        let mut failed = false;
        let timeout = self.aggregator.provider_timeout();

        for rung in self.retry.ladder(query) {
            for provider in self.aggregator.providers() {
                match tokio::time::timeout(timeout, provider.try_search(&rung)).await {
                    Ok(Ok(candidates)) => found.extend(candidates),
                    Ok(Err(e)) => {
                        tracing::warn!(source = %provider.source(), query = %rung.keyword(), "search failed: {}", e);
                        failed = true;
                    }
                    Err(_) => {
                        tracing::warn!(source = %provider.source(), query = %rung.keyword(), "search timed out");
                        failed = true;
                    }
                }
                if needs.satisfied_by(found) {
                    return failed;
                }
            }
        }
        failed
    }

    /// Resolve the outstanding needs of one track.
    pub async fn resolve_track(&self, request: &TrackRequest) -> TrackResolution {
        let mut needs = request.needs;
        let mut resolution = TrackResolution {
            id: request.id.clone(),
            cover: AttributeOutcome::from_need(needs.cover),
            lyrics: AttributeOutcome::from_need(needs.lyrics),
            attempts: 0,
        };

        if needs.cover {
            if let Some(art) = self.local_cover(request).await {
                tracing::debug!(track = %request.id, "using local artwork");
                resolution.cover = AttributeOutcome::Filled {
                    value: ResolvedCover::Local(art),
                    source: "local".to_string(),
                };
                needs.cover = false;
            }
        }

        if needs.is_empty() {
            return resolution;
        }
        if request.query.is_empty() {
            tracing::debug!(track = %request.id, "no tags to search with");
            return resolution;
        }

        let mut found: Vec<Candidate> = Vec::new();
        for attempt in 1..=self.retry.max_attempts {
            resolution.attempts = attempt;
            let before = found.len();
            let failed = self.run_attempt(&request.query, needs, &mut found).await;

            if needs.satisfied_by(&found) {
                break;
            }
            let got_nothing = found.len() == before;
            if !failed && !got_nothing {
                tracing::debug!(track = %request.id, attempt, "providers answered, needs still unmet");
                break;
            }
            if got_nothing && attempt < self.retry.max_attempts {
                tokio::time::sleep(self.retry.backoff()).await;
            }
        }

        // Best-ranked candidate per attribute, scored against the strict query
        let ranked = self.aggregator.score_all(&request.query, found);
        if needs.cover {
            if let Some(best) = ranked.iter().find(|s| s.candidate.has_cover()) {
                resolution.cover = AttributeOutcome::Filled {
                    value: ResolvedCover::Remote(best.candidate.cover.clone().unwrap_or_default()),
                    source: best.candidate.source.tag().to_string(),
                };
            }
        }
        if needs.lyrics {
            if let Some(best) = ranked.iter().find(|s| s.candidate.has_lyrics()) {
                resolution.lyrics = AttributeOutcome::Filled {
                    value: best.candidate.lyrics.clone(),
                    source: best.candidate.source.tag().to_string(),
                };
            }
        }

        resolution
    }

    /// Resolve many tracks with bounded concurrency.
    ///
    /// `progress` is updated once per track, after that track completes.
    pub async fn resolve_batch(
        &self,
        requests: Vec<TrackRequest>,
        progress: &Mutex<BatchProgress>,
    ) -> HashMap<String, TrackResolution> {
        let total = requests.len();
        stream::iter(requests)
            .map(|request| async move {
                let resolution = self.resolve_track(&request).await;
                {
                    let mut p = progress.lock();
                    p.processed += 1;
                    if resolution.has_failures() {
                        p.failed += 1;
                    }
                    tracing::info!(
                        processed = p.processed,
                        failed = p.failed,
                        total,
                        track = %resolution.id,
                        "track resolved"
                    );
                }
                (request.id, resolution)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::aggregator::{ScoringConfig, TieBreak};
    use crate::search::domain::Source;
    use crate::search::traits::mocks::{candidate, MockProvider, LONG_LYRICS};
    use crate::search::traits::Provider;
    use tempfile::TempDir;

    fn resolver(providers: Vec<Arc<dyn Provider>>) -> Resolver {
        let aggregator = Aggregator::new(providers, ScoringConfig::default())
            .with_tie_break(TieBreak::disabled())
            .with_provider_timeout(Duration::from_millis(200));
        let retry = RetryPolicy {
            backoff_ms: 10,
            ..RetryPolicy::default()
        };
        Resolver::new(Arc::new(aggregator), retry)
    }

    fn request(query: Query, needs: Needs) -> TrackRequest {
        TrackRequest {
            id: "t1".into(),
            query,
            needs,
            path: None,
        }
    }

    #[tokio::test]
    async fn test_short_circuits_after_first_satisfying_provider() {
        let first = Arc::new(MockProvider::with_results(
            Source::Qq,
            vec![candidate("Song", "Artist", "", Some("http://c.jpg"), "")],
        ));
        let second = Arc::new(MockProvider::empty(Source::Netease));
        let third = Arc::new(MockProvider::empty(Source::Kugou));
        let r = resolver(vec![first.clone(), second.clone(), third.clone()]);

        let needs = Needs {
            cover: true,
            lyrics: false,
        };
        let res = r.resolve_track(&request(Query::new("Song", "Artist", ""), needs)).await;

        assert!(res.cover.is_filled());
        assert_eq!(res.cover.source(), Some("qq"));
        assert!(matches!(res.lyrics, AttributeOutcome::NotNeeded));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
        assert_eq!(third.calls(), 0);
    }

    #[tokio::test]
    async fn test_cover_and_lyrics_from_different_providers() {
        let covers = Arc::new(MockProvider::with_results(
            Source::Qq,
            vec![candidate("Song", "Artist", "", Some("http://c.jpg"), "")],
        ));
        let lyrics = Arc::new(MockProvider::with_results(
            Source::Kugou,
            vec![candidate("Song", "Artist", "", None, LONG_LYRICS)],
        ));
        let r = resolver(vec![covers, lyrics]);

        let res = r.resolve_track(&request(Query::new("Song", "Artist", ""), Needs::all())).await;

        assert_eq!(res.cover.source(), Some("qq"));
        assert_eq!(res.lyrics.source(), Some("kugou"));
        assert!(!res.has_failures());
        assert_eq!(res.attempts, 1);
    }

    #[tokio::test]
    async fn test_nothing_needed_makes_no_calls() {
        let provider = Arc::new(MockProvider::empty(Source::Qq));
        let r = resolver(vec![provider.clone()]);

        let res = r
            .resolve_track(&request(Query::new("Song", "", ""), Needs::default()))
            .await;

        assert_eq!(provider.calls(), 0);
        assert_eq!(res.attempts, 0);
        assert!(!res.has_failures());
    }

    #[tokio::test]
    async fn test_empty_query_reports_missing_without_calls() {
        let provider = Arc::new(MockProvider::empty(Source::Qq));
        let r = resolver(vec![provider.clone()]);

        let res = r.resolve_track(&request(Query::default(), Needs::all())).await;

        assert_eq!(provider.calls(), 0);
        assert!(res.cover.is_missing());
        assert!(res.lyrics.is_missing());
    }

    #[tokio::test]
    async fn test_local_cover_clears_need_before_network() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("track.mp3");
        std::fs::write(&audio, b"fake").unwrap();
        std::fs::write(temp.path().join("cover.jpg"), b"jpeg").unwrap();

        let provider = Arc::new(MockProvider::empty(Source::Qq));
        let r = resolver(vec![provider.clone()]);
        let mut req = request(
            Query::new("Song", "", ""),
            Needs {
                cover: true,
                lyrics: false,
            },
        );
        req.path = Some(audio);

        let res = r.resolve_track(&req).await;

        assert_eq!(res.cover.source(), Some("local"));
        assert!(matches!(
            res.cover,
            AttributeOutcome::Filled {
                value: ResolvedCover::Local(_),
                ..
            }
        ));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_album_is_dropped_when_strict_query_fails() {
        let provider = Arc::new(MockProvider::empty(Source::Netease));
        let r = resolver(vec![provider.clone()]);

        let res = r
            .resolve_track(&request(Query::new("Song", "Artist", "Stale Album"), Needs::all()))
            .await;

        // strict + loosened query on each of three attempts
        assert_eq!(res.attempts, 3);
        assert_eq!(provider.calls(), 6);
        assert!(res.has_failures());
    }

    #[tokio::test]
    async fn test_answered_but_unmet_stops_retrying() {
        let provider = Arc::new(MockProvider::with_results(
            Source::Qq,
            vec![candidate("Song", "Artist", "", None, "[00:01.00]la")],
        ));
        let r = resolver(vec![provider.clone()]);

        let res = r.resolve_track(&request(Query::new("Song", "Artist", ""), Needs::all())).await;

        assert_eq!(res.attempts, 1);
        assert_eq!(provider.calls(), 1);
        assert!(res.cover.is_missing());
        assert!(res.lyrics.is_filled());
    }

    #[tokio::test]
    async fn test_failures_are_retried() {
        let provider = Arc::new(MockProvider::failing(
            Source::Kugou,
            SearchError::Timeout("slow".into()),
        ));
        let r = resolver(vec![provider.clone()]);

        let res = r.resolve_track(&request(Query::new("Song", "", ""), Needs::all())).await;

        assert_eq!(res.attempts, 3);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_batch_tracks_progress() {
        let provider = Arc::new(MockProvider::with_results(
            Source::Qq,
            vec![candidate("Song", "Artist", "", Some("http://c.jpg"), LONG_LYRICS)],
        ));
        let r = resolver(vec![provider]).with_concurrency(2);

        let requests = vec![
            TrackRequest {
                id: "found".into(),
                query: Query::new("Song", "Artist", ""),
                needs: Needs::all(),
                path: None,
            },
            TrackRequest {
                id: "untagged".into(),
                query: Query::default(),
                needs: Needs::all(),
                path: None,
            },
            TrackRequest {
                id: "complete".into(),
                query: Query::new("Other", "", ""),
                needs: Needs::default(),
                path: None,
            },
        ];

        let progress = Mutex::new(BatchProgress::default());
        let results = r.resolve_batch(requests, &progress).await;

        assert_eq!(results.len(), 3);
        assert!(!results["found"].has_failures());
        assert!(results["untagged"].has_failures());
        assert_eq!(
            *progress.lock(),
            BatchProgress {
                processed: 3,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_batch_never_exceeds_concurrency() {
        let provider = Arc::new(MockProvider::slow(
            Source::Qq,
            Duration::from_millis(50),
            vec![candidate("Song", "Artist", "", Some("http://c.jpg"), LONG_LYRICS)],
        ));
        let r = resolver(vec![provider.clone()]).with_concurrency(3);

        let requests: Vec<TrackRequest> = (0..10)
            .map(|i| TrackRequest {
                id: format!("t{}", i),
                query: Query::new("Song", "Artist", ""),
                needs: Needs::all(),
                path: None,
            })
            .collect();

        let progress = Mutex::new(BatchProgress::default());
        let results = r.resolve_batch(requests, &progress).await;

        assert_eq!(results.len(), 10);
        assert_eq!(provider.calls(), 10);
        assert!(provider.peak_in_flight() <= 3);
        assert!(provider.peak_in_flight() > 1);
        assert_eq!(progress.lock().processed, 10);
    }

    fn resolver_with_backoff(provider: Arc<MockProvider>, backoff_ms: u64) -> Resolver {
        let aggregator = Aggregator::new(vec![provider as Arc<dyn Provider>], ScoringConfig::default())
            .with_tie_break(TieBreak::disabled());
        let retry = RetryPolicy {
            backoff_ms,
            loosen_album: false,
            ..RetryPolicy::default()
        };
        Resolver::new(Arc::new(aggregator), retry)
    }

    #[tokio::test]
    async fn test_backoff_only_after_empty_attempt() {
        let answered = Arc::new(MockProvider::with_results(
            Source::Qq,
            vec![candidate("Song", "Artist", "", None, "[00:01.00]la")],
        ));
        let r = resolver_with_backoff(answered, 300);
        let started = std::time::Instant::now();
        let res = r.resolve_track(&request(Query::new("Song", "Artist", ""), Needs::all())).await;
        assert_eq!(res.attempts, 1);
        assert!(started.elapsed() < Duration::from_millis(300));

        let silent = Arc::new(MockProvider::empty(Source::Qq));
        let r = resolver_with_backoff(silent.clone(), 300);
        let started = std::time::Instant::now();
        let res = r.resolve_track(&request(Query::new("Song", "Artist", ""), Needs::all())).await;
        assert_eq!(res.attempts, 3);
        assert_eq!(silent.calls(), 3);
        // two waits between three attempts, none after the last
        assert!(started.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_resolve_picks_catalog_b() {
        let r = resolver(vec![
            Arc::new(MockProvider::empty(Source::Qq)),
            Arc::new(MockProvider::with_results(
                Source::Netease,
                vec![candidate("可能", "程响", "", Some("http://p.jpg"), LONG_LYRICS)],
            )),
            Arc::new(MockProvider::empty(Source::Kugou)),
        ]);
        let best = r.resolve(&Query::new("可能", "程响", "")).await.unwrap().unwrap();
        assert_eq!(best.source.letter(), 'B');
    }
}
