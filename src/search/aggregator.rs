//! Cross-provider aggregation.
//!
//! Fans a query out to every provider at once, scores the pooled
//! candidates against the original query and picks the best one,
//! preferring complete results (cover plus real lyrics) over higher-scored
//! but incomplete ones.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::domain::{Candidate, Query, ScoredCandidate, SearchError, Source};
use super::traits::Provider;
use crate::similarity::{assoc_artists, association, normalize};

/// Default time budget for one provider within an aggregated search
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

/// Small fixed per-source bonus reflecting historical reliability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceBias {
    pub qq: f64,
    pub netease: f64,
    pub kugou: f64,
}

impl SourceBias {
    pub fn get(&self, source: Source) -> f64 {
        match source {
            Source::Qq => self.qq,
            Source::Netease => self.netease,
            Source::Kugou => self.kugou,
        }
    }
}

impl Default for SourceBias {
    fn default() -> Self {
        Self {
            qq: 0.01,
            netease: 0.005,
            kugou: 0.0,
        }
    }
}

/// Composite score weights and bonuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub title_weight: f64,
    pub artist_weight: f64,
    pub album_weight: f64,
    /// Added when the query album equals the candidate album (normalized)
    pub album_exact_bonus: f64,
    pub translation_bonus: f64,
    /// Bonus by platform rank; ranks past the end get nothing
    pub rank_bonus: Vec<f64>,
    pub source_bias: SourceBias,
    /// Adjacent scores closer than this are perturbed
    pub tie_epsilon: f64,
    /// Lyrics must be longer than this (in characters) to count as high quality
    pub min_lyrics_chars: usize,
    /// Perturb near-ties at all
    pub jitter: bool,
    /// Fixed seed for reproducible tie-breaking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_seed: Option<u64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            title_weight: 0.5,
            artist_weight: 0.35,
            album_weight: 0.15,
            album_exact_bonus: 0.2,
            translation_bonus: 0.02,
            rank_bonus: vec![0.05, 0.03, 0.01],
            source_bias: SourceBias::default(),
            tie_epsilon: 0.01,
            min_lyrics_chars: 50,
            jitter: true,
            jitter_seed: None,
        }
    }
}

/// Randomness source for breaking near-ties.
///
/// `disabled()` gives fully deterministic ordering; `seeded()` gives a
/// reproducible perturbation sequence.
pub struct TieBreak {
    rng: Option<Mutex<StdRng>>,
}

impl TieBreak {
    /// No perturbation.
    pub fn disabled() -> Self {
        Self { rng: None }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Seeded from the operating system.
    pub fn random() -> Self {
        Self {
            rng: Some(Mutex::new(StdRng::from_os_rng())),
        }
    }

    pub fn from_config(scoring: &ScoringConfig) -> Self {
        match (scoring.jitter, scoring.jitter_seed) {
            (false, _) => Self::disabled(),
            (true, Some(seed)) => Self::seeded(seed),
            (true, None) => Self::random(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.rng.is_some()
    }

    /// Perturb near-equal neighbours of a descending list, then re-sort.
    ///
    /// The perturbation of an item is bounded by `(epsilon - diff) / 2`
    /// where `diff` is its distance to the item above it.
    pub fn apply(&self, scored: &mut [ScoredCandidate], epsilon: f64) {
        let Some(ref rng) = self.rng else { return };
        let mut rng = rng.lock();
        for i in 1..scored.len() {
            let diff = (scored[i].score - scored[i - 1].score).abs();
            if diff < epsilon {
                let max = 0.5 * (epsilon - diff);
                if !max.is_finite() {
                    continue;
                }
                scored[i].score += rng.random_range(-max..=max);
            }
        }
        drop(rng);
        sort_descending(scored);
    }
}

impl Default for TieBreak {
    fn default() -> Self {
        Self::random()
    }
}

fn sort_descending(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Runs all providers concurrently and picks the best candidate.
pub struct Aggregator {
    providers: Vec<Arc<dyn Provider>>,
    scoring: ScoringConfig,
    tie_break: TieBreak,
    provider_timeout: Duration,
}

impl Aggregator {
    pub fn new(providers: Vec<Arc<dyn Provider>>, scoring: ScoringConfig) -> Self {
        Self {
            providers,
            tie_break: TieBreak::from_config(&scoring),
            scoring,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn provider_timeout(&self) -> Duration {
        self.provider_timeout
    }

    /// Composite score of one candidate against the original query.
    pub fn score(&self, query: &Query, candidate: &Candidate) -> f64 {
        let s = &self.scoring;
        let mut score = s.title_weight * association(&query.title, &candidate.title)
            + s.artist_weight * assoc_artists(&query.artist, &candidate.artist)
            + s.album_weight * association(&query.album, &candidate.album);

        if query.has_album() && normalize(&query.album) == normalize(&candidate.album) {
            score += s.album_exact_bonus;
        }
        score += s.source_bias.get(candidate.source);
        if candidate.has_translation {
            score += s.translation_bonus;
        }
        score += s.rank_bonus.get(candidate.platform_rank).copied().unwrap_or(0.0);
        score
    }

    /// Score and sort descending, without tie-break perturbation.
    pub fn score_all(&self, query: &Query, candidates: Vec<Candidate>) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| ScoredCandidate {
                score: self.score(query, &candidate),
                candidate,
            })
            .collect();
        sort_descending(&mut scored);
        scored
    }

    /// Score, sort and break near-ties.
    pub fn rank(&self, query: &Query, candidates: Vec<Candidate>) -> Vec<ScoredCandidate> {
        let mut scored = self.score_all(query, candidates);
        self.tie_break.apply(&mut scored, self.scoring.tie_epsilon);
        scored
    }

    /// Cover plus lyrics longer than the configured minimum.
    pub fn is_high_quality(&self, candidate: &Candidate) -> bool {
        candidate.has_cover() && candidate.lyrics.chars().count() > self.scoring.min_lyrics_chars
    }

    /// High quality first, then anything with a cover, then the top entry.
    pub fn select<'a>(&self, ranked: &'a [ScoredCandidate]) -> Option<&'a ScoredCandidate> {
        ranked
            .iter()
            .find(|s| self.is_high_quality(&s.candidate))
            .or_else(|| ranked.iter().find(|s| s.candidate.has_cover()))
            .or_else(|| ranked.first())
    }

    /// Query every provider concurrently; slow or failing providers
    /// contribute nothing.
    pub async fn gather(&self, query: &Query) -> Vec<Candidate> {
        let searches = self.providers.iter().map(|provider| async move {
            match tokio::time::timeout(self.provider_timeout, provider.search(query)).await {
                Ok(candidates) => candidates,
                Err(_) => {
                    tracing::warn!(source = %provider.source(), "provider timed out");
                    Vec::new()
                }
            }
        });
        join_all(searches).await.into_iter().flatten().collect()
    }

    /// Best candidate across all providers, or `None` when nothing matched.
    pub async fn search_song_best(&self, query: &Query) -> Result<Option<Candidate>, SearchError> {
        query.validate()?;

        let candidates = self.gather(query).await;
        tracing::debug!(query = %query.keyword(), total = candidates.len(), "aggregated candidates");

        let ranked = self.rank(query, candidates);
        let best = self.select(&ranked).map(|s| {
            tracing::debug!(
                source = %s.candidate.source,
                score = s.score,
                title = %s.candidate.title,
                lyrics = %s.candidate.lyrics_preview(),
                "selected candidate"
            );
            s.candidate.clone()
        });
        Ok(best)
    }
}
