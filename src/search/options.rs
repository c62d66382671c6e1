//! Per-provider tuning: request sizes, timeouts and local admission scoring.
//!
//! The weights and thresholds are empirically tuned defaults, not
//! invariants; the config file can override them per provider.

use std::cmp::Ordering;
use std::time::Duration;

use super::domain::{Query, Source};
use crate::similarity::{assoc_artists, association};

/// Provider-local composite weighting and admission threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalScoring {
    pub title_weight: f64,
    pub artist_weight: f64,
    pub album_weight: f64,
    /// Raw results scoring below this are discarded before any detail call
    pub admission_threshold: f64,
}

impl LocalScoring {
    pub fn qq() -> Self {
        Self {
            title_weight: 0.6,
            artist_weight: 0.3,
            album_weight: 0.1,
            admission_threshold: 0.5,
        }
    }

    pub fn netease() -> Self {
        Self {
            title_weight: 0.55,
            artist_weight: 0.3,
            album_weight: 0.15,
            admission_threshold: 0.2,
        }
    }

    pub fn kugou() -> Self {
        Self {
            title_weight: 0.6,
            artist_weight: 0.3,
            album_weight: 0.1,
            admission_threshold: 0.2,
        }
    }

    pub fn for_source(source: Source) -> Self {
        match source {
            Source::Qq => Self::qq(),
            Source::Netease => Self::netease(),
            Source::Kugou => Self::kugou(),
        }
    }

    /// Score one raw result. The title score is the best over `titles`
    /// (song name plus any aliases the provider lists).
    pub fn score(&self, query: &Query, titles: &[&str], artist: &str, album: &str) -> f64 {
        let title_score = titles
            .iter()
            .map(|t| association(&query.title, t))
            .fold(0.0, f64::max);
        let artist_score = assoc_artists(&query.artist, artist);
        let album_score = association(&query.album, album);

        self.title_weight * title_score
            + self.artist_weight * artist_score
            + self.album_weight * album_score
    }

    /// Drop results under the threshold, sort the rest by score descending
    /// (stable for equal scores) and keep the first `keep`.
    pub fn select<T>(&self, scored: Vec<(f64, T)>, keep: usize) -> Vec<(f64, T)> {
        let mut admitted: Vec<(f64, T)> = scored
            .into_iter()
            .filter(|(score, _)| *score >= self.admission_threshold)
            .collect();
        admitted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        admitted.truncate(keep);
        admitted
    }
}

/// Runtime options handed to each provider client.
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// Raw results requested from the search endpoint
    pub fetch_limit: usize,
    /// Candidates kept after local ranking (detail calls are made only for these)
    pub keep: usize,
    /// Timeout for search and detail requests
    pub request_timeout: Duration,
    /// Timeout for the primary cover probe
    pub cover_probe_timeout: Duration,
    /// Timeout for each fallback cover probe
    pub fallback_probe_timeout: Duration,
    pub scoring: LocalScoring,
}

impl ProviderOptions {
    pub fn for_source(source: Source) -> Self {
        Self {
            scoring: LocalScoring::for_source(source),
            ..Self::default()
        }
    }
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            fetch_limit: 10,
            keep: 3,
            request_timeout: Duration::from_secs(10),
            cover_probe_timeout: Duration::from_millis(700),
            fallback_probe_timeout: Duration::from_millis(500),
            scoring: LocalScoring::qq(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_filters_sorts_and_truncates() {
        let scoring = LocalScoring::qq();
        let scored = vec![(0.55, "b"), (0.2, "low"), (0.9, "a"), (0.7, "c"), (0.6, "d")];
        let kept: Vec<_> = scoring.select(scored, 3).into_iter().map(|(_, t)| t).collect();
        assert_eq!(kept, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_alias_counts_for_title() {
        let scoring = LocalScoring::netease();
        let query = Query::new("离开", "周杰伦", "");
        let without = scoring.score(&query, &["分裂"], "周杰伦", "八度空间");
        let with = scoring.score(&query, &["分裂", "离开"], "周杰伦", "八度空间");
        assert!(with > without);
        assert!((with - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_consistent_across_calls() {
        let scoring = LocalScoring::qq();
        let query = Query::new("Yesterday", "The Beatles", "");
        let first = scoring.score(&query, &["Let It Be"], "Someone Else", "x");
        let second = scoring.score(&query, &["Let It Be"], "Someone Else", "x");
        assert_eq!(first, second);
        assert!(first < scoring.admission_threshold);
        assert!(scoring.select(vec![(first, ())], 3).is_empty());
        assert!(scoring.select(vec![(second, ())], 3).is_empty());
    }
}
