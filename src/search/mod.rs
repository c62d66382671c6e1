//! Metadata search across music catalogs.
//!
//! This module resolves cover art and lyrics for a (title, artist, album)
//! query using three external catalogs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Resolver (needs, widen-and-retry, batch)     │
//! ├──────────────────────────────────────────────┤
//! │ Aggregator (fan-out, composite score, pick)  │
//! ├──────────────────────────────────────────────┤
//! │ Provider trait (+ CachedProvider decorator)  │
//! ├──────────────┬───────────────┬───────────────┤
//! │ qq (A)       │ netease (B)   │ kugou (C)     │
//! │ dto/adapter/ │ dto/adapter/  │ dto/adapter/  │
//! │ client       │ client        │ client        │
//! └──────────────┴───────────────┴───────────────┘
//! ```
//!
//! Each provider module keeps wire formats in `dto.rs` and converts them to
//! the types in [`domain`] in `adapter.rs`; nothing outside a provider
//! module sees its DTOs.

pub mod aggregator;
pub mod cache;
pub mod domain;
pub mod http;
pub mod kugou;
pub mod netease;
pub mod options;
pub mod qq;
pub mod resolver;
pub mod traits;

use std::sync::Arc;

use crate::config::Config;

pub use aggregator::{Aggregator, ScoringConfig, SourceBias, TieBreak};
pub use cache::CachedProvider;
pub use domain::{Candidate, Query, ScoredCandidate, SearchError, Source};
pub use options::{LocalScoring, ProviderOptions};
pub use resolver::{
    AttributeOutcome, BatchProgress, Needs, ResolvedCover, Resolver, RetryPolicy, TrackRequest,
    TrackResolution,
};
pub use traits::Provider;

/// Build the client for one catalog.
pub fn build_provider(source: Source, options: ProviderOptions) -> Result<Arc<dyn Provider>, SearchError> {
    Ok(match source {
        Source::Qq => Arc::new(qq::QqClient::new(options)?),
        Source::Netease => Arc::new(netease::NeteaseClient::new(options)?),
        Source::Kugou => Arc::new(kugou::KugouClient::new(options)?),
    })
}

/// Same as [`build_provider`], wrapped in a query cache.
pub fn build_cached_provider(
    source: Source,
    options: ProviderOptions,
    capacity: usize,
    ttl: std::time::Duration,
) -> Result<Arc<dyn Provider>, SearchError> {
    Ok(match source {
        Source::Qq => Arc::new(CachedProvider::with_limits(qq::QqClient::new(options)?, capacity, ttl)),
        Source::Netease => Arc::new(CachedProvider::with_limits(
            netease::NeteaseClient::new(options)?,
            capacity,
            ttl,
        )),
        Source::Kugou => Arc::new(CachedProvider::with_limits(
            kugou::KugouClient::new(options)?,
            capacity,
            ttl,
        )),
    })
}

/// Clients for every enabled catalog, in configured order.
pub fn providers_from_config(config: &Config) -> Result<Vec<Arc<dyn Provider>>, SearchError> {
    let providers = &config.providers;
    providers
        .sources()
        .into_iter()
        .map(|source| {
            let options = providers.options_for(source);
            if providers.cache {
                build_cached_provider(source, options, providers.cache_capacity, providers.cache_ttl())
            } else {
                build_provider(source, options)
            }
        })
        .collect()
}

/// Aggregator over the enabled catalogs.
pub fn aggregator_from_config(config: &Config) -> Result<Aggregator, SearchError> {
    Ok(Aggregator::new(providers_from_config(config)?, config.scoring.clone())
        .with_provider_timeout(config.providers.provider_timeout()))
}

/// Resolver wired from the config file.
pub fn resolver_from_config(config: &Config) -> Result<Resolver, SearchError> {
    let aggregator = Arc::new(aggregator_from_config(config)?);
    Ok(Resolver::new(aggregator, config.retry.clone())
        .with_concurrency(config.batch.concurrency)
        .with_local_first(config.batch.local_first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_providers_follow_config_order() {
        let mut config = Config::default();
        config.providers.enabled = vec!["kugou".into(), "qq".into()];
        config.providers.cache = false;

        let providers = providers_from_config(&config).unwrap();
        let sources: Vec<Source> = providers.iter().map(|p| p.source()).collect();
        assert_eq!(sources, vec![Source::Kugou, Source::Qq]);
    }

    #[test]
    fn test_resolver_from_default_config() {
        let resolver = resolver_from_config(&Config::default()).unwrap();
        assert_eq!(resolver.aggregator().providers().len(), 3);
        assert_eq!(
            resolver.aggregator().provider_timeout(),
            std::time::Duration::from_secs(20)
        );
    }
}
