//! The provider seam.
//!
//! Every catalog adapter implements [`Provider`], whatever protocol it
//! speaks underneath. The aggregator and the resolver only ever see this
//! trait, so tests can substitute the mocks below.

use std::sync::Arc;

use async_trait::async_trait;

use super::domain::{Candidate, Query, SearchError, Source};

/// One external music catalog.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Which catalog this is.
    fn source(&self) -> Source;

    /// Search the catalog, reporting transport/parse failures of the
    /// initial search call as errors.
    ///
    /// Implementations must return `Err(SearchError::EmptyQuery)` without
    /// touching the network when the query is empty. Failures while
    /// resolving one candidate's lyrics or cover must not fail the call.
    async fn try_search(&self, query: &Query) -> Result<Vec<Candidate>, SearchError>;

    /// Search the catalog; any failure degrades to an empty result.
    async fn search(&self, query: &Query) -> Vec<Candidate> {
        match self.try_search(query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                if e.is_remote() {
                    tracing::warn!(source = %self.source(), "search failed: {}", e);
                }
                Vec::new()
            }
        }
    }
}

/// Shared providers (the aggregator and resolver hold `Arc<dyn Provider>`).
#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn source(&self) -> Source {
        (**self).source()
    }

    async fn try_search(&self, query: &Query) -> Result<Vec<Candidate>, SearchError> {
        (**self).try_search(query).await
    }
}
