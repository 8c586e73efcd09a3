use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use smsf_core::traits::{Embedder, VectorIndex};
use smsf_core::{Error, FilterSet, Result, ScoredChunk};

/// Top-K similarity search inside one partition of the shared index.
///
/// Collaborator failures (and timeouts) surface as `RetrievalUnavailable`;
/// an empty result only ever means the partition has no match.
pub struct PartitionedRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    timeout: Duration,
}

fn unavailable(e: Error) -> Error {
    match e {
        Error::PartitionIsolationViolation(_) | Error::RetrievalUnavailable(_) => e,
        other => Error::RetrievalUnavailable(other.to_string()),
    }
}

impl PartitionedRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, timeout: Duration) -> Self {
        Self { embedder, index, timeout }
    }

    async fn bounded<T>(&self, what: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res.map_err(unavailable),
            Err(_) => Err(Error::RetrievalUnavailable(format!("{what} timed out after {:?}", self.timeout))),
        }
    }

    /// Most similar first. Every returned chunk satisfies `filter`; anything
    /// else coming back from the index is treated as an isolation breach.
    /// A superseded chunk inside the partition means a stale index and is
    /// reported as `RetrievalUnavailable`.
    pub async fn retrieve(&self, query_text: &str, filter: &FilterSet, top_k: usize) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Err(Error::InvalidRequest("top_k must be at least 1".to_string()));
        }
        let mut vectors = self.bounded("embedding", self.embedder.embed_batch(&[query_text.to_string()])).await?;
        let query_vec = match vectors.pop() {
            Some(v) if !v.is_empty() => v,
            _ => return Err(Error::RetrievalUnavailable("embedding provider returned no vector".to_string())),
        };

        let mut hits = self.bounded("vector search", self.index.search(&query_vec, filter, top_k)).await?;
        if let Some(stray) = hits.iter().find(|h| !filter.matches(&h.chunk)) {
            return Err(Error::PartitionIsolationViolation(format!(
                "index returned chunk '{}' (doc_type={}, fund_id={}) outside filter {filter}",
                stray.chunk.id, stray.chunk.doc_type, stray.chunk.fund_id
            )));
        }
        if let Some(stale) = hits.iter().find(|h| !h.chunk.is_latest) {
            return Err(Error::RetrievalUnavailable(format!(
                "index returned superseded chunk '{}'; the index is stale",
                stale.chunk.id
            )));
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        debug!(filter = %filter, top_k, hits = hits.len(), "retrieved");
        Ok(hits)
    }
}
