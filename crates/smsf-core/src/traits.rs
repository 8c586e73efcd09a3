use async_trait::async_trait;

use crate::error::Result;
use crate::filter::FilterSet;
use crate::types::{DocumentChunk, ScoredChunk};

/// Embedding provider. Stored chunks and incoming questions must go through
/// the same provider so their vectors are comparable.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-large`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Similarity search restricted by exact-match tag filters.
///
/// Implementations apply `filter` before the top-K cut, so a small partition
/// still yields its best matches. Chunks with `is_latest == false` are never
/// returned.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<usize>;
    async fn search(&self, query_vec: &[f32], filter: &FilterSet, top_k: usize) -> Result<Vec<ScoredChunk>>;
    /// Clears `is_latest` on every current chunk matching `filter` except the
    /// ids in `keep_ids`. Returns the number of rows touched.
    async fn supersede(&self, filter: &FilterSet, keep_ids: &[String]) -> Result<usize>;
}

/// Text completion at zero sampling temperature.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> &str;
    async fn complete(&self, prompt: &str) -> Result<String>;
}
