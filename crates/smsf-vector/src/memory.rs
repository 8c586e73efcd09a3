//! In-memory index for tests and dry runs without LanceDB.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use smsf_core::traits::VectorIndex;
use smsf_core::{DocumentChunk, Error, FilterSet, Result, ScoredChunk};

/// Brute-force cosine index keyed by chunk id.
#[derive(Clone, Default)]
pub struct MemoryVectorIndex {
    rows: Arc<RwLock<HashMap<String, (DocumentChunk, Vec<f32>)>>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.rows.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.rows.read().await.is_empty() }

    pub async fn get(&self, id: &str) -> Option<DocumentChunk> { self.rows.read().await.get(id).map(|(c, _)| c.clone()) }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::Storage(format!("{} chunks but {} embeddings", chunks.len(), embeddings.len())));
        }
        let mut rows = self.rows.write().await;
        for (chunk, vector) in chunks.iter().zip(embeddings) {
            rows.insert(chunk.id.clone(), (chunk.clone(), vector.clone()));
        }
        debug!("Upserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    async fn search(&self, query_vec: &[f32], filter: &FilterSet, top_k: usize) -> Result<Vec<ScoredChunk>> {
        let rows = self.rows.read().await;
        let mut hits: Vec<ScoredChunk> = rows
            .values()
            .filter(|(chunk, _)| chunk.is_latest && filter.matches(chunk))
            .map(|(chunk, vector)| ScoredChunk { chunk: chunk.clone(), score: Self::cosine_similarity(query_vec, vector) })
            .collect();
        // Sort by score descending; id breaks ties so results are stable.
        hits.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn supersede(&self, filter: &FilterSet, keep_ids: &[String]) -> Result<usize> {
        let mut rows = self.rows.write().await;
        let mut touched = 0;
        for (chunk, _) in rows.values_mut() {
            if chunk.is_latest && !keep_ids.contains(&chunk.id) && filter.matches(chunk) {
                chunk.is_latest = false;
                touched += 1;
            }
        }
        Ok(touched)
    }
}
