use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use smsf_core::config::EmbeddingSettings;
use smsf_core::traits::Embedder;
use smsf_core::{Error, Result};

/// Client for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
    dim: usize,
    batch_size: usize,
    id: String,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .map_err(|_| Error::InvalidConfig(format!("{} is not set", settings.api_key_env)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/embeddings", settings.base_url.trim_end_matches('/')),
            model: settings.model.clone(),
            api_key,
            dim: settings.dimension,
            batch_size: settings.batch_size.max(1),
            id: format!("openai:{}:d{}", settings.model, settings.dimension),
        })
    }

    async fn embed_request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
            "dimensions": self.dim,
        });
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("failed to reach {}: {e}", self.url)))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!("http error {status}: {text}")));
        }
        let mut out: EmbeddingsResponse =
            resp.json().await.map_err(|e| Error::Embedding(format!("invalid embeddings JSON: {e}")))?;
        if out.data.len() != texts.len() {
            return Err(Error::Embedding(format!("returned {} embeddings for {} inputs", out.data.len(), texts.len())));
        }
        out.data.sort_by_key(|item| item.index);
        let mut vectors = Vec::with_capacity(out.data.len());
        for item in out.data {
            if item.embedding.len() != self.dim {
                return Err(Error::Embedding(format!("dim mismatch: got {} expected {}", item.embedding.len(), self.dim)));
            }
            vectors.push(item.embedding);
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!(model = %self.model, inputs = batch.len(), "embedding batch");
            vectors.extend(self.embed_request(batch).await?);
        }
        Ok(vectors)
    }
}
