//! Chunk, embed and index source files.
use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use smsf_core::config::Settings;
use smsf_core::data_processor::{ChunkingConfig, DataProcessor, SourceDocument};
use smsf_core::traits::{Embedder, VectorIndex};
use smsf_core::types::is_global_fund;
use smsf_core::{DocType, DocumentChunk, FilterSet, GLOBAL_FUND_ID};

use crate::registry::{content_hash, IndexStatus, Registry, RegistryEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Indexed { chunks: usize, superseded: usize },
    /// Unchanged since the last completed run.
    Skipped,
}

pub struct Ingestor {
    processor: DataProcessor,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(settings: &Settings, embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            processor: DataProcessor::with_config(ChunkingConfig::from(&settings.ingest)),
            embedder,
            index,
            batch_size: settings.embedding.batch_size.max(1),
        }
    }

    pub fn processor(&self) -> &DataProcessor { &self.processor }

    /// Indexes one document, then supersedes every current chunk the new
    /// version no longer contains: within the same document for legislation
    /// and rulings, across the fund's whole deed for a trust deed.
    pub async fn ingest_document(&self, doc: &SourceDocument) -> Result<FileOutcome> {
        let chunks = self.processor.process(doc)?;
        let embeddings = self.embed(&chunks).await?;
        let stored = self.index.upsert(&chunks, &embeddings).await?;

        let scope = match doc.doc_type {
            DocType::TrustDeed => FilterSet::private_deed(&doc.fund_id)?,
            _ => FilterSet::document(&doc.doc_id)?,
        };
        let keep: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
        let superseded = self.index.supersede(&scope, &keep).await?;
        info!(doc_id = %doc.doc_id, doc_type = %doc.doc_type, chunks = stored, superseded, "indexed document");
        Ok(FileOutcome::Indexed { chunks: stored, superseded })
    }

    async fn embed(&self, chunks: &[DocumentChunk]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                anyhow::bail!("embedder returned {} vectors for {} texts", vectors.len(), texts.len());
            }
            out.extend(vectors);
        }
        debug!(chunks = chunks.len(), embedder = self.embedder.embedder_id(), "embedded chunks");
        Ok(out)
    }

    /// Indexes `path` unless the registry shows the same content already
    /// completed. The registry entry is updated (not saved) either way.
    pub async fn ingest_file(
        &self,
        path: &Path,
        doc_type: DocType,
        fund_id: Option<&str>,
        registry: &mut Registry,
        force: bool,
    ) -> Result<FileOutcome> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let hash = content_hash(&bytes);
        let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let fund = match doc_type {
            DocType::TrustDeed if !is_global_fund(fund_id) => fund_id.map(str::trim).unwrap_or_default().to_string(),
            _ => GLOBAL_FUND_ID.to_string(),
        };
        if !force && registry.is_indexed(&name, &fund, &hash) {
            info!(file = %name, fund_id = %fund, "unchanged since last run, skipping");
            return Ok(FileOutcome::Skipped);
        }

        let result = match SourceDocument::from_file(path, doc_type, fund_id) {
            Ok(doc) => self.ingest_document(&doc).await,
            Err(e) => Err(e),
        };
        let (chunks, status) = match &result {
            Ok(FileOutcome::Indexed { chunks, .. }) => (*chunks, IndexStatus::Completed),
            Ok(FileOutcome::Skipped) => (0, IndexStatus::Completed),
            Err(e) => {
                warn!(file = %name, error = %e, "indexing failed");
                (0, IndexStatus::Failed)
            }
        };
        registry.record(RegistryEntry {
            name,
            doc_type,
            fund_id: fund,
            content_hash: hash,
            chunks,
            indexed_at: Utc::now(),
            status,
        });
        result
    }
}
