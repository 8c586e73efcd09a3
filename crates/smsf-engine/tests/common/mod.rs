#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use smsf_core::traits::{Embedder, LanguageModel, VectorIndex};
use smsf_core::{DocType, DocumentChunk, Error, FilterSet, Result, ScoredChunk, GLOBAL_FUND_ID};
use smsf_embed::FakeEmbedder;
use smsf_vector::MemoryVectorIndex;

pub const DIM: usize = 256;

type Responder = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Language model stub: answers from a closure and records every prompt.
pub struct ScriptedModel {
    responder: Responder,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(responder: impl Fn(&str) -> Result<String> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self { responder: Box::new(responder), prompts: Mutex::new(Vec::new()) })
    }

    /// Replies in order; running out is an error.
    pub fn replies(replies: &[&str]) -> Arc<Self> {
        let queue: Mutex<VecDeque<String>> = Mutex::new(replies.iter().map(|r| r.to_string()).collect());
        Self::new(move |_| {
            queue.lock().unwrap().pop_front().ok_or_else(|| Error::LanguageModel("script exhausted".to_string()))
        })
    }

    pub fn failing() -> Arc<Self> { Self::new(|_| Err(Error::LanguageModel("429 quota exceeded".to_string()))) }

    pub fn prompts(&self) -> Vec<String> { self.prompts.lock().unwrap().clone() }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_id(&self) -> &str { "scripted" }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.responder)(prompt)
    }
}

/// Behaves like a compliance assistant for the end-to-end scenarios:
/// routes on the question, cites the first context locator, never refines.
pub fn assistant() -> Arc<ScriptedModel> {
    ScriptedModel::new(|prompt| {
        if prompt.starts_with("Some choices are given below") {
            let question = prompt
                .split("question: '")
                .nth(1)
                .and_then(|rest| rest.split("'\n").next())
                .unwrap_or_default()
                .to_lowercase();
            let wanted = if question.contains("deed") {
                "private_deed"
            } else if question.contains("act") {
                "public_law"
            } else {
                "fallback"
            };
            let choice = prompt
                .lines()
                .find(|l| l.contains(&format!(") {wanted}:")))
                .and_then(|l| l.trim_start_matches('(').split(')').next())
                .unwrap_or("0")
                .to_string();
            Ok(format!("{{\"choice\": {choice}, \"reason\": \"best match\"}}"))
        } else if prompt.ends_with("Refined answer: ") {
            let existing = between(prompt, "The existing compliance answer is:\n---------------------\n", "\n---------------------");
            let locator = context_locator(prompt);
            if locator.ends_with("SIS Act") && !existing.contains("SIS Act") {
                Ok(format!("{existing} See also {locator}."))
            } else {
                Ok("NO_CHANGE".to_string())
            }
        } else if prompt.ends_with("General answer: ") {
            Ok("Hello! Ask me anything about running an SMSF.".to_string())
        } else {
            Ok(format!("Yes, subject to conditions. Legal basis: {}.", context_locator(prompt)))
        }
    })
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    text.split(start).nth(1).and_then(|rest| rest.split(end).next()).unwrap_or_default()
}

/// Last field of the context header, e.g. `s 67A SIS Act` from `[legislation | sis_act.txt | s 67A SIS Act]`.
fn context_locator(prompt: &str) -> String {
    let context = prompt.rsplit("context:\n---------------------\n").next().unwrap_or(prompt);
    let header = context.lines().find(|l| l.starts_with('[')).unwrap_or("[none]");
    header.trim_matches(|c| c == '[' || c == ']').rsplit(" | ").next().unwrap_or_default().to_string()
}

/// Index that cannot be reached.
pub struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn upsert(&self, _: &[DocumentChunk], _: &[Vec<f32>]) -> Result<usize> {
        Err(Error::Storage("connection refused".to_string()))
    }
    async fn search(&self, _: &[f32], _: &FilterSet, _: usize) -> Result<Vec<ScoredChunk>> {
        Err(Error::Storage("connection refused".to_string()))
    }
    async fn supersede(&self, _: &FilterSet, _: &[String]) -> Result<usize> {
        Err(Error::Storage("connection refused".to_string()))
    }
}

/// Wraps the memory index and records every search filter.
#[derive(Default)]
pub struct RecordingIndex {
    pub inner: MemoryVectorIndex,
    pub filters: Mutex<Vec<FilterSet>>,
}

impl RecordingIndex {
    pub fn filters(&self) -> Vec<FilterSet> { self.filters.lock().unwrap().clone() }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    async fn upsert(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        self.inner.upsert(chunks, embeddings).await
    }
    async fn search(&self, query_vec: &[f32], filter: &FilterSet, top_k: usize) -> Result<Vec<ScoredChunk>> {
        self.filters.lock().unwrap().push(filter.clone());
        self.inner.search(query_vec, filter, top_k).await
    }
    async fn supersede(&self, filter: &FilterSet, keep_ids: &[String]) -> Result<usize> {
        self.inner.supersede(filter, keep_ids).await
    }
}

pub fn embedder() -> Arc<FakeEmbedder> { Arc::new(FakeEmbedder::new(DIM)) }

pub fn chunk(doc_id: &str, idx: usize, doc_type: DocType, fund_id: &str, locator: Option<&str>, content: &str) -> DocumentChunk {
    DocumentChunk {
        id: format!("{doc_id}:{idx}"),
        doc_id: doc_id.to_string(),
        source: format!("{doc_id}.txt"),
        doc_type,
        fund_id: fund_id.to_string(),
        section: if doc_type == DocType::TrustDeed { None } else { locator.map(str::to_string) },
        clause: if doc_type == DocType::TrustDeed { locator.map(str::to_string) } else { None },
        content: content.to_string(),
        chunk_index: idx,
        total_chunks: 1,
        is_latest: true,
    }
}

/// Legislation, a ruling and two lexically identical deeds for different funds.
pub fn corpus() -> Vec<DocumentChunk> {
    vec![
        chunk("sis_act", 0, DocType::Legislation, GLOBAL_FUND_ID, Some("67A"),
            "s 67A Limited recourse borrowing arrangements. A trustee may borrow money to acquire a single acquirable asset held on trust."),
        chunk("sis_act", 1, DocType::Legislation, GLOBAL_FUND_ID, Some("62"),
            "s 62 Sole purpose test. The fund must be maintained solely for retirement benefits."),
        chunk("SMSFR 2012 1", 0, DocType::AtoRuling, GLOBAL_FUND_ID, Some("SMSFR 2012 1"),
            "This ruling explains the meaning of a single acquirable asset for limited recourse borrowing."),
        chunk("FUND_A:deed", 0, DocType::TrustDeed, "FUND_A", Some("12.4"),
            "12.4 Borrowing. The trustee may enter a limited recourse borrowing arrangement permitted by the SIS Act."),
        chunk("FUND_B:deed", 0, DocType::TrustDeed, "FUND_B", Some("9.1"),
            "9.1 Borrowing. The trustee may enter a limited recourse borrowing arrangement permitted by the SIS Act. FUND_B secret."),
    ]
}

pub async fn seed(index: &dyn VectorIndex, chunks: &[DocumentChunk]) {
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let vectors = embedder().embed_batch(&texts).await.unwrap();
    index.upsert(chunks, &vectors).await.unwrap();
}
