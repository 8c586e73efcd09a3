//! Entry point: one question for one fund in, one answer or one error out.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

use smsf_core::config::{EngineSettings, RouterKind, Settings};
use smsf_core::traits::{Embedder, LanguageModel, VectorIndex};
use smsf_core::{AnswerResult, DocumentChunk, Error, ErrorKind, QueryRequest, Result};

use crate::retriever::PartitionedRetriever;
use crate::router::{KeywordSelector, LlmSelector, Router, Selector};
use crate::synthesizer::AnswerSynthesizer;
use crate::tools::{build_tools, Tool, ToolDescription};

/// The single error a caller sees. `message` is generic for its kind;
/// details are logged, not returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message} ({})", .kind.code())]
pub struct QueryError {
    pub kind: ErrorKind,
    pub fund_id: String,
    pub message: String,
}

impl QueryError {
    pub fn new(kind: ErrorKind, fund_id: &str) -> Self {
        Self { kind, fund_id: fund_id.to_string(), message: kind.public_message().to_string() }
    }
}

/// First `max_chars` characters of `text`, never splitting a character.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

pub struct QueryOrchestrator {
    retriever: PartitionedRetriever,
    synthesizer: AnswerSynthesizer,
    selector: Arc<dyn Selector>,
    settings: EngineSettings,
}

impl QueryOrchestrator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LanguageModel>,
        selector: Arc<dyn Selector>,
        settings: EngineSettings,
    ) -> Self {
        let timeout = settings.request_timeout();
        Self {
            retriever: PartitionedRetriever::new(embedder, index, timeout),
            synthesizer: AnswerSynthesizer::new(llm, timeout),
            selector,
            settings,
        }
    }

    /// Picks the selector named by `router.kind`.
    pub fn from_settings(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        let selector: Arc<dyn Selector> = match settings.router.kind {
            RouterKind::Llm => Arc::new(LlmSelector::new(llm.clone(), settings.engine.request_timeout())),
            RouterKind::Keyword => Arc::new(KeywordSelector),
        };
        Self::new(embedder, index, llm, selector, settings.engine.clone())
    }

    /// Answers a `{fund_id, question}` request body.
    pub async fn handle(&self, request: &QueryRequest) -> std::result::Result<AnswerResult, QueryError> {
        self.answer(&request.fund_id, &request.question).await
    }

    pub async fn answer(&self, fund_id: &str, question: &str) -> std::result::Result<AnswerResult, QueryError> {
        let span = info_span!("ask", fund_id = %fund_id);
        match self.run(fund_id, question).instrument(span).await {
            Ok(result) => Ok(result),
            Err(e) => {
                let kind = e.kind();
                warn!(fund_id = %fund_id, code = kind.code(), error = %e, "query failed");
                Err(QueryError::new(kind, fund_id))
            }
        }
    }

    async fn run(&self, fund_id: &str, question: &str) -> Result<AnswerResult> {
        let fund_id = fund_id.trim();
        let question = question.trim();
        if fund_id.is_empty() || question.is_empty() {
            return Err(Error::InvalidRequest("fund_id and question must both be non-empty".to_string()));
        }

        let tools = build_tools(Some(fund_id), self.settings.include_fallback);
        let descriptions: Vec<ToolDescription> = tools.iter().map(Tool::describe).collect();
        let mut router = Router::new(self.selector.as_ref());
        let index = router.route(question, &descriptions).await?;
        let tool = &tools[index];

        let chunks: Vec<DocumentChunk> = match tool.partition.filter()? {
            Some(filter) => self
                .retriever
                .retrieve(question, &filter, self.settings.similarity_top_k)
                .await?
                .into_iter()
                .map(|hit| hit.chunk)
                .collect(),
            None => Vec::new(),
        };
        info!(tool = %tool.name, chunks = chunks.len(), "retrieval done");

        let answer = self.synthesizer.synthesize(question, &chunks).await?;
        let sources = chunks.iter().map(|c| preview(&c.content, self.settings.source_preview_chars)).collect();
        Ok(AnswerResult { answer, fund_id: fund_id.to_string(), sources })
    }
}
