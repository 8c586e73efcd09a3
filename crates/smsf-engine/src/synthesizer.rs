use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use smsf_core::traits::LanguageModel;
use smsf_core::{DocumentChunk, Error, Result};

use crate::prompts::{fallback_prompt, qa_prompt, refine_prompt, GENERAL_DISCLAIMER, NO_CHANGE};

/// Builds an answer from retrieved chunks: the QA prompt on the first chunk,
/// then one refine step per further chunk, strictly in retrieval order.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>, timeout: Duration) -> Self { Self { llm, timeout } }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let text = match tokio::time::timeout(self.timeout, self.llm.complete(prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(Error::SynthesisFailed(e.to_string())),
            Err(_) => return Err(Error::SynthesisFailed(format!("language model timed out after {:?}", self.timeout))),
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::SynthesisFailed("language model returned an empty answer".to_string()));
        }
        Ok(text.to_string())
    }

    pub async fn synthesize(&self, question: &str, chunks: &[DocumentChunk]) -> Result<String> {
        let Some((first, rest)) = chunks.split_first() else {
            return self.fallback(question).await;
        };
        let mut answer = self.complete(&qa_prompt(question, first)).await?;
        for chunk in rest {
            answer = self.refine(question, &answer, chunk).await?;
        }
        debug!(chunks = chunks.len(), refine_steps = rest.len(), "synthesized answer");
        Ok(answer)
    }

    /// Returns `existing_answer` untouched when the model reports no change
    /// or echoes the same answer back.
    pub async fn refine(&self, question: &str, existing_answer: &str, chunk: &DocumentChunk) -> Result<String> {
        let out = self.complete(&refine_prompt(question, existing_answer, chunk)).await?;
        if reports_no_change(&out) || out == existing_answer.trim() {
            return Ok(existing_answer.to_string());
        }
        Ok(out)
    }

    /// General-information answer; always begins with the disclaimer.
    pub async fn fallback(&self, question: &str) -> Result<String> {
        let out = self.complete(&fallback_prompt(question)).await?;
        Ok(with_disclaimer(&out))
    }
}

/// True when the reply leads with the sentinel, however it is decorated:
/// `NO_CHANGE.`, `` `NO_CHANGE` ``, `"no_change"`, `NO_CHANGE - nothing new`.
fn reports_no_change(reply: &str) -> bool {
    let reply = reply.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '`' | '"' | '\'' | '*'));
    let head = reply.split(|c: char| !(c.is_alphanumeric() || c == '_')).next().unwrap_or_default();
    head.eq_ignore_ascii_case(NO_CHANGE)
}

pub fn with_disclaimer(answer: &str) -> String {
    let answer = answer.trim_start();
    if answer.starts_with(GENERAL_DISCLAIMER) {
        answer.to_string()
    } else {
        format!("{GENERAL_DISCLAIMER} {answer}")
    }
}
