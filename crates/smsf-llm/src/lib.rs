//! Language model provider for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Every call is made at temperature 0 so that identical prompts yield
//! near-identical answers; the temperature is deliberately not configurable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use smsf_core::config::LlmSettings;
use smsf_core::traits::LanguageModel;
use smsf_core::{Error, Result};

pub const TEMPERATURE: f32 = 0.0;

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub temperature: f32,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl<'a> ChatRequest<'a> {
    /// Single user turn at the fixed temperature.
    pub fn user(model: &'a str, prompt: &'a str) -> Self {
        Self { model, temperature: TEMPERATURE, messages: vec![ChatMessage { role: "user", content: prompt }] }
    }
}

/// Extracts the first choice's text; empty or missing text is an error.
pub fn parse_chat_response(body: &str) -> Result<String> {
    let resp: ChatResponse =
        serde_json::from_str(body).map_err(|e| Error::LanguageModel(format!("invalid chat completion JSON: {e}")))?;
    match resp.choices.into_iter().next().and_then(|c| c.message.content) {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(Error::LanguageModel("LLM returned empty text".to_string())),
        None => Err(Error::LanguageModel("LLM returned no text".to_string())),
    }
}

pub struct ChatModel {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl ChatModel {
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .map_err(|_| Error::InvalidConfig(format!("{} is not set", settings.api_key_env)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            model: settings.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl LanguageModel for ChatModel {
    fn model_id(&self) -> &str { &self.model }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "chat completion");
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest::user(&self.model, prompt))
            .send()
            .await
            .map_err(|e| Error::LanguageModel(format!("failed to reach {}: {e}", self.url)))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::LanguageModel(format!("reading response: {e}")))?;
        if !status.is_success() {
            return Err(Error::LanguageModel(format!("http error {status}: {body}")));
        }
        parse_chat_response(&body)
    }
}
