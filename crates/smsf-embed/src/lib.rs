use std::sync::Arc;

use smsf_core::config::EmbeddingSettings;
use smsf_core::traits::Embedder;
use smsf_core::Result;
use tracing::info;

mod fake;
mod openai;

pub use fake::FakeEmbedder;
pub use openai::OpenAiEmbedder;

/// True when `APP_USE_FAKE_EMBEDDINGS` asks for the deterministic embedder.
pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if use_fake_embeddings() {
        info!(dim = settings.dimension, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.dimension)));
    }
    Ok(Arc::new(OpenAiEmbedder::from_settings(settings)?))
}
