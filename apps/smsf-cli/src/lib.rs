//! Wiring shared by the `smsf-ask` and `smsf-ingest` binaries.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use smsf_core::config::{resolve_with_base, Config, Settings};
use smsf_vector::LanceVectorIndex;

/// Logs go to stderr so stdout stays machine readable. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

pub fn load_settings() -> Result<Settings> {
    let config = Config::load().context("loading configuration")?;
    config.settings()
}

/// Resolves a configured path against the working directory.
pub fn resolve_path(raw: &str) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    Ok(resolve_with_base(&cwd, raw))
}

pub async fn open_index(settings: &Settings) -> Result<Arc<LanceVectorIndex>> {
    let uri = resolve_path(&settings.store.uri)?;
    std::fs::create_dir_all(&uri).with_context(|| format!("creating {}", uri.display()))?;
    let index = LanceVectorIndex::open(&uri.to_string_lossy(), &settings.store.table, settings.embedding.dimension)
        .await
        .with_context(|| format!("opening vector store at {}", uri.display()))?;
    Ok(Arc::new(index))
}
