//! Local JSON ledger of indexed source files.
//!
//! The whole file is read and rewritten on every change; it is small and only
//! the ingest binary writes it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use smsf_core::DocType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub doc_type: DocType,
    pub fund_id: String,
    pub content_hash: String,
    pub chunks: usize,
    pub indexed_at: DateTime<Utc>,
    pub status: IndexStatus,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Registry {
    indexed_files: Vec<RegistryEntry>,
    #[serde(skip)]
    path: PathBuf,
}

pub fn content_hash(bytes: &[u8]) -> String { blake3::hash(bytes).to_hex().to_string() }

impl Registry {
    /// A missing file yields an empty registry bound to `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut registry = if path.exists() {
            let raw = fs::read_to_string(path).with_context(|| format!("reading registry {}", path.display()))?;
            serde_json::from_str::<Registry>(&raw).with_context(|| format!("parsing registry {}", path.display()))?
        } else {
            Registry::default()
        };
        registry.path = path.to_path_buf();
        Ok(registry)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(self)?).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    pub fn entries(&self) -> &[RegistryEntry] { &self.indexed_files }

    pub fn get(&self, name: &str, fund_id: &str) -> Option<&RegistryEntry> {
        self.indexed_files.iter().find(|e| e.name == name && e.fund_id == fund_id)
    }

    /// Same name, same fund, same content and completed last time.
    pub fn is_indexed(&self, name: &str, fund_id: &str, hash: &str) -> bool {
        self.get(name, fund_id).is_some_and(|e| e.content_hash == hash && e.status == IndexStatus::Completed)
    }

    /// Replaces any entry with the same name and fund.
    pub fn record(&mut self, entry: RegistryEntry) {
        self.indexed_files.retain(|e| !(e.name == entry.name && e.fund_id == entry.fund_id));
        self.indexed_files.push(entry);
    }
}
