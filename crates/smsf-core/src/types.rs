//! Domain types shared by the retrieval core, the index backends and ingestion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub type ChunkId = String;

/// Fund identifier carried by every public (non fund-specific) document.
pub const GLOBAL_FUND_ID: &str = "global";

/// True when `fund_id` is missing, blank or the public sentinel.
pub fn is_global_fund(fund_id: Option<&str>) -> bool {
    match fund_id.map(str::trim) {
        None => true,
        Some(id) => id.is_empty() || id.eq_ignore_ascii_case(GLOBAL_FUND_ID),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Legislation,
    AtoRuling,
    TrustDeed,
}

impl DocType {
    pub const ALL: [DocType; 3] = [DocType::Legislation, DocType::AtoRuling, DocType::TrustDeed];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Legislation => "legislation",
            DocType::AtoRuling => "ato_ruling",
            DocType::TrustDeed => "trust_deed",
        }
    }

    /// Public documents are shared by every fund and tagged `fund_id = "global"`.
    pub fn is_public(&self) -> bool { !matches!(self, DocType::TrustDeed) }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for DocType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DocType::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| Error::InvalidChunk(format!("unknown doc_type '{s}'")))
    }
}

/// A chunk of a source document that is independently indexed.
///
/// - `id`: stable chunk identifier (`<doc_id>:<chunk_index>`)
/// - `doc_id`: stable document identity (file stem or ruling id)
/// - `source`: original file name the chunk came from
/// - `doc_type`/`fund_id`: the partition tags every filter is evaluated against
/// - `section`/`clause`: optional legal locator used for citations
/// - `is_latest`: cleared when a newer version of the document supersedes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub source: String,
    pub doc_type: DocType,
    pub fund_id: String,
    pub section: Option<String>,
    pub clause: Option<String>,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub is_latest: bool,
}

impl DocumentChunk {
    /// Checks the tag invariant: deed chunks belong to a concrete fund and
    /// public chunks to the global sentinel.
    pub fn validate_tags(&self) -> Result<()> {
        match self.doc_type {
            DocType::TrustDeed if is_global_fund(Some(&self.fund_id)) => Err(Error::InvalidChunk(format!(
                "trust deed chunk '{}' must carry a concrete fund_id, got '{}'",
                self.id, self.fund_id
            ))),
            d if d.is_public() && self.fund_id != GLOBAL_FUND_ID => Err(Error::InvalidChunk(format!(
                "{} chunk '{}' must carry fund_id '{}', got '{}'",
                d, self.id, GLOBAL_FUND_ID, self.fund_id
            ))),
            _ => Ok(()),
        }
    }

    /// Human readable citation label, e.g. `s 62 SIS Act` or `Clause 12.4`.
    pub fn locator(&self) -> Option<String> {
        match (self.doc_type, &self.section, &self.clause) {
            (DocType::Legislation, Some(s), _) => Some(format!("s {s} SIS Act")),
            (DocType::AtoRuling, Some(s), _) => Some(s.clone()),
            (_, _, Some(c)) => Some(format!("Clause {c}")),
            _ => None,
        }
    }
}

/// A chunk returned by a vector index together with its similarity.
/// Higher `score` is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Body of an ask request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub fund_id: String,
    pub question: String,
}

/// The single response produced for a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub fund_id: String,
    pub sources: Vec<String>,
}
