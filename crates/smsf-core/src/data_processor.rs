//! Turns extracted source text into tagged [`DocumentChunk`]s.
//!
//! Legislation is split on section headings (`s 62`, `Section 17A(1)`), ATO
//! rulings and trust deeds on paragraphs. Long spans are cut into overlapping
//! word windows. Every chunk is validated before it leaves this module.

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::config::IngestSettings;
use crate::error::Error;
use crate::types::{is_global_fund, DocType, DocumentChunk, GLOBAL_FUND_ID};

fn section_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?mi)^[ \t]*(?:section[ \t]+|s[ \t]?)(\d+[A-Z]{0,2})(?:[ \t]*\(([^)\n]+)\))?").expect("static regex")
    })
}

fn clause_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:clause\s+(\d{1,3}(?:\.\d{1,3})*(?:\.[a-z])?)|(\d{1,3}(?:\.\d{1,3})+(?:\.[a-z])?))\b")
            .expect("static regex")
    })
}

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub max_chunk_chars: usize,
    pub target_words: usize,
    pub overlap_percent: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self { Self::from(&IngestSettings::default()) }
}

impl From<&IngestSettings> for ChunkingConfig {
    fn from(s: &IngestSettings) -> Self {
        Self { max_chunk_chars: s.max_chunk_chars, target_words: s.target_words, overlap_percent: s.overlap_percent }
    }
}

/// Extracted text of one source file plus the tags its chunks will carry.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub doc_id: String,
    pub source: String,
    pub doc_type: DocType,
    pub fund_id: String,
    pub text: String,
}

impl SourceDocument {
    /// Public documents are always tagged global; deeds require a concrete fund.
    pub fn new(doc_id: &str, source: &str, doc_type: DocType, fund_id: Option<&str>, text: String) -> Result<Self, Error> {
        let fund_id = match doc_type {
            DocType::TrustDeed => {
                if is_global_fund(fund_id) {
                    return Err(Error::InvalidRequest(format!("trust deed '{source}' needs a concrete fund_id")));
                }
                fund_id.map(str::trim).unwrap_or_default().to_string()
            }
            _ => GLOBAL_FUND_ID.to_string(),
        };
        Ok(Self { doc_id: doc_id.to_string(), source: source.to_string(), doc_type, fund_id, text })
    }

    pub fn from_file(path: &Path, doc_type: DocType, fund_id: Option<&str>) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => String::from_utf8_lossy(&fs::read(path).with_context(|| format!("reading {}", path.display()))?).to_string(),
        };
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("no file name in {}", path.display()))?;
        let source = path.file_name().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| stem.clone());
        let doc_id = match (doc_type, fund_id) {
            (DocType::TrustDeed, Some(fund)) => format!("{}:{}", fund.trim(), stem),
            _ => stem,
        };
        Ok(Self::new(&doc_id, &source, doc_type, fund_id, text)?)
    }

    /// `TR_2023_1.txt` -> `TR 2023 1`
    fn ruling_id(&self) -> String {
        let stem = self.source.rsplit_once('.').map(|(s, _)| s).unwrap_or(&self.source);
        stem.replace('_', " ")
    }
}

struct Span {
    text: String,
    section: Option<String>,
    clause: Option<String>,
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Self { Self { chunking_config } }

    pub fn process(&self, doc: &SourceDocument) -> Result<Vec<DocumentChunk>, Error> {
        let spans = match doc.doc_type {
            DocType::Legislation => self.split_sections(&doc.text),
            DocType::AtoRuling => {
                let ruling = doc.ruling_id();
                self.split_paragraphs(&doc.text, false)
                    .into_iter()
                    .map(|s| Span { section: Some(ruling.clone()), ..s })
                    .collect()
            }
            DocType::TrustDeed => self.split_paragraphs(&doc.text, true),
        };
        let total_chunks = spans.len();
        let chunks: Vec<DocumentChunk> = spans
            .into_iter()
            .enumerate()
            .map(|(chunk_index, span)| DocumentChunk {
                id: format!("{}:{}", doc.doc_id, chunk_index),
                doc_id: doc.doc_id.clone(),
                source: doc.source.clone(),
                doc_type: doc.doc_type,
                fund_id: doc.fund_id.clone(),
                section: span.section,
                clause: span.clause,
                content: span.text,
                chunk_index,
                total_chunks,
                is_latest: true,
            })
            .collect();
        self.validate(&chunks)?;
        debug!(doc_id = %doc.doc_id, doc_type = %doc.doc_type, chunks = chunks.len(), "chunked document");
        Ok(chunks)
    }

    /// Tag invariant, size bound, and section presence after the preamble.
    pub fn validate(&self, chunks: &[DocumentChunk]) -> Result<(), Error> {
        let mut seen_section = false;
        for c in chunks {
            c.validate_tags()?;
            if c.content.trim().is_empty() {
                return Err(Error::InvalidChunk(format!("empty chunk: {}", c.id)));
            }
            if c.content.chars().count() > self.chunking_config.max_chunk_chars {
                return Err(Error::InvalidChunk(format!("oversized chunk: {}", c.id)));
            }
            if c.doc_type == DocType::Legislation {
                if c.section.is_some() {
                    seen_section = true;
                } else if seen_section {
                    return Err(Error::InvalidChunk(format!("missing section metadata: {}", c.id)));
                }
            }
        }
        Ok(())
    }

    fn split_sections(&self, text: &str) -> Vec<Span> {
        let re = section_heading();
        let matches: Vec<_> = re.captures_iter(text).collect();
        let mut spans = Vec::new();
        let first_start = matches.first().and_then(|c| c.get(0)).map(|m| m.start()).unwrap_or(text.len());
        let preamble = &text[..first_start];
        if !preamble.trim().is_empty() {
            spans.extend(self.split_paragraphs(preamble, false));
        }
        for (i, caps) in matches.iter().enumerate() {
            let Some(whole) = caps.get(0) else { continue };
            let end = matches.get(i + 1).and_then(|c| c.get(0)).map(|m| m.start()).unwrap_or(text.len());
            let body = text[whole.start()..end].trim();
            if body.is_empty() {
                continue;
            }
            let number = caps.get(1).map(|m| m.as_str().to_uppercase()).unwrap_or_default();
            let section = match caps.get(2) {
                Some(sub) => format!("{}({})", number, sub.as_str().trim()),
                None => number,
            };
            for piece in self.fit(body) {
                spans.push(Span { text: piece, section: Some(section.clone()), clause: None });
            }
        }
        spans
    }

    /// Paragraph chunking. With `track_clauses`, a paragraph opening with a
    /// clause number sets the clause for itself and the paragraphs after it.
    fn split_paragraphs(&self, text: &str, track_clauses: bool) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut clause: Option<String> = None;
        for paragraph in text.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            if track_clauses {
                if let Some(caps) = clause_number().captures(paragraph) {
                    clause = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string());
                }
            }
            for piece in self.fit(paragraph) {
                spans.push(Span { text: piece, section: None, clause: clause.clone() });
            }
        }
        spans
    }

    fn fit(&self, text: &str) -> Vec<String> {
        let words = text.split_whitespace().count();
        if words <= self.chunking_config.target_words && text.chars().count() <= self.chunking_config.max_chunk_chars {
            vec![text.to_string()]
        } else {
            self.split_with_overlap(text)
        }
    }

    fn split_with_overlap(&self, paragraph: &str) -> Vec<String> {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        let words_per_chunk = self.chunking_config.target_words.max(1);
        let overlap_words = ((words_per_chunk as f32 * self.chunking_config.overlap_percent) as usize).min(words_per_chunk - 1);
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + words_per_chunk).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end >= words.len() {
                break;
            }
            start = end - overlap_words;
        }
        chunks
    }

    /// `.txt` / `.md` files under `root`, sorted for stable ingestion order.
    pub fn list_source_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if matches!(path.extension().and_then(|s| s.to_str()), Some("txt") | Some("md")) {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        if files.is_empty() {
            info!("no .txt/.md files found under {}", root.display());
        }
        files
    }
}
