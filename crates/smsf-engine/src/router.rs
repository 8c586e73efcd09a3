//! Tool selection: exactly one tool index per request.
//!
//! [`LlmSelector`] asks the language model; [`KeywordSelector`] is a
//! deterministic rule-based classifier with the same contract. Neither
//! retrieves anything.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

use smsf_core::traits::LanguageModel;
use smsf_core::{Error, Result};

use crate::prompts::selector_prompt;
use crate::tools::{ToolDescription, FALLBACK_TOOL, PRIVATE_DEED_TOOL, PUBLIC_LAW_TOOL};

#[async_trait]
pub trait Selector: Send + Sync {
    /// Zero-based index into `tools`. Must fail with `SelectionAmbiguous`
    /// rather than guess.
    async fn select(&self, question: &str, tools: &[ToolDescription]) -> Result<usize>;
}

#[derive(Deserialize)]
struct Choice {
    choice: i64,
}

fn number_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+").expect("static regex"))
}

fn in_range(choice: i64, n: usize, raw: &str) -> Result<usize> {
    match usize::try_from(choice) {
        Ok(c) if (1..=n).contains(&c) => Ok(c - 1),
        _ => Err(Error::SelectionAmbiguous(format!("choice {choice} is outside 1..={n} in {raw:?}"))),
    }
}

/// Parses a 1-based selection into a 0-based index.
///
/// Accepts a JSON object with a `choice` field (possibly wrapped in prose or a
/// code fence) or a reply containing exactly one number.
pub fn parse_selection(raw: &str, n: usize) -> Result<usize> {
    if n == 0 {
        return Err(Error::SelectionAmbiguous("no tools to choose from".to_string()));
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Ok(parsed) = serde_json::from_str::<Choice>(&raw[start..=end]) {
                return in_range(parsed.choice, n, raw);
            }
        }
    }
    let mut numbers: Vec<i64> = number_token().find_iter(raw).filter_map(|m| m.as_str().parse().ok()).collect();
    numbers.dedup();
    match numbers.as_slice() {
        [only] => in_range(*only, n, raw),
        [] => Err(Error::SelectionAmbiguous(format!("no choice found in {raw:?}"))),
        _ => Err(Error::SelectionAmbiguous(format!("several choices found in {raw:?}"))),
    }
}

pub struct LlmSelector {
    llm: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl LlmSelector {
    pub fn new(llm: Arc<dyn LanguageModel>, timeout: Duration) -> Self { Self { llm, timeout } }
}

#[async_trait]
impl Selector for LlmSelector {
    async fn select(&self, question: &str, tools: &[ToolDescription]) -> Result<usize> {
        let prompt = selector_prompt(question, tools);
        let raw = match tokio::time::timeout(self.timeout, self.llm.complete(&prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(Error::SynthesisFailed(format!("selector call failed: {e}"))),
            Err(_) => return Err(Error::SynthesisFailed(format!("selector call timed out after {:?}", self.timeout))),
        };
        debug!(raw = %raw.trim(), "selector output");
        parse_selection(&raw, tools.len())
    }
}

const DEED_TERMS: &[&str] = &["deed", "deeds", "clause", "clauses"];
const LAW_TERMS: &[&str] = &[
    "sis", "act", "section", "sections", "regulation", "regulations", "ruling", "rulings", "ato", "law",
    "legislation", "legal", "contribution", "contributions", "borrow", "borrowing", "lrba", "pension",
    "superannuation", "smsf", "trustee", "trustees", "investment", "invest", "sole", "purpose",
];

/// Rule-based selector: deed vocabulary goes to the fund's deed, legal
/// vocabulary to public law, anything else to the fallback. When the preferred
/// tool is absent the next one in that order is used.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordSelector;

#[async_trait]
impl Selector for KeywordSelector {
    async fn select(&self, question: &str, tools: &[ToolDescription]) -> Result<usize> {
        let lower = question.to_lowercase();
        let words: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();
        let mentions = |terms: &[&str]| words.iter().any(|w| terms.contains(w));

        let preference: &[&str] = if mentions(DEED_TERMS) {
            &[PRIVATE_DEED_TOOL, PUBLIC_LAW_TOOL]
        } else if mentions(LAW_TERMS) {
            &[PUBLIC_LAW_TOOL]
        } else {
            &[FALLBACK_TOOL, PUBLIC_LAW_TOOL]
        };
        preference
            .iter()
            .find_map(|name| tools.iter().position(|t| t.name == *name))
            .ok_or_else(|| Error::SelectionAmbiguous(format!("no matching tool among {} choices", tools.len())))
    }
}

/// Per-request routing state: `AwaitingSelection` until the selector answers,
/// then `Selected` for the rest of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    AwaitingSelection,
    Selected(usize),
}

pub struct Router<'a> {
    selector: &'a dyn Selector,
    state: RouterState,
}

impl<'a> Router<'a> {
    pub fn new(selector: &'a dyn Selector) -> Self { Self { selector, state: RouterState::AwaitingSelection } }

    pub fn state(&self) -> RouterState { self.state }

    /// Selects once; later calls return the decision already made.
    pub async fn route(&mut self, question: &str, tools: &[ToolDescription]) -> Result<usize> {
        if let RouterState::Selected(index) = self.state {
            return Ok(index);
        }
        let index = match tools.len() {
            0 => return Err(Error::SelectionAmbiguous("no tools to choose from".to_string())),
            1 => 0,
            n => {
                let index = self.selector.select(question, tools).await?;
                if index >= n {
                    return Err(Error::SelectionAmbiguous(format!("selector returned index {index} for {n} tools")));
                }
                index
            }
        };
        self.state = RouterState::Selected(index);
        info!(index, tool = %tools[index].name, "routed");
        Ok(index)
    }
}
