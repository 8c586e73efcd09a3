//! Exact-match metadata filters over chunk tags.
//!
//! A [`FilterSet`] is a conjunction of [`Predicate`]s; a predicate with several
//! values matches when the tag equals any one of them (`doc_type IN (...)`).
//! There is no wildcard: a predicate always names concrete values, and the
//! builder refuses to produce a trust-deed filter without a fund predicate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::types::{is_global_fund, DocType, DocumentChunk};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    DocType,
    FundId,
    DocId,
}

impl FilterKey {
    pub fn column(&self) -> &'static str {
        match self {
            FilterKey::DocType => "doc_type",
            FilterKey::FundId => "fund_id",
            FilterKey::DocId => "doc_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub key: FilterKey,
    pub values: Vec<String>,
}

impl Predicate {
    pub fn exact(key: FilterKey, value: impl Into<String>) -> Self { Self { key, values: vec![value.into()] } }

    pub fn any_of(key: FilterKey, values: impl IntoIterator<Item = String>) -> Self {
        Self { key, values: values.into_iter().collect() }
    }

    fn tag<'a>(&self, chunk: &'a DocumentChunk) -> &'a str {
        match self.key {
            FilterKey::DocType => chunk.doc_type.as_str(),
            FilterKey::FundId => chunk.fund_id.as_str(),
            FilterKey::DocId => chunk.doc_id.as_str(),
        }
    }

    pub fn matches(&self, chunk: &DocumentChunk) -> bool {
        let tag = self.tag(chunk);
        self.values.iter().any(|v| v == tag)
    }

    fn to_sql(&self) -> String {
        let quoted: Vec<String> = self.values.iter().map(|v| format!("'{}'", v.replace('\'', "''"))).collect();
        if quoted.len() == 1 {
            format!("{} = {}", self.key.column(), quoted[0])
        } else {
            format!("{} IN ({})", self.key.column(), quoted.join(", "))
        }
    }
}

/// Conjunction of exact-match predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

impl FilterSet {
    /// `doc_type IN (legislation, ato_ruling)`; no fund predicate.
    pub fn public_law() -> Self {
        Self {
            predicates: vec![Predicate::any_of(
                FilterKey::DocType,
                [DocType::Legislation, DocType::AtoRuling].iter().map(|d| d.as_str().to_string()),
            )],
        }
    }

    /// `fund_id = <fund_id> AND doc_type = trust_deed`.
    pub fn private_deed(fund_id: &str) -> Result<Self> { build_filter(&[DocType::TrustDeed], Some(fund_id)) }

    /// Every chunk of one source document (`doc_id = <doc_id>`). Used for
    /// maintenance, never as a retrieval partition.
    pub fn document(doc_id: &str) -> Result<Self> {
        let doc_id = doc_id.trim();
        if doc_id.is_empty() {
            return Err(Error::InvalidRequest("a document filter needs a doc_id".to_string()));
        }
        Ok(Self { predicates: vec![Predicate::exact(FilterKey::DocId, doc_id)] })
    }

    pub fn predicates(&self) -> &[Predicate] { &self.predicates }

    pub fn is_empty(&self) -> bool { self.predicates.is_empty() }

    /// Values constrained for `key`, if the filter constrains it at all.
    pub fn values_for(&self, key: FilterKey) -> Option<&[String]> {
        self.predicates.iter().find(|p| p.key == key).map(|p| p.values.as_slice())
    }

    pub fn matches(&self, chunk: &DocumentChunk) -> bool { self.predicates.iter().all(|p| p.matches(chunk)) }

    /// SQL predicate for storage engines that accept `WHERE`-style filters.
    /// Values are single-quote escaped.
    pub fn to_sql(&self) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }
        Some(self.predicates.iter().map(Predicate::to_sql).collect::<Vec<_>>().join(" AND "))
    }

    /// Fails unless the filter pins exactly `fund_id` and restricts to trust deeds.
    pub fn ensure_private_isolation(&self, fund_id: &str) -> Result<()> {
        let fund_ok = matches!(self.values_for(FilterKey::FundId), Some([only]) if only == fund_id);
        let type_ok = matches!(self.values_for(FilterKey::DocType), Some([only]) if only == DocType::TrustDeed.as_str());
        if fund_ok && type_ok && !is_global_fund(Some(fund_id)) {
            Ok(())
        } else {
            Err(Error::PartitionIsolationViolation(format!(
                "private deed filter for fund '{fund_id}' is not pinned to that fund: {self}"
            )))
        }
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_sql() {
            Some(sql) => f.write_str(&sql),
            None => f.write_str("<unfiltered>"),
        }
    }
}

/// Builds the conjunctive filter for a retrieval scope.
///
/// `doc_types` becomes one `doc_type` predicate. A scope that reaches trust
/// deeds must name a concrete fund; asking for deeds with no fund (or the
/// global sentinel) is rejected rather than widened. Public documents are
/// always tagged global, so a public-only scope carries no fund predicate,
/// and a scope mixing deeds with public types has no conjunctive form.
pub fn build_filter(doc_types: &[DocType], fund_id: Option<&str>) -> Result<FilterSet> {
    if doc_types.is_empty() {
        return Err(Error::InvalidRequest("a filter needs at least one doc_type".to_string()));
    }
    let reaches_deeds = doc_types.contains(&DocType::TrustDeed);
    let reaches_public = doc_types.iter().any(|d| d.is_public());
    if reaches_deeds && is_global_fund(fund_id) {
        return Err(Error::PartitionIsolationViolation(format!(
            "trust deed filter requested without a concrete fund_id ({fund_id:?})"
        )));
    }
    if reaches_deeds && reaches_public {
        return Err(Error::InvalidRequest(
            "trust deeds and public documents cannot share one filter; query them as separate partitions".to_string(),
        ));
    }
    let mut predicates = Vec::with_capacity(2);
    if reaches_deeds {
        if let Some(fund) = fund_id.map(str::trim).filter(|f| !f.is_empty()) {
            predicates.push(Predicate::exact(FilterKey::FundId, fund));
        }
    }
    let mut types: Vec<String> = Vec::new();
    for d in doc_types {
        if !types.iter().any(|t| t == d.as_str()) {
            types.push(d.as_str().to_string());
        }
    }
    predicates.push(Predicate::any_of(FilterKey::DocType, types));
    Ok(FilterSet { predicates })
}
