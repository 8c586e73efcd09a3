//! Retrieval partitions wrapped as named, described tools.

use serde::Serialize;
use tracing::debug;

use smsf_core::types::is_global_fund;
use smsf_core::{FilterSet, Result};

pub const PUBLIC_LAW_TOOL: &str = "public_law";
pub const PRIVATE_DEED_TOOL: &str = "private_deed";
pub const FALLBACK_TOOL: &str = "fallback";

/// The view of the corpus a tool searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partition {
    PublicLaw,
    PrivateDeed { fund_id: String },
    /// No retrieval; the answer comes from the general-information template.
    Fallback,
}

impl Partition {
    /// Filter for this partition, or `None` when it does not retrieve.
    /// A private filter is re-checked for its fund predicate before it is handed out.
    pub fn filter(&self) -> Result<Option<FilterSet>> {
        match self {
            Partition::PublicLaw => Ok(Some(FilterSet::public_law())),
            Partition::PrivateDeed { fund_id } => {
                let filter = FilterSet::private_deed(fund_id)?;
                filter.ensure_private_isolation(fund_id)?;
                Ok(Some(filter))
            }
            Partition::Fallback => Ok(None),
        }
    }
}

/// What the selector sees: name and description only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub partition: Partition,
}

impl Tool {
    pub fn describe(&self) -> ToolDescription {
        ToolDescription { name: self.name.clone(), description: self.description.clone() }
    }

    fn public_law() -> Self {
        Self {
            name: PUBLIC_LAW_TOOL.to_string(),
            description: "Search here for SIS Act sections, SIS Regulations and ATO rulings: \
                          the superannuation law and regulator guidance that applies to every fund."
                .to_string(),
            partition: Partition::PublicLaw,
        }
    }

    fn private_deed(fund_id: &str) -> Self {
        Self {
            name: PRIVATE_DEED_TOOL.to_string(),
            description: format!(
                "Search here for the clauses of the trust deed of fund {fund_id}: \
                 what this fund's own deed allows or restricts (trustee powers, investments, borrowing, benefits)."
            ),
            partition: Partition::PrivateDeed { fund_id: fund_id.to_string() },
        }
    }

    fn fallback() -> Self {
        Self {
            name: FALLBACK_TOOL.to_string(),
            description: "Use this for greetings, small talk or general superannuation questions \
                          that do not need the law or a trust deed looked up."
                .to_string(),
            partition: Partition::Fallback,
        }
    }
}

/// Fresh, ordered tool list for one request: public law, then the fund's deed
/// (only for a concrete fund), then the fallback when enabled.
pub fn build_tools(fund_id: Option<&str>, include_fallback: bool) -> Vec<Tool> {
    let mut tools = vec![Tool::public_law()];
    if !is_global_fund(fund_id) {
        if let Some(fund) = fund_id.map(str::trim) {
            tools.push(Tool::private_deed(fund));
        }
    }
    if include_fallback {
        tools.push(Tool::fallback());
    }
    debug!(tools = ?tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(), "assembled tool set");
    tools
}
