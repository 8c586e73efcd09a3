use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use smsf_cli::{init_tracing, load_settings, open_index};
use smsf_core::config::RouterKind;
use smsf_core::QueryRequest;
use smsf_embed::get_default_embedder;
use smsf_engine::QueryOrchestrator;
use smsf_llm::ChatModel;

#[derive(Parser)]
#[command(name = "smsf-ask", about = "Answer an SMSF compliance question for one fund")]
struct Args {
    /// Fund identifier; use "global" for questions not tied to a fund
    #[arg(short, long, required_unless_present = "request")]
    fund_id: Option<String>,

    /// The question to answer
    #[arg(required_unless_present = "request")]
    question: Option<String>,

    /// Full request body as JSON: {"fund_id": "...", "question": "..."}
    #[arg(long, conflicts_with_all = ["fund_id", "question"])]
    request: Option<String>,

    /// Override engine.similarity_top_k
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Use the rule-based router instead of the language model
    #[arg(long)]
    keyword_router: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<()> {
    let out = if pretty { serde_json::to_string_pretty(value)? } else { serde_json::to_string(value)? };
    println!("{out}");
    Ok(())
}

impl Args {
    fn query_request(&self) -> Result<QueryRequest> {
        if let Some(body) = &self.request {
            return serde_json::from_str(body).context("parsing --request");
        }
        Ok(QueryRequest {
            fund_id: self.fund_id.clone().unwrap_or_default(),
            question: self.question.clone().unwrap_or_default(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let args = Args::parse();
    let request = args.query_request()?;

    let mut settings = load_settings()?;
    if let Some(k) = args.top_k {
        settings.engine.similarity_top_k = k;
    }
    if args.keyword_router {
        settings.router.kind = RouterKind::Keyword;
    }
    settings.validate()?;

    let embedder = get_default_embedder(&settings.embedding)?;
    let index = open_index(&settings).await?;
    let llm = Arc::new(ChatModel::from_settings(&settings.llm)?);
    let orchestrator = QueryOrchestrator::from_settings(&settings, embedder, index, llm);

    match orchestrator.handle(&request).await {
        Ok(result) => {
            print_json(&serde_json::to_value(&result)?, args.pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            print_json(&serde_json::json!({ "error": err }), args.pretty)?;
            Ok(ExitCode::FAILURE)
        }
    }
}
