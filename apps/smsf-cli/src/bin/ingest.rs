use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};

use smsf_cli::{init_tracing, load_settings, open_index, resolve_path};
use smsf_core::DocType;
use smsf_embed::get_default_embedder;
use smsf_engine::ingest::{FileOutcome, Ingestor};
use smsf_engine::registry::Registry;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Legislation,
    AtoRuling,
    TrustDeed,
}

impl From<Kind> for DocType {
    fn from(k: Kind) -> Self {
        match k {
            Kind::Legislation => DocType::Legislation,
            Kind::AtoRuling => DocType::AtoRuling,
            Kind::TrustDeed => DocType::TrustDeed,
        }
    }
}

#[derive(Parser)]
#[command(name = "smsf-ingest", about = "Chunk, embed and index extracted .txt/.md sources")]
struct Args {
    /// File or directory of extracted text
    path: PathBuf,

    /// Document type of every file under `path`
    #[arg(short = 't', long, value_enum)]
    doc_type: Kind,

    /// Owning fund; required for trust deeds
    #[arg(short, long)]
    fund_id: Option<String>,

    /// Re-index files the registry already shows as completed
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let doc_type = DocType::from(args.doc_type);
    if doc_type == DocType::TrustDeed && args.fund_id.is_none() {
        anyhow::bail!("--fund-id is required for trust deeds");
    }

    let settings = load_settings()?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let index = open_index(&settings).await?;
    let ingestor = Ingestor::new(&settings, embedder, index);

    let files = if args.path.is_dir() {
        ingestor.processor().list_source_files(&args.path)
    } else {
        vec![args.path.clone()]
    };
    let registry_path = resolve_path(&settings.ingest.registry_path)?;
    let mut registry = Registry::load(&registry_path)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .context("progress template")?
            .progress_chars("#>-"),
    );

    let (mut indexed, mut skipped, mut failed, mut chunks) = (0usize, 0usize, 0usize, 0usize);
    for path in &files {
        pb.set_message(path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default());
        match ingestor.ingest_file(path, doc_type, args.fund_id.as_deref(), &mut registry, args.force).await {
            Ok(FileOutcome::Indexed { chunks: n, .. }) => {
                indexed += 1;
                chunks += n;
            }
            Ok(FileOutcome::Skipped) => skipped += 1,
            Err(e) => {
                failed += 1;
                warn!(file = %path.display(), error = %e, "failed to index");
            }
        }
        registry.save()?;
        pb.inc(1);
    }
    pb.finish_with_message("done");
    info!(indexed, skipped, failed, chunks, registry = %registry_path.display(), "ingestion finished");
    if failed > 0 {
        anyhow::bail!("{failed} of {} files failed to index", files.len());
    }
    Ok(())
}
