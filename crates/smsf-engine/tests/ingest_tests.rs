mod common;

use common::{embedder, FailingIndex};
use smsf_core::config::Settings;
use smsf_core::{DocType, FilterSet};
use smsf_core::traits::VectorIndex;
use smsf_engine::ingest::{FileOutcome, Ingestor};
use smsf_engine::registry::{IndexStatus, Registry};
use smsf_vector::MemoryVectorIndex;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const DEED_2019: &str = "Recitals.\n\n12.4 Borrowing\nThe Trustee must not borrow.\n\n12.5 Investments\nThe Trustee may invest in listed shares.";
const DEED_2024: &str = "12.4 Borrowing\nThe Trustee may enter a limited recourse borrowing arrangement.";

fn ingestor(index: Arc<MemoryVectorIndex>) -> Ingestor { Ingestor::new(&Settings::default(), embedder(), index) }

#[tokio::test]
async fn unchanged_files_are_skipped_unless_forced() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("sis_act_1993.txt");
    fs::write(&path, "s 62 Sole purpose test\nThe fund must be maintained for retirement.").unwrap();
    let registry_path = tmp.path().join("state/registry.json");

    let index = Arc::new(MemoryVectorIndex::new());
    let ingest = ingestor(index.clone());
    let mut registry = Registry::load(&registry_path).unwrap();
    let first = ingest.ingest_file(&path, DocType::Legislation, None, &mut registry, false).await.unwrap();
    assert_eq!(first, FileOutcome::Indexed { chunks: 1, superseded: 0 });
    registry.save().unwrap();

    let mut reloaded = Registry::load(&registry_path).unwrap();
    let entry = reloaded.get("sis_act_1993.txt", "global").unwrap().clone();
    assert_eq!(entry.status, IndexStatus::Completed);
    assert_eq!(entry.chunks, 1);
    assert_eq!(entry.content_hash.len(), 64);

    let again = ingest.ingest_file(&path, DocType::Legislation, None, &mut reloaded, false).await.unwrap();
    assert_eq!(again, FileOutcome::Skipped);
    let forced = ingest.ingest_file(&path, DocType::Legislation, None, &mut reloaded, true).await.unwrap();
    assert!(matches!(forced, FileOutcome::Indexed { .. }));
    assert_eq!(reloaded.entries().len(), 1, "re-indexing replaces the entry");

    fs::write(&path, "s 62 Sole purpose test\nAmended text.").unwrap();
    let changed = ingest.ingest_file(&path, DocType::Legislation, None, &mut reloaded, false).await.unwrap();
    assert!(matches!(changed, FileOutcome::Indexed { .. }));
}

#[tokio::test]
async fn newer_deed_supersedes_the_funds_previous_deed_only() {
    let tmp = TempDir::new().unwrap();
    let old = tmp.path().join("deed_2019.txt");
    let new = tmp.path().join("deed_2024.txt");
    fs::write(&old, DEED_2019).unwrap();
    fs::write(&new, DEED_2024).unwrap();

    let index = Arc::new(MemoryVectorIndex::new());
    let ingest = ingestor(index.clone());
    let mut registry = Registry::load(&tmp.path().join("registry.json")).unwrap();

    ingest.ingest_file(&old, DocType::TrustDeed, Some("FUND_A"), &mut registry, false).await.unwrap();
    ingest.ingest_file(&old, DocType::TrustDeed, Some("FUND_B"), &mut registry, false).await.unwrap();
    let outcome = ingest.ingest_file(&new, DocType::TrustDeed, Some("FUND_A"), &mut registry, false).await.unwrap();
    assert_eq!(outcome, FileOutcome::Indexed { chunks: 1, superseded: 3 });

    assert!(!index.get("FUND_A:deed_2019:1").await.unwrap().is_latest);
    assert!(index.get("FUND_A:deed_2024:0").await.unwrap().is_latest);
    assert!(index.get("FUND_B:deed_2019:1").await.unwrap().is_latest, "other funds untouched");

    let q = embedder().embed_text("may the trustee borrow");
    let hits = index.search(&q, &FilterSet::private_deed("FUND_A").unwrap(), 10).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["FUND_A:deed_2024:0"]);
    assert_eq!(registry.entries().len(), 3, "same file name is tracked per fund");
}

#[tokio::test]
async fn shorter_reingest_retires_trailing_chunks() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("deed.txt");
    fs::write(&path, DEED_2019).unwrap();
    let index = Arc::new(MemoryVectorIndex::new());
    let ingest = ingestor(index.clone());
    let mut registry = Registry::load(&tmp.path().join("registry.json")).unwrap();

    ingest.ingest_file(&path, DocType::TrustDeed, Some("FUND_A"), &mut registry, false).await.unwrap();
    fs::write(&path, DEED_2024).unwrap();
    let outcome = ingest.ingest_file(&path, DocType::TrustDeed, Some("FUND_A"), &mut registry, false).await.unwrap();
    assert_eq!(outcome, FileOutcome::Indexed { chunks: 1, superseded: 2 });
    assert!(!index.get("FUND_A:deed:2").await.unwrap().is_latest);
}

#[tokio::test]
async fn removed_legislation_sections_stop_being_searchable() {
    let tmp = TempDir::new().unwrap();
    let act = tmp.path().join("sis_act.txt");
    let ruling = tmp.path().join("TR_2010_1.txt");
    fs::write(
        &act,
        "s 62 Sole purpose test\nThe fund must be maintained for retirement.\n\n\
         s 65 Lending to members\nA trustee must not lend money to a member.\n\n\
         s 66 Acquisition of assets from related parties\nA trustee must not acquire an asset from a related party.",
    )
    .unwrap();
    fs::write(&ruling, "This ruling explains acquisitions from related parties.").unwrap();

    let index = Arc::new(MemoryVectorIndex::new());
    let ingest = ingestor(index.clone());
    let mut registry = Registry::load(&tmp.path().join("registry.json")).unwrap();
    ingest.ingest_file(&ruling, DocType::AtoRuling, None, &mut registry, false).await.unwrap();
    let first = ingest.ingest_file(&act, DocType::Legislation, None, &mut registry, false).await.unwrap();
    assert_eq!(first, FileOutcome::Indexed { chunks: 3, superseded: 0 });

    fs::write(&act, "s 62 Sole purpose test\nThe fund must be maintained for retirement.").unwrap();
    let outcome = ingest.ingest_file(&act, DocType::Legislation, None, &mut registry, false).await.unwrap();
    assert_eq!(outcome, FileOutcome::Indexed { chunks: 1, superseded: 2 });

    let q = embedder().embed_text("acquire an asset from a related party");
    let hits = index.search(&q, &FilterSet::public_law(), 10).await.unwrap();
    let mut ids: Vec<&str> = hits.iter().map(|h| h.chunk.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["TR_2010_1:0", "sis_act:0"], "other documents stay current");
    assert!(!index.get("sis_act:2").await.unwrap().is_latest);
}

#[tokio::test]
async fn deed_without_fund_is_refused_and_recorded_failed() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("deed.txt");
    fs::write(&path, DEED_2024).unwrap();
    let index = Arc::new(MemoryVectorIndex::new());
    let mut registry = Registry::load(&tmp.path().join("registry.json")).unwrap();

    assert!(ingestor(index.clone()).ingest_file(&path, DocType::TrustDeed, Some("global"), &mut registry, false).await.is_err());
    assert!(index.is_empty().await);
    assert_eq!(registry.entries()[0].status, IndexStatus::Failed);
}

#[tokio::test]
async fn storage_failure_is_recorded_and_retried_next_run() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("TR_2010_1.txt");
    fs::write(&path, "This ruling explains limited recourse borrowing.").unwrap();
    let mut registry = Registry::load(&tmp.path().join("registry.json")).unwrap();

    let broken = Ingestor::new(&Settings::default(), embedder(), Arc::new(FailingIndex));
    assert!(broken.ingest_file(&path, DocType::AtoRuling, None, &mut registry, false).await.is_err());
    assert_eq!(registry.entries()[0].status, IndexStatus::Failed);

    let index = Arc::new(MemoryVectorIndex::new());
    let outcome = ingestor(index.clone()).ingest_file(&path, DocType::AtoRuling, None, &mut registry, false).await.unwrap();
    assert_eq!(outcome, FileOutcome::Indexed { chunks: 1, superseded: 0 });
    assert_eq!(index.get("TR_2010_1:0").await.unwrap().section.as_deref(), Some("TR 2010 1"));
}
