use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use arrow_array::RecordBatchIterator;
use tracing::debug;

use smsf_core::traits::VectorIndex;
use smsf_core::{DocumentChunk, Error, FilterSet, Result, ScoredChunk};

use crate::schema::build_chunk_schema;
use crate::table::{ensure_table, open_db, storage_err};
use crate::writer::{batch_to_scored_chunks, chunks_to_record_batch};

const LATEST_ONLY: &str = "is_latest = true";

/// Chunk table in LanceDB. The metadata filter is pushed into the vector
/// query as a prefilter, so the top-K cut happens inside the partition.
pub struct LanceVectorIndex {
	db: Connection,
	table_name: String,
	dim: i32,
}

impl LanceVectorIndex {
	pub async fn open(uri: &str, table_name: &str, dim: usize) -> Result<Self> {
		let dim = i32::try_from(dim).map_err(|_| Error::InvalidConfig(format!("embedding dimension {dim} too large")))?;
		let db = open_db(uri).await?;
		ensure_table(&db, table_name, build_chunk_schema(dim)).await?;
		Ok(Self { db, table_name: table_name.to_string(), dim })
	}

	async fn table(&self) -> Result<Table> {
		self.db.open_table(&self.table_name).execute().await.map_err(storage_err("open table"))
	}

	pub async fn count(&self) -> Result<usize> {
		self.table().await?.count_rows(None).await.map_err(storage_err("count rows"))
	}
}

fn with_latest(filter: &FilterSet) -> String {
	match filter.to_sql() {
		Some(sql) => format!("{sql} AND {LATEST_ONLY}"),
		None => LATEST_ONLY.to_string(),
	}
}

#[async_trait]
impl VectorIndex for LanceVectorIndex {
	async fn upsert(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<usize> {
		if chunks.is_empty() {
			return Ok(0);
		}
		let batch = chunks_to_record_batch(chunks, embeddings, self.dim)?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		let table = self.table().await?;
		// Upsert behavior via merge_insert: id is unique
		let mut mi = table.merge_insert(&["id"]);
		mi.when_matched_update_all(None).when_not_matched_insert_all();
		let _ = mi.execute(reader).await.map_err(storage_err("merge insert"))?;
		debug!(table = %self.table_name, rows = chunks.len(), "upserted chunks");
		Ok(chunks.len())
	}

	async fn search(&self, query_vec: &[f32], filter: &FilterSet, top_k: usize) -> Result<Vec<ScoredChunk>> {
		let predicate = with_latest(filter);
		let table = self.table().await?;
		let mut stream = table
			.vector_search(query_vec.to_vec())
			.map_err(storage_err("create search query"))?
			.distance_type(DistanceType::Cosine)
			.only_if(predicate.clone())
			.limit(top_k)
			.execute()
			.await
			.map_err(storage_err("execute search"))?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(storage_err("fetch results"))? {
			hits.extend(batch_to_scored_chunks(&batch)?);
		}
		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(top_k);
		debug!(filter = %predicate, hits = hits.len(), "vector search");
		Ok(hits)
	}

	async fn supersede(&self, filter: &FilterSet, keep_ids: &[String]) -> Result<usize> {
		let mut predicate = with_latest(filter);
		if !keep_ids.is_empty() {
			let quoted: Vec<String> = keep_ids.iter().map(|id| format!("'{}'", id.replace('\'', "''"))).collect();
			predicate = format!("{predicate} AND id NOT IN ({})", quoted.join(", "));
		}
		let table = self.table().await?;
		let stale = table.count_rows(Some(predicate.clone())).await.map_err(storage_err("count stale rows"))?;
		if stale == 0 {
			return Ok(0);
		}
		let _ = table
			.update()
			.only_if(predicate)
			.column("is_latest", "false")
			.execute()
			.await
			.map_err(storage_err("mark superseded"))?;
		debug!(table = %self.table_name, rows = stale, kept = keep_ids.len(), "superseded chunks");
		Ok(stale)
	}
}
