//! Conversion between [`DocumentChunk`]s and Arrow record batches.
use arrow_array::{
	Array, BooleanArray, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, StringArray, TimestampMillisecondArray,
};
use chrono::Utc;
use std::sync::Arc;

use smsf_core::{DocumentChunk, Error, Result, ScoredChunk};

use crate::schema::build_chunk_schema;

fn position_col(chunks: &[DocumentChunk], what: &str, value: impl Fn(&DocumentChunk) -> usize) -> Result<Int32Array> {
	let values = chunks
		.iter()
		.map(|c| i32::try_from(value(c)).map_err(|_| Error::Storage(format!("chunk '{}': {what} {} exceeds i32", c.id, value(c)))))
		.collect::<Result<Vec<i32>>>()?;
	Ok(Int32Array::from(values))
}

pub fn chunks_to_record_batch(chunks: &[DocumentChunk], embeddings: &[Vec<f32>], dim: i32) -> Result<RecordBatch> {
	if chunks.len() != embeddings.len() {
		return Err(Error::Storage(format!("{} chunks but {} embeddings", chunks.len(), embeddings.len())));
	}
	if let Some(bad) = embeddings.iter().find(|v| v.len() != dim as usize) {
		return Err(Error::Storage(format!("embedding has {} dims, table expects {dim}", bad.len())));
	}
	let chunk_index = position_col(chunks, "chunk_index", |c| c.chunk_index)?;
	let total_chunks = position_col(chunks, "total_chunks", |c| c.total_chunks)?;
	let now = Utc::now().timestamp_millis();
	let vectors = embeddings.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
	RecordBatch::try_new(build_chunk_schema(dim), vec![
		Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()))),
		Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.doc_id.as_str()))),
		Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.source.as_str()))),
		Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.doc_type.as_str()))),
		Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.fund_id.as_str()))),
		Arc::new(StringArray::from(chunks.iter().map(|c| c.section.clone()).collect::<Vec<_>>())),
		Arc::new(StringArray::from(chunks.iter().map(|c| c.clause.clone()).collect::<Vec<_>>())),
		Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.content.as_str()))),
		Arc::new(chunk_index),
		Arc::new(total_chunks),
		Arc::new(BooleanArray::from(chunks.iter().map(|c| c.is_latest).collect::<Vec<_>>())),
		Arc::new(TimestampMillisecondArray::from(vec![now; chunks.len()])),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim)),
	])
	.map_err(|e| Error::Storage(format!("building record batch: {e}")))
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| Error::Storage(format!("column '{name}' missing")))
}

fn int_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<Int32Array>())
		.ok_or_else(|| Error::Storage(format!("column '{name}' missing")))
}

/// Reads search results back into chunks. Score is `1 - _distance` (cosine).
pub fn batch_to_scored_chunks(batch: &RecordBatch) -> Result<Vec<ScoredChunk>> {
	let ids = string_col(batch, "id")?;
	let doc_ids = string_col(batch, "doc_id")?;
	let sources = string_col(batch, "source")?;
	let doc_types = string_col(batch, "doc_type")?;
	let fund_ids = string_col(batch, "fund_id")?;
	let sections = string_col(batch, "section")?;
	let clauses = string_col(batch, "clause")?;
	let contents = string_col(batch, "content")?;
	let chunk_indices = int_col(batch, "chunk_index")?;
	let totals = int_col(batch, "total_chunks")?;
	let latest = batch
		.column_by_name("is_latest")
		.and_then(|c| c.as_any().downcast_ref::<BooleanArray>())
		.ok_or_else(|| Error::Storage("column 'is_latest' missing".to_string()))?;
	let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());

	let optional = |arr: &StringArray, i: usize| if arr.is_null(i) { None } else { Some(arr.value(i).to_string()) };
	let mut out = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		let chunk = DocumentChunk {
			id: ids.value(i).to_string(),
			doc_id: doc_ids.value(i).to_string(),
			source: sources.value(i).to_string(),
			doc_type: doc_types.value(i).parse().map_err(|e: Error| Error::Storage(e.to_string()))?,
			fund_id: fund_ids.value(i).to_string(),
			section: optional(sections, i),
			clause: optional(clauses, i),
			content: contents.value(i).to_string(),
			chunk_index: chunk_indices.value(i).max(0) as usize,
			total_chunks: totals.value(i).max(0) as usize,
			is_latest: latest.value(i),
		};
		let score = distances.map_or(0.0, |d| 1.0 - d.value(i));
		out.push(ScoredChunk { chunk, score });
	}
	Ok(out)
}
