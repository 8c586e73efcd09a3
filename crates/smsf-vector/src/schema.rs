use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

/// Column layout of the chunk table. `vector` is a fixed-size list of `dim` floats.
pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("doc_id", DataType::Utf8, false),
		Field::new("source", DataType::Utf8, false),
		Field::new("doc_type", DataType::Utf8, false),
		Field::new("fund_id", DataType::Utf8, false),
		Field::new("section", DataType::Utf8, true),
		Field::new("clause", DataType::Utf8, true),
		Field::new("content", DataType::Utf8, false),
		Field::new("chunk_index", DataType::Int32, false),
		Field::new("total_chunks", DataType::Int32, false),
		Field::new("is_latest", DataType::Boolean, false),
		Field::new("indexed_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
