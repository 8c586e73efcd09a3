//! LanceDB connection helpers.
use lancedb::{connect, Connection};
use arrow_array::RecordBatchIterator;
use std::sync::Arc;

use smsf_core::{Error, Result};

pub(crate) fn storage_err(context: &str) -> impl FnOnce(lancedb::Error) -> Error + '_ {
    move |e| Error::Storage(format!("{context}: {e}"))
}

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(storage_err("connect"))
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await.map_err(storage_err("list tables"))?;
    Ok(names.iter().any(|n| n == name))
}

pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<()> {
    if table_exists(conn, name).await? {
        return Ok(());
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await.map_err(storage_err("create table"))?;
    Ok(())
}
