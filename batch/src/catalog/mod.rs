//! Table catalog over an object store.
//!
//! Layout under the warehouse root:
//!
//! ```text
//! <database>/<table>/_SUCCESS                   commit marker (overwritten tables)
//! <database>/<table>/part-<uuid>.parquet
//! <database>/<table>/ingest_date=../ingest_hour=../part-<uuid>.parquet   (appends)
//! ```
//!
//! A table replaced with [`Catalog::overwrite_table`] exists once its marker
//! exists; the marker names the data objects that make up the table.

use crate::models::PartitionKey;
use crate::storage::StorageLocation;
use crate::utils::paths::PathBuilder;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Error, Result};
use futures::TryStreamExt;
use object_store::ObjectStore;
use object_store::path::Path;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const COMMIT_MARKER: &str = "_SUCCESS";
const PARQUET_EXTENSION: &str = "parquet";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableMarker {
    pub table: String,
    pub files: Vec<String>,
    pub row_count: usize,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    fn database(&self) -> &str;

    /// True once a committed version of `table` exists.
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Replaces the whole table with `batches`.
    async fn overwrite_table(
        &self,
        table: &str,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<TableMarker>;

    /// Adds `batches` as one new object under the partition; returns its URL.
    async fn append_partition(
        &self,
        table: &str,
        partition: &PartitionKey,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<String>;

    /// URLs of every data object currently part of `table`.
    async fn table_files(&self, table: &str) -> Result<Vec<String>>;
}

pub struct WarehouseCatalog {
    location: StorageLocation,
    database: String,
}

impl WarehouseCatalog {
    pub fn new(location: StorageLocation, database: &str) -> Self {
        Self {
            location,
            database: database.to_string(),
        }
    }

    fn store(&self) -> &dyn ObjectStore {
        self.location.store().as_ref()
    }

    fn table_path(&self, table: &str) -> Path {
        PathBuilder::new(self.location.root())
            .with_segment(&self.database)
            .with_segment(table)
            .build()
    }

    fn marker_path(&self, table: &str) -> Path {
        self.table_path(table).child(COMMIT_MARKER)
    }

    async fn read_marker(&self, table: &str) -> Result<Option<TableMarker>> {
        match self.store().get(&self.marker_path(table)).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_data_files(&self, table: &str) -> Result<Vec<Path>> {
        let prefix = self.table_path(table);
        let objects: Vec<_> = self.store().list(Some(&prefix)).try_collect().await?;

        let mut files: Vec<Path> = objects
            .into_iter()
            .map(|meta| meta.location)
            .filter(|path| path.extension() == Some(PARQUET_EXTENSION))
            .collect();
        files.sort();
        Ok(files)
    }

    async fn remove_stale_files(&self, table: &str, marker: &TableMarker) {
        let files = match self.list_data_files(table).await {
            Ok(files) => files,
            Err(e) => {
                warn!(table, error = %e, "Could not list table for cleanup");
                return;
            }
        };

        for path in files {
            if marker.files.iter().any(|f| f.as_str() == path.as_ref()) {
                continue;
            }
            match self.store().delete(&path).await {
                Ok(()) => debug!(table, file = %path, "Removed stale data file"),
                Err(e) => warn!(table, file = %path, error = %e, "Failed to remove stale data file"),
            }
        }
    }
}

#[async_trait]
impl Catalog for WarehouseCatalog {
    fn database(&self) -> &str {
        &self.database
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        match self.store().head(&self.marker_path(table)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn overwrite_table(
        &self,
        table: &str,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<TableMarker> {
        let data_path = PathBuilder::new(&self.table_path(table))
            .with_file_name(&data_file_name())
            .build();
        let row_count = batches.iter().map(|b| b.num_rows()).sum();

        // Data first, marker last: a crash in between leaves no committed table.
        let buffer = encode_parquet(table, schema, &batches)?;
        self.store().put(&data_path, buffer.into()).await?;

        let marker = TableMarker {
            table: table.to_string(),
            files: vec![data_path.to_string()],
            row_count,
            created_at: Utc::now(),
        };
        let marker_json = serde_json::to_vec_pretty(&marker)?;
        self.store()
            .put(&self.marker_path(table), marker_json.into())
            .await?;
        info!(
            database = %self.database,
            table,
            rows = row_count,
            file = %data_path,
            "Table overwritten"
        );

        self.remove_stale_files(table, &marker).await;

        Ok(marker)
    }

    async fn append_partition(
        &self,
        table: &str,
        partition: &PartitionKey,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<String> {
        let data_path = PathBuilder::new(&self.table_path(table))
            .with_table_partition(partition)
            .with_file_name(&data_file_name())
            .build();

        let buffer = encode_parquet(table, schema, &batches)?;
        self.store().put(&data_path, buffer.into()).await?;

        let url = self.location.object_url(&data_path);
        info!(
            database = %self.database,
            table,
            partition = %partition,
            rows = batches.iter().map(|b| b.num_rows()).sum::<usize>(),
            file = %url,
            "Appended partition data"
        );
        Ok(url)
    }

    async fn table_files(&self, table: &str) -> Result<Vec<String>> {
        let files = match self.read_marker(table).await? {
            Some(marker) => marker
                .files
                .iter()
                .map(|f| Path::parse(f))
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => self.list_data_files(table).await?,
        };

        Ok(files
            .iter()
            .map(|path| self.location.object_url(path))
            .collect())
    }
}

fn data_file_name() -> String {
    format!("part-{}.{}", Uuid::new_v4(), PARQUET_EXTENSION)
}

/// Encodes all batches into a single Parquet object.
pub fn encode_parquet(table: &str, schema: SchemaRef, batches: &[RecordBatch]) -> Result<Vec<u8>> {
    let schema = batches.first().map(|b| b.schema()).unwrap_or(schema);
    let writer_props = WriterProperties::builder()
        .set_key_value_metadata(Some(vec![
            KeyValue {
                key: "table".to_string(),
                value: Some(table.to_string()),
            },
            KeyValue {
                key: "written_at".to_string(),
                value: Some(Utc::now().to_rfc3339()),
            },
        ]))
        .build();

    let mut buffer: Vec<u8> = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, schema, Some(writer_props))?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;

    if buffer.is_empty() {
        return Err(Error::Storage(format!("Empty parquet output for {}", table)));
    }
    Ok(buffer)
}
