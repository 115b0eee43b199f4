use crate::catalog::Catalog;
use crate::models::PartitionKey;
use crate::models::schema::{SalesSchemaVersion, get_sales_schema};
use crate::utils::arrow::{conform_batches, row_count};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use common::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub rows: usize,
    pub object: Option<String>,
}

/// Appends fact records for one partition. No deduplication against earlier
/// runs: writing the same partition twice stores its records twice.
pub struct FactWriter {
    catalog: Arc<dyn Catalog>,
    table: String,
    schema: SchemaRef,
}

impl FactWriter {
    pub fn new(catalog: Arc<dyn Catalog>, table: &str) -> Self {
        Self {
            catalog,
            table: table.to_string(),
            schema: Arc::new(get_sales_schema(SalesSchemaVersion::Fact).clone()),
        }
    }

    pub async fn write(&self, partition: &PartitionKey, batches: Vec<RecordBatch>) -> Result<WriteOutcome> {
        let rows = row_count(&batches);
        if rows == 0 {
            info!(table = %self.table, partition = %partition, "No fact records to write");
            return Ok(WriteOutcome { rows, object: None });
        }

        let batches = conform_batches(&self.schema, batches)?;
        let object = self
            .catalog
            .append_partition(&self.table, partition, self.schema.clone(), batches)
            .await?;

        Ok(WriteOutcome {
            rows,
            object: Some(object),
        })
    }
}
