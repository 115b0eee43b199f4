use crate::catalog::Catalog;
use crate::storage::StorageLocation;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use datafusion::prelude::*;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    AlreadyPresent,
    Loaded { rows: usize },
}

/// Loads the date dimension from its bootstrap CSV when the catalog lacks it.
pub struct DimensionBootstrapper {
    catalog: Arc<dyn Catalog>,
    table: String,
    source: StorageLocation,
}

impl DimensionBootstrapper {
    pub fn new(catalog: Arc<dyn Catalog>, table: &str, source: StorageLocation) -> Self {
        Self {
            catalog,
            table: table.to_string(),
            source,
        }
    }

    pub async fn ensure(&self, ctx: &SessionContext) -> Result<BootstrapOutcome> {
        if self.catalog.table_exists(&self.table).await? {
            info!(table = %self.table, "Dimension already present, skipping bootstrap");
            return Ok(BootstrapOutcome::AlreadyPresent);
        }

        let source_url = self.source.url().to_string();
        info!(table = %self.table, source = %source_url, "Bootstrapping dimension");

        // Fully read before anything is written.
        let (schema, batches) = self.load_source(ctx).await.map_err(|e| {
            Error::Bootstrap(format!("failed to read {}: {}", source_url, e))
        })?;

        let marker = self
            .catalog
            .overwrite_table(&self.table, schema, batches)
            .await?;

        Ok(BootstrapOutcome::Loaded {
            rows: marker.row_count,
        })
    }

    async fn load_source(&self, ctx: &SessionContext) -> Result<(SchemaRef, Vec<RecordBatch>)> {
        self.source.register(ctx)?;

        let extension = self
            .source
            .root()
            .extension()
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let options = CsvReadOptions::new()
            .has_header(true)
            .file_extension(&extension);

        let df = ctx.read_csv(self.source.url().as_str(), options).await?;
        let schema = df.schema().inner().clone();
        let batches = df.collect().await?;
        Ok((schema, batches))
    }
}
