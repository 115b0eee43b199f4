pub mod bootstrap;
pub mod locator;
pub mod reader;
pub mod rules;
pub mod transform;
pub mod udf;
pub mod writer;

use crate::catalog::{Catalog, WarehouseCatalog};
use crate::models::PartitionKey;
use crate::models::schema::{SHIPPING_ADDRESS_COLUMN, TRANSACTION_ID_COLUMN};
use crate::processor::rules::AddressPart;
use crate::storage::StorageLocation;
use crate::utils::arrow::{row_count, string_values};
use arrow::record_batch::RecordBatch;
use bootstrap::{BootstrapOutcome, DimensionBootstrapper};
use common::Result;
use common::config::{JobConfig, Settings};
use datafusion::prelude::SessionContext;
use locator::PartitionLocator;
use reader::{FilePattern, SalesReader};
use std::sync::Arc;
use tracing::{debug, info, warn};
use transform::SalesTransformer;
use writer::FactWriter;

/// What one run did.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub partition: PartitionKey,
    pub raw_path: String,
    pub files: Vec<String>,
    pub dimension: BootstrapOutcome,
    pub records: usize,
    pub malformed_addresses: usize,
    pub fact_object: Option<String>,
}

/// The hourly sales job: locate → bootstrap dimension → read → transform → append.
pub struct HourlyJob {
    ctx: Arc<SessionContext>,
    locator: PartitionLocator,
    bootstrapper: DimensionBootstrapper,
    reader: SalesReader,
    transformer: SalesTransformer,
    writer: FactWriter,
}

impl HourlyJob {
    pub fn new(
        ctx: Arc<SessionContext>,
        raw: StorageLocation,
        bootstrap_source: StorageLocation,
        catalog: Arc<dyn Catalog>,
        config: &JobConfig,
    ) -> Result<Self> {
        let pattern = FilePattern::new(&config.file_pattern)?;
        Ok(Self {
            locator: PartitionLocator::new(raw.clone()),
            bootstrapper: DimensionBootstrapper::new(
                catalog.clone(),
                &config.date_dim_table,
                bootstrap_source,
            ),
            reader: SalesReader::new(ctx.clone(), raw, pattern)?,
            transformer: SalesTransformer::new(&ctx)?,
            writer: FactWriter::new(catalog, &config.fact_table),
            ctx,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let s3 = settings.s3.as_ref();
        let job = &settings.job;

        let ctx = Arc::new(SessionContext::new());
        let raw = StorageLocation::parse(&job.raw_root, s3)?;
        let warehouse = StorageLocation::parse(&job.warehouse_root, s3)?;
        let bootstrap_source = StorageLocation::parse(&job.date_dim_bootstrap, s3)?;
        warehouse.register(&ctx)?;

        let catalog: Arc<dyn Catalog> = Arc::new(WarehouseCatalog::new(warehouse, &job.database));
        info!(database = %catalog.database(), "Using catalog database");

        Self::new(ctx, raw, bootstrap_source, catalog, job)
    }

    pub async fn run(&self, partition: PartitionKey) -> Result<JobReport> {
        info!(partition = %partition, "Starting hourly sales job");

        let raw_partition = self.locator.locate(partition).await?;

        let dimension = self.bootstrapper.ensure(&self.ctx).await?;

        let files = self.reader.matching_files(&raw_partition)?;
        let raw = self.reader.read(&files).await?;
        let facts = self.transformer.transform(raw)?;
        let batches = facts.collect().await?;

        let records = row_count(&batches);
        let malformed_addresses = report_malformed_addresses(&batches)?;

        let outcome = self.writer.write(&partition, batches).await?;

        info!(
            partition = %partition,
            files = files.len(),
            records,
            malformed_addresses,
            "Hourly sales job finished"
        );

        Ok(JobReport {
            partition,
            raw_path: raw_partition.url,
            files: files.iter().map(|file| self.reader.file_url(file)).collect(),
            dimension,
            records,
            malformed_addresses,
            fact_object: outcome.object,
        })
    }
}

/// Counts records whose address is present but did not split into four
/// parts, logging each affected transaction.
fn report_malformed_addresses(batches: &[RecordBatch]) -> Result<usize> {
    let mut malformed = 0;
    for batch in batches {
        let ids = string_values(batch, TRANSACTION_ID_COLUMN)?;
        let addresses = string_values(batch, SHIPPING_ADDRESS_COLUMN)?;
        let streets = string_values(batch, AddressPart::Street.column())?;

        for ((id, address), street) in ids.iter().zip(&addresses).zip(&streets) {
            if let (Some(address), None) = (address, street) {
                debug!(
                    transaction_id = id.as_deref().unwrap_or("<null>"),
                    address = %address,
                    "Shipping address does not have four segments"
                );
                malformed += 1;
            }
        }
    }

    if malformed > 0 {
        warn!(
            malformed,
            "Records with malformed shipping addresses were kept with NULL address fields"
        );
    }
    Ok(malformed)
}
