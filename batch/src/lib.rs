pub mod catalog;
pub mod models;
pub mod processor;
pub mod storage;
pub mod utils;

use common::Result;
use common::config::Settings;
use models::PartitionKey;
use processor::{HourlyJob, JobReport};

/// Runs the hourly sales job for one partition
pub async fn run_hourly_job(settings: &Settings, partition: PartitionKey) -> Result<JobReport> {
    let job = HourlyJob::from_settings(settings)?;
    job.run(partition).await
}
