use config::{Config, ConfigError};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub job: JobConfig,
    #[serde(default)]
    pub s3: Option<S3Settings>,
    #[serde(default)]
    pub mover: MoverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JobConfig {
    pub raw_root: String,
    pub warehouse_root: String,
    pub date_dim_bootstrap: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    #[serde(default = "default_date_dim_table")]
    pub date_dim_table: String,
    #[serde(default = "default_fact_table")]
    pub fact_table: String,
}

/// Credentials for `s3://` locations (MinIO or AWS).
#[derive(Debug, Deserialize, Clone)]
pub struct S3Settings {
    #[serde(default = "default_s3_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_s3_region")]
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MoverConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    #[serde(default = "default_target_dir")]
    pub target_dir: String,
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for MoverConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            target_dir: default_target_dir(),
            delay_seconds: default_delay_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_database() -> String {
    "retail_dw".to_string()
}

fn default_file_pattern() -> String {
    "sales_transactions*.csv".to_string()
}

fn default_date_dim_table() -> String {
    "date_dim".to_string()
}

fn default_fact_table() -> String {
    "sales_fact".to_string()
}

fn default_s3_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_s3_region() -> String {
    "us-east-1".to_string()
}

fn default_source_dir() -> String {
    "data/source".to_string()
}

fn default_target_dir() -> String {
    "data/landing".to_string()
}

fn default_delay_seconds() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        debug!(
            raw_root = %settings.job.raw_root,
            warehouse_root = %settings.job.warehouse_root,
            database = %settings.job.database,
            "Loaded job settings"
        );

        Ok(settings)
    }
}
