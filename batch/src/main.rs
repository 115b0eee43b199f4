use batch::models::PartitionKey;
use chrono::Local;
use clap::{Arg, ArgMatches, Command};
use common::config::Settings;
use common::logging::init_tracing;
use std::process;
use tracing::info;

fn cli() -> Command {
    Command::new("Retail Batch Layer")
        .version("1.0")
        .about("Ingests one hourly partition of sales transactions into the fact store")
        .arg(
            Arg::new("day")
                .long("day")
                .value_name("YYYY_MM_DD")
                .help("Partition day; requires --hour"),
        )
        .arg(
            Arg::new("hour")
                .long("hour")
                .value_name("HH")
                .help("Partition hour (0-23); requires --day"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file"),
        )
}

/// The partition named on the command line, or the current hour when
/// neither `--day` nor `--hour` is given.
fn parse_partition(matches: &ArgMatches) -> common::Result<PartitionKey> {
    PartitionKey::resolve(
        matches.get_one::<String>("day").map(|s| s.as_str()),
        matches.get_one::<String>("hour").map(|s| s.as_str()),
        Local::now().naive_local(),
    )
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    // Validated before any configuration or storage is touched.
    let partition = match parse_partition(&matches) {
        Ok(partition) => partition,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or("config/retail.toml");

    let settings = match Settings::new(config_path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load config {}: {}", config_path, e);
            process::exit(1);
        }
    };
    init_tracing(&settings.logging);

    info!(config = %config_path, partition = %partition, "Starting retail batch job");

    match batch::run_hourly_job(&settings, partition).await {
        Ok(report) => info!(
            partition = %report.partition,
            records = report.records,
            fact_object = report.fact_object.as_deref().unwrap_or("<none>"),
            "Retail batch job completed"
        ),
        Err(e) => {
            eprintln!("Hourly job error: {}", e);
            process::exit(1);
        }
    }
}
