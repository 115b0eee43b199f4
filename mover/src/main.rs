use anyhow::Context;
use clap::{Arg, Command};
use common::config::Settings;
use common::logging::init_tracing;
use mover::LandingMover;
use std::process;
use std::time::Duration;
use tracing::info;

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Sets a custom config file")
}

async fn run(subcommand: &str, config_path: &str) -> anyhow::Result<()> {
    let settings = Settings::new(config_path)
        .with_context(|| format!("failed to load config {}", config_path))?;
    init_tracing(&settings.logging);

    let mover = LandingMover::from_config(&settings.mover);
    match subcommand {
        "next" => match mover.move_next().await? {
            Some(name) => info!(directory = %name, "Moved one directory"),
            None => info!("Nothing to move"),
        },
        _ => {
            // Per-directory failures are logged by the drain and do not fail the run.
            mover
                .move_all(Duration::from_secs(settings.mover.delay_seconds))
                .await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = Command::new("Landing Zone Mover")
        .version("1.0")
        .about("Moves staged hourly directories into the raw landing zone")
        .subcommand(
            Command::new("next")
                .about("Move the next pending directory")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("drain")
                .about("Move every pending directory, pausing between each")
                .arg(config_arg()),
        )
        .get_matches();

    let Some((subcommand, sub_matches)) = matches.subcommand() else {
        eprintln!("Please specify a valid subcommand");
        process::exit(1);
    };
    let config_path = sub_matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or("config/retail.toml");

    if let Err(e) = run(subcommand, config_path).await {
        eprintln!("Mover error: {:#}", e);
        process::exit(1);
    }
}
