use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::sync::watch;

use fam_daemon::{load_catalog, InsightsSink, MemorySink, Monitor, MonitorConfig};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Starts the monitor loop. Polls the configured locations until
    /// interrupted (ctrl-c), delivering lifecycle events to the backend.
    Run {
        /// Path to the monitor configuration
        #[clap(long, default_value = "fam.toml")]
        config: PathBuf,
    },
    /// Runs a single poll pass and prints the events it would emit,
    /// without contacting the backend.
    Check {
        /// Path to the monitor configuration
        #[clap(long, default_value = "fam.toml")]
        config: PathBuf,
    },
    /// Validates the configuration and the expected-file catalog.
    Validate {
        /// Path to the monitor configuration
        #[clap(long, default_value = "fam.toml")]
        config: PathBuf,
    },
}

#[derive(Parser)]
#[clap(version, author, about)]
pub struct Cli {
    /// Output results as JSON
    #[clap(long, global = true)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Command,
}

/// Resolve the catalog path relative to the config file's directory.
fn catalog_path(config_path: &Path, config: &MonitorConfig) -> PathBuf {
    if config.catalog.is_absolute() {
        config.catalog.clone()
    } else {
        config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&config.catalog)
    }
}

fn try_main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { config: config_path } => {
            let config = MonitorConfig::load(&config_path)?;
            config.validate_credentials()?;
            let specs = load_catalog(&catalog_path(&config_path, &config))?;

            let sink = InsightsSink::new(&config.account_id, &config.api_key);
            let mut monitor = Monitor::new(config, specs, sink);

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                let (tx, rx) = watch::channel(false);
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        log::info!("shutdown requested");
                        let _ = tx.send(true);
                    }
                });
                monitor.run(rx).await;
            });
        }
        Command::Check { config: config_path } => {
            let config = MonitorConfig::load(&config_path)?;
            let specs = load_catalog(&catalog_path(&config_path, &config))?;

            let mut monitor = Monitor::new(config, specs, MemorySink::new());
            let events = monitor.poll_once(Local::now());

            if cli.json {
                println!("{}", serde_json::to_string(&events)?);
            } else if events.is_empty() {
                println!("No events this cycle");
            } else {
                for event in events {
                    println!(
                        "{}: {} ({})",
                        event.event_type.wire_name(),
                        event.file_name,
                        event.status
                    );
                }
            }
        }
        Command::Validate { config: config_path } => {
            let config = MonitorConfig::load(&config_path)?;
            let specs = load_catalog(&catalog_path(&config_path, &config))?;

            if cli.json {
                println!(
                    "{}",
                    json!({
                        "status": "ok",
                        "specs": specs.len(),
                        "locations": config.locations.len(),
                    })
                );
            } else {
                println!(
                    "Configuration OK: {} expected files across {} location sets",
                    specs.len(),
                    config.locations.len()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
