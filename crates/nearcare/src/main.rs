use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nearcare::data::FacilityDataset;
use nearcare::{ServiceConfig, init_logging, ingest, server};
use tracing::info;

#[derive(Parser)]
#[command(name = "nearcare")]
#[command(about = "Healthcare facility search service")]
#[command(version)]
struct Cli {
    /// Directory holding facilities.parquet (overrides DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset (overrides LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides NEARCARE_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Geocoding service base URL (overrides GEOCODER_BASE_URL)
        #[arg(long)]
        geocoder_url: Option<String>,
    },
    /// Append facilities from a CSV file
    Ingest {
        /// CSV file with the facility upload headers
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ServiceConfig::from_env().context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_logging(config.log_level.as_str())?;

    match cli.command {
        Command::Serve {
            host,
            port,
            geocoder_url,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(url) = geocoder_url {
                config.geocoder.base_url = url.trim_end_matches('/').to_string();
            }
            server::serve(config).await?;
        }
        Command::Ingest { path } => {
            let dataset = FacilityDataset::open(&config.data_dir)?;
            let report = tokio::task::spawn_blocking(move || ingest::ingest_file(&dataset, &path))
                .await??;
            info!(?report, "Ingest finished");
            println!(
                "Imported {} facilities ({} rows rejected), {} in total",
                report.accepted, report.rejected, report.total
            );
        }
    }
    Ok(())
}
