//! Fire-weather grid fetcher.
//!
//! Runs the RTMA fallback fetch or the NDFD dual-range fetch once and prints
//! a summary of what was retrieved:
//!
//! ```text
//! firewx-fetch rtma --region AK --time 2024-01-15T12:00:00Z
//! firewx-fetch ndfd --scope AR.conus --parameter ds.maxrh.bin
//! firewx-fetch parameters
//! ```

mod summary;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use firewx_common::{Region, ValidTime};
use retrieval::{
    HttpSource, NdfdFetcher, NdfdParameter, OpendapSource, RetrievalConfig, RtmaFetcher,
};
use storage::ScratchCache;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use summary::{ndfd_summary, render_text, rtma_summary, GridSummary};

#[derive(Parser, Debug)]
#[command(name = "firewx-fetch")]
#[command(about = "Retrieve RTMA analyses and NDFD forecast grids for fire-weather maps")]
struct Cli {
    /// YAML configuration file
    #[arg(long, env = "FIREWX_CONFIG")]
    config: Option<PathBuf>,

    /// Scratch directory for downloaded grids
    #[arg(long, env = "FIREWX_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// RTMA OPeNDAP server root
    #[arg(long, env = "FIREWX_RTMA_URL")]
    rtma_url: Option<String>,

    /// NDFD archive root
    #[arg(long, env = "FIREWX_NDFD_URL")]
    ndfd_url: Option<String>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Summary format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Newest RTMA analysis at or before a time, plus the analysis a day earlier
    Rtma {
        /// CONUS, AK or HI (case-insensitive; anything else is CONUS)
        #[arg(long, default_value = "CONUS")]
        region: String,

        /// Reference time, ISO 8601 (default: now)
        #[arg(long)]
        time: Option<String>,

        /// Variable to read; repeat for several (default: from config)
        #[arg(long = "variable")]
        variables: Vec<String>,
    },

    /// Short- and extended-range grids of one NDFD parameter
    Ndfd {
        /// Server directory, e.g. AR.conus
        #[arg(long)]
        scope: String,

        /// Parameter file, e.g. ds.maxrh.bin
        #[arg(long)]
        parameter: String,

        #[arg(long, default_value = "CONUS")]
        region: String,
    },

    /// List the supported NDFD parameters
    Parameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    let config = load_config(&cli)?;

    match &cli.command {
        Command::Rtma {
            region,
            time,
            variables,
        } => {
            let region = Region::from_code(region);
            let reference_time = match time {
                Some(t) => ValidTime::from_iso8601(t)
                    .with_context(|| format!("Invalid --time {:?}", t))?,
                None => Utc::now(),
            };

            let mut rtma_config = config.rtma.clone();
            if !variables.is_empty() {
                rtma_config.variables = variables.clone();
            }

            info!(region = %region, reference_time = %reference_time, "Fetching RTMA analysis");
            let fetcher = RtmaFetcher::new(Arc::new(OpendapSource), &rtma_config);
            let retrieval = fetcher.fetch(region, reference_time).await?;

            print_summary(&rtma_summary(&retrieval), cli.output)?;
        }
        Command::Ndfd {
            scope,
            parameter,
            region,
        } => {
            let region = Region::from_code(region);
            let cache = ScratchCache::new(&config.cache_dir);

            info!(scope = %scope, parameter = %parameter, cache = %cache.root().display(), "Fetching NDFD grids");
            let fetcher = NdfdFetcher::new(Arc::new(HttpSource::new()?), cache, &config.ndfd);
            let retrieval = fetcher.fetch(scope, parameter, region).await?;

            print_summary(&ndfd_summary(&retrieval), cli.output)?;
        }
        Command::Parameters => {
            for parameter in NdfdParameter::ALL {
                println!(
                    "{:<18} {:<8} {}",
                    parameter.file_name(),
                    parameter.grib_name(),
                    parameter.description()
                );
            }
        }
    }

    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Configuration file (or defaults), then command-line/environment overrides.
fn load_config(cli: &Cli) -> Result<RetrievalConfig> {
    let mut config = match &cli.config {
        Some(path) => RetrievalConfig::load(path)?,
        None => RetrievalConfig::default(),
    };

    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(url) = &cli.rtma_url {
        config.rtma.base_url = url.clone();
    }
    if let Some(url) = &cli.ndfd_url {
        config.ndfd.base_url = url.clone();
    }

    Ok(config)
}

fn print_summary(lines: &[GridSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_text(lines)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(lines)?),
    }
    Ok(())
}
