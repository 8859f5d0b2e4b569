//! Basic cleaning step - download the raw dataset, drop outliers and
//! publish the result as a new artifact

use anyhow::{Context, Result};
use basic_cleaning::artifact::store_from_config;
use basic_cleaning::cleaning::{run_job, CleaningJob};
use basic_cleaning::config::StoreConfig;
use clap::{CommandFactory, Parser};
use tracing::{error, info};

/// A very basic data cleaning
#[derive(Parser, Debug)]
#[command(name = "basic-cleaning", version, about, long_about = None)]
struct Cli {
    /// The input artifact that may have unclean data
    #[arg(long = "input_artifact")]
    input_artifact: String,

    /// The cleaned output artifact to be saved in the store
    #[arg(long = "output_artifact")]
    output_artifact: String,

    /// The type or tag of the output, e.g. clean_sample as opposed to raw_data
    #[arg(long = "output_type")]
    output_type: String,

    /// The output description, e.g. data with outliers removed and cleaned
    #[arg(long = "output_description")]
    output_description: String,

    /// Minimum rental price to keep
    #[arg(long = "min_price", allow_negative_numbers = true)]
    min_price: f64,

    /// Maximum rental price to keep
    #[arg(long = "max_price", allow_negative_numbers = true)]
    max_price: f64,
}

impl From<Cli> for CleaningJob {
    fn from(cli: Cli) -> Self {
        CleaningJob {
            input_artifact: cli.input_artifact,
            output_artifact: cli.output_artifact,
            output_type: cli.output_type,
            output_description: cli.output_description,
            min_price: cli.min_price,
            max_price: cli.max_price,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let job: CleaningJob = Cli::parse().into();

    // Bounds and output-name problems are argument errors, reported before any I/O
    if let Err(e) = job.cleaning_config() {
        Cli::command()
            .error(clap::error::ErrorKind::ValueValidation, e)
            .exit();
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting basic cleaning");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = StoreConfig::from_env().context("Failed to load store configuration")?;
    let store = store_from_config(&config).context("Failed to set up artifact store")?;
    info!("Configuration loaded");

    match run_job(store.as_ref(), &job, &config.work_dir).await {
        Ok(outcome) => {
            info!(
                "✓ Data cleaning completed: {} -> {} ({} of {} rows kept, run {})",
                outcome.input,
                outcome.output,
                outcome.stats.after_geo,
                outcome.stats.input_rows,
                outcome.run_id
            );
            Ok(())
        }
        Err(e) => {
            let cause = if e.is_input_error() {
                "check the input artifact and arguments"
            } else {
                "check the artifact store and work dir"
            };
            error!("✗ Data cleaning failed: {} ({})", e, cause);
            Err(e).with_context(|| format!("Cleaning {} failed", job.input_artifact))
        }
    }
}
