//! Cleaning job - download, clean, save and publish within one run

use crate::artifact::{check_artifact_name, ArtifactId, ArtifactSpec, ArtifactStore, Run};
use crate::cleaning::clean::clean;
use crate::cleaning::parse::read_dataset;
use crate::cleaning::types::{CleanStats, CleaningConfig, Schema};
use crate::cleaning::write::write_dataset;
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

pub const JOB_TYPE: &str = "basic_cleaning";

/// Parameters of one cleaning run, recorded as the run configuration
#[derive(Debug, Clone, Serialize)]
pub struct CleaningJob {
    pub input_artifact: String,
    pub output_artifact: String,
    pub output_type: String,
    pub output_description: String,
    pub min_price: f64,
    pub max_price: f64,
}

impl CleaningJob {
    /// Validate the arguments that need no I/O: the price bounds and the
    /// output name, which doubles as a file name in the work dir
    pub fn cleaning_config(&self) -> Result<CleaningConfig> {
        check_artifact_name(&self.output_artifact)?;
        CleaningConfig::new(self.min_price, self.max_price)
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub run_id: Uuid,
    pub input: ArtifactId,
    pub output: ArtifactId,
    pub output_path: PathBuf,
    pub stats: CleanStats,
}

/// Run the job. The run is recorded as failed if any step errors.
pub async fn run_job(
    store: &dyn ArtifactStore,
    job: &CleaningJob,
    work_dir: &Path,
) -> Result<JobOutcome> {
    let config = job.cleaning_config()?;

    let mut run = Run::start(store, JOB_TYPE);
    match execute(&mut run, job, &config, work_dir).await {
        Ok((input, output, output_path, stats)) => {
            let record = run.finish(None).await?;
            Ok(JobOutcome {
                run_id: record.id,
                input,
                output,
                output_path,
                stats,
            })
        }
        Err(e) => {
            // The step error matters more than a failure to record the run
            if let Err(record_err) = run.finish(Some(e.to_string())).await {
                warn!("Failed to record run: {}", record_err);
            }
            Err(e)
        }
    }
}

async fn execute(
    run: &mut Run<'_>,
    job: &CleaningJob,
    config: &CleaningConfig,
    work_dir: &Path,
) -> Result<(ArtifactId, ArtifactId, PathBuf, CleanStats)> {
    run.update_config(job)?;

    info!("Step 1/4: Downloading artifact {}", job.input_artifact);
    let input = run.use_artifact(&job.input_artifact).await?;
    info!("✓ Resolved {} to {:?}", input.id, input.path);

    info!("Step 2/4: Reading data...");
    let dataset = read_dataset(&input.path, &Schema::default())?;
    info!("✓ Read {} rows", dataset.n_rows());

    info!("Step 3/4: Cleaning data...");
    let (cleaned, stats) = clean(dataset, config)?;
    info!("✓ Cleaning complete: {}", stats);

    info!("Step 4/4: Saving and uploading {}...", job.output_artifact);
    let output_path = work_dir.join(&job.output_artifact);
    write_dataset(&cleaned, &output_path)?;

    let spec = ArtifactSpec {
        name: job.output_artifact.clone(),
        artifact_type: job.output_type.clone(),
        description: job.output_description.clone(),
        summary: serde_json::to_value(&stats)?,
    };
    let output = run.log_artifact(&output_path, &spec).await?;
    info!("✓ Published {}", output);

    Ok((input.id, output, output_path, stats))
}
