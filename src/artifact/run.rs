//! Run tracking - config, input lineage and logged outputs of one execution

use crate::artifact::types::{
    ArtifactId, ArtifactRef, ArtifactSpec, ResolvedArtifact, RunRecord, RunStatus,
};
use crate::artifact::ArtifactStore;
use crate::error::Result;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// One execution of a job against an artifact store
pub struct Run<'a> {
    store: &'a dyn ArtifactStore,
    record: RunRecord,
}

impl<'a> Run<'a> {
    pub fn start(store: &'a dyn ArtifactStore, job_type: &str) -> Self {
        let record = RunRecord::new(job_type);
        info!("Started run {} ({})", record.id, job_type);
        Run { store, record }
    }

    pub fn record(&self) -> &RunRecord {
        &self.record
    }

    /// Merge the fields of `config` into the run configuration
    pub fn update_config<T: Serialize>(&mut self, config: &T) -> Result<()> {
        match serde_json::to_value(config)? {
            serde_json::Value::Object(fields) => self.record.config.extend(fields),
            other => {
                self.record.config.insert("value".to_string(), other);
            }
        }
        Ok(())
    }

    /// Resolve an input artifact and record it as used by this run
    pub async fn use_artifact(&mut self, reference: &str) -> Result<ResolvedArtifact> {
        let reference = ArtifactRef::parse(reference)?;
        let resolved = self.store.resolve(&reference).await?;
        self.record.used_artifacts.push(resolved.id.clone());
        Ok(resolved)
    }

    /// Publish an output artifact and record it as logged by this run
    pub async fn log_artifact(&mut self, path: &Path, spec: &ArtifactSpec) -> Result<ArtifactId> {
        let id = self.store.publish(path, spec).await?;
        self.record.logged_artifacts.push(id.clone());
        Ok(id)
    }

    /// Close the run and hand the record to the store
    pub async fn finish(mut self, error: Option<String>) -> Result<RunRecord> {
        self.record.status = match error {
            None => RunStatus::Finished,
            Some(_) => RunStatus::Failed,
        };
        if let Some(message) = &error {
            warn!("Run {} failed: {}", self.record.id, message);
        }
        self.record.error_message = error;
        self.record.finished_at = Some(Utc::now());

        self.store.record_run(&self.record).await?;
        info!("Finished run {} ({:?})", self.record.id, self.record.status);
        Ok(self.record)
    }
}
