//! Artifact store collaborators - resolve inputs, publish outputs, track runs

pub mod http;
pub mod local;
pub mod run;
pub mod types;

pub use http::HttpArtifactStore;
pub use local::LocalArtifactStore;
pub use run::Run;
pub use types::*;

use crate::config::StoreConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Versioned artifact storage plus run bookkeeping
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Make the referenced artifact available as a local file
    async fn resolve(&self, reference: &ArtifactRef) -> Result<ResolvedArtifact>;

    /// Upload `path` as a new version of `spec.name`
    async fn publish(&self, path: &Path, spec: &ArtifactSpec) -> Result<ArtifactId>;

    /// Persist a run's configuration and lineage
    async fn record_run(&self, run: &RunRecord) -> Result<()>;
}

/// Pick the store described by the configuration
pub fn store_from_config(config: &StoreConfig) -> Result<Box<dyn ArtifactStore>> {
    match &config.store_url {
        Some(url) => Ok(Box::new(HttpArtifactStore::new(
            url,
            config.store_token.clone(),
            config.http_timeout,
            &config.work_dir,
        )?)),
        None => Ok(Box::new(LocalArtifactStore::new(&config.store_dir))),
    }
}
