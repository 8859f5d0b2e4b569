//! Directory-backed artifact store
//!
//! Layout:
//! ```text
//! <root>/<name>/v<N>/files/<file_name>
//! <root>/<name>/v<N>/metadata.json
//! <root>/runs/<run-id>.json
//! ```

use crate::artifact::types::{
    check_artifact_name, ArtifactId, ArtifactMetadata, ArtifactRef, ArtifactSpec,
    ResolvedArtifact, RunRecord, Version,
};
use crate::artifact::ArtifactStore;
use crate::error::{CleaningError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const METADATA_FILE: &str = "metadata.json";
const FILES_DIR: &str = "files";
const RUNS_DIR: &str = "runs";

#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalArtifactStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read back the metadata of a published version
    pub fn metadata(&self, id: &ArtifactId) -> Result<ArtifactMetadata> {
        let path = self.version_dir(&id.name, id.version).join(METADATA_FILE);
        if !path.exists() {
            return Err(CleaningError::ArtifactNotFound {
                reference: id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Published version numbers of `name`, ascending
    pub fn versions(&self, name: &str) -> Result<Vec<u32>> {
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions: Vec<u32> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join(METADATA_FILE).is_file())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|n| n.strip_prefix('v'))
                    .and_then(|n| n.parse::<u32>().ok())
            })
            .collect();
        versions.sort_unstable();
        Ok(versions)
    }

    pub fn run_path(&self, record: &RunRecord) -> PathBuf {
        self.root.join(RUNS_DIR).join(format!("{}.json", record.id))
    }

    fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.root.join(name).join(format!("v{}", version))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn resolve(&self, reference: &ArtifactRef) -> Result<ResolvedArtifact> {
        let not_found = || CleaningError::ArtifactNotFound {
            reference: reference.to_string(),
        };

        let versions = self.versions(&reference.name)?;
        let version = match reference.version {
            Version::Latest => versions.last().copied(),
            Version::Number(n) => versions.contains(&n).then_some(n),
        }
        .ok_or_else(not_found)?;

        let id = ArtifactId {
            name: reference.name.clone(),
            version,
        };
        let metadata = self.metadata(&id)?;
        let path = self
            .version_dir(&id.name, version)
            .join(FILES_DIR)
            .join(&metadata.file_name);
        if !path.is_file() {
            return Err(not_found());
        }

        debug!("Resolved {} to {:?}", reference, path);
        Ok(ResolvedArtifact { id, path })
    }

    async fn publish(&self, path: &Path, spec: &ArtifactSpec) -> Result<ArtifactId> {
        check_artifact_name(&spec.name)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CleaningError::Store {
                message: format!("cannot publish {:?}: no file name", path),
            })?
            .to_string();

        let version = self
            .versions(&spec.name)?
            .last()
            .map(|v| v + 1)
            .unwrap_or(0);
        let id = ArtifactId {
            name: spec.name.clone(),
            version,
        };

        let dir = self.version_dir(&id.name, version);
        let files = dir.join(FILES_DIR);
        fs::create_dir_all(&files)?;
        let size_bytes = fs::copy(path, files.join(&file_name))?;

        let metadata = ArtifactMetadata {
            id: id.clone(),
            artifact_type: spec.artifact_type.clone(),
            description: spec.description.clone(),
            file_name,
            size_bytes,
            created_at: Utc::now(),
            summary: spec.summary.clone(),
        };
        // metadata.json marks the version as complete, so it goes last
        write_json_atomic(&dir.join(METADATA_FILE), &metadata)?;

        info!("Published {} ({} bytes)", id, size_bytes);
        Ok(id)
    }

    async fn record_run(&self, run: &RunRecord) -> Result<()> {
        let path = self.run_path(run);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_json_atomic(&path, run)?;
        debug!("Recorded run {} at {:?}", run.id, path);
        Ok(())
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn spec(name: &str) -> ArtifactSpec {
        ArtifactSpec {
            name: name.to_string(),
            artifact_type: "raw_data".to_string(),
            description: "Raw listings".to_string(),
            summary: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_publish_assigns_increasing_versions() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("store"));
        let file = dir.path().join("sample.csv");
        fs::write(&file, "a,b\n1,2\n").unwrap();

        let first = store.publish(&file, &spec("sample.csv")).await.unwrap();
        let second = store.publish(&file, &spec("sample.csv")).await.unwrap();

        assert_eq!(first.version, 0);
        assert_eq!(second.version, 1);
        assert_eq!(store.versions("sample.csv").unwrap(), vec![0, 1]);

        let metadata = store.metadata(&second).unwrap();
        assert_eq!(metadata.artifact_type, "raw_data");
        assert_eq!(metadata.file_name, "sample.csv");
        assert_eq!(metadata.size_bytes, 8);
    }

    #[tokio::test]
    async fn test_resolve_latest_and_pinned() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("store"));
        let file = dir.path().join("sample.csv");

        fs::write(&file, "v0").unwrap();
        store.publish(&file, &spec("sample.csv")).await.unwrap();
        fs::write(&file, "v1").unwrap();
        store.publish(&file, &spec("sample.csv")).await.unwrap();

        let latest = store
            .resolve(&ArtifactRef::parse("sample.csv:latest").unwrap())
            .await
            .unwrap();
        assert_eq!(latest.id.version, 1);
        assert_eq!(fs::read_to_string(&latest.path).unwrap(), "v1");

        let pinned = store
            .resolve(&ArtifactRef::parse("sample.csv:v0").unwrap())
            .await
            .unwrap();
        assert_eq!(fs::read_to_string(&pinned.path).unwrap(), "v0");
    }

    #[tokio::test]
    async fn test_resolve_missing_artifact() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());

        let result = store
            .resolve(&ArtifactRef::parse("missing.csv:latest").unwrap())
            .await;
        assert!(matches!(result, Err(CleaningError::ArtifactNotFound { .. })));

        let file = dir.path().join("sample.csv");
        fs::write(&file, "x").unwrap();
        store.publish(&file, &spec("sample.csv")).await.unwrap();

        let result = store
            .resolve(&ArtifactRef::parse("sample.csv:v5").unwrap())
            .await;
        assert!(matches!(result, Err(CleaningError::ArtifactNotFound { .. })));
    }

    #[tokio::test]
    async fn test_file_named_like_metadata_keeps_its_content() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("store"));
        let file = dir.path().join("metadata.json");
        fs::write(&file, "price\n50\n").unwrap();

        let id = store.publish(&file, &spec("metadata.json")).await.unwrap();
        let resolved = store
            .resolve(&ArtifactRef::parse("metadata.json:latest").unwrap())
            .await
            .unwrap();

        assert_eq!(resolved.id, id);
        assert_eq!(fs::read_to_string(&resolved.path).unwrap(), "price\n50\n");
        assert_eq!(store.metadata(&id).unwrap().file_name, "metadata.json");
    }

    #[tokio::test]
    async fn test_publish_rejects_nested_name() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("store"));
        let file = dir.path().join("clean_sample.csv");
        fs::write(&file, "x").unwrap();

        let result = store.publish(&file, &spec("clean/clean_sample.csv")).await;
        assert!(matches!(result, Err(CleaningError::InvalidReference { .. })));
        assert!(!store.root().join("clean").exists());
    }

    #[tokio::test]
    async fn test_record_run() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let record = RunRecord::new("basic_cleaning");

        store.record_run(&record).await.unwrap();

        let saved: RunRecord =
            serde_json::from_str(&fs::read_to_string(store.run_path(&record)).unwrap()).unwrap();
        assert_eq!(saved.id, record.id);
        assert_eq!(saved.job_type, "basic_cleaning");
    }
}
