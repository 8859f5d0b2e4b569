//! HTTP client for a remote artifact store
//!
//! Endpoints:
//! - `GET  {base}/artifacts/{name}/{version}` -> `ArtifactMetadata`
//! - `GET  {base}/artifacts/{name}/v{N}/file` -> file bytes
//! - `POST {base}/artifacts/{name}?type=..&description=..&file_name=..` -> `ArtifactId`
//! - `POST {base}/runs` with a `RunRecord` body

use crate::artifact::types::{
    check_artifact_name, ArtifactId, ArtifactMetadata, ArtifactRef, ArtifactSpec,
    ResolvedArtifact, RunRecord,
};
use crate::artifact::ArtifactStore;
use crate::error::{CleaningError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct HttpArtifactStore {
    client: Client,
    base: Url,
    token: Option<String>,
    download_dir: PathBuf,
}

impl HttpArtifactStore {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
        work_dir: &Path,
    ) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| CleaningError::Store {
            message: format!("invalid store URL '{}': {}", base_url, e),
        })?;
        if base.cannot_be_a_base() {
            return Err(CleaningError::Store {
                message: format!("store URL '{}' cannot be a base", base_url),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(HttpArtifactStore {
            client,
            base,
            token,
            download_dir: work_dir.join("downloads"),
        })
    }

    /// Base URL with `segments` appended, each percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_bytes(&self, url: Url, reference: &ArtifactRef) -> Result<Bytes> {
        info!("Downloading from {}", url);
        let response = self.authorize(self.client.get(url)).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(CleaningError::ArtifactNotFound {
                reference: reference.to_string(),
            });
        }
        if !status.is_success() {
            return Err(CleaningError::Store {
                message: format!("HTTP request failed: {}", status),
            });
        }

        let bytes = response.bytes().await?;
        info!("Downloaded {} bytes", bytes.len());
        Ok(bytes)
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn resolve(&self, reference: &ArtifactRef) -> Result<ResolvedArtifact> {
        let version = reference.version.to_string();
        let url = self.endpoint(&["artifacts", reference.name.as_str(), version.as_str()]);
        let metadata: ArtifactMetadata =
            serde_json::from_slice(&self.get_bytes(url, reference).await?)?;

        let pinned = format!("v{}", metadata.id.version);
        let url = self.endpoint(&["artifacts", metadata.id.name.as_str(), pinned.as_str(), "file"]);
        let bytes = self.get_bytes(url, reference).await?;

        let dir = self.download_dir.join(&metadata.id.name).join(&pinned);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&metadata.file_name);
        tokio::fs::write(&path, &bytes).await?;

        debug!("Resolved {} to {:?}", reference, path);
        Ok(ResolvedArtifact {
            id: metadata.id,
            path,
        })
    }

    async fn publish(&self, path: &Path, spec: &ArtifactSpec) -> Result<ArtifactId> {
        check_artifact_name(&spec.name)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CleaningError::Store {
                message: format!("cannot publish {:?}: no file name", path),
            })?;
        let body = tokio::fs::read(path).await?;
        info!("Uploading {} ({} bytes)", spec.name, body.len());

        let mut query = vec![
            ("type", spec.artifact_type.clone()),
            ("description", spec.description.clone()),
            ("file_name", file_name.to_string()),
        ];
        if !spec.summary.is_null() {
            query.push(("summary", spec.summary.to_string()));
        }

        let url = self.endpoint(&["artifacts", spec.name.as_str()]);
        let response = self
            .authorize(self.client.post(url).query(&query).body(body))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CleaningError::Store {
                message: format!("publish of {} failed: {}", spec.name, status),
            });
        }

        let id: ArtifactId = response.json().await?;
        info!("Published {}", id);
        Ok(id)
    }

    async fn record_run(&self, run: &RunRecord) -> Result<()> {
        let url = self.endpoint(&["runs"]);
        let response = self
            .authorize(self.client.post(url).json(run))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CleaningError::Store {
                message: format!("recording run {} failed: {}", run.id, status),
            });
        }
        debug!("Recorded run {}", run.id);
        Ok(())
    }
}
