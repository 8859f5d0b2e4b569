//! Artifact references, identifiers, metadata and run records

use crate::error::{CleaningError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Which version of an artifact a reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Version {
    Latest,
    Number(u32),
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::Latest => write!(f, "latest"),
            Version::Number(n) => write!(f, "v{}", n),
        }
    }
}

/// Parsed `[entity/project/]name[:version]` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub name: String,
    pub version: Version,
}

impl ArtifactRef {
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = |message: &str| CleaningError::InvalidReference {
            reference: reference.to_string(),
            message: message.to_string(),
        };

        // entity/project/ prefixes only matter to remote stores
        let tail = reference.rsplit('/').next().unwrap_or(reference).trim();

        let (name, version) = match tail.rsplit_once(':') {
            Some((name, version)) => (name, parse_version(version).ok_or_else(|| {
                invalid("version must be 'latest', 'vN' or a number")
            })?),
            None => (tail, Version::Latest),
        };

        validate_name(name).map_err(invalid)?;

        Ok(ArtifactRef {
            name: name.to_string(),
            version,
        })
    }
}

/// Check that `name` can be published and later resolved by the same name:
/// a single path component with no version separator
pub fn check_artifact_name(name: &str) -> Result<()> {
    validate_name(name).map_err(|message| CleaningError::InvalidReference {
        reference: name.to_string(),
        message: message.to_string(),
    })
}

fn validate_name(name: &str) -> std::result::Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("empty artifact name");
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err("artifact name is not a valid file name");
    }
    if name.contains(':') {
        return Err("artifact name cannot contain ':'");
    }
    Ok(())
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    if version.eq_ignore_ascii_case("latest") {
        return Some(Version::Latest);
    }
    version
        .strip_prefix('v')
        .unwrap_or(version)
        .parse::<u32>()
        .ok()
        .map(Version::Number)
}

/// Identifier the store assigns on publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactId {
    pub name: String,
    pub version: u32,
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:v{}", self.name, self.version)
    }
}

/// What to publish: name plus descriptive metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub summary: serde_json::Value,
}

/// Stored next to every published file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: ArtifactId,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub summary: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// Configuration and lineage of one execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub job_type: String,
    pub status: RunStatus,
    pub config: serde_json::Map<String, serde_json::Value>,
    pub used_artifacts: Vec<ArtifactId>,
    pub logged_artifacts: Vec<ArtifactId>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl RunRecord {
    pub fn new(job_type: &str) -> Self {
        RunRecord {
            id: Uuid::new_v4(),
            job_type: job_type.to_string(),
            status: RunStatus::Running,
            config: serde_json::Map::new(),
            used_artifacts: Vec::new(),
            logged_artifacts: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
            error_message: None,
        }
    }
}

/// A resolved input: where the file landed and which version it was
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    pub id: ArtifactId,
    pub path: PathBuf,
}
