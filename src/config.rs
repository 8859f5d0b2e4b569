//! Store configuration loaded from the environment

use crate::error::{CleaningError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Where artifacts live and where local files are written
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub store_url: Option<String>,
    pub store_dir: PathBuf,
    pub store_token: Option<String>,
    pub work_dir: PathBuf,
    pub http_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            store_url: None,
            store_dir: PathBuf::from("./artifacts"),
            store_token: None,
            work_dir: PathBuf::from("."),
            http_timeout: Duration::from_secs(300), // 5 min timeout
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = StoreConfig::default();

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| CleaningError::Store {
                    message: format!("HTTP_TIMEOUT_SECS must be a whole number, got '{}'", raw),
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.http_timeout,
        };

        Ok(StoreConfig {
            store_url: get("ARTIFACT_STORE_URL"),
            store_dir: get("ARTIFACT_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
            store_token: get("ARTIFACT_STORE_TOKEN"),
            work_dir: get("WORK_DIR").map(PathBuf::from).unwrap_or(defaults.work_dir),
            http_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.store_url, None);
        assert_eq!(config.store_dir, PathBuf::from("./artifacts"));
        assert_eq!(config.work_dir, PathBuf::from("."));
        assert_eq!(config.http_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("ARTIFACT_STORE_URL", "https://store.example.com"),
            ("ARTIFACT_STORE_TOKEN", "secret"),
            ("WORK_DIR", "/tmp/cleaning"),
            ("HTTP_TIMEOUT_SECS", "30"),
            ("ARTIFACT_STORE_DIR", ""),
        ]))
        .unwrap();

        assert_eq!(config.store_url.as_deref(), Some("https://store.example.com"));
        assert_eq!(config.store_token.as_deref(), Some("secret"));
        assert_eq!(config.work_dir, PathBuf::from("/tmp/cleaning"));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        // Empty value falls back to the default
        assert_eq!(config.store_dir, PathBuf::from("./artifacts"));
    }

    #[test]
    fn test_bad_timeout() {
        let result = StoreConfig::from_lookup(lookup(&[("HTTP_TIMEOUT_SECS", "soon")]));
        assert!(result.is_err());
    }
}
