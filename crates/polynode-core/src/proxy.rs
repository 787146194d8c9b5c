use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid proxy configuration: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Contents of `proxy.json`.
///
/// Only `http_proxy` is used by the downloader. `https_proxy` is carried so
/// that a hand-edited file survives a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,
}

impl ProxyConfig {
    #[must_use]
    pub fn with_http_proxy(url: impl Into<String>) -> Self {
        Self {
            http_proxy: Some(url.into()),
            https_proxy: None,
        }
    }

    /// Load the file at `path`. A missing file means no proxy.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    /// Unlike application settings, a broken proxy file is not silently
    /// replaced by defaults since downloads would then bypass the proxy.
    pub fn load(path: &Path) -> Result<Self, ProxyConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ProxyConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| ProxyConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    /// Returns an error when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ProxyConfigError> {
        let write_error = |source| ProxyConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(std::io::Error::from);
        std::fs::write(path, content.map_err(write_error)?).map_err(write_error)
    }

    /// The proxy to route downloads through, if one is configured.
    #[must_use]
    pub fn http_proxy_url(&self) -> Option<&str> {
        self.http_proxy
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::{ProxyConfig, ProxyConfigError};

    #[test]
    fn missing_file_means_no_proxy() {
        let temp = tempfile::tempdir().expect("tempdir should be created");

        let config = ProxyConfig::load(&temp.path().join("proxy.json"))
            .expect("missing file should load");

        assert_eq!(config, ProxyConfig::default());
        assert_eq!(config.http_proxy_url(), None);
    }

    #[test]
    fn save_then_load_preserves_url() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("nested").join("proxy.json");

        ProxyConfig::with_http_proxy("http://proxy.local:3128")
            .save(&path)
            .expect("save should succeed");

        let written = std::fs::read_to_string(&path).expect("file should exist");
        assert!(written.contains("\"http_proxy\": \"http://proxy.local:3128\""));
        assert!(!written.contains("https_proxy"));

        let loaded = ProxyConfig::load(&path).expect("saved file should load");
        assert_eq!(loaded.http_proxy_url(), Some("http://proxy.local:3128"));
    }

    #[test]
    fn unknown_and_missing_keys_are_tolerated() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("proxy.json");
        std::fs::write(&path, r#"{"https_proxy": "http://secure:8080", "extra": 1}"#)
            .expect("file should be written");

        let config = ProxyConfig::load(&path).expect("partial file should load");

        assert_eq!(config.https_proxy.as_deref(), Some("http://secure:8080"));
        assert_eq!(config.http_proxy_url(), None);
    }

    #[test]
    fn blank_proxy_is_ignored() {
        let config = ProxyConfig::with_http_proxy("   ");
        assert_eq!(config.http_proxy_url(), None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("proxy.json");
        std::fs::write(&path, "{ not json").expect("file should be written");

        let result = ProxyConfig::load(&path);

        assert!(matches!(result, Err(ProxyConfigError::Malformed { .. })));
    }
}
