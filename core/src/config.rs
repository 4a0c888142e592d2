use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Endpoint of a detection service running on the local machine.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/api/detect-anomalies";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading session config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing session config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Settings injected into the session controller and its transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub endpoint: String,
    /// No timeout when absent; a request then runs until the transport gives up.
    pub request_timeout_secs: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl SessionConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path_ref.to_path_buf(),
            source,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_points_at_local_service() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.request_timeout(), None);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"endpoint: http://10.0.0.5:8080/api/detect-anomalies\nrequest_timeout_secs: 30\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = SessionConfig::load(&path).unwrap();
        assert_eq!(cfg.endpoint, "http://10.0.0.5:8080/api/detect-anomalies");
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn config_load_fills_missing_fields() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"request_timeout_secs: 0\n").unwrap();
        let path = temp.into_temp_path();
        let cfg = SessionConfig::load(&path).unwrap();
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.request_timeout(), None);
    }

    #[test]
    fn config_load_reports_missing_file() {
        let err = SessionConfig::load("/nonexistent/session.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
