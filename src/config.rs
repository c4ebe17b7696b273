//! Connector configuration
//!
//! Non-secret tuning knobs for the connector, loaded from a YAML or JSON
//! file. Every field has a default so an empty file (or no file) is valid.
//! Credentials never live here; they arrive on the event.

use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Connector Config
// ============================================================================

/// Complete connector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Base URL for Asana REST calls
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Base URL for links back to tasks in the Asana web app
    #[serde(default = "default_app_base")]
    pub app_base: String,

    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Extraction phase configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

fn default_api_base() -> String {
    "https://app.asana.com/api/1.0".to_string()
}

fn default_app_base() -> String {
    "https://app.asana.com/0".to_string()
}

fn default_page_size() -> u32 {
    100
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            app_base: default_app_base(),
            page_size: default_page_size(),
            http: HttpConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl ConnectorConfig {
    /// Load configuration from a file; `.json` is parsed as JSON, anything
    /// else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {e}", path.display())))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            let config: Self = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate values that serde can't check
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_base)?;
        url::Url::parse(&self.app_base)?;

        if self.page_size == 0 || self.page_size > 100 {
            return Err(Error::InvalidConfigValue {
                field: "page_size".to_string(),
                message: format!("must be between 1 and 100, got {}", self.page_size),
            });
        }

        if self.extraction.default_retry_after_secs == 0 {
            return Err(Error::InvalidConfigValue {
                field: "extraction.default_retry_after_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Build the HTTP client configuration
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.api_base)
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .max_retries(self.http.max_retries)
            .backoff(
                self.http.backoff,
                Duration::from_millis(self.http.initial_backoff_ms),
                Duration::from_millis(self.http.max_backoff_ms),
            );

        if let Some(agent) = &self.http.user_agent {
            builder = builder.user_agent(agent);
        }

        builder.build()
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport retries for 5xx/connect/timeout failures.
    /// Rate limits are never retried here.
    #[serde(default)]
    pub max_retries: u32,

    /// Backoff strategy between transport retries
    #[serde(default)]
    pub backoff: BackoffType,

    /// Initial backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_initial_backoff_ms() -> u64 {
    250
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            user_agent: None,
        }
    }
}

// ============================================================================
// Extraction Config
// ============================================================================

/// Extraction phase settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Wall-clock budget per invocation; the runner checkpoints and yields
    /// before starting a page fetch once it is spent
    #[serde(default)]
    pub execution_budget_secs: Option<u64>,

    /// Persist the checkpoint after every page
    #[serde(default)]
    pub state_per_page: bool,

    /// Delay reported for a 429 without a usable `Retry-After`
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,
}

fn default_retry_after_secs() -> u64 {
    60
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            execution_budget_secs: None,
            state_per_page: false,
            default_retry_after_secs: default_retry_after_secs(),
        }
    }
}

impl ExtractionConfig {
    /// Execution budget as a duration
    pub fn execution_budget(&self) -> Option<Duration> {
        self.execution_budget_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ConnectorConfig::default();
        assert_eq!(config.api_base, "https://app.asana.com/api/1.0");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.http.max_retries, 0);
        assert_eq!(config.extraction.default_retry_after_secs, 60);
        assert!(config.extraction.execution_budget().is_none());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ConnectorConfig::from_yaml("").unwrap(), ConnectorConfig::default());
    }

    #[test]
    fn test_yaml_overrides_and_unknown_fields() {
        let yaml = r"
api_base: http://localhost:9999/api/1.0
page_size: 50
some_future_field: true
http:
  timeout_secs: 5
  backoff: linear
extraction:
  execution_budget_secs: 600
  state_per_page: true
";
        let config = ConnectorConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.api_base, "http://localhost:9999/api/1.0");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.http.backoff, BackoffType::Linear);
        assert_eq!(
            config.extraction.execution_budget(),
            Some(Duration::from_secs(600))
        );
        assert!(config.extraction.state_per_page);
        assert_eq!(config.app_base, "https://app.asana.com/0");
    }

    #[test]
    fn test_rejects_bad_page_size() {
        let err = ConnectorConfig::from_yaml("page_size: 500").unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_rejects_zero_retry_after() {
        let err = ConnectorConfig::from_yaml("extraction:\n  default_retry_after_secs: 0")
            .unwrap_err();
        assert!(err.to_string().contains("default_retry_after_secs"));
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(ConnectorConfig::from_yaml("api_base: not a url").is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"page_size": 10}"#).unwrap();

        let config = ConnectorConfig::from_file(&path).unwrap();
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_http_client_config() {
        let config = ConnectorConfig::default();
        let http = config.http_client_config();
        assert_eq!(http.base_url.as_deref(), Some("https://app.asana.com/api/1.0"));
        assert_eq!(http.timeout, Duration::from_secs(30));
        assert_eq!(http.max_retries, 0);
    }
}
