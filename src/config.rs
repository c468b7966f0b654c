//! Configuration for the marksheet relay.
//!
//! All relay behaviour is controlled through [`RelayConfig`], built via its
//! [`RelayConfigBuilder`]. The webhook endpoint is decided once, here, from a
//! single [`WebhookMode`] value; request handlers only ever ask
//! [`RelayConfig::endpoint`] and never look at the environment themselves.
//!
//! # Example
//! ```rust
//! use marksheet_relay::{RelayConfig, WebhookMode};
//!
//! let config = RelayConfig::builder()
//!     .mode(WebhookMode::Production)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.endpoint(), "http://localhost:5678/webhook/upload-marksheet");
//! ```

use crate::error::RelayError;
use crate::upload::MAX_UPLOAD_BYTES;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Webhook URL used while the workflow is being edited in the n8n editor.
pub const DEFAULT_TEST_URL: &str = "http://localhost:5678/webhook-test/upload-marksheet";

/// Webhook URL served once the workflow is activated.
pub const DEFAULT_PRODUCTION_URL: &str = "http://localhost:5678/webhook/upload-marksheet";

/// Which of the two webhook URLs the relay forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookMode {
    /// The editor's `webhook-test` listener. (default)
    #[default]
    Test,
    /// The activated workflow's `webhook` listener.
    Production,
}

impl WebhookMode {
    /// Map the boolean production switch onto a mode.
    pub fn from_production_flag(production: bool) -> Self {
        if production {
            WebhookMode::Production
        } else {
            WebhookMode::Test
        }
    }
}

impl fmt::Display for WebhookMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookMode::Test => f.write_str("test"),
            WebhookMode::Production => f.write_str("production"),
        }
    }
}

/// Configuration for the relay service.
///
/// Built via [`RelayConfig::builder()`] or using [`RelayConfig::default()`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Selects between `test_url` and `production_url`. Default: [`WebhookMode::Test`].
    pub mode: WebhookMode,

    /// Endpoint used in [`WebhookMode::Test`].
    pub test_url: String,

    /// Endpoint used in [`WebhookMode::Production`].
    pub production_url: String,

    /// Per-file upload limit in bytes. Default: 10 MiB.
    pub max_upload_bytes: u64,

    /// Directory for the scoped temporary copy of each upload.
    /// If None, uses the system temp directory.
    pub upload_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: WebhookMode::default(),
            test_url: DEFAULT_TEST_URL.to_string(),
            production_url: DEFAULT_PRODUCTION_URL.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            upload_dir: None,
        }
    }
}

impl RelayConfig {
    /// Create a new builder for `RelayConfig`.
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder {
            config: Self::default(),
        }
    }

    /// The one webhook URL this process forwards to.
    pub fn endpoint(&self) -> &str {
        match self.mode {
            WebhookMode::Test => &self.test_url,
            WebhookMode::Production => &self.production_url,
        }
    }

    /// Where scoped upload copies are staged.
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Request-body cap: the file limit plus headroom for multipart framing.
    pub fn body_limit(&self) -> usize {
        const MULTIPART_HEADROOM: u64 = 1024 * 1024;
        usize::try_from(self.max_upload_bytes.saturating_add(MULTIPART_HEADROOM))
            .unwrap_or(usize::MAX)
    }
}

/// Builder for [`RelayConfig`].
#[derive(Debug)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    pub fn mode(mut self, mode: WebhookMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn production(self, production: bool) -> Self {
        self.mode(WebhookMode::from_production_flag(production))
    }

    pub fn test_url(mut self, url: impl Into<String>) -> Self {
        self.config.test_url = url.into();
        self
    }

    pub fn production_url(mut self, url: impl Into<String>) -> Self {
        self.config.production_url = url.into();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes.max(1);
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RelayConfig, RelayError> {
        let c = &self.config;
        for (label, url) in [("test", &c.test_url), ("production", &c.production_url)] {
            let parsed = reqwest::Url::parse(url).map_err(|e| {
                RelayError::InvalidConfig(format!("{label} webhook URL '{url}' is invalid: {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(RelayError::InvalidConfig(format!(
                    "{label} webhook URL must be http or https, got '{url}'"
                )));
            }
        }
        if let Some(dir) = &c.upload_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(RelayError::InvalidConfig(format!(
                    "Upload directory '{}' is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_test_endpoint() {
        let config = RelayConfig::default();
        assert_eq!(config.mode, WebhookMode::Test);
        assert_eq!(config.endpoint(), DEFAULT_TEST_URL);
        assert_eq!(config.max_upload_bytes, MAX_UPLOAD_BYTES);
    }

    #[test]
    fn production_flag_switches_endpoint() {
        let config = RelayConfig::builder().production(true).build().unwrap();
        assert_eq!(config.endpoint(), DEFAULT_PRODUCTION_URL);

        let config = RelayConfig::builder().production(false).build().unwrap();
        assert_eq!(config.endpoint(), DEFAULT_TEST_URL);
    }

    #[test]
    fn overridden_urls_follow_the_mode() {
        let config = RelayConfig::builder()
            .test_url("http://127.0.0.1:9000/hook-test")
            .production_url("https://n8n.example.com/webhook/upload-marksheet")
            .mode(WebhookMode::Production)
            .build()
            .unwrap();
        assert_eq!(
            config.endpoint(),
            "https://n8n.example.com/webhook/upload-marksheet"
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        let err = RelayConfig::builder()
            .test_url("ftp://example.com/upload")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http or https"), "got: {err}");

        let err = RelayConfig::builder()
            .production_url("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("production"), "got: {err}");
    }

    #[test]
    fn upload_limit_is_clamped_and_padded() {
        let config = RelayConfig::builder().max_upload_bytes(0).build().unwrap();
        assert_eq!(config.max_upload_bytes, 1);
        assert_eq!(config.body_limit(), 1 + 1024 * 1024);
    }

    #[test]
    fn mode_display() {
        assert_eq!(WebhookMode::Test.to_string(), "test");
        assert_eq!(WebhookMode::Production.to_string(), "production");
    }
}
