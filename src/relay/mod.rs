//! The relay: stage an upload, forward it to the webhook, hand back the answer.
//!
//! ## Data Flow
//!
//! ```text
//! multipart body ──▶ scoped ──▶ webhook ──▶ parse
//!  (browser/CLI)     (temp file) (one POST)  (JSON or {raw})
//! ```
//!
//! 1. [`scoped`]: write the incoming bytes to a temp file owned by a guard
//! 2. [`webhook`]: stream the temp file to the configured endpoint as a
//!    `data` multipart part; the only stage with network I/O
//!
//! [`Relay::extract`] takes the [`ScopedUpload`] by value, so the temp file is
//! released when the call returns, whichever way it returns.

pub mod scoped;
pub mod webhook;

pub use scoped::ScopedUpload;
pub use webhook::{parse_body, ProbeReport, WebhookClient};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::upload::AcceptedType;
use serde_json::Value;
use std::time::Instant;
use tracing::info;

/// Opaque JSON produced by the extraction workflow.
pub type ExtractionResult = Value;

/// Relay service bound to one configuration and one webhook endpoint.
#[derive(Debug, Clone)]
pub struct Relay {
    config: RelayConfig,
    webhook: WebhookClient,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let webhook = WebhookClient::new(config.endpoint())?;
        Ok(Self { config, webhook })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &str {
        self.webhook.endpoint()
    }

    /// Open an empty staging file for an upload of the given type.
    pub async fn stage(
        &self,
        file_name: impl Into<String>,
        kind: AcceptedType,
    ) -> Result<ScopedUpload, RelayError> {
        ScopedUpload::create(&self.config.upload_dir(), file_name, kind).await
    }

    /// Forward a staged upload and return the webhook's answer.
    ///
    /// The upload is consumed; its temp file is gone once this returns.
    pub async fn extract(&self, upload: ScopedUpload) -> Result<ExtractionResult, RelayError> {
        let start = Instant::now();
        let result = self.webhook.forward(&upload).await;
        drop(upload);

        if result.is_ok() {
            info!("Extraction complete in {}ms", start.elapsed().as_millis());
        }
        result
    }

    /// Connectivity check against the configured endpoint.
    pub async fn probe(&self) -> ProbeReport {
        self.webhook.probe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WebhookMode;
    use tempfile::TempDir;

    #[test]
    fn relay_uses_the_configured_endpoint() {
        let config = RelayConfig::builder()
            .mode(WebhookMode::Production)
            .build()
            .unwrap();
        let relay = Relay::new(config).unwrap();
        assert_eq!(
            relay.endpoint(),
            "http://localhost:5678/webhook/upload-marksheet"
        );
    }

    #[tokio::test]
    async fn failed_extract_still_releases_the_upload() {
        let dir = TempDir::new().unwrap();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = RelayConfig::builder()
            .test_url(format!("http://127.0.0.1:{port}/webhook-test/upload-marksheet"))
            .upload_dir(dir.path())
            .build()
            .unwrap();
        let relay = Relay::new(config).unwrap();

        let upload = ScopedUpload::from_bytes(dir.path(), "sheet.pdf", AcceptedType::Pdf, b"%PDF")
            .await
            .unwrap();
        let staged_path = upload.path().to_path_buf();

        let err = relay.extract(upload).await.unwrap_err();
        assert!(matches!(err, RelayError::Transport { .. }), "got: {err:?}");
        assert!(!staged_path.exists());
    }
}
