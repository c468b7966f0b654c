//! Client for a running relay, used by the terminal front-end.
//!
//! It speaks to the relay exactly as the browser page does: one multipart
//! `marksheet` part posted to `/api/extract`, answered with either
//! `{success: true, data}` or an error envelope.

use crate::error::RelayError;
use crate::relay::{ExtractionResult, ProbeReport};
use crate::server::handlers::UPLOAD_FIELD;
use crate::upload::AcceptedType;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Default address of a locally running relay.
pub const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Debug, Deserialize)]
struct ExtractEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Value,
    error: Option<String>,
    message: Option<String>,
    details: Option<Value>,
}

/// HTTP client bound to one relay base URL.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base: String,
}

impl RelayClient {
    pub fn new(base: impl Into<String>) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("marksheet-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Upload a marksheet and return the extraction result.
    ///
    /// An error envelope from the relay comes back as [`RelayError::Upstream`]
    /// carrying the relay's status and its most specific message.
    pub async fn extract(
        &self,
        file_name: &str,
        kind: AcceptedType,
        bytes: Vec<u8>,
    ) -> Result<ExtractionResult, RelayError> {
        let url = format!("{}/api/extract", self.base);
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(kind.mime())
            .map_err(|e| self.transport(&url, e))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport(&url, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport(&url, e))?;
        debug!("Relay answered HTTP {} with {} bytes", status, text.len());

        match serde_json::from_str::<ExtractEnvelope>(&text) {
            Ok(envelope) if status.is_success() && envelope.success => Ok(envelope.data),
            Ok(envelope) => Err(RelayError::Upstream {
                status: status.as_u16(),
                body: envelope_message(envelope),
            }),
            Err(_) => Err(RelayError::Upstream {
                status: status.as_u16(),
                body: text,
            }),
        }
    }

    /// Ask the relay to probe its webhook.
    pub async fn probe(&self) -> Result<ProbeReport, RelayError> {
        let url = format!("{}/api/test-n8n", self.base);
        let value: Value = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport(&url, e))?
            .json()
            .await
            .map_err(|e| self.transport(&url, e))?;

        Ok(match value.get("error").and_then(Value::as_str) {
            Some(error) => ProbeReport::Failed {
                error: error.to_string(),
            },
            None => ProbeReport::Reached {
                status: value.get("status").and_then(Value::as_u64).unwrap_or(0) as u16,
                ok: value.get("ok").and_then(Value::as_bool).unwrap_or(false),
                response: value
                    .get("response")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
        })
    }

    fn transport(&self, url: &str, e: reqwest::Error) -> RelayError {
        RelayError::Transport {
            endpoint: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Most specific human-readable text in an error envelope.
fn envelope_message(envelope: ExtractEnvelope) -> String {
    let details = envelope.details.map(|d| match d {
        Value::String(s) => s,
        other => other.to_string(),
    });
    [envelope.message, details, envelope.error]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Failed to extract data".to_string())
}
