//! Outbound calls to the extraction webhook.
//!
//! Exactly one attempt per request: no retry, no backoff and no timeout beyond
//! reqwest's defaults. A non-success answer is surfaced with its status and
//! raw body; a success answer that is not JSON is wrapped as `{"raw": ...}`.

use crate::error::RelayError;
use crate::relay::scoped::ScopedUpload;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

/// Multipart field name the webhook reads the marksheet from.
pub const WEBHOOK_FILE_FIELD: &str = "data";

/// Outcome of [`WebhookClient::probe`]. Serialises to the diagnostic body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProbeReport {
    /// The webhook answered (with any status).
    Reached {
        status: u16,
        ok: bool,
        response: String,
    },
    /// The webhook could not be reached.
    Failed { error: String },
}

/// HTTP client bound to the single configured webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
    endpoint: String,
}

impl WebhookClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("marksheet-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a staged upload to the webhook and return its parsed answer.
    pub async fn forward(&self, upload: &ScopedUpload) -> Result<Value, RelayError> {
        let body = upload.body().await.map_err(|source| RelayError::TempFile {
            dir: upload
                .path()
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default(),
            source,
        })?;

        let part = Part::stream_with_length(body, upload.size())
            .file_name(upload.file_name().to_string())
            .mime_str(upload.kind().mime())
            .map_err(|e| self.transport(e))?;
        let form = Form::new().part(WEBHOOK_FILE_FIELD, part);

        info!(
            "Sending '{}' ({}, {} bytes) to {}",
            upload.file_name(),
            upload.kind(),
            upload.size(),
            self.endpoint
        );

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport(e))?;
        debug!("Webhook answered HTTP {} with {} bytes", status, text.len());

        if !status.is_success() {
            error!("Webhook error {}: {}", status, text);
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(parse_body(text))
    }

    /// Post a trivial JSON payload and report what came back. Never fails.
    pub async fn probe(&self) -> ProbeReport {
        let result = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "test": true }))
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                error!("Webhook probe failed: {}", e);
                return ProbeReport::Failed {
                    error: e.to_string(),
                };
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(text) => ProbeReport::Reached {
                status: status.as_u16(),
                ok: status.is_success(),
                response: text,
            },
            Err(e) => ProbeReport::Failed {
                error: e.to_string(),
            },
        }
    }

    fn transport(&self, e: reqwest::Error) -> RelayError {
        RelayError::Transport {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        }
    }
}

/// Parse a webhook body as JSON, keeping unparseable text under `raw`.
pub fn parse_body(text: String) -> Value {
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => value,
        Err(e) => {
            debug!("Webhook body is not JSON ({}); wrapping as raw text", e);
            json!({ "raw": text })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_bodies_pass_through() {
        let value = parse_body(r#"{"students":[{"name":"Asha"}]}"#.to_string());
        assert_eq!(value["students"][0]["name"], "Asha");
    }

    #[test]
    fn non_json_bodies_are_wrapped() {
        let value = parse_body("Workflow was started".to_string());
        assert_eq!(value, json!({ "raw": "Workflow was started" }));
    }

    #[test]
    fn empty_body_is_wrapped() {
        assert_eq!(parse_body(String::new()), json!({ "raw": "" }));
    }

    #[test]
    fn probe_report_shapes() {
        let reached = ProbeReport::Reached {
            status: 404,
            ok: false,
            response: "not registered".into(),
        };
        assert_eq!(
            serde_json::to_value(&reached).unwrap(),
            json!({ "status": 404, "ok": false, "response": "not registered" })
        );

        let failed = ProbeReport::Failed {
            error: "connection refused".into(),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({ "error": "connection refused" })
        );
    }

    #[tokio::test]
    async fn probe_reports_unreachable_endpoint() {
        // Grab a free port, then close it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = WebhookClient::new(format!("http://127.0.0.1:{port}/webhook")).unwrap();
        assert!(matches!(client.probe().await, ProbeReport::Failed { .. }));
    }
}
