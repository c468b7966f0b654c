//! Error types for the marksheet relay.
//!
//! Every failure the relay can hit is a variant of [`RelayError`]. The HTTP
//! layer never lets one escape as an unhandled fault: [`RelayError`] implements
//! [`IntoResponse`] and turns itself into a JSON envelope of the shape
//! `{ "error": ..., "message": ... }` (plus `details`/`status` for upstream
//! failures) with a matching status code.
//!
//! A webhook body that is not valid JSON is deliberately *not* an error. The
//! relay wraps it as `{ "raw": <text> }` and reports success.

use crate::upload::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// All errors returned by the marksheet relay library.
#[derive(Debug, Error)]
pub enum RelayError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// The uploaded file failed type or size validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The multipart body could not be read.
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    // ── Webhook errors ────────────────────────────────────────────────────
    /// The webhook answered, but with a non-success status.
    #[error("Webhook responded with HTTP {status}")]
    Upstream { status: u16, body: String },

    /// The webhook could not be reached or the exchange failed mid-flight.
    #[error("Webhook request to '{endpoint}' failed: {reason}")]
    Transport { endpoint: String, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The scoped temporary copy of the upload could not be created.
    #[error("Failed to stage upload in '{dir}': {source}")]
    TempFile {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Server errors ─────────────────────────────────────────────────────
    /// The listener could not be bound.
    #[error("Failed to bind '{addr}': {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Rendering errors ──────────────────────────────────────────────────
    /// The index page or the cards fragment could not be rendered.
    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

impl RelayError {
    /// HTTP status used when this error is answered to the browser.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Validation(ValidationError::FileTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            RelayError::Validation(_) | RelayError::MalformedUpload(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            RelayError::Transport { .. }
            | RelayError::TempFile { .. }
            | RelayError::Bind { .. }
            | RelayError::InvalidConfig(_)
            | RelayError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, stable label for the `error` field of the JSON envelope.
    pub fn label(&self) -> &'static str {
        match self {
            RelayError::Validation(ValidationError::MissingFile) => "No file uploaded",
            RelayError::Validation(ValidationError::InvalidFileType { .. }) => "Invalid file type",
            RelayError::Validation(ValidationError::FileTooLarge { .. }) => "File too large",
            RelayError::Validation(ValidationError::MultipleFiles) => "Too many files",
            RelayError::MalformedUpload(_) => "Malformed upload",
            RelayError::Upstream { .. } => "Failed to process marksheet",
            _ => "Server error",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!("Request failed with {}: {}", status, self);

        let body = match &self {
            RelayError::Upstream { status: upstream, body } => json!({
                "error": self.label(),
                "message": self.to_string(),
                "details": body,
                "status": upstream,
            }),
            _ => json!({
                "error": self.label(),
                "message": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_maps_to_413() {
        let e = RelayError::from(ValidationError::FileTooLarge {
            size: 11 * 1024 * 1024,
            limit: 10 * 1024 * 1024,
        });
        assert_eq!(e.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(e.label(), "File too large");
    }

    #[test]
    fn invalid_type_maps_to_400() {
        let e = RelayError::from(ValidationError::InvalidFileType {
            content_type: "text/plain".into(),
        });
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert!(e.to_string().contains("Invalid file type"), "got: {e}");
    }

    #[test]
    fn upstream_display_carries_status() {
        let e = RelayError::Upstream {
            status: 404,
            body: "webhook not registered".into(),
        };
        assert!(e.to_string().contains("404"));
        assert_eq!(e.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn transport_is_a_generic_server_error() {
        let e = RelayError::Transport {
            endpoint: "http://localhost:5678/webhook/upload-marksheet".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.label(), "Server error");
    }
}
