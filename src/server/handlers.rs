//! Request handlers.

use crate::error::RelayError;
use crate::relay::{ProbeReport, ScopedUpload};
use crate::server::assets::{self, APP_JS, STYLE_CSS};
use crate::server::AppState;
use crate::ui::view::render_results;
use crate::upload::{self, ValidationError};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Multipart field the page uploads the marksheet under.
pub const UPLOAD_FIELD: &str = "marksheet";

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, RelayError> {
    Ok(Html(assets::render_index(state.relay.config())?))
}

pub async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}

pub async fn style_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS)
}

/// Receive one marksheet, relay it, answer `{success: true, data}`.
///
/// The file is staged chunk by chunk; type is checked from the part headers
/// before any bytes are read and size is checked as they arrive, so a
/// rejected upload never reaches the webhook.
pub async fn extract(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, RelayError> {
    let mut multipart = multipart.map_err(|e| RelayError::MalformedUpload(e.body_text()))?;
    let relay = &state.relay;
    let limit = relay.config().max_upload_bytes;
    let mut staged: Option<ScopedUpload> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        if staged.is_some() {
            return Err(ValidationError::MultipleFiles.into());
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let kind = upload::check_type(&content_type)?;
        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or("marksheet")
            .to_string();

        let mut upload = relay.stage(file_name, kind).await?;
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
            if let Err(e) = upload::check_size(upload.size() + chunk.len() as u64, limit) {
                drop(upload);
                // Read the rest of the body (bounded by the router's body limit)
                // so the client gets the 413 instead of a reset connection.
                while let Ok(Some(_)) = field.chunk().await {}
                drop(field);
                discard_remaining(&mut multipart).await;
                return Err(e.into());
            }
            upload.append(&chunk).await?;
        }
        upload.finish().await?;
        staged = Some(upload);
    }

    let upload = staged.ok_or(ValidationError::MissingFile)?;
    let data = relay.extract(upload).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// Render student cards for a result the page already holds.
pub async fn render(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Html<String>, RelayError> {
    let Json(data) = payload.map_err(|e| RelayError::MalformedUpload(e.body_text()))?;
    Ok(Html(render_results(&data)?))
}

/// Webhook connectivity probe. Always 200; the body says what happened.
pub async fn test_webhook(State(state): State<Arc<AppState>>) -> Json<ProbeReport> {
    Json(state.relay.probe().await)
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn discard_remaining(multipart: &mut Multipart) {
    while let Ok(Some(mut field)) = multipart.next_field().await {
        while let Ok(Some(_)) = field.chunk().await {}
    }
}

fn multipart_error(e: MultipartError, limit: u64) -> RelayError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // The body limit tripped before the per-file check; the exact size is unknown.
        return ValidationError::FileTooLarge {
            size: limit.saturating_add(1),
            limit,
        }
        .into();
    }
    RelayError::MalformedUpload(e.body_text())
}
