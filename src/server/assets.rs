//! The presentation page and its static assets, compiled into the binary.

use crate::config::{RelayConfig, WebhookMode};
use crate::error::RelayError;
use crate::upload::{describe_limit, ACCEPTED_MIME_TYPES};
use askama::Template;

pub const APP_JS: &str = include_str!("../../static/app.js");
pub const STYLE_CSS: &str = include_str!("../../static/style.css");

/// Index page. The client-side validator reads its rules from the data
/// attributes rendered here, so both sides share the relay's constants.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub accept: String,
    pub max_upload_bytes: u64,
    pub max_upload_label: String,
    pub mode: WebhookMode,
}

impl IndexTemplate {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            accept: ACCEPTED_MIME_TYPES.join(","),
            max_upload_bytes: config.max_upload_bytes,
            max_upload_label: describe_limit(&config.max_upload_bytes),
            mode: config.mode,
        }
    }
}

pub fn render_index(config: &RelayConfig) -> Result<String, RelayError> {
    Ok(IndexTemplate::new(config).render()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_carries_validation_rules() {
        let html = render_index(&RelayConfig::default()).unwrap();
        assert!(html.contains("image/jpeg,image/png,image/webp,application/pdf"));
        assert!(html.contains("data-max-bytes=\"10485760\""));
        assert!(html.contains("Max 10MB"));
        assert!(html.contains("/app.js"));
    }

    #[test]
    fn small_limits_are_labelled_in_bytes() {
        let config = RelayConfig::builder().max_upload_bytes(1024).build().unwrap();
        let html = render_index(&config).unwrap();
        assert!(html.contains("data-max-label=\"1024 bytes\""));
        assert!(html.contains("Max 1024 bytes"));
    }

    #[test]
    fn assets_are_embedded() {
        assert!(APP_JS.contains("/api/extract"));
        assert!(STYLE_CSS.contains(".student-card"));
    }
}
