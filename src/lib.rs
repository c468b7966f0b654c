//! # marksheet-relay
//!
//! Upload a marksheet scan, relay it to an extraction webhook, and show the
//! student marks that come back.
//!
//! The extraction itself (OCR, parsing) lives in an external workflow engine
//! such as n8n. This crate is the thin part around it: an HTTP relay that
//! validates and forwards one file per request, and a presentation layer that
//! turns whatever JSON the workflow returns into student cards.
//!
//! ## Request Flow
//!
//! ```text
//! browser / CLI
//!  │
//!  ├─ 1. Validate  type ∈ {jpeg, png, webp, pdf}, size ≤ 10 MiB (both sides)
//!  ├─ 2. Stage     scoped temp file, removed on every exit path
//!  ├─ 3. Forward   one multipart POST (`data` part) to the webhook
//!  ├─ 4. Parse     JSON body, or {"raw": text} when it is not JSON
//!  └─ 5. Render    student cards + raw JSON, copy / download
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use marksheet_relay::{start_server, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::builder().production(false).build()?;
//!     let addr = start_server(config, "127.0.0.1", 3000).await?;
//!     println!("open http://{addr}");
//!     tokio::signal::ctrl_c().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `marksheet` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod relay;
pub mod server;
pub mod ui;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::RelayClient;
pub use config::{RelayConfig, RelayConfigBuilder, WebhookMode};
pub use error::RelayError;
pub use relay::{ExtractionResult, ProbeReport, Relay, ScopedUpload};
pub use server::{router, start_server, Server};
pub use upload::{validate, AcceptedType, ValidationError, MAX_UPLOAD_BYTES};
