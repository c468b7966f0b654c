//! HTTP front of the relay, built on axum.
//!
//! ```text
//! GET  /             index page (askama)
//! GET  /app.js       page controller
//! GET  /style.css    stylesheet
//! POST /api/extract  multipart `marksheet` ──▶ Relay::extract ──▶ {success, data}
//! POST /api/render   extraction JSON ──▶ student cards fragment
//! GET  /api/test-n8n webhook probe report
//! GET  /api/health   {status, timestamp}
//! ```
//!
//! Handlers share one immutable [`AppState`]; nothing is kept between
//! requests.

pub mod assets;
pub mod handlers;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::relay::Relay;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
#[derive(Debug)]
pub struct AppState {
    pub relay: Relay,
}

/// Build the router for a relay.
pub fn router(relay: Relay) -> Router {
    let body_limit = relay.config().body_limit();
    let state = Arc::new(AppState { relay });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/app.js", get(handlers::app_js))
        .route("/style.css", get(handlers::style_css))
        .route("/api/extract", post(handlers::extract))
        .route("/api/render", post(handlers::render))
        .route("/api/test-n8n", get(handlers::test_webhook))
        .route("/api/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A bound, not yet running relay server.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    app: Router,
}

impl Server {
    /// Bind the relay to `host:port`. Port 0 picks a free port.
    pub async fn bind(config: RelayConfig, host: &str, port: u16) -> Result<Self, RelayError> {
        let endpoint = config.endpoint().to_string();
        let mode = config.mode;
        let relay = Relay::new(config)?;

        let addr = format!("{host}:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RelayError::Bind {
                addr: addr.clone(),
                source,
            })?;

        info!("Forwarding uploads to {} ({} mode)", endpoint, mode);

        Ok(Self {
            listener,
            app: router(relay),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        self.listener.local_addr().map_err(|source| RelayError::Bind {
            addr: "listener".to_string(),
            source,
        })
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), RelayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!("Server listening on {}", addr);

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| RelayError::Bind {
                addr: addr.to_string(),
                source,
            })
    }
}

/// Start the relay in the background.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    config: RelayConfig,
    host: &str,
    port: u16,
) -> Result<SocketAddr, RelayError> {
    let server = Server::bind(config, host, port).await?;
    let addr = server.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = server.run_until(std::future::pending()).await {
            error!("Server error: {}", e);
        }
    });

    Ok(addr)
}
