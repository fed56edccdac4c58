//! HTTP surface.
//!
//! [`router`] wires the bucket and file routes over an [`ObjectStore`];
//! [`serve`] runs it until ctrl-c.

mod handlers;
mod params;
mod response;

pub use params::QueryParams;
pub use response::{content_disposition, ErrorResponse, MessageResponse};

use crate::client::ObjectStore;
use crate::config::{ServerConfig, DEFAULT_HEAD_CONCURRENCY};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Object store every handler talks to.
    pub store: Arc<dyn ObjectStore>,
    /// Bucket used when a request names none.
    pub default_bucket: Option<String>,
    /// Concurrent head-object calls per listing.
    pub head_concurrency: usize,
}

impl AppState {
    /// State with no default bucket.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            default_bucket: None,
            head_concurrency: DEFAULT_HEAD_CONCURRENCY,
        }
    }

    /// Set the fallback bucket.
    pub fn with_default_bucket(mut self, bucket: Option<String>) -> Self {
        self.default_bucket = bucket.filter(|b| !b.trim().is_empty());
        self
    }

    /// Set the head-object concurrency used by listings.
    pub fn with_head_concurrency(mut self, concurrency: usize) -> Self {
        self.head_concurrency = concurrency.max(1);
        self
    }

    fn default_bucket(&self) -> Option<&str> {
        self.default_bucket.as_deref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("default_bucket", &self.default_bucket)
            .field("head_concurrency", &self.head_concurrency)
            .finish_non_exhaustive()
    }
}

/// Build the application router.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/buckets", get(handlers::list_buckets))
        .route(
            "/buckets/:bucket_name",
            post(handlers::create_bucket).delete(handlers::delete_bucket),
        )
        .route(
            "/files",
            get(handlers::list_files).delete(handlers::delete_file),
        )
        .route("/files/upload", post(handlers::upload_file))
        .route("/files/create-folder", post(handlers::create_folder))
        .route("/files/copy", post(handlers::copy_file))
        .route("/files/download", get(handlers::download_file))
        .route("/files/download-zip", get(handlers::download_zip));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(build_cors(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins. `*` mirrors the request origin, since
/// credentials cannot be combined with a wildcard.
pub fn build_cors(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .expose_headers([header::ETAG, header::CONTENT_DISPOSITION])
}

/// Serve `app` on `listener` until ctrl-c.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
