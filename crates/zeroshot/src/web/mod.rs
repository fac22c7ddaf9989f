//! Web interface: the form page plus a small JSON API.

mod error;
mod handlers;
mod page;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use zeroshot_core::config::InterfaceConfig;
use zeroshot_core::{Classifier, Config, Gallery, ImageDecoder};

use page::Page;

/// Room for multipart boundaries and the text fields on top of the image.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared, read-only application state.
pub struct AppState {
    pub classifier: Classifier,
    pub decoder: ImageDecoder,
    pub gallery: Gallery,
    pub interface: InterfaceConfig,
    /// Include error call sites and cause chains in responses
    pub debug: bool,
    pub start_time: Instant,
    page: Page,
}

impl AppState {
    pub fn new(classifier: Classifier, config: &Config) -> anyhow::Result<Self> {
        let page = Page::new().context("Failed to compile page template")?;
        Ok(Self {
            classifier,
            decoder: ImageDecoder::new(config.limits.clone()),
            gallery: Gallery::from_config(config),
            interface: config.interface.clone(),
            debug: config.server.debug,
            start_time: Instant::now(),
            page,
        })
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .decoder
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/classify", post(handlers::classify))
        .route("/api/examples", get(handlers::list_examples))
        .route("/api/examples/{index}", get(handlers::example_result))
        .route("/examples/{index}/image", get(handlers::example_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
