//! # pf-web
//!
//! HTTP boundary of photo-frame: gallery listing, multipart upload,
//! delete and raw photo serving over one [`PhotoStore`](pf_core::store::PhotoStore).
//!
//! ## Routes
//!
//! - `GET /api/photos`
//! - `POST /upload_photo`
//! - `POST /delete_photo`
//! - `GET /uploads/{filename}`

pub mod error;
pub mod handlers;
pub mod state;

pub use error::WebError;
pub use state::AppState;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use pf_core::config::models::AppConfig;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Most files accepted in a single upload request.
pub const MAX_BATCH_FILES: u64 = 32;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .max_file_bytes
        .saturating_mul(MAX_BATCH_FILES)
        .try_into()
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/api/photos", get(handlers::list_photos))
        .route("/upload_photo", post(handlers::upload_photo))
        .route("/delete_photo", post(handlers::delete_photo))
        .route("/uploads/{filename}", get(handlers::serve_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the web boundary until Ctrl-C or SIGTERM.
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(config));
    state
        .store
        .ensure_root()
        .with_context(|| format!("Failed to create store {}", config.store_dir.display()))?;

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(
        "Listening on {}, serving photos from {}",
        listener.local_addr()?,
        config.store_dir.display()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down...");
}
