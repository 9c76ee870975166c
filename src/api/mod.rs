//! HTTP surface for the generation engine.
//!
//! Job endpoints are available to any authenticated caller and are always
//! scoped to that caller; administration endpoints (model groups, config
//! bundles, backends) require the superadmin role. Token verification is
//! delegated to an injected [`TokenAuthenticator`].

pub mod auth;
pub mod error;
mod handlers;

use crate::engine::GenerationEngine;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;

pub use auth::{Caller, Role, StaticTokenAuthenticator, TokenAuthenticator};
pub use error::{ApiError, ApiResult};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GenerationEngine>,
    pub auth: Arc<dyn TokenAuthenticator>,
}

impl AppState {
    pub fn new(engine: Arc<GenerationEngine>, auth: Arc<dyn TokenAuthenticator>) -> Self {
        Self { engine, auth }
    }
}

/// Build the API router. Exposed separately from [`serve`] so tests can
/// drive it without binding a socket.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/jobs", post(handlers::submit_job).get(handlers::list_jobs))
        .route("/api/jobs/{id}", get(handlers::get_job))
        .route("/api/jobs/{id}/cancel", post(handlers::cancel_job))
        .route(
            "/api/admin/model-groups",
            get(handlers::list_groups).post(handlers::create_group),
        )
        .route(
            "/api/admin/model-groups/{id}",
            get(handlers::get_group)
                .patch(handlers::update_group)
                .delete(handlers::delete_group),
        )
        .route("/api/admin/config/export", get(handlers::export_config))
        .route("/api/admin/config/import", post(handlers::import_config))
        .route("/api/admin/backends", get(handlers::list_backends))
        .route("/api/admin/backends/{id}/models", get(handlers::list_backend_models))
        .route("/api/admin/backends/{id}/test", post(handlers::test_backend))
        .route("/api/admin/backends/{id}/pull", post(handlers::pull_backend_model))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Start the HTTP server on the given address.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let router = app(state);

    let listener = TcpListener::bind(addr).await?;
    log::info!("articleforge API listening on http://{}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
