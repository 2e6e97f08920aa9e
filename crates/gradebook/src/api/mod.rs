//! HTTP JSON API for student records.
//!
//! Routes map one-to-one onto [`Gateway`] operations. Every failure is turned
//! into a status code and a `{"message": ...}` body at this boundary.

pub mod handlers;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::storage::{SharedStorage, Storage};

/// Shared state accessible by all API handlers.
#[derive(Debug, Clone)]
pub struct ApiState {
    /// The record gateway.
    pub gateway: Arc<Gateway>,
}

impl ApiState {
    /// Wrap a gateway for use as router state.
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

/// Build the API router with all routes.
pub fn build_router(state: ApiState, cors_enabled: bool) -> Router {
    let router = Router::new()
        .merge(handlers::student_routes())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

fn message_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

async fn route_not_found(uri: Uri) -> Response {
    message_response(StatusCode::NOT_FOUND, format!("route not found: {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    message_response(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("method {method} not allowed on {}", uri.path()),
    )
}

/// Open the configured store and serve the API until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the address cannot be
/// bound, or the server fails while running.
pub async fn serve(config: &Config) -> Result<()> {
    let storage = Storage::open(config.database_path())?;
    let gateway = Gateway::new(Arc::new(SharedStorage::new(storage)));
    let app = build_router(ApiState::new(gateway), config.server.cors_enabled);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| Error::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("Server running on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

impl Error {
    /// The HTTP status this error is reported with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        if self.is_validation_error() {
            StatusCode::BAD_REQUEST
        } else if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        message_response(status, self.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}
