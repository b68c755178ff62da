//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::LaunchpadError;
use crate::server::handlers::{
    deploy_handler, health_handler, projects_handler, redeploy_handler, reset_handler,
    session_handler, version_handler,
};
use crate::server::state::ServerState;

/// Routes of the control server
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Session
        .route("/session", get(session_handler))
        .route("/session/deploy", post(deploy_handler))
        .route("/session/reset", post(reset_handler))
        // Projects
        .route("/projects", get(projects_handler))
        .route("/projects/{id}/redeploy", post(redeploy_handler))
        // State and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), LaunchpadError>>, LaunchpadError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting control server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| LaunchpadError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| LaunchpadError::ServerError(e.to_string()))
    });

    Ok(handle)
}
