//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use openapi_server::models::{
    DeployRequest, ErrorResponse, HealthResponse, ProjectListResponse, ProjectSummary,
    SessionResponse, VersionResponse,
};
use tracing::debug;

use crate::deploy::projects::Project;
use crate::deploy::session::SessionSnapshot;
use crate::errors::LaunchpadError;
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Error wrapper mapping controller errors to status codes
#[derive(Debug)]
pub struct ApiError(pub LaunchpadError);

impl From<LaunchpadError> for ApiError {
    fn from(err: LaunchpadError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            LaunchpadError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            LaunchpadError::SubmissionInFlight => (StatusCode::CONFLICT, "submission_in_flight"),
            LaunchpadError::StaleResponse => (StatusCode::CONFLICT, "stale_response"),
            LaunchpadError::Deploy(_) => (StatusCode::BAD_GATEWAY, "deploy_error"),
            LaunchpadError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        debug!("Request failed with {}: {}", status, self.0);

        let body = ErrorResponse {
            error: error.to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn session_response(snapshot: SessionSnapshot) -> SessionResponse {
    SessionResponse {
        phase: snapshot.phase.to_string(),
        logs: snapshot.logs,
        preview_url: snapshot.preview_url,
        id: snapshot.id,
        source_reference: snapshot.source_reference,
    }
}

fn project_summary(project: Project) -> ProjectSummary {
    ProjectSummary {
        id: project.id,
        name: project.name,
        url: project.url,
        status: project.status.as_str().to_string(),
        source_reference: project.source.source,
        last_deployed_at: project.last_deployed_at,
    }
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "launchpad".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Current session snapshot
pub async fn session_handler(State(state): State<Arc<ServerState>>) -> Json<SessionResponse> {
    Json(session_response(state.controller.snapshot()))
}

/// Submit a repository for deployment
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DeployRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let snapshot = state.controller.submit_reference(&request.repo_url).await?;
    Ok(Json(session_response(snapshot)))
}

/// Discard the current session
pub async fn reset_handler(State(state): State<Arc<ServerState>>) -> Json<SessionResponse> {
    Json(session_response(state.controller.reset()))
}

/// Deployed projects, newest first
pub async fn projects_handler(State(state): State<Arc<ServerState>>) -> Json<ProjectListResponse> {
    let projects: Vec<ProjectSummary> = state.projects.list().into_iter().map(project_summary).collect();
    let total = projects.len();
    Json(ProjectListResponse { projects, total })
}

/// Redeploy a known project into its job slot
pub async fn redeploy_handler(
    State(state): State<Arc<ServerState>>,
    Path(project_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let snapshot = state.controller.redeploy(&project_id).await?;
    Ok(Json(session_response(snapshot)))
}
