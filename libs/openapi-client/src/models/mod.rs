//! API models

use serde::{Deserialize, Serialize};

/// Project creation request sent to the build backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    /// Source reference exactly as the user entered it (trimmed)
    #[serde(rename = "gitURL")]
    pub git_url: String,

    /// Existing project slug to redeploy into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Project creation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectResponse {
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub data: Option<ProjectData>,
}

/// Project data assigned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(rename = "projectSlug")]
    pub project_slug: String,

    pub url: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
