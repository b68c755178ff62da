//! Project build API client

use async_trait::async_trait;
use openapi_client::models::{CreateProjectRequest, CreateProjectResponse};
use tracing::info;

use crate::deploy::backend::{BuildBackend, BuildTicket};
use crate::deploy::reference::RepoRef;
use crate::errors::DeployError;
use crate::http::client::HttpClient;

#[async_trait]
impl BuildBackend for HttpClient {
    async fn submit_build(
        &self,
        repo: &RepoRef,
        existing_id: Option<&str>,
    ) -> Result<BuildTicket, DeployError> {
        let request = CreateProjectRequest {
            git_url: repo.source.clone(),
            slug: existing_id.map(str::to_string),
        };

        let response: CreateProjectResponse = self.post("/project", &request).await?;
        let data = response.data.ok_or(DeployError::MissingProjectData)?;

        info!("Build queued for {} as {}", repo, data.project_slug);
        Ok(BuildTicket {
            id: data.project_slug,
            preview_url: data.url,
        })
    }
}
