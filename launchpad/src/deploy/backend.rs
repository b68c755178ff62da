//! Build backend seam

use async_trait::async_trait;

use crate::deploy::reference::RepoRef;
use crate::errors::DeployError;

/// What the backend hands back for an accepted build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTicket {
    /// Job identifier, also the log channel suffix
    pub id: String,
    pub preview_url: String,
}

/// Submits build requests.
///
/// Exactly one backend call per invocation, no retries. `existing_id`
/// redeploys into an existing job slot instead of allocating a new one.
#[async_trait]
pub trait BuildBackend: Send + Sync {
    async fn submit_build(
        &self,
        repo: &RepoRef,
        existing_id: Option<&str>,
    ) -> Result<BuildTicket, DeployError>;
}
