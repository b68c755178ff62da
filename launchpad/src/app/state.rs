//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::deploy::backend::BuildBackend;
use crate::deploy::controller::SessionController;
use crate::deploy::phase::MarkerClassifier;
use crate::deploy::projects::ProjectRegistry;
use crate::errors::LaunchpadError;
use crate::http::client::HttpClient;
use crate::stream::connection::ConnectionManager;

/// Main application state
pub struct AppState {
    /// Shared log stream connection
    pub connection: Arc<ConnectionManager>,

    /// Deployed projects
    pub projects: Arc<ProjectRegistry>,

    /// The deployment session controller
    pub controller: SessionController,
}

impl AppState {
    /// Initialize application state against the real build backend
    pub fn init(options: &AppOptions) -> Result<Self, LaunchpadError> {
        info!("Initializing application state...");

        let http_client = Arc::new(HttpClient::new(
            &options.build_api_url,
            options.request_timeout,
        )?);

        Ok(Self::with_backend(options, http_client))
    }

    /// Initialize application state with any build backend
    pub fn with_backend(options: &AppOptions, backend: Arc<dyn BuildBackend>) -> Self {
        let connection = Arc::new(ConnectionManager::new());
        let projects = Arc::new(ProjectRegistry::new());
        let classifier = Arc::new(MarkerClassifier::new(
            options.success_markers.clone(),
            options.failure_markers.clone(),
        ));

        let controller = SessionController::new(
            backend,
            connection.clone(),
            classifier,
            projects.clone(),
        );

        Self {
            connection,
            projects,
            controller,
        }
    }

    /// Shutdown application state
    pub fn shutdown(&self) {
        info!("Shutting down application state...");
        self.controller.reset();
    }
}
