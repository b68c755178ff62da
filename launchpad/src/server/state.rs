//! Server state

use std::sync::Arc;

use crate::deploy::controller::SessionController;
use crate::deploy::projects::ProjectRegistry;

/// Server state shared across handlers
pub struct ServerState {
    pub controller: SessionController,
    pub projects: Arc<ProjectRegistry>,
}

impl ServerState {
    pub fn new(controller: SessionController, projects: Arc<ProjectRegistry>) -> Self {
        Self {
            controller,
            projects,
        }
    }
}
