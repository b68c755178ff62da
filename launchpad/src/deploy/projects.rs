//! Deployed project registry

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deploy::backend::BuildTicket;
use crate::deploy::phase::Phase;
use crate::deploy::reference::RepoRef;

/// Dashboard status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Ready,
    Building,
    Error,
}

impl ProjectStatus {
    /// Status shown for a session phase; idle has no project yet
    pub fn from_phase(phase: Phase) -> Option<Self> {
        match phase {
            Phase::Idle => None,
            Phase::Submitting | Phase::Building => Some(ProjectStatus::Building),
            Phase::Success => Some(ProjectStatus::Ready),
            Phase::Failed => Some(ProjectStatus::Error),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Ready => "ready",
            ProjectStatus::Building => "building",
            ProjectStatus::Error => "error",
        }
    }
}

/// A project the backend accepted at least once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub url: String,
    pub source: RepoRef,
    pub status: ProjectStatus,
    pub last_deployed_at: DateTime<Utc>,
}

/// In-memory list of projects, most recently created first
#[derive(Default)]
pub struct ProjectRegistry {
    projects: RwLock<Vec<Project>>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted build. A known id is updated in place.
    pub fn record(&self, ticket: &BuildTicket, source: &RepoRef) -> Project {
        let mut projects = self.projects.write().unwrap_or_else(|e| e.into_inner());

        let project = Project {
            id: ticket.id.clone(),
            name: source.repo.clone(),
            url: ticket.preview_url.clone(),
            source: source.clone(),
            status: ProjectStatus::Building,
            last_deployed_at: Utc::now(),
        };

        match projects.iter_mut().find(|p| p.id == ticket.id) {
            Some(existing) => *existing = project.clone(),
            None => projects.insert(0, project.clone()),
        }
        project
    }

    /// Update the status of a project, returns false for unknown ids
    pub fn set_status(&self, id: &str, status: ProjectStatus) -> bool {
        let mut projects = self.projects.write().unwrap_or_else(|e| e.into_inner());
        match projects.iter_mut().find(|p| p.id == id) {
            Some(project) => {
                project.status = status;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<Project> {
        let projects = self.projects.read().unwrap_or_else(|e| e.into_inner());
        projects.iter().find(|p| p.id == id).cloned()
    }

    pub fn list(&self) -> Vec<Project> {
        let projects = self.projects.read().unwrap_or_else(|e| e.into_inner());
        projects.clone()
    }

    pub fn len(&self) -> usize {
        let projects = self.projects.read().unwrap_or_else(|e| e.into_inner());
        projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
