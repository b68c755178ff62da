//! Deployment session state

use serde::{Deserialize, Serialize};

use crate::deploy::phase::{Phase, PhaseClassifier};
use crate::deploy::reference::RepoRef;

/// Read-only view of a session handed to the rendering layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<String>,
}

/// One submission attempt and everything observed for it
#[derive(Debug, Clone, Default)]
pub struct DeploymentSession {
    generation: u64,
    id: Option<String>,
    source: Option<RepoRef>,
    preview_url: Option<String>,
    phase: Phase,
    logs: Vec<String>,
}

impl DeploymentSession {
    /// Fresh idle session
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            ..Default::default()
        }
    }

    /// Session whose build request is about to be sent
    pub fn submitting(generation: u64, source: RepoRef) -> Self {
        Self {
            generation,
            source: Some(source),
            phase: Phase::Submitting,
            ..Default::default()
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn source(&self) -> Option<&RepoRef> {
        self.source.as_ref()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Record the backend's acceptance of the build request
    pub fn accept(&mut self, id: String, preview_url: String) -> Result<(), String> {
        if self.phase != Phase::Submitting {
            return Err(format!("Invalid transition: {:?} -> accepted", self.phase));
        }
        self.id = Some(id);
        self.preview_url = Some(preview_url);
        self.phase = Phase::Building;
        Ok(())
    }

    /// Record a failed build request with a single synthetic log line
    pub fn reject(&mut self, line: String) -> Result<(), String> {
        if self.phase != Phase::Submitting {
            return Err(format!("Invalid transition: {:?} -> rejected", self.phase));
        }
        self.logs.push(line);
        self.phase = Phase::Failed;
        Ok(())
    }

    /// Append a streamed line and advance the phase
    pub fn push_line(&mut self, line: String, classifier: &dyn PhaseClassifier) -> Phase {
        self.phase = classifier.next_phase(self.phase, &line);
        self.logs.push(line);
        self.phase
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            logs: self.logs.clone(),
            preview_url: self.preview_url.clone(),
            id: self.id.clone(),
            source_reference: self.source.as_ref().map(|s| s.source.clone()),
        }
    }
}
