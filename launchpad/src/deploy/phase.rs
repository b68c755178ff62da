//! Deployment phases and log line classification

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a deployment session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Nothing submitted yet
    #[default]
    Idle,

    /// Build request in flight
    Submitting,

    /// Build accepted, streaming logs
    Building,

    /// Deployment completed
    Success,

    /// Build request or build failed
    Failed,
}

impl Phase {
    /// Success and Failed never change for a session
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Success | Phase::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Submitting => "submitting",
            Phase::Building => "building",
            Phase::Success => "success",
            Phase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a streamed log line to the next phase
pub trait PhaseClassifier: Send + Sync {
    fn next_phase(&self, current: Phase, line: &str) -> Phase;
}

pub const DEFAULT_SUCCESS_MARKERS: &[&str] = &["✅", "Deployment completed"];
pub const DEFAULT_FAILURE_MARKERS: &[&str] = &["❌", "Error", "Failed"];

/// Substring based classifier.
///
/// Any line that merely contains a marker triggers the transition, so a line
/// like "0 Errors found" ends the session as failed. Success markers are
/// checked before failure markers.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    success_markers: Vec<String>,
    failure_markers: Vec<String>,
}

impl MarkerClassifier {
    /// Empty markers are dropped, they would match every line
    pub fn new(success_markers: Vec<String>, failure_markers: Vec<String>) -> Self {
        let non_empty = |markers: Vec<String>| -> Vec<String> {
            markers.into_iter().filter(|m| !m.is_empty()).collect()
        };
        Self {
            success_markers: non_empty(success_markers),
            failure_markers: non_empty(failure_markers),
        }
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_SUCCESS_MARKERS.iter().map(|m| m.to_string()).collect(),
            DEFAULT_FAILURE_MARKERS.iter().map(|m| m.to_string()).collect(),
        )
    }
}

impl PhaseClassifier for MarkerClassifier {
    fn next_phase(&self, current: Phase, line: &str) -> Phase {
        if current.is_terminal() {
            return current;
        }
        if self.success_markers.iter().any(|m| line.contains(m.as_str())) {
            return Phase::Success;
        }
        if self.failure_markers.iter().any(|m| line.contains(m.as_str())) {
            return Phase::Failed;
        }
        Phase::Building
    }
}

/// Classify with the default markers
pub fn next_phase(current: Phase, line: &str) -> Phase {
    MarkerClassifier::default().next_phase(current, line)
}
