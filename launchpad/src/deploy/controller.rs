//! Deployment session controller

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::deploy::backend::BuildBackend;
use crate::deploy::phase::{Phase, PhaseClassifier};
use crate::deploy::projects::{ProjectRegistry, ProjectStatus};
use crate::deploy::reference::{validate, RepoRef};
use crate::deploy::session::{DeploymentSession, SessionSnapshot};
use crate::errors::LaunchpadError;
use crate::stream::connection::{ConnectionManager, LineHandler, Subscription};
use crate::stream::payload::log_channel;

struct ControllerState {
    session: DeploymentSession,
    subscription: Option<Subscription>,
}

struct Shared {
    backend: Arc<dyn BuildBackend>,
    connection: Arc<ConnectionManager>,
    classifier: Arc<dyn PhaseClassifier>,
    projects: Arc<ProjectRegistry>,
    state: Mutex<ControllerState>,
    updates: watch::Sender<SessionSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, session: &DeploymentSession) {
        self.updates.send_replace(session.snapshot());
    }

    fn handle_line(&self, generation: u64, line: String) -> bool {
        let mut state = self.lock();
        if state.session.generation() != generation {
            debug!(
                target: "launchpad::diagnostics",
                generation,
                current = state.session.generation(),
                "Discarding line from superseded session"
            );
            return false;
        }
        if state.session.id().is_none() {
            debug!(
                target: "launchpad::diagnostics",
                generation,
                phase = %state.session.phase(),
                "Discarding line for a session without an accepted build"
            );
            return false;
        }

        let before = state.session.phase();
        let after = state.session.push_line(line, self.classifier.as_ref());
        if before != after {
            info!("Deployment phase {} -> {}", before, after);
            if let (Some(id), Some(status)) = (state.session.id(), ProjectStatus::from_phase(after)) {
                self.projects.set_status(id, status);
            }
        }
        self.publish(&state.session);
        true
    }
}

/// Owns the current deployment session and is the only thing a renderer
/// needs to observe.
///
/// A submission while a build request is in flight is rejected with
/// [`LaunchpadError::SubmissionInFlight`]. Any other submission replaces the
/// current session with a new one; when it targets the same repository the
/// previous job id is passed along so the backend redeploys into that slot.
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl SessionController {
    pub fn new(
        backend: Arc<dyn BuildBackend>,
        connection: Arc<ConnectionManager>,
        classifier: Arc<dyn PhaseClassifier>,
        projects: Arc<ProjectRegistry>,
    ) -> Self {
        let session = DeploymentSession::new(0);
        let (updates, _) = watch::channel(session.snapshot());

        Self {
            shared: Arc::new(Shared {
                backend,
                connection,
                classifier,
                projects,
                state: Mutex::new(ControllerState {
                    session,
                    subscription: None,
                }),
                updates,
            }),
        }
    }

    /// Current session state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.lock().session.snapshot()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Generation of the current session
    pub fn generation(&self) -> u64 {
        self.shared.lock().session.generation()
    }

    /// Channel of the live log subscription, if any
    pub fn subscribed_channel(&self) -> Option<String> {
        self.shared
            .lock()
            .subscription
            .as_ref()
            .map(|s| s.channel().to_string())
    }

    pub fn projects(&self) -> Arc<ProjectRegistry> {
        self.shared.projects.clone()
    }

    /// Validate `input` and start a deployment for it
    pub async fn submit_reference(&self, input: &str) -> Result<SessionSnapshot, LaunchpadError> {
        let repo = match validate(input) {
            Ok(repo) => repo,
            Err(e) => {
                info!("Rejected source reference {:?}: {}", input, e);
                return Err(e.into());
            }
        };
        self.submit(repo, None).await
    }

    /// Redeploy a known project into its existing job slot
    pub async fn redeploy(&self, project_id: &str) -> Result<SessionSnapshot, LaunchpadError> {
        let project = self
            .shared
            .projects
            .get(project_id)
            .ok_or_else(|| LaunchpadError::NotFound(format!("project {}", project_id)))?;
        self.submit(project.source, Some(project.id)).await
    }

    /// Feed one streamed line to the session of `generation`.
    ///
    /// Returns false when the line belongs to a superseded session or the
    /// build request has not been accepted yet.
    pub fn handle_line(&self, generation: u64, line: impl Into<String>) -> bool {
        self.shared.handle_line(generation, line.into())
    }

    /// Drop the subscription and start over with an idle session
    pub fn reset(&self) -> SessionSnapshot {
        let mut state = self.shared.lock();
        if let Some(subscription) = state.subscription.take() {
            subscription.unsubscribe();
        }
        let generation = state.session.generation() + 1;
        state.session = DeploymentSession::new(generation);
        info!(generation, "Session reset");

        self.shared.publish(&state.session);
        state.session.snapshot()
    }

    async fn submit(
        &self,
        repo: RepoRef,
        existing_id: Option<String>,
    ) -> Result<SessionSnapshot, LaunchpadError> {
        let (generation, existing_id) = {
            let mut state = self.shared.lock();
            if state.session.phase() == Phase::Submitting {
                warn!("Rejecting submission of {}: a build request is in flight", repo);
                return Err(LaunchpadError::SubmissionInFlight);
            }

            let existing_id = existing_id.or_else(|| inherited_id(&state.session, &repo));
            if let Some(subscription) = state.subscription.take() {
                subscription.unsubscribe();
            }
            let generation = state.session.generation() + 1;
            state.session = DeploymentSession::submitting(generation, repo.clone());
            self.shared.publish(&state.session);
            (generation, existing_id)
        };

        info!(generation, existing_id = ?existing_id, "Submitting build for {}", repo);
        let result = self
            .shared
            .backend
            .submit_build(&repo, existing_id.as_deref())
            .await;

        let mut state = self.shared.lock();
        if state.session.generation() != generation {
            debug!(
                target: "launchpad::diagnostics",
                generation,
                current = state.session.generation(),
                "Discarding stale build response"
            );
            return Err(LaunchpadError::StaleResponse);
        }

        match result {
            Ok(ticket) => {
                state
                    .session
                    .accept(ticket.id.clone(), ticket.preview_url.clone())
                    .map_err(LaunchpadError::InvalidTransition)?;
                self.shared.projects.record(&ticket, &repo);

                let shared = Arc::downgrade(&self.shared);
                let handler: LineHandler = Arc::new(move |line| {
                    if let Some(shared) = shared.upgrade() {
                        shared.handle_line(generation, line);
                    }
                });
                state.subscription = Some(
                    self.shared
                        .connection
                        .subscribe(log_channel(&ticket.id), handler),
                );

                info!("Build {} accepted, preview at {}", ticket.id, ticket.preview_url);
                self.shared.publish(&state.session);
                Ok(state.session.snapshot())
            }
            Err(e) => {
                warn!("Build request for {} failed: {}", repo, e);
                state
                    .session
                    .reject(format!(
                        "❌ Deployment failed: {}. Please check your repository URL and try again.",
                        e
                    ))
                    .map_err(LaunchpadError::InvalidTransition)?;
                if let Some(id) = existing_id.as_deref() {
                    self.shared.projects.set_status(id, ProjectStatus::Error);
                }
                self.shared.publish(&state.session);
                Err(e.into())
            }
        }
    }
}

/// Job id to reuse when `repo` is resubmitted over `session`
fn inherited_id(session: &DeploymentSession, repo: &RepoRef) -> Option<String> {
    let source = session.source()?;
    if source.owner == repo.owner && source.repo == repo.repo {
        session.id().map(str::to_string)
    } else {
        None
    }
}
