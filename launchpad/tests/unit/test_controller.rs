//! Session controller tests with a fake build backend

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use launchpad::deploy::backend::{BuildBackend, BuildTicket};
use launchpad::deploy::controller::SessionController;
use launchpad::deploy::phase::{MarkerClassifier, Phase};
use launchpad::deploy::projects::{ProjectRegistry, ProjectStatus};
use launchpad::deploy::reference::RepoRef;
use launchpad::errors::{DeployError, LaunchpadError};
use launchpad::stream::connection::ConnectionManager;
use serde_json::json;
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

#[derive(Default)]
struct FakeBackend {
    calls: AtomicUsize,
    existing_ids: Mutex<Vec<Option<String>>>,
    gate: Option<Arc<Notify>>,
    fail: bool,
}

impl FakeBackend {
    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn existing_ids(&self) -> Vec<Option<String>> {
        self.existing_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildBackend for FakeBackend {
    async fn submit_build(
        &self,
        repo: &RepoRef,
        existing_id: Option<&str>,
    ) -> Result<BuildTicket, DeployError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.existing_ids
            .lock()
            .unwrap()
            .push(existing_id.map(str::to_string));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(DeployError::Transport("connection refused".to_string()));
        }

        let id = existing_id.map(str::to_string).unwrap_or_else(|| repo.repo.clone());
        Ok(BuildTicket {
            preview_url: format!("http://{}.localhost:8000", id),
            id,
        })
    }
}

struct Harness {
    controller: SessionController,
    connection: Arc<ConnectionManager>,
    projects: Arc<ProjectRegistry>,
}

fn harness(backend: Arc<FakeBackend>) -> Harness {
    let connection = Arc::new(ConnectionManager::new());
    let projects = Arc::new(ProjectRegistry::new());
    let controller = SessionController::new(
        backend,
        connection.clone(),
        Arc::new(MarkerClassifier::default()),
        projects.clone(),
    );
    Harness {
        controller,
        connection,
        projects,
    }
}

fn log_frame(channel: &str, line: &str) -> String {
    json!({"event": "message", "channel": channel, "data": {"log": line}}).to_string()
}

#[tokio::test]
async fn test_invalid_reference_makes_no_request() {
    let backend = Arc::new(FakeBackend::default());
    let h = harness(backend.clone());

    let err = assert_err!(h.controller.submit_reference("not-a-url").await);
    assert!(matches!(err, LaunchpadError::Validation(_)));
    assert_eq!(backend.calls(), 0);
    assert_eq!(h.controller.snapshot().phase, Phase::Idle);
}

#[tokio::test]
async fn test_accepted_build_follows_log_channel() {
    let backend = Arc::new(FakeBackend::default());
    let h = harness(backend.clone());

    let snapshot = assert_ok!(h.controller.submit_reference("https://github.com/acme/widget").await);
    assert_eq!(snapshot.phase, Phase::Building);
    assert_eq!(snapshot.id.as_deref(), Some("widget"));
    assert_eq!(snapshot.preview_url.as_deref(), Some("http://widget.localhost:8000"));
    assert_eq!(h.controller.subscribed_channel().as_deref(), Some("logs:widget"));
    assert_eq!(h.connection.channels(), vec!["logs:widget"]);

    for line in ["Cloning...", "Building...", "✅ Deployment completed"] {
        h.connection.dispatch(&log_frame("logs:widget", line));
    }

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Success);
    assert_eq!(snapshot.logs, vec!["Cloning...", "Building...", "✅ Deployment completed"]);
    assert_eq!(h.projects.get("widget").unwrap().status, ProjectStatus::Ready);
}

#[tokio::test]
async fn test_failed_request_adds_synthetic_line() {
    let backend = Arc::new(FakeBackend::failing());
    let h = harness(backend.clone());

    let err = assert_err!(h.controller.submit_reference("github.com/acme/widget").await);
    assert!(matches!(err, LaunchpadError::Deploy(DeployError::Transport(_))));

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Failed);
    assert_eq!(snapshot.logs.len(), 1);
    assert!(snapshot.logs[0].starts_with("❌ Deployment failed:"));
    assert!(h.connection.channels().is_empty());
    assert!(h.projects.is_empty());
}

#[tokio::test]
async fn test_watchers_see_every_step() {
    let backend = Arc::new(FakeBackend::default());
    let h = harness(backend);
    let mut updates = h.controller.watch();

    assert_ok!(h.controller.submit_reference("github.com/acme/widget").await);
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().phase, Phase::Building);

    h.connection.dispatch(&log_frame("logs:widget", "Build Failed: exit code 1"));
    assert_eq!(updates.borrow_and_update().phase, Phase::Failed);
}

#[tokio::test]
async fn test_submission_in_flight_is_rejected() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend::gated(gate.clone()));
    let h = harness(backend.clone());

    let first = tokio::spawn({
        let controller = h.controller.clone();
        async move { controller.submit_reference("github.com/acme/widget").await }
    });
    h.controller
        .watch()
        .wait_for(|s| s.phase == Phase::Submitting)
        .await
        .unwrap();

    let err = assert_err!(h.controller.submit_reference("github.com/acme/other").await);
    assert!(matches!(err, LaunchpadError::SubmissionInFlight));

    gate.notify_one();
    assert_ok!(first.await.unwrap());
    assert_eq!(backend.calls(), 1);
    assert_eq!(h.controller.snapshot().id.as_deref(), Some("widget"));
}

#[tokio::test]
async fn test_reset_discards_pending_response() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend::gated(gate.clone()));
    let h = harness(backend);

    let pending = tokio::spawn({
        let controller = h.controller.clone();
        async move { controller.submit_reference("github.com/acme/widget").await }
    });
    h.controller
        .watch()
        .wait_for(|s| s.phase == Phase::Submitting)
        .await
        .unwrap();

    let reset = h.controller.reset();
    assert_eq!(reset.phase, Phase::Idle);

    gate.notify_one();
    let err = assert_err!(pending.await.unwrap());
    assert!(matches!(err, LaunchpadError::StaleResponse));

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot, reset);
    assert!(snapshot.logs.is_empty());
    assert!(snapshot.id.is_none());
    assert!(h.connection.channels().is_empty());
    assert!(h.projects.is_empty());
}

#[tokio::test]
async fn test_lines_after_reset_are_ignored() {
    let backend = Arc::new(FakeBackend::default());
    let h = harness(backend);

    assert_ok!(h.controller.submit_reference("github.com/acme/widget").await);
    let old_generation = h.controller.generation();
    h.controller.reset();

    assert!(!h.controller.handle_line(old_generation, "✅ Deployment completed"));
    h.connection.dispatch(&log_frame("logs:widget", "late line"));

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(snapshot.logs.is_empty());
    assert_eq!(h.connection.stats().unrouted, 1);
}

#[tokio::test]
async fn test_resubmit_replaces_subscription() {
    let backend = Arc::new(FakeBackend::default());
    let h = harness(backend.clone());

    assert_ok!(h.controller.submit_reference("github.com/acme/widget").await);
    h.connection.dispatch(&log_frame("logs:widget", "Cloning..."));
    assert_ok!(h.controller.submit_reference("github.com/acme/gadget").await);

    assert_eq!(h.connection.channels(), vec!["logs:gadget"]);
    assert!(h.controller.snapshot().logs.is_empty());
    assert_eq!(backend.existing_ids(), vec![None, None]);
    assert_eq!(h.projects.len(), 2);
}

#[tokio::test]
async fn test_same_repository_reuses_job_slot() {
    let backend = Arc::new(FakeBackend::default());
    let h = harness(backend.clone());

    assert_ok!(h.controller.submit_reference("github.com/acme/widget").await);
    assert_ok!(h.controller.submit_reference("https://github.com/acme/widget").await);

    assert_eq!(backend.existing_ids(), vec![None, Some("widget".to_string())]);
    assert_eq!(h.projects.len(), 1);
}

#[tokio::test]
async fn test_redeploy_known_project() {
    let backend = Arc::new(FakeBackend::default());
    let h = harness(backend.clone());

    assert_ok!(h.controller.submit_reference("github.com/acme/widget").await);
    h.controller.reset();

    let snapshot = assert_ok!(h.controller.redeploy("widget").await);
    assert_eq!(snapshot.phase, Phase::Building);
    assert_eq!(backend.existing_ids().last().cloned().flatten().as_deref(), Some("widget"));
    assert_eq!(h.projects.get("widget").unwrap().status, ProjectStatus::Building);

    let err = assert_err!(h.controller.redeploy("ghost").await);
    assert!(matches!(err, LaunchpadError::NotFound(_)));
}

#[tokio::test]
async fn test_lines_before_acceptance_are_ignored() {
    let backend = Arc::new(FakeBackend::default());
    let h = harness(backend);

    assert!(!h.controller.handle_line(h.controller.generation(), "✅ Deployment completed"));

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(snapshot.logs.is_empty());
    assert!(snapshot.id.is_none());
}

#[tokio::test]
async fn test_line_while_submitting_does_not_block_acceptance() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend::gated(gate.clone()));
    let h = harness(backend);

    let pending = tokio::spawn({
        let controller = h.controller.clone();
        async move { controller.submit_reference("github.com/acme/widget").await }
    });
    h.controller
        .watch()
        .wait_for(|s| s.phase == Phase::Submitting)
        .await
        .unwrap();

    assert!(!h.controller.handle_line(h.controller.generation(), "Cloning..."));
    assert_eq!(h.controller.snapshot().phase, Phase::Submitting);

    gate.notify_one();
    let snapshot = assert_ok!(pending.await.unwrap());
    assert_eq!(snapshot.phase, Phase::Building);
    assert!(snapshot.logs.is_empty());
    assert_eq!(h.controller.subscribed_channel().as_deref(), Some("logs:widget"));
}
