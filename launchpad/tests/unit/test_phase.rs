//! Phase classification and session log tests

use launchpad::deploy::phase::{next_phase, MarkerClassifier, Phase, PhaseClassifier};
use launchpad::deploy::session::DeploymentSession;
use launchpad::deploy::reference::validate;

fn building_session() -> DeploymentSession {
    let mut session = DeploymentSession::submitting(1, validate("github.com/acme/widget").unwrap());
    session
        .accept("widget".to_string(), "http://widget.localhost:8000".to_string())
        .unwrap();
    session
}

#[test]
fn test_successful_build() {
    let classifier = MarkerClassifier::default();
    let mut session = building_session();

    for line in ["Cloning...", "Building...", "✅ Deployment completed"] {
        session.push_line(line.to_string(), &classifier);
    }

    assert_eq!(session.phase(), Phase::Success);
    assert_eq!(
        session.logs(),
        &["Cloning...", "Building...", "✅ Deployment completed"]
    );
}

#[test]
fn test_failure_is_sticky() {
    let classifier = MarkerClassifier::default();
    let mut session = building_session();

    assert_eq!(
        session.push_line("Build Failed: exit code 1".to_string(), &classifier),
        Phase::Failed
    );
    assert_eq!(
        session.push_line("✅ Deployment completed".to_string(), &classifier),
        Phase::Failed
    );
    assert_eq!(session.logs().len(), 2);
}

#[test]
fn test_incidental_substring_match() {
    assert_eq!(next_phase(Phase::Building, "0 Errors found"), Phase::Failed);
}

#[test]
fn test_plain_lines_keep_building() {
    assert_eq!(next_phase(Phase::Building, "npm install"), Phase::Building);
    assert_eq!(next_phase(Phase::Building, ""), Phase::Building);
}

#[test]
fn test_terminal_phases_never_move() {
    let lines = ["Deployment completed", "❌ broke", "Cloning...", "✅", "Failed"];
    for terminal in [Phase::Success, Phase::Failed] {
        for line in lines {
            assert_eq!(next_phase(terminal, line), terminal);
        }
    }
}

#[test]
fn test_custom_markers() {
    let classifier = MarkerClassifier::new(vec!["LIVE".to_string()], vec!["BROKEN".to_string()]);
    assert_eq!(classifier.next_phase(Phase::Building, "✅ Deployment completed"), Phase::Building);
    assert_eq!(classifier.next_phase(Phase::Building, "site is LIVE"), Phase::Success);
    assert_eq!(classifier.next_phase(Phase::Building, "BROKEN pipe"), Phase::Failed);
}

#[test]
fn test_phase_serialization() {
    assert_eq!(serde_json::to_string(&Phase::Submitting).unwrap(), "\"submitting\"");
    assert!(Phase::Success.is_terminal());
    assert!(!Phase::Building.is_terminal());
}
