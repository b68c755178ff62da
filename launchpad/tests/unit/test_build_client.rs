//! Build API client tests against a mock backend

use std::time::Duration;

use launchpad::deploy::backend::BuildBackend;
use launchpad::deploy::reference::validate;
use launchpad::errors::DeployError;
use launchpad::http::client::HttpClient;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpClient {
    HttpClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_build_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/project"))
        .and(body_json(json!({"gitURL": "https://github.com/acme/widget"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "queued",
            "data": {"projectSlug": "brave-otter", "url": "http://brave-otter.localhost:8000"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repo = validate("https://github.com/acme/widget").unwrap();
    let ticket = client(&server).submit_build(&repo, None).await.unwrap();
    assert_eq!(ticket.id, "brave-otter");
    assert_eq!(ticket.preview_url, "http://brave-otter.localhost:8000");
}

#[tokio::test]
async fn test_redeploy_sends_slug() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/project"))
        .and(body_partial_json(json!({"slug": "brave-otter"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"projectSlug": "brave-otter", "url": "http://brave-otter.localhost:8000"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repo = validate("github.com/acme/widget").unwrap();
    let ticket = client(&server)
        .submit_build(&repo, Some("brave-otter"))
        .await
        .unwrap();
    assert_eq!(ticket.id, "brave-otter");
}

#[tokio::test]
async fn test_backend_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/project"))
        .respond_with(ResponseTemplate::new(500).set_body_string("clone failed"))
        .mount(&server)
        .await;

    let repo = validate("github.com/acme/widget").unwrap();
    let err = client(&server).submit_build(&repo, None).await.unwrap_err();
    assert_eq!(
        err,
        DeployError::Backend {
            status: 500,
            body: "clone failed".to_string()
        }
    );
}

#[tokio::test]
async fn test_missing_project_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .mount(&server)
        .await;

    let repo = validate("github.com/acme/widget").unwrap();
    let err = client(&server).submit_build(&repo, None).await.unwrap_err();
    assert_eq!(err, DeployError::MissingProjectData);
}

#[tokio::test]
async fn test_unreachable_backend() {
    let client = HttpClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let repo = validate("github.com/acme/widget").unwrap();
    let err = client.submit_build(&repo, None).await.unwrap_err();
    assert!(matches!(err, DeployError::Transport(_)));
}
