//! Error types for launchpad

use thiserror::Error;

/// Rejection of a user-supplied source reference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Enter a GitHub repository URL")]
    Empty,

    #[error("Enter valid Github Repository URL")]
    Invalid(String),
}

/// Failure of a build request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("backend response is missing project data")]
    MissingProjectData,
}

impl From<reqwest::Error> for DeployError {
    fn from(err: reqwest::Error) -> Self {
        DeployError::Transport(err.to_string())
    }
}

/// A stream payload that could not be turned into a log line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("message frame has no channel")]
    MissingChannel,

    #[error("payload has no `log` field")]
    MissingLog,
}

/// Main error type for launchpad
#[derive(Error, Debug)]
pub enum LaunchpadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Deployment failed: {0}")]
    Deploy(#[from] DeployError),

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("Response belongs to a superseded submission")]
    StaleResponse,

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
