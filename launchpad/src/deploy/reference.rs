//! Source reference validation

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

static GITHUB_REPO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?github\.com/([^/]+)/([^/]+)/?$")
        .expect("repository pattern is valid")
});

/// A validated GitHub repository reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,

    /// Trimmed input the reference was parsed from
    pub source: String,
}

impl RepoRef {
    /// Canonical https URL of the repository
    pub fn canonical_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Validate a user-supplied repository URL
pub fn validate(input: &str) -> Result<RepoRef, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let captures = GITHUB_REPO
        .captures(trimmed)
        .ok_or_else(|| ValidationError::Invalid(trimmed.to_string()))?;

    Ok(RepoRef {
        owner: captures[1].to_string(),
        repo: captures[2].to_string(),
        source: trimmed.to_string(),
    })
}
