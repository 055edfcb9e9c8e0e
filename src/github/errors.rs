use octocrab::Error as OctocrabError;
use thiserror::Error;

/// Message GitHub attaches to 403/404 responses when the token lacks a permission.
const NOT_ACCESSIBLE_MESSAGE: &str = "Resource not accessible by integration";

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub token not found: {0}")]
    TokenNotFound(String),

    #[error("GitHub repository not configured: {0}")]
    ConfigNotFound(String),

    /// The token may not perform this operation (HTTP 403/404 "Resource not
    /// accessible by integration").
    #[error("HTTP {status}: {message}")]
    NotAccessible { status: u16, message: String },

    /// A 404 that is not a permission problem, e.g. removing a label the PR
    /// does not carry.
    #[error("HTTP 404: {0}")]
    NotFound(String),

    #[error("malformed GitHub response: {0}")]
    MalformedResponse(String),

    #[error("GitHub API error: {0}")]
    ApiError(#[source] OctocrabError),
}

impl GitHubError {
    pub fn is_not_accessible(&self) -> bool {
        matches!(self, GitHubError::NotAccessible { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GitHubError::NotFound(_))
    }
}

impl From<OctocrabError> for GitHubError {
    fn from(err: OctocrabError) -> Self {
        let (status, message) = match &err {
            OctocrabError::GitHub { source, .. } => {
                (source.status_code.as_u16(), source.message.clone())
            }
            _ => return GitHubError::ApiError(err),
        };

        match status {
            403 | 404 if message.ends_with(NOT_ACCESSIBLE_MESSAGE) => {
                GitHubError::NotAccessible { status, message }
            }
            404 => GitHubError::NotFound(message),
            _ => GitHubError::ApiError(err),
        }
    }
}

impl From<serde_json::Error> for GitHubError {
    fn from(err: serde_json::Error) -> Self {
        GitHubError::MalformedResponse(err.to_string())
    }
}
