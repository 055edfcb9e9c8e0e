use thiserror::Error;

use crate::github::GitHubError;

/// Fatal failures of a reconciliation run
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("unhandled mergeable state '{value}' on PR #{pr_number}")]
    UnrecognizedMergeable { pr_number: u64, value: String },

    #[error("missing permissions to {action} on PR #{pr_number}: {source}")]
    MissingPermissions {
        action: String,
        pr_number: u64,
        #[source]
        source: GitHubError,
    },

    #[error("error adding \"{label}\": {source}")]
    AddLabel {
        label: String,
        #[source]
        source: GitHubError,
    },

    #[error("error removing \"{label}\": {source}")]
    RemoveLabel {
        label: String,
        #[source]
        source: GitHubError,
    },

    #[error("error commenting on PR #{pr_number}: {source}")]
    Comment {
        pr_number: u64,
        #[source]
        source: GitHubError,
    },

    #[error("failed to fetch open pull requests: {0}")]
    Fetch(#[source] GitHubError),
}
