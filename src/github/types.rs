use serde::{Deserialize, Serialize};

/// Mergeability as computed by GitHub for an open pull request.
///
/// Values outside the documented enum are kept verbatim so the classifier can
/// reject them instead of the decoder silently dropping the PR.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum MergeableState {
    Conflicting,
    Mergeable,
    Unknown,
    Unrecognized(String),
}

impl From<String> for MergeableState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CONFLICTING" => MergeableState::Conflicting,
            "MERGEABLE" => MergeableState::Mergeable,
            "UNKNOWN" => MergeableState::Unknown,
            _ => MergeableState::Unrecognized(value),
        }
    }
}

impl From<MergeableState> for String {
    fn from(state: MergeableState) -> Self {
        match state {
            MergeableState::Conflicting => "CONFLICTING".to_string(),
            MergeableState::Mergeable => "MERGEABLE".to_string(),
            MergeableState::Unknown => "UNKNOWN".to_string(),
            MergeableState::Unrecognized(value) => value,
        }
    }
}

/// One open pull request as observed by a single page fetch.
///
/// Labels are not re-read after this crate mutates them; a later fetch
/// produces a fresh snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSnapshot {
    pub number: u64,
    pub title: String,
    pub permalink: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub labels: Vec<String>,
    pub mergeable: MergeableState,
}

impl PullRequestSnapshot {
    /// GitHub label names are case-insensitive.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|name| name.eq_ignore_ascii_case(label))
    }
}

/// Parameters of one page query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// Continuation cursor; `None` starts from the first page.
    pub cursor: Option<String>,
    pub base_branch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestPage {
    pub items: Vec<PullRequestSnapshot>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl PullRequestPage {
    /// Cursor for the following page, if GitHub reported one.
    pub fn continuation(&self) -> Option<&str> {
        if self.has_more {
            self.next_cursor.as_deref()
        } else {
            None
        }
    }
}
