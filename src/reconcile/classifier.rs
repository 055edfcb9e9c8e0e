use super::errors::ReconcileError;
use crate::github::{MergeableState, PullRequestSnapshot};

/// What the loop should do with one pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    MarkDirty,
    MarkClean,
    /// GitHub has not finished computing mergeability yet.
    Retry,
}

/// Map a PR's mergeability to an action.
///
/// Unrecognized states abort the run: they mean the upstream contract
/// changed and guessing would mislabel PRs.
pub fn classify(pr: &PullRequestSnapshot) -> Result<MergeAction, ReconcileError> {
    match &pr.mergeable {
        MergeableState::Conflicting => Ok(MergeAction::MarkDirty),
        MergeableState::Mergeable => Ok(MergeAction::MarkClean),
        MergeableState::Unknown => Ok(MergeAction::Retry),
        MergeableState::Unrecognized(value) => Err(ReconcileError::UnrecognizedMergeable {
            pr_number: pr.number,
            value: value.clone(),
        }),
    }
}
