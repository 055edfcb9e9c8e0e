use tracing::warn;

use super::errors::ReconcileError;
use crate::github::GitHubError;
use crate::observability::ReconcileMetrics;

/// How label and comment mutations treat a token without write access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionPolicy {
    pub continue_on_missing_permissions: bool,
}

impl PermissionPolicy {
    pub fn new(continue_on_missing_permissions: bool) -> Self {
        Self {
            continue_on_missing_permissions,
        }
    }

    /// Settle the result of one mutation.
    ///
    /// Returns `Ok(true)` when the mutation happened and `Ok(false)` when a
    /// permission denial was tolerated. Other failures go through `other`.
    pub fn settle(
        &self,
        result: Result<(), GitHubError>,
        pr_number: u64,
        action: &str,
        metrics: &ReconcileMetrics,
        other: impl FnOnce(GitHubError) -> ReconcileError,
    ) -> Result<bool, ReconcileError> {
        match result {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_accessible() => {
                if self.continue_on_missing_permissions {
                    metrics.record_permission_degradation();
                    warn!(
                        pr_number,
                        "Could not {} on #{}: {}. Continuing due to continueOnMissingPermissions.",
                        action,
                        pr_number,
                        err
                    );
                    Ok(false)
                } else {
                    Err(ReconcileError::MissingPermissions {
                        action: action.to_string(),
                        pr_number,
                        source: err,
                    })
                }
            }
            Err(err) => Err(other(err)),
        }
    }
}
