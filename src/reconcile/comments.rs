use tracing::info;

use super::errors::ReconcileError;
use super::permissions::PermissionPolicy;
use crate::github::{PullRequestHost, PullRequestSnapshot};
use crate::observability::ReconcileMetrics;

/// Posts the configured transition comment on a PR.
///
/// Callers only invoke this after the dirty label actually changed, which is
/// what keeps repeated runs from re-notifying.
pub struct CommentNotifier<'a, H: PullRequestHost + ?Sized> {
    host: &'a H,
    policy: PermissionPolicy,
    metrics: &'a ReconcileMetrics,
}

impl<'a, H: PullRequestHost + ?Sized> CommentNotifier<'a, H> {
    pub fn new(host: &'a H, policy: PermissionPolicy, metrics: &'a ReconcileMetrics) -> Self {
        Self {
            host,
            policy,
            metrics,
        }
    }

    /// Returns whether a comment was posted. The body is sent verbatim.
    pub async fn post_comment(
        &self,
        pr: &PullRequestSnapshot,
        body: Option<&str>,
    ) -> Result<bool, ReconcileError> {
        let Some(body) = body.filter(|body| !body.is_empty()) else {
            return Ok(false);
        };

        let result = self.host.create_comment(pr.number, body).await;
        let posted = self.policy.settle(
            result,
            pr.number,
            "create comment",
            self.metrics,
            |source| ReconcileError::Comment {
                pr_number: pr.number,
                source,
            },
        )?;

        if posted {
            self.metrics.record_comment();
            info!("Commented on #{}", pr.number);
        }
        Ok(posted)
    }
}
