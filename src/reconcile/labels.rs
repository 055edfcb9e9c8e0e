use tracing::{debug, info};

use super::errors::ReconcileError;
use super::permissions::PermissionPolicy;
use crate::github::{PullRequestHost, PullRequestSnapshot};
use crate::observability::ReconcileMetrics;

/// Effect of an idempotent label operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelChange {
    Added,
    Removed,
    Unchanged,
}

/// Converges one label on one PR, touching the API only when the fetched
/// snapshot disagrees with the desired state.
pub struct LabelReconciler<'a, H: PullRequestHost + ?Sized> {
    host: &'a H,
    policy: PermissionPolicy,
    metrics: &'a ReconcileMetrics,
}

impl<'a, H: PullRequestHost + ?Sized> LabelReconciler<'a, H> {
    pub fn new(host: &'a H, policy: PermissionPolicy, metrics: &'a ReconcileMetrics) -> Self {
        Self {
            host,
            policy,
            metrics,
        }
    }

    pub async fn ensure_label(
        &self,
        pr: &PullRequestSnapshot,
        label: &str,
    ) -> Result<LabelChange, ReconcileError> {
        if pr.has_label(label) {
            info!("Issue #{} already has label '{}'. Skipping.", pr.number, label);
            return Ok(LabelChange::Unchanged);
        }

        let result = self.host.add_label(pr.number, label).await;
        let applied = self.policy.settle(
            result,
            pr.number,
            &format!("add label \"{label}\""),
            self.metrics,
            |source| ReconcileError::AddLabel {
                label: label.to_string(),
                source,
            },
        )?;

        if applied {
            self.metrics.record_label_added();
            Ok(LabelChange::Added)
        } else {
            Ok(LabelChange::Unchanged)
        }
    }

    /// Remove `label` if the PR carries it. `None` or an empty name means no
    /// label is configured and nothing is called.
    pub async fn ensure_label_absent(
        &self,
        pr: &PullRequestSnapshot,
        label: Option<&str>,
    ) -> Result<LabelChange, ReconcileError> {
        let Some(label) = label.filter(|name| !name.is_empty()) else {
            return Ok(LabelChange::Unchanged);
        };

        if !pr.has_label(label) {
            debug!("Issue #{} does not have label '{}'. Skipping.", pr.number, label);
            return Ok(LabelChange::Unchanged);
        }

        let result = match self.host.remove_label(pr.number, label).await {
            Err(err) if err.is_not_found() => {
                info!(
                    "On #{} label \"{}\" doesn't need to be removed since it doesn't exist on that issue.",
                    pr.number, label
                );
                return Ok(LabelChange::Unchanged);
            }
            result => result,
        };

        let applied = self.policy.settle(
            result,
            pr.number,
            &format!("remove label \"{label}\""),
            self.metrics,
            |source| ReconcileError::RemoveLabel {
                label: label.to_string(),
                source,
            },
        )?;

        if applied {
            self.metrics.record_label_removed();
            Ok(LabelChange::Removed)
        } else {
            Ok(LabelChange::Unchanged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{GitHubError, MergeableState, MockPullRequestHost};

    fn pr_with_labels(number: u64, labels: &[&str]) -> PullRequestSnapshot {
        PullRequestSnapshot {
            number,
            title: format!("PR {number}"),
            permalink: format!("https://github.com/acme/widgets/pull/{number}"),
            updated_at: chrono::Utc::now(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            mergeable: MergeableState::Conflicting,
        }
    }

    fn denied(status: u16) -> GitHubError {
        GitHubError::NotAccessible {
            status,
            message: "Resource not accessible by integration".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ensure_label_skips_present_label() {
        // No expectations: any API call panics
        let host = MockPullRequestHost::new();
        let metrics = ReconcileMetrics::new();
        let labels = LabelReconciler::new(&host, PermissionPolicy::default(), &metrics);

        let change = labels
            .ensure_label(&pr_with_labels(42, &["dirty"]), "dirty")
            .await
            .unwrap();
        assert_eq!(change, LabelChange::Unchanged);
    }

    #[tokio::test]
    async fn test_ensure_label_adds_missing_label() {
        let mut host = MockPullRequestHost::new();
        host.expect_add_label()
            .withf(|number, label| *number == 42 && label == "dirty")
            .times(1)
            .returning(|_, _| Ok(()));
        let metrics = ReconcileMetrics::new();
        let labels = LabelReconciler::new(&host, PermissionPolicy::default(), &metrics);

        let change = labels
            .ensure_label(&pr_with_labels(42, &["needs-review"]), "dirty")
            .await
            .unwrap();
        assert_eq!(change, LabelChange::Added);
        assert_eq!(metrics.get_stats().labels_added, 1);
    }

    #[tokio::test]
    async fn test_ensure_label_failure_names_label() {
        let mut host = MockPullRequestHost::new();
        host.expect_add_label()
            .returning(|_, _| Err(GitHubError::MalformedResponse("bad gateway".to_string())));
        let metrics = ReconcileMetrics::new();
        let labels = LabelReconciler::new(&host, PermissionPolicy::new(true), &metrics);

        let err = labels
            .ensure_label(&pr_with_labels(42, &[]), "dirty")
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("error adding \"dirty\""));
    }

    #[tokio::test]
    async fn test_ensure_label_denied_degrades_when_configured() {
        let mut host = MockPullRequestHost::new();
        host.expect_add_label().returning(|_, _| Err(denied(403)));
        let metrics = ReconcileMetrics::new();
        let labels = LabelReconciler::new(&host, PermissionPolicy::new(true), &metrics);

        let change = labels
            .ensure_label(&pr_with_labels(42, &[]), "dirty")
            .await
            .unwrap();
        assert_eq!(change, LabelChange::Unchanged);
        assert_eq!(metrics.get_stats().labels_added, 0);
    }

    #[tokio::test]
    async fn test_ensure_label_denied_is_fatal_by_default() {
        let mut host = MockPullRequestHost::new();
        host.expect_add_label().returning(|_, _| Err(denied(404)));
        let metrics = ReconcileMetrics::new();
        let labels = LabelReconciler::new(&host, PermissionPolicy::default(), &metrics);

        let err = labels
            .ensure_label(&pr_with_labels(42, &[]), "dirty")
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::MissingPermissions { pr_number: 42, .. }));
    }

    #[tokio::test]
    async fn test_ensure_label_absent_without_configured_label() {
        let host = MockPullRequestHost::new();
        let metrics = ReconcileMetrics::new();
        let labels = LabelReconciler::new(&host, PermissionPolicy::default(), &metrics);
        let pr = pr_with_labels(42, &["ready-to-merge"]);

        assert_eq!(
            labels.ensure_label_absent(&pr, None).await.unwrap(),
            LabelChange::Unchanged
        );
        assert_eq!(
            labels.ensure_label_absent(&pr, Some("")).await.unwrap(),
            LabelChange::Unchanged
        );
    }

    #[tokio::test]
    async fn test_ensure_label_absent_skips_absent_label() {
        let host = MockPullRequestHost::new();
        let metrics = ReconcileMetrics::new();
        let labels = LabelReconciler::new(&host, PermissionPolicy::default(), &metrics);

        let change = labels
            .ensure_label_absent(&pr_with_labels(42, &["needs-review"]), Some("ready-to-merge"))
            .await
            .unwrap();
        assert_eq!(change, LabelChange::Unchanged);
    }

    #[tokio::test]
    async fn test_ensure_label_absent_removes_present_label() {
        let mut host = MockPullRequestHost::new();
        host.expect_remove_label()
            .withf(|number, label| *number == 7 && label == "dirty")
            .times(1)
            .returning(|_, _| Ok(()));
        let metrics = ReconcileMetrics::new();
        let labels = LabelReconciler::new(&host, PermissionPolicy::default(), &metrics);

        let change = labels
            .ensure_label_absent(&pr_with_labels(7, &["dirty"]), Some("dirty"))
            .await
            .unwrap();
        assert_eq!(change, LabelChange::Removed);
        assert_eq!(metrics.get_stats().labels_removed, 1);
    }

    #[tokio::test]
    async fn test_ensure_label_absent_treats_not_found_as_unchanged() {
        let mut host = MockPullRequestHost::new();
        host.expect_remove_label()
            .returning(|_, _| Err(GitHubError::NotFound("Label does not exist".to_string())));
        let metrics = ReconcileMetrics::new();
        // Strict policy: a missing label is still not a permission problem
        let labels = LabelReconciler::new(&host, PermissionPolicy::default(), &metrics);

        let change = labels
            .ensure_label_absent(&pr_with_labels(7, &["dirty"]), Some("dirty"))
            .await
            .unwrap();
        assert_eq!(change, LabelChange::Unchanged);
    }

    #[tokio::test]
    async fn test_ensure_label_absent_denied_degrades_when_configured() {
        let mut host = MockPullRequestHost::new();
        host.expect_remove_label().returning(|_, _| Err(denied(404)));
        let metrics = ReconcileMetrics::new();
        let labels = LabelReconciler::new(&host, PermissionPolicy::new(true), &metrics);

        let change = labels
            .ensure_label_absent(&pr_with_labels(7, &["dirty"]), Some("dirty"))
            .await
            .unwrap();
        assert_eq!(change, LabelChange::Unchanged);
        assert_eq!(metrics.get_stats().permission_degradations, 1);
    }

    #[tokio::test]
    async fn test_ensure_label_absent_other_failure_names_label() {
        let mut host = MockPullRequestHost::new();
        host.expect_remove_label()
            .returning(|_, _| Err(GitHubError::MalformedResponse("oops".to_string())));
        let metrics = ReconcileMetrics::new();
        let labels = LabelReconciler::new(&host, PermissionPolicy::default(), &metrics);

        let err = labels
            .ensure_label_absent(&pr_with_labels(7, &["dirty"]), Some("dirty"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::RemoveLabel { ref label, .. } if label == "dirty"));
    }
}
