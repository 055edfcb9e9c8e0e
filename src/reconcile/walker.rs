use tracing::{debug, info, info_span, warn, Instrument};

use super::classifier::{classify, MergeAction};
use super::comments::CommentNotifier;
use super::context::{DirtyStatuses, ReconciliationContext};
use super::errors::ReconcileError;
use super::labels::{LabelChange, LabelReconciler};
use super::permissions::PermissionPolicy;
use crate::github::{PullRequestHost, PullRequestSnapshot};
use crate::observability::ReconcileMetrics;

/// Where the loop is between two awaits
#[derive(Debug)]
enum WalkState {
    Fetching(ReconciliationContext),
    Retrying(ReconciliationContext),
    Done,
}

/// Walks every page of open pull requests, reconciling each PR's dirty label
/// and re-fetching a page while GitHub still reports mergeability as unknown.
pub struct PageWalker<'a, H: PullRequestHost + ?Sized> {
    host: &'a H,
    metrics: &'a ReconcileMetrics,
}

impl<'a, H: PullRequestHost + ?Sized> PageWalker<'a, H> {
    pub fn new(host: &'a H, metrics: &'a ReconcileMetrics) -> Self {
        Self { host, metrics }
    }

    /// Run the loop to completion and return the dirty flag of every PR that
    /// was classified. PRs still unknown when the retry budget runs out are
    /// absent from the result.
    pub async fn run(
        &self,
        context: ReconciliationContext,
    ) -> Result<DirtyStatuses, ReconcileError> {
        let mut statuses = DirtyStatuses::new();
        let mut state = WalkState::Fetching(context);

        loop {
            state = match state {
                WalkState::Fetching(context) => {
                    if context.retries_exhausted() {
                        warn!("reached maximum allowed retries");
                        WalkState::Done
                    } else {
                        self.fetch_page(context, &mut statuses).await?
                    }
                }
                WalkState::Retrying(context) => {
                    info!("Retrying after {}s.", context.retry_after.as_secs());
                    tokio::time::sleep(context.retry_after).await;

                    let context = context.retried();
                    self.metrics.record_retry();
                    info!(
                        "retrying with {} retries remaining.",
                        context.retries_remaining
                    );
                    WalkState::Fetching(context)
                }
                WalkState::Done => return Ok(statuses),
            };
        }
    }

    async fn fetch_page(
        &self,
        context: ReconciliationContext,
        statuses: &mut DirtyStatuses,
    ) -> Result<WalkState, ReconcileError> {
        let page = self
            .host
            .query_open_pull_requests(&context.page_query())
            .await
            .map_err(ReconcileError::Fetch)?;
        self.metrics.record_page();

        if page.items.is_empty() {
            return Ok(WalkState::Done);
        }

        let mut classified = DirtyStatuses::new();
        let mut unresolved = Vec::new();
        for pr in &page.items {
            debug!(?pr, "Classifying pull request");

            let dirty = match classify(pr)? {
                MergeAction::Retry => {
                    info!(
                        "for PR \"{}\": mergeability not yet computed, retrying after {}s.",
                        pr.title,
                        context.retry_after.as_secs()
                    );
                    unresolved.push(pr.number);
                    continue;
                }
                MergeAction::MarkDirty => true,
                MergeAction::MarkClean => false,
            };

            let span = info_span!(
                "pull_request",
                pr.number = pr.number,
                pr.title = %pr.title
            );
            self.reconcile_pull_request(&context, pr, dirty)
                .instrument(span)
                .await?;
            classified.record(pr.number, dirty);
        }
        // A re-fetched page overwrites what its earlier attempt recorded
        statuses.merge(classified);

        if !unresolved.is_empty() {
            debug!(?unresolved, "Page has pull requests with unknown mergeability");
            return Ok(WalkState::Retrying(context));
        }

        Ok(match page.continuation() {
            Some(cursor) => WalkState::Fetching(context.advance(cursor)),
            None => WalkState::Done,
        })
    }

    async fn reconcile_pull_request(
        &self,
        context: &ReconciliationContext,
        pr: &PullRequestSnapshot,
        dirty: bool,
    ) -> Result<(), ReconcileError> {
        let policy = PermissionPolicy::new(context.continue_on_missing_permissions);
        let labels = LabelReconciler::new(self.host, policy, self.metrics);
        let notifier = CommentNotifier::new(self.host, policy, self.metrics);

        if dirty {
            match context.remove_on_dirty_label.as_deref() {
                Some(remove) if !remove.is_empty() => info!(
                    "for PR \"{}\": add \"{}\", remove \"{}\"",
                    pr.title, context.dirty_label, remove
                ),
                _ => info!("for PR \"{}\": add \"{}\"", pr.title, context.dirty_label),
            }

            let (added, _) = tokio::try_join!(
                labels.ensure_label(pr, &context.dirty_label),
                labels.ensure_label_absent(pr, context.remove_on_dirty_label.as_deref()),
            )?;

            if added == LabelChange::Added {
                notifier
                    .post_comment(pr, context.comment_on_dirty.as_deref())
                    .await?;
            }
        } else {
            info!("for PR \"{}\": remove \"{}\"", pr.title, context.dirty_label);

            // The remove-on-dirty label is not restored here; a cleaned-up PR
            // needs another manual review pass.
            let removed = labels
                .ensure_label_absent(pr, Some(&context.dirty_label))
                .await?;

            if removed == LabelChange::Removed {
                notifier
                    .post_comment(pr, context.comment_on_clean.as_deref())
                    .await?;
            }
        }

        Ok(())
    }
}
