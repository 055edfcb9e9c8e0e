use tracing::{info, Instrument};

use crate::config::{GitHubConfig, LabelerConfig};
use crate::github::{GitHubClient, GitHubError, PullRequestHost};
use crate::observability::{PassTimer, ReconcileMetrics};
use crate::reconcile::{DirtyStatuses, PageWalker, ReconcileError};
use crate::telemetry::{create_run_span, generate_correlation_id};

/// Build the production GitHub client from resolved configuration.
pub fn build_client(config: &GitHubConfig) -> Result<GitHubClient, GitHubError> {
    let token = config.token.clone().ok_or_else(|| {
        GitHubError::TokenNotFound(
            "set the repoToken input, GITHUB_TOKEN, or github.token in conflict-labeler.toml"
                .to_string(),
        )
    })?;

    let (owner, repo) = match (&config.owner, &config.repo) {
        (Some(owner), Some(repo)) => (owner.clone(), repo.clone()),
        _ => {
            return Err(GitHubError::ConfigNotFound(
                "set GITHUB_REPOSITORY=owner/name or github.owner and github.repo".to_string(),
            ))
        }
    };

    match config.api_url.as_deref() {
        Some(api_url) => GitHubClient::with_base_uri(token, api_url, owner, repo),
        None => GitHubClient::new(token, owner, repo),
    }
}

/// Reconcile every open PR once and return the dirty status of each PR that
/// could be classified.
pub async fn run_job<H: PullRequestHost + ?Sized>(
    config: &LabelerConfig,
    host: &H,
    metrics: &ReconcileMetrics,
) -> Result<DirtyStatuses, ReconcileError> {
    let owner = config.github.owner.as_deref().unwrap_or_default();
    let repo = config.github.repo.as_deref().unwrap_or_default();
    let correlation_id = generate_correlation_id();
    let span = create_run_span(owner, repo, &correlation_id);

    async {
        let context = config.reconcile.initial_context();
        info!(
            dirty_label = %context.dirty_label,
            base_branch = ?context.base_branch,
            retry_max = context.retries_remaining,
            retry_after_secs = context.retry_after.as_secs(),
            "Checking open pull requests for merge conflicts"
        );

        let timer = PassTimer::start(format!("{owner}/{repo}"));
        let statuses = PageWalker::new(host, metrics).run(context).await?;
        timer.finish();
        metrics.log_stats();

        Ok::<_, ReconcileError>(statuses)
    }
    .instrument(span)
    .await
}
