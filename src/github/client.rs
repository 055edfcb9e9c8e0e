use async_trait::async_trait;
use octocrab::Octocrab;
use serde_json::json;
use tracing::debug;

use super::errors::GitHubError;
use super::graphql::{parse_page, OPEN_PULL_REQUESTS_QUERY};
use super::types::{PageQuery, PullRequestPage};

#[cfg(test)]
use mockall::automock;

/// Operations the reconciliation loop needs from the hosting platform.
///
/// Permission failures surface as [`GitHubError::NotAccessible`] and missing
/// labels on removal as [`GitHubError::NotFound`]; callers decide whether
/// those are fatal.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Fetch up to 100 open pull requests starting at `query.cursor`.
    async fn query_open_pull_requests(
        &self,
        query: &PageQuery,
    ) -> Result<PullRequestPage, GitHubError>;

    async fn add_label(&self, pr_number: u64, label: &str) -> Result<(), GitHubError>;

    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<(), GitHubError>;

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<(), GitHubError>;
}

#[derive(Debug)]
pub struct GitHubClient {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubClient {
    pub fn new(token: String, owner: String, repo: String) -> Result<Self, GitHubError> {
        let octocrab = Octocrab::builder().personal_token(token).build()?;
        Ok(Self::with_octocrab(octocrab, owner, repo))
    }

    /// Point the client at a different API root, e.g. a GitHub Enterprise
    /// host or a local test server.
    pub fn with_base_uri(
        token: String,
        base_uri: &str,
        owner: String,
        repo: String,
    ) -> Result<Self, GitHubError> {
        let octocrab = Octocrab::builder()
            .base_uri(base_uri)?
            .personal_token(token)
            .build()?;
        Ok(Self::with_octocrab(octocrab, owner, repo))
    }

    pub fn with_octocrab(octocrab: Octocrab, owner: String, repo: String) -> Self {
        Self {
            octocrab,
            owner,
            repo,
        }
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    async fn query_open_pull_requests(
        &self,
        query: &PageQuery,
    ) -> Result<PullRequestPage, GitHubError> {
        debug!("{}", OPEN_PULL_REQUESTS_QUERY);

        let payload = json!({
            "query": OPEN_PULL_REQUESTS_QUERY,
            "variables": {
                "owner": self.owner,
                "repo": self.repo,
                "after": query.cursor,
                "baseRefName": query.base_branch,
            }
        });

        let response: serde_json::Value = self.octocrab.graphql(&payload).await?;
        debug!(response = %response, "Fetched open pull requests");

        parse_page(response)
    }

    async fn add_label(&self, pr_number: u64, label: &str) -> Result<(), GitHubError> {
        // Labels on pull requests are managed through the issues API
        self.octocrab
            .issues(&self.owner, &self.repo)
            .add_labels(pr_number, &[label.to_string()])
            .await?;
        Ok(())
    }

    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<(), GitHubError> {
        self.octocrab
            .issues(&self.owner, &self.repo)
            .remove_label(pr_number, label)
            .await?;
        Ok(())
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<(), GitHubError> {
        self.octocrab
            .issues(&self.owner, &self.repo)
            .create_comment(pr_number, body)
            .await?;
        Ok(())
    }
}
