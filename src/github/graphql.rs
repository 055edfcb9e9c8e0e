use serde::Deserialize;

use super::errors::GitHubError;
use super::types::{MergeableState, PullRequestPage, PullRequestSnapshot};

pub(crate) const OPEN_PULL_REQUESTS_QUERY: &str = r#"
query openPullRequests($owner: String!, $repo: String!, $after: String, $baseRefName: String) {
  repository(owner: $owner, name: $repo) {
    pullRequests(first: 100, after: $after, states: OPEN, baseRefName: $baseRefName) {
      nodes {
        mergeable
        number
        permalink
        title
        updatedAt
        labels(first: 100) {
          nodes {
            name
          }
        }
      }
      pageInfo {
        endCursor
        hasNextPage
      }
    }
  }
}
"#;

#[derive(Deserialize)]
pub(crate) struct Root {
    pub(crate) data: Option<Data>,
    #[serde(default)]
    pub(crate) errors: Vec<QueryError>,
}

#[derive(Deserialize)]
pub(crate) struct QueryError {
    pub(crate) message: String,
}

#[derive(Deserialize)]
pub(crate) struct Data {
    pub(crate) repository: Option<Repository>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Repository {
    pub(crate) pull_requests: PullRequests,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PullRequests {
    pub(crate) nodes: Vec<Node>,
    pub(crate) page_info: PageInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Node {
    pub(crate) mergeable: MergeableState,
    pub(crate) number: u64,
    pub(crate) permalink: String,
    pub(crate) title: String,
    pub(crate) updated_at: chrono::DateTime<chrono::Utc>,
    pub(crate) labels: Option<Labels>,
}

#[derive(Deserialize)]
pub(crate) struct Labels {
    pub(crate) nodes: Vec<LabelNode>,
}

#[derive(Deserialize)]
pub(crate) struct LabelNode {
    pub(crate) name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub(crate) has_next_page: bool,
    pub(crate) end_cursor: Option<String>,
}

impl From<Node> for PullRequestSnapshot {
    fn from(node: Node) -> Self {
        let labels = node
            .labels
            .map(|labels| labels.nodes.into_iter().map(|label| label.name).collect())
            .unwrap_or_default();

        PullRequestSnapshot {
            number: node.number,
            title: node.title,
            permalink: node.permalink,
            updated_at: node.updated_at,
            labels,
            mergeable: node.mergeable,
        }
    }
}

/// Decode a raw GraphQL response body into one page of pull requests.
pub(crate) fn parse_page(body: serde_json::Value) -> Result<PullRequestPage, GitHubError> {
    let root: Root = serde_json::from_value(body)?;

    if !root.errors.is_empty() {
        let messages: Vec<String> = root.errors.into_iter().map(|e| e.message).collect();
        return Err(GitHubError::MalformedResponse(messages.join("; ")));
    }

    let repository = root
        .data
        .and_then(|data| data.repository)
        .ok_or_else(|| GitHubError::MalformedResponse("response has no repository".to_string()))?;

    let PullRequests { nodes, page_info } = repository.pull_requests;

    Ok(PullRequestPage {
        items: nodes.into_iter().map(PullRequestSnapshot::from).collect(),
        next_cursor: page_info.end_cursor,
        has_more: page_info.has_next_page,
    })
}
