pub mod client;
pub mod errors;
pub(crate) mod graphql;
pub mod types;

pub use client::{GitHubClient, PullRequestHost};
pub use errors::GitHubError;
pub use types::{MergeableState, PageQuery, PullRequestPage, PullRequestSnapshot};

#[cfg(test)]
pub use client::MockPullRequestHost;
