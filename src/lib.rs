// Conflict Labeler Library - Merge Conflict Labeling for Open Pull Requests
// This exposes the reconciliation loop and its collaborators for testing and integration

pub mod config;
pub mod github;
pub mod job;
pub mod observability;
pub mod output;
pub mod reconcile;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{ConfigError, LabelerConfig};
pub use github::{
    GitHubClient, GitHubError, MergeableState, PageQuery, PullRequestHost, PullRequestPage,
    PullRequestSnapshot,
};
pub use job::{build_client, run_job};
pub use observability::{ReconcileMetrics, ReconcileStats};
pub use reconcile::{
    classify,
    DirtyStatuses,
    LabelChange,
    MergeAction,
    PageWalker,
    ReconcileError,
    ReconciliationContext,
};
pub use telemetry::init_telemetry;
