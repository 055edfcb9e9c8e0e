// Reconciliation loop - converges the dirty label of every open PR with the
// mergeability GitHub reports for it.

pub mod classifier;
pub mod comments;
pub mod context;
pub mod errors;
pub mod labels;
pub mod permissions;
pub mod walker;

pub use classifier::{classify, MergeAction};
pub use comments::CommentNotifier;
pub use context::{DirtyStatuses, ReconciliationContext};
pub use errors::ReconcileError;
pub use labels::{LabelChange, LabelReconciler};
pub use permissions::PermissionPolicy;
pub use walker::PageWalker;
