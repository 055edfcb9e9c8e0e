use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::github::PageQuery;

/// State carried from one page fetch to the next.
///
/// Steps never mutate a context in place; they derive the next one with
/// [`advance`](Self::advance) or [`retried`](Self::retried), so the cursor
/// only moves forward and the retry budget only shrinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationContext {
    pub cursor: Option<String>,
    pub base_branch: Option<String>,
    pub dirty_label: String,
    /// Label stripped from conflicting PRs; `None` disables removal.
    pub remove_on_dirty_label: Option<String>,
    pub comment_on_dirty: Option<String>,
    pub comment_on_clean: Option<String>,
    pub retries_remaining: u32,
    pub retry_after: Duration,
    pub continue_on_missing_permissions: bool,
}

impl ReconciliationContext {
    pub fn new(dirty_label: impl Into<String>) -> Self {
        Self {
            cursor: None,
            base_branch: None,
            dirty_label: dirty_label.into(),
            remove_on_dirty_label: None,
            comment_on_dirty: None,
            comment_on_clean: None,
            retries_remaining: 5,
            retry_after: Duration::from_secs(120),
            continue_on_missing_permissions: false,
        }
    }

    /// Context for the page after this one.
    pub fn advance(self, cursor: impl Into<String>) -> Self {
        Self {
            cursor: Some(cursor.into()),
            ..self
        }
    }

    /// Context for re-fetching the same page with one retry fewer.
    pub fn retried(self) -> Self {
        Self {
            retries_remaining: self.retries_remaining.saturating_sub(1),
            ..self
        }
    }

    pub fn retries_exhausted(&self) -> bool {
        self.retries_remaining == 0
    }

    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            cursor: self.cursor.clone(),
            base_branch: self.base_branch.clone(),
        }
    }
}

/// Dirty flag per PR number, ordered by number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DirtyStatuses(BTreeMap<u64, bool>);

impl DirtyStatuses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a classification; a later record for the same PR wins.
    pub fn record(&mut self, pr_number: u64, dirty: bool) {
        self.0.insert(pr_number, dirty);
    }

    /// Fold `later` into `self`, overwriting entries for the same PR.
    pub fn merge(&mut self, later: DirtyStatuses) {
        self.0.extend(later.0);
    }

    pub fn get(&self, pr_number: u64) -> Option<bool> {
        self.0.get(&pr_number).copied()
    }

    pub fn contains(&self, pr_number: u64) -> bool {
        self.0.contains_key(&pr_number)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dirty_count(&self) -> usize {
        self.0.values().filter(|dirty| **dirty).count()
    }
}

impl FromIterator<(u64, bool)> for DirtyStatuses {
    fn from_iter<I: IntoIterator<Item = (u64, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
