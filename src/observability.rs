use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Counters for one reconciliation run
#[derive(Debug, Default)]
pub struct ReconcileMetrics {
    pub pages_fetched: AtomicU64,
    pub labels_added: AtomicU64,
    pub labels_removed: AtomicU64,
    pub comments_posted: AtomicU64,
    pub retries: AtomicU64,
    pub permission_degradations: AtomicU64,
}

impl ReconcileMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_page(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_label_added(&self) {
        self.labels_added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_label_removed(&self) {
        self.labels_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_comment(&self) {
        self.comments_posted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_permission_degradation(&self) {
        self.permission_degradations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> ReconcileStats {
        ReconcileStats {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            labels_added: self.labels_added.load(Ordering::Relaxed),
            labels_removed: self.labels_removed.load(Ordering::Relaxed),
            comments_posted: self.comments_posted.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            permission_degradations: self.permission_degradations.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            pages_fetched = stats.pages_fetched,
            labels_added = stats.labels_added,
            labels_removed = stats.labels_removed,
            comments_posted = stats.comments_posted,
            retries = stats.retries,
            permission_degradations = stats.permission_degradations,
            "Reconciliation summary"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileStats {
    pub pages_fetched: u64,
    pub labels_added: u64,
    pub labels_removed: u64,
    pub comments_posted: u64,
    pub retries: u64,
    pub permission_degradations: u64,
}

/// Wall-clock time of one reconciliation pass, logged with the repository it covered
pub struct PassTimer {
    repository: String,
    started: Instant,
}

impl PassTimer {
    pub fn start(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            started: Instant::now(),
        }
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.started.elapsed();
        info!(
            repository = %self.repository,
            elapsed_secs = elapsed.as_secs_f64(),
            "Reconciliation pass finished"
        );
        elapsed
    }
}
