// In-memory repository host for driving the reconciliation loop end to end
#![allow(dead_code)]

use async_trait::async_trait;
use conflict_labeler::{
    GitHubError, MergeableState, PageQuery, PullRequestHost, PullRequestPage, PullRequestSnapshot,
};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Query(PageQuery),
    AddLabel(u64, String),
    RemoveLabel(u64, String),
    Comment(u64, String),
}

#[derive(Debug, Clone)]
pub struct FakePullRequest {
    pub number: u64,
    pub base_branch: String,
    pub labels: Vec<String>,
    /// Mergeability reported by successive fetches; the last value sticks.
    pub mergeable: VecDeque<MergeableState>,
}

impl FakePullRequest {
    pub fn new(number: u64, labels: &[&str], mergeable: &[MergeableState]) -> Self {
        Self {
            number,
            base_branch: "main".to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            mergeable: mergeable.iter().cloned().collect(),
        }
    }

    pub fn targeting(mut self, base_branch: &str) -> Self {
        self.base_branch = base_branch.to_string();
        self
    }

    fn observe(&mut self) -> PullRequestSnapshot {
        let mergeable = if self.mergeable.len() > 1 {
            self.mergeable.pop_front().unwrap()
        } else {
            self.mergeable.front().cloned().unwrap_or(MergeableState::Unknown)
        };

        PullRequestSnapshot {
            number: self.number,
            title: format!("PR #{}", self.number),
            permalink: format!("https://github.com/acme/widgets/pull/{}", self.number),
            updated_at: chrono::Utc::now(),
            labels: self.labels.clone(),
            mergeable,
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    pull_requests: Vec<FakePullRequest>,
    calls: Vec<Call>,
    deny_mutations: bool,
}

pub struct FakeHost {
    state: Mutex<FakeState>,
    page_size: usize,
}

impl FakeHost {
    pub fn new(pull_requests: Vec<FakePullRequest>) -> Self {
        Self::with_page_size(pull_requests, 100)
    }

    pub fn with_page_size(pull_requests: Vec<FakePullRequest>, page_size: usize) -> Self {
        Self {
            state: Mutex::new(FakeState {
                pull_requests,
                ..FakeState::default()
            }),
            page_size,
        }
    }

    /// Answer every label and comment mutation with "Resource not accessible by integration".
    pub fn deny_mutations(self) -> Self {
        self.state.lock().unwrap().deny_mutations = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn queries(&self) -> Vec<PageQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Query(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::Query(_)))
            .collect()
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Comment(number, body) => Some((number, body)),
                _ => None,
            })
            .collect()
    }

    pub fn removals(&self) -> Vec<(u64, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::RemoveLabel(number, label) => Some((number, label)),
                _ => None,
            })
            .collect()
    }

    pub fn labels_of(&self, number: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .pull_requests
            .iter()
            .find(|pr| pr.number == number)
            .map(|pr| pr.labels.clone())
            .unwrap_or_default()
    }

    fn denied() -> GitHubError {
        GitHubError::NotAccessible {
            status: 403,
            message: "Resource not accessible by integration".to_string(),
        }
    }
}

#[async_trait]
impl PullRequestHost for FakeHost {
    async fn query_open_pull_requests(
        &self,
        query: &PageQuery,
    ) -> Result<PullRequestPage, GitHubError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Query(query.clone()));

        let offset: usize = match &query.cursor {
            Some(cursor) => cursor
                .parse()
                .map_err(|_| GitHubError::MalformedResponse(format!("bad cursor {cursor}")))?,
            None => 0,
        };

        let mut matching: Vec<&mut FakePullRequest> = state
            .pull_requests
            .iter_mut()
            .filter(|pr| {
                query
                    .base_branch
                    .as_deref()
                    .map_or(true, |base| pr.base_branch == base)
            })
            .collect();
        let total = matching.len();

        let items = matching
            .iter_mut()
            .skip(offset)
            .take(self.page_size)
            .map(|pr| pr.observe())
            .collect();

        let end = offset + self.page_size;
        Ok(PullRequestPage {
            items,
            next_cursor: Some(end.to_string()),
            has_more: end < total,
        })
    }

    async fn add_label(&self, pr_number: u64, label: &str) -> Result<(), GitHubError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::AddLabel(pr_number, label.to_string()));
        if state.deny_mutations {
            return Err(Self::denied());
        }

        if let Some(pr) = state.pull_requests.iter_mut().find(|pr| pr.number == pr_number) {
            if !pr.labels.iter().any(|l| l.eq_ignore_ascii_case(label)) {
                pr.labels.push(label.to_string());
            }
        }
        Ok(())
    }

    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<(), GitHubError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::RemoveLabel(pr_number, label.to_string()));
        if state.deny_mutations {
            return Err(Self::denied());
        }

        let pr = state
            .pull_requests
            .iter_mut()
            .find(|pr| pr.number == pr_number)
            .ok_or_else(|| GitHubError::NotFound("Not Found".to_string()))?;
        let before = pr.labels.len();
        pr.labels.retain(|l| !l.eq_ignore_ascii_case(label));
        if pr.labels.len() == before {
            return Err(GitHubError::NotFound("Label does not exist".to_string()));
        }
        Ok(())
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> Result<(), GitHubError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Comment(pr_number, body.to_string()));
        if state.deny_mutations {
            return Err(Self::denied());
        }
        Ok(())
    }
}

/// Collects formatted log output so tests can assert on emitted events.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install a subscriber writing into this capture for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
