use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::reconcile::ReconciliationContext;

pub const DEFAULT_CONFIG_FILE: &str = "conflict-labeler.toml";

/// GitHub Actions exposes `with:` inputs as `INPUT_<NAME>` variables.
const ACTION_INPUTS: &[(&str, &str)] = &[
    ("reconcile.dirty_label", "dirtyLabel"),
    ("reconcile.remove_on_dirty_label", "removeOnDirtyLabel"),
    ("reconcile.comment_on_dirty", "commentOnDirty"),
    ("reconcile.comment_on_clean", "commentOnClean"),
    ("reconcile.retry_after_seconds", "retryAfter"),
    ("reconcile.retry_max", "retryMax"),
    (
        "reconcile.continue_on_missing_permissions",
        "continueOnMissingPermissions",
    ),
    ("github.token", "repoToken"),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("dirtyLabel is required but was not configured")]
    MissingDirtyLabel,

    #[error("invalid repository '{0}', expected owner/name")]
    InvalidRepository(String),

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Resolved configuration for one run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabelerConfig {
    #[serde(default)]
    pub github: GitHubConfig,
    pub reconcile: ReconcileConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GitHubConfig {
    /// API token (repoToken input, GITHUB_TOKEN, or config)
    pub token: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    /// API root for GitHub Enterprise; defaults to api.github.com
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcileConfig {
    /// Label applied to conflicting PRs
    pub dirty_label: String,
    /// Label stripped from conflicting PRs
    pub remove_on_dirty_label: Option<String>,
    pub comment_on_dirty: Option<String>,
    pub comment_on_clean: Option<String>,
    pub retry_after_seconds: u64,
    pub retry_max: u32,
    pub continue_on_missing_permissions: bool,
    /// Only reconcile PRs targeting this branch
    pub base_branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// Structured JSON logs; plain text otherwise
    pub json_logs: bool,
}

impl LabelerConfig {
    /// Load configuration from the process environment with precedence:
    /// 1. Default values
    /// 2. Configuration file (`path`, or conflict-labeler.toml if present)
    /// 3. Environment variables (prefixed with CONFLICT_LABELER_)
    /// 4. GitHub Actions inputs (INPUT_*)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(path, std::env::vars().collect())
    }

    /// Same as [`load`](Self::load) with an explicit environment.
    pub fn load_from(
        path: Option<&Path>,
        env: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("reconcile.dirty_label", "")?
            .set_default("reconcile.retry_after_seconds", 120)?
            .set_default("reconcile.retry_max", 5)?
            .set_default("reconcile.continue_on_missing_permissions", false)?
            .set_default("observability.log_level", "info")?
            .set_default("observability.json_logs", true)?;

        match path {
            Some(path) => builder = builder.add_source(File::from(path).required(true)),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::from(Path::new(DEFAULT_CONFIG_FILE)));
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix("CONFLICT_LABELER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(env.clone())),
        );

        for (key, input) in ACTION_INPUTS {
            builder = builder.set_override_option(*key, action_input(&env, input))?;
        }

        let mut labeler_config: LabelerConfig = builder.build()?.try_deserialize()?;
        labeler_config.apply_invocation_context(&env)?;
        labeler_config.normalize();

        Ok(labeler_config)
    }

    /// Fill in values GitHub Actions provides through its own variables.
    fn apply_invocation_context(
        &mut self,
        env: &HashMap<String, String>,
    ) -> Result<(), ConfigError> {
        if self.github.token.is_none() {
            self.github.token = non_empty(env.get("GITHUB_TOKEN"));
        }

        if self.github.owner.is_none() || self.github.repo.is_none() {
            if let Some(repository) = non_empty(env.get("GITHUB_REPOSITORY")) {
                let (owner, repo) = split_repository(&repository)?;
                if self.github.owner.is_none() {
                    self.github.owner = Some(owner);
                }
                if self.github.repo.is_none() {
                    self.github.repo = Some(repo);
                }
            }
        }

        if self.reconcile.base_branch.is_none() {
            self.reconcile.base_branch = base_branch_from_event(env);
        }

        Ok(())
    }

    /// Empty strings disable optional labels and comments.
    fn normalize(&mut self) {
        for value in [
            &mut self.reconcile.remove_on_dirty_label,
            &mut self.reconcile.comment_on_dirty,
            &mut self.reconcile.comment_on_clean,
            &mut self.reconcile.base_branch,
            &mut self.github.token,
            &mut self.github.owner,
            &mut self.github.repo,
            &mut self.github.api_url,
        ] {
            if value.as_deref().is_some_and(str::is_empty) {
                *value = None;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconcile.dirty_label.trim().is_empty() {
            return Err(ConfigError::MissingDirtyLabel);
        }
        Ok(())
    }

    /// Render as TOML with the token masked
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut redacted = self.clone();
        if redacted.github.token.is_some() {
            redacted.github.token = Some("***".to_string());
        }
        Ok(toml::to_string_pretty(&redacted)?)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<(), dotenvy::Error> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

impl ReconcileConfig {
    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_after_seconds)
    }

    /// Initial loop context: first page, full retry budget.
    pub fn initial_context(&self) -> ReconciliationContext {
        ReconciliationContext {
            cursor: None,
            base_branch: self.base_branch.clone(),
            dirty_label: self.dirty_label.clone(),
            remove_on_dirty_label: self.remove_on_dirty_label.clone(),
            comment_on_dirty: self.comment_on_dirty.clone(),
            comment_on_clean: self.comment_on_clean.clone(),
            retries_remaining: self.retry_max,
            retry_after: self.retry_after(),
            continue_on_missing_permissions: self.continue_on_missing_permissions,
        }
    }
}

fn action_input(env: &HashMap<String, String>, name: &str) -> Option<String> {
    let key = format!("INPUT_{}", name.replace(' ', "_").to_uppercase());
    non_empty(env.get(&key))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn split_repository(repository: &str) -> Result<(String, String), ConfigError> {
    match repository.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(ConfigError::InvalidRepository(repository.to_string())),
    }
}

/// Pushes to a branch only affect PRs targeting that branch.
fn base_branch_from_event(env: &HashMap<String, String>) -> Option<String> {
    if env.get("GITHUB_EVENT_NAME").map(String::as_str) != Some("push") {
        return None;
    }
    env.get("GITHUB_REF")
        .and_then(|git_ref| git_ref.strip_prefix("refs/heads/"))
        .filter(|branch| !branch.is_empty())
        .map(str::to_string)
}
