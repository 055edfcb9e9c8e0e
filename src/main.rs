use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use conflict_labeler::{
    build_client, init_telemetry, output, run_job, LabelerConfig, ReconcileMetrics,
};

#[derive(Parser)]
#[command(name = "conflict-labeler")]
#[command(about = "Label open pull requests that have merge conflicts")]
#[command(long_about = "Checks every open pull request of a repository, adds a label to the ones \
                       GitHub reports as conflicting and removes it once they merge cleanly again. \
                       Runs once and exits; designed for GitHub Actions but usable anywhere.")]
struct Cli {
    /// Configuration file (defaults to conflict-labeler.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args, Default)]
struct Overrides {
    /// Label applied to pull requests with conflicts
    #[arg(long, global = true)]
    dirty_label: Option<String>,
    /// Label removed from pull requests with conflicts
    #[arg(long, global = true)]
    remove_on_dirty_label: Option<String>,
    /// Comment posted when a pull request becomes conflicting
    #[arg(long, global = true)]
    comment_on_dirty: Option<String>,
    /// Comment posted when a pull request's conflicts are resolved
    #[arg(long, global = true)]
    comment_on_clean: Option<String>,
    /// Seconds to wait before re-checking unknown mergeability
    #[arg(long, global = true, value_name = "SECONDS")]
    retry_after: Option<u64>,
    /// Maximum number of re-checks for unknown mergeability
    #[arg(long, global = true)]
    retry_max: Option<u32>,
    /// Log and continue when the token may not edit labels or comments
    #[arg(long, global = true)]
    continue_on_missing_permissions: bool,
    /// Only check pull requests targeting this branch
    #[arg(long, global = true)]
    base_branch: Option<String>,
    /// Repository as owner/name
    #[arg(long, global = true, value_name = "OWNER/NAME")]
    repository: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile labels on all open pull requests (default)
    Run,
    /// Print the resolved configuration without contacting GitHub
    Config,
}

fn main() {
    let cli = Cli::parse();

    let result = tokio::runtime::Runtime::new()
        .context("failed to start async runtime")
        .and_then(|runtime| runtime.block_on(execute(cli)));

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    LabelerConfig::load_env_file().context("failed to load .env file")?;
    let mut config = LabelerConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, cli.overrides)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_command(config).await,
        Commands::Config => {
            print!("{}", config.to_redacted_toml()?);
            Ok(())
        }
    }
}

fn apply_overrides(config: &mut LabelerConfig, overrides: Overrides) -> Result<()> {
    let reconcile = &mut config.reconcile;
    if let Some(label) = overrides.dirty_label {
        reconcile.dirty_label = label;
    }
    if let Some(label) = overrides.remove_on_dirty_label {
        reconcile.remove_on_dirty_label = Some(label).filter(|l| !l.is_empty());
    }
    if let Some(body) = overrides.comment_on_dirty {
        reconcile.comment_on_dirty = Some(body).filter(|b| !b.is_empty());
    }
    if let Some(body) = overrides.comment_on_clean {
        reconcile.comment_on_clean = Some(body).filter(|b| !b.is_empty());
    }
    if let Some(seconds) = overrides.retry_after {
        reconcile.retry_after_seconds = seconds;
    }
    if let Some(retries) = overrides.retry_max {
        reconcile.retry_max = retries;
    }
    if overrides.continue_on_missing_permissions {
        reconcile.continue_on_missing_permissions = true;
    }
    if let Some(branch) = overrides.base_branch {
        reconcile.base_branch = Some(branch).filter(|b| !b.is_empty());
    }
    if let Some(repository) = overrides.repository {
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
            .with_context(|| format!("invalid repository '{repository}', expected owner/name"))?;
        config.github.owner = Some(owner.to_string());
        config.github.repo = Some(repo.to_string());
    }
    Ok(())
}

async fn run_command(config: LabelerConfig) -> Result<()> {
    config.validate()?;
    init_telemetry(&config.observability)?;

    let client = build_client(&config.github)?;
    let metrics = ReconcileMetrics::new();

    let statuses = run_job(&config, &client, &metrics).await?;

    let output_file = std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from);
    let json = output::emit(&statuses, output_file.as_deref())?;
    println!("{json}");

    Ok(())
}
