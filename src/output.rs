use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::reconcile::DirtyStatuses;

/// Name of the job output consumed by later workflow steps
pub const OUTPUT_NAME: &str = "prDirtyStatuses";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to serialize prDirtyStatuses: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write job output: {0}")]
    Io(#[from] std::io::Error),
}

/// Render the output line in the `name=value` form GitHub Actions reads.
pub fn render(statuses: &DirtyStatuses) -> Result<String, OutputError> {
    Ok(format!("{OUTPUT_NAME}={}", serde_json::to_string(statuses)?))
}

/// Append the output to the file at `GITHUB_OUTPUT` (if any) and return the
/// JSON value.
pub fn emit(statuses: &DirtyStatuses, output_file: Option<&Path>) -> Result<String, OutputError> {
    let json = serde_json::to_string(statuses)?;

    if let Some(path) = output_file {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", render(statuses)?)?;
    }

    info!(
        output = OUTPUT_NAME,
        classified = statuses.len(),
        dirty = statuses.dirty_count(),
        "{}={}",
        OUTPUT_NAME,
        json
    );
    Ok(json)
}
