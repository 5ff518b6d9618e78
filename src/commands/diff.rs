use crate::cli::ReportFormat;
use crate::compare::compare;
use crate::config::FailOn;
use crate::{loader, report};
use anyhow::Context;
use colored::*;
use std::path::Path;

/// Compare two documents; returns whether the `fail_on` policy was met
pub fn execute_diff(
    old_path: &Path,
    new_path: &Path,
    format: ReportFormat,
    fail_on: FailOn,
) -> anyhow::Result<bool> {
    let old = loader::load_schema_set(old_path)
        .with_context(|| format!("loading {}", old_path.display()))?;
    let new = loader::load_schema_set(new_path)
        .with_context(|| format!("loading {}", new_path.display()))?;

    let result = compare(&old, &new);
    let failed = fail_on.is_met(&result);

    match format {
        ReportFormat::Json => println!("{}", report::comparison_json(&result)?),
        ReportFormat::Text => {
            println!("{}", "Comparing API descriptions...".bright_blue());
            println!("  Old: {}", old_path.display());
            println!("  New: {}", new_path.display());
            println!();
            print!("{}", report::render_comparison(&result));
        }
    }

    tracing::info!(
        changes = result.changes.len(),
        breaking = result.has_breaking_changes,
        failed,
        "diff finished"
    );
    Ok(failed)
}
