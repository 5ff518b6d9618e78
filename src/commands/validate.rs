use super::select_schema;
use crate::cli::ReportFormat;
use crate::validation::{Direction, PartialValidationConfig, validate_str};
use crate::{loader, report};
use anyhow::Context;
use colored::*;
use std::fs;
use std::path::Path;

pub struct ValidateOptions<'a> {
    pub endpoint: &'a str,
    pub direction: Direction,
    pub status: Option<&'a str>,
    pub config: PartialValidationConfig,
    pub format: ReportFormat,
}

/// Validate a payload file; returns whether it conforms
pub fn execute_validate(
    openapi_path: &Path,
    body_path: &Path,
    options: ValidateOptions<'_>,
) -> anyhow::Result<bool> {
    let set = loader::load_schema_set(openapi_path)
        .with_context(|| format!("loading {}", openapi_path.display()))?;
    let schema = select_schema(&set, options.endpoint, options.direction, options.status)?;

    let body = fs::read_to_string(body_path)
        .with_context(|| format!("reading {}", body_path.display()))?;

    let violations: Vec<_> = validate_str(&body, schema, options.direction, Some(&options.config))
        .into_iter()
        .map(|v| v.with_endpoint(options.endpoint))
        .collect();

    match options.format {
        ReportFormat::Json => println!("{}", report::violations_json(&violations)?),
        ReportFormat::Text => {
            println!(
                "{}",
                format!("Validating {} body of {}...", options.direction, options.endpoint)
                    .bright_blue()
            );
            println!("  Payload: {}", body_path.display());
            println!();
            print!("{}", report::render_violations(&violations));
        }
    }

    Ok(violations.is_empty())
}
