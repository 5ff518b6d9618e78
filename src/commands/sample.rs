use super::select_schema;
use crate::loader;
use crate::sample::generate_sample;
use crate::validation::Direction;
use anyhow::Context;
use std::path::Path;

pub fn execute_sample(
    openapi_path: &Path,
    endpoint: &str,
    direction: Direction,
    status: Option<&str>,
) -> anyhow::Result<()> {
    let set = loader::load_schema_set(openapi_path)
        .with_context(|| format!("loading {}", openapi_path.display()))?;
    let schema = select_schema(&set, endpoint, direction, status)?;

    let sample = generate_sample(schema, direction);
    println!("{}", serde_json::to_string_pretty(&sample)?);
    Ok(())
}
