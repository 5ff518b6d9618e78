use crate::loader;
use anyhow::Context;
use colored::*;
use std::path::Path;

pub fn execute_list(openapi_path: &Path) -> anyhow::Result<()> {
    println!("{}", "Loading OpenAPI file...".bright_blue());
    println!("  Path: {}", openapi_path.display());

    let set = loader::load_schema_set(openapi_path)
        .with_context(|| format!("loading {}", openapi_path.display()))?;

    println!("\n{}", "✓ OpenAPI loaded successfully".green());
    if let Some(title) = &set.title {
        println!("  Title: {}", title.bold());
    }
    if let Some(version) = &set.version {
        println!("  Version: {}", version);
    }
    println!();

    if set.is_empty() {
        println!("{}", "No endpoints found".yellow());
        return Ok(());
    }

    println!("{}", format!("Endpoints ({}):", set.len()).bold());
    for (id, schemas) in &set.endpoints {
        println!();
        println!("  {} {}", id.method.bright_cyan(), id.path.bold());

        if let Some(request) = &schemas.request {
            println!("     Request body: {}", request.kind());
        }

        for (status, body) in &schemas.responses {
            match body {
                Some(schema) => println!("     {} {}", status.bright_yellow(), schema.kind()),
                None => println!("     {} {}", status.bright_yellow(), "(no body)".dimmed()),
            }
        }
    }

    Ok(())
}
