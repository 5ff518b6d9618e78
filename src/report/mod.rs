//! Human-readable and JSON renderings of validation and comparison results.

use crate::compare::{Change, ComparisonReport};
use crate::error::Result;
use crate::validation::Violation;
use colored::*;
use std::fmt::Write;

/// Render violations as coloured text, one line per violation
pub fn render_violations(violations: &[Violation]) -> String {
    let mut output = String::new();

    if violations.is_empty() {
        let _ = writeln!(output, "{}", "✓ Payload conforms to the contract".green());
        return output;
    }

    let _ = writeln!(
        output,
        "{}",
        format!("✗ {} violation(s) found:", violations.len())
            .red()
            .bold()
    );
    for violation in violations {
        let _ = write!(output, "  {} ", "•".red());
        if let Some(endpoint) = &violation.endpoint {
            let _ = write!(output, "{} ", format!("[{}]", endpoint).dimmed());
        }
        let _ = write!(
            output,
            "{} {} {}",
            violation.path.bold(),
            format!("{}:", violation.kind).yellow(),
            violation.message
        );
        match (&violation.expected, &violation.actual) {
            (Some(expected), Some(actual)) => {
                let _ = write!(output, " (expected: {}, actual: {})", expected, actual);
            }
            (Some(expected), None) => {
                let _ = write!(output, " (expected: {})", expected);
            }
            (None, Some(actual)) => {
                let _ = write!(output, " (actual: {})", actual);
            }
            (None, None) => {}
        }
        output.push('\n');
    }
    output
}

/// Render a comparison report grouped by severity
pub fn render_comparison(report: &ComparisonReport) -> String {
    let mut output = String::new();

    if report.is_empty() {
        let _ = writeln!(output, "{}", "✓ No changes detected".green());
        return output;
    }

    let breaking: Vec<&Change> = report.breaking().collect();
    let non_breaking: Vec<&Change> = report.non_breaking().collect();

    if !breaking.is_empty() {
        let _ = writeln!(
            output,
            "{}",
            format!("Breaking changes ({}):", breaking.len()).red().bold()
        );
        for change in &breaking {
            let _ = writeln!(output, "  {} {}", "✗".red(), change_line(change));
        }
        output.push('\n');
    }

    if !non_breaking.is_empty() {
        let _ = writeln!(
            output,
            "{}",
            format!("Non-breaking changes ({}):", non_breaking.len()).bold()
        );
        for change in &non_breaking {
            let _ = writeln!(output, "  {} {}", "•".bright_blue(), change_line(change));
        }
        output.push('\n');
    }

    let summary = format!(
        "{} change(s): {} breaking, {} non-breaking",
        report.changes.len(),
        breaking.len(),
        non_breaking.len()
    );
    if report.has_breaking_changes {
        let _ = writeln!(output, "{}", summary.red().bold());
    } else {
        let _ = writeln!(output, "{}", summary.green());
    }
    output
}

fn change_line(change: &Change) -> String {
    let mut line = change.endpoint.bold().to_string();
    if let Some(location) = &change.location {
        line.push_str(&format!(" {}", location.cyan()));
    }
    if let Some(path) = &change.path {
        line.push_str(&format!(" {}", path));
    }
    line.push_str(&format!(
        " {} {}",
        format!("{}:", change.kind).yellow(),
        change.description
    ));
    line
}

pub fn violations_json(violations: &[Violation]) -> Result<String> {
    Ok(serde_json::to_string_pretty(violations)?)
}

pub fn comparison_json(report: &ComparisonReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
