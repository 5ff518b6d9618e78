use crate::config::FailOn;
use crate::validation::Direction;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "treaty")]
#[command(version)]
#[command(about = "Contract validation and breaking-change detection for JSON APIs", long_about = None)]
pub struct Cli {
    /// Settings file (YAML); TREATY_* environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two OpenAPI documents and classify every change
    Diff {
        /// Previous version of the API description
        #[arg(long)]
        old: PathBuf,

        /// New version of the API description
        #[arg(long)]
        new: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: ReportFormat,

        /// Which changes fail the command (overrides TREATY_FAIL_ON)
        #[arg(long)]
        fail_on: Option<FailOnArg>,
    },

    /// Validate a JSON payload against an endpoint's body schema
    Validate {
        /// Path to OpenAPI file
        #[arg(short, long)]
        openapi: PathBuf,

        /// Endpoint as "METHOD /path", e.g. "GET /users/{id}"
        #[arg(short, long)]
        endpoint: String,

        /// Which body of the exchange the payload is
        #[arg(short, long, default_value = "response")]
        direction: DirectionArg,

        /// Response status code (first documented 2xx if omitted)
        #[arg(short, long)]
        status: Option<String>,

        /// JSON payload file
        #[arg(short, long)]
        body: PathBuf,

        /// Report every undeclared property
        #[arg(long)]
        strict: bool,

        /// Never report undeclared properties
        #[arg(long)]
        ignore_extra: bool,

        /// Only check these top-level properties
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: ReportFormat,
    },

    /// Generate a sample payload for an endpoint
    Sample {
        /// Path to OpenAPI file
        #[arg(short, long)]
        openapi: PathBuf,

        /// Endpoint as "METHOD /path"
        #[arg(short, long)]
        endpoint: String,

        /// Which body of the exchange to generate
        #[arg(short, long, default_value = "response")]
        direction: DirectionArg,

        /// Response status code (first documented 2xx if omitted)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// List endpoints and their documented status codes
    List {
        /// Path to OpenAPI file
        #[arg(short, long)]
        openapi: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    /// Coloured text
    Text,
    /// JSON document
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    Request,
    Response,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Request => Direction::Request,
            DirectionArg::Response => Direction::Response,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FailOnArg {
    /// Fail only on breaking changes
    Breaking,
    /// Fail on any change
    Any,
}

impl From<FailOnArg> for FailOn {
    fn from(arg: FailOnArg) -> Self {
        match arg {
            FailOnArg::Breaking => FailOn::Breaking,
            FailOnArg::Any => FailOn::Any,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate_command() {
        let cli = Cli::try_parse_from([
            "treaty",
            "validate",
            "--openapi",
            "api.yaml",
            "--endpoint",
            "POST /users",
            "--direction",
            "request",
            "--body",
            "user.json",
            "--only",
            "name,email",
        ])
        .unwrap();

        let Commands::Validate {
            endpoint,
            direction,
            only,
            strict,
            ..
        } = cli.command
        else {
            panic!("expected the validate command");
        };
        assert_eq!(endpoint, "POST /users");
        assert_eq!(Direction::from(direction), Direction::Request);
        assert_eq!(only, vec!["name", "email"]);
        assert!(!strict);
    }

    #[test]
    fn test_parse_diff_with_global_config() {
        let cli = Cli::try_parse_from([
            "treaty", "diff", "--old", "v1.yaml", "--new", "v2.yaml", "--config", "treaty.yaml",
            "--fail-on", "any",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("treaty.yaml")));
        let Commands::Diff { fail_on, .. } = cli.command else {
            panic!("expected the diff command");
        };
        assert_eq!(fail_on.map(FailOn::from), Some(FailOn::Any));
    }
}
