use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreatyError {
    #[error("Failed to load API description: {0}")]
    DocumentLoadError(String),

    #[error("Unsupported OpenAPI version: {0}. Only 3.0.x and 3.1.x are supported.")]
    UnsupportedVersion(String),

    #[error("Unresolved schema reference: {0}")]
    UnresolvedReference(String),

    #[error("Cyclic schema references: {}", .0.join(" -> "))]
    CyclicSchema(Vec<String>),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TreatyError>;
