use super::converter::to_schema_set;
use crate::error::{Result, TreatyError};
use crate::models::contract::ApiSchemaSet;
use crate::models::openapi::OpenApiDocument;
use std::fs;
use std::path::Path;

/// Load an OpenAPI document (YAML or JSON) from a file
pub fn load_openapi<P: AsRef<Path>>(path: P) -> Result<OpenApiDocument> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| {
        TreatyError::DocumentLoadError(format!("Failed to read file {}: {}", path.display(), e))
    })?;

    let document = parse_openapi(&content)?;
    tracing::info!(
        path = %path.display(),
        title = %document.info.title,
        version = %document.info.version,
        paths = document.paths.len(),
        "loaded OpenAPI document"
    );
    Ok(document)
}

/// Parse an OpenAPI document from text. JSON is accepted as a subset of YAML.
pub fn parse_openapi(content: &str) -> Result<OpenApiDocument> {
    let document: OpenApiDocument = serde_yaml::from_str(content).map_err(|e| {
        TreatyError::DocumentLoadError(format!("Failed to parse OpenAPI document: {}", e))
    })?;

    check_version(&document)?;
    Ok(document)
}

/// Load a document and derive the body schemas of every endpoint
pub fn load_schema_set<P: AsRef<Path>>(path: P) -> Result<ApiSchemaSet> {
    let document = load_openapi(path)?;
    to_schema_set(&document)
}

fn check_version(document: &OpenApiDocument) -> Result<()> {
    if !document.openapi.starts_with("3.0") && !document.openapi.starts_with("3.1") {
        return Err(TreatyError::UnsupportedVersion(document.openapi.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_openapi() {
        let yaml = r#"
openapi: 3.0.0
info:
  title: Test API
  version: 1.0.0
paths:
  /test:
    get:
      operationId: getTest
      responses:
        '200':
          description: OK
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let result = load_openapi(file.path());
        assert!(result.is_ok());

        let document = result.unwrap();
        assert_eq!(document.info.title, "Test API");
        assert_eq!(document.openapi, "3.0.0");
    }

    #[test]
    fn test_load_json_document() {
        let json = r#"{
  "openapi": "3.1.0",
  "info": {"title": "Json API", "version": "2.0.0"},
  "paths": {"/ping": {"get": {"responses": {"204": {"description": "pong"}}}}}
}"#;

        let document = parse_openapi(json).unwrap();
        assert_eq!(document.info.title, "Json API");
        assert!(document.paths["/ping"].get.is_some());
    }

    #[test]
    fn test_load_invalid_version() {
        let yaml = r#"
openapi: 2.0.0
info:
  title: Test API
  version: 1.0.0
paths: {}
"#;

        let result = parse_openapi(yaml);
        assert!(matches!(result, Err(TreatyError::UnsupportedVersion(v)) if v == "2.0.0"));
    }

    #[test]
    fn test_load_malformed_document() {
        let result = parse_openapi("openapi: [unterminated");
        assert!(matches!(result, Err(TreatyError::DocumentLoadError(_))));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_openapi("/nonexistent/file.yaml");
        assert!(result.is_err());
    }
}
