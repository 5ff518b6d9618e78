use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use treaty::cli::ReportFormat;
use treaty::config::FailOn;
use treaty::loader::load_schema_set;
use treaty::models::contract::{ApiSchemaSet, EndpointId, EndpointSchemas};
use treaty::models::schema::SchemaNode;
use treaty::{ChangeKind, Severity, TreatyError, commands, compare};

fn fixture(name: &str) -> ApiSchemaSet {
    load_schema_set(Path::new("tests/fixtures").join(name)).expect("fixture should load")
}

#[test]
fn test_compare_fixture_versions() {
    let v1 = fixture("users_v1.yaml");
    let v2 = fixture("users_v2.yaml");

    let report = compare(&v1, &v2);
    assert!(report.has_breaking_changes);

    let summary: Vec<(String, ChangeKind, Severity, Option<String>)> = report
        .changes
        .iter()
        .map(|c| (c.endpoint.clone(), c.kind, c.severity, c.path.clone()))
        .collect();

    let at = |p: &str| Some(p.to_string());
    assert_eq!(
        summary,
        vec![
            (
                "GET /users".to_string(),
                ChangeKind::FieldAdded,
                Severity::NonBreaking,
                at("$[*].email")
            ),
            (
                "GET /users".to_string(),
                ChangeKind::StatusCodeAdded,
                Severity::NonBreaking,
                at("$")
            ),
            (
                "POST /users".to_string(),
                ChangeKind::RequiredAdded,
                Severity::Breaking,
                at("$.role")
            ),
            (
                "POST /users".to_string(),
                ChangeKind::FieldAdded,
                Severity::NonBreaking,
                at("$.email")
            ),
            (
                "POST /users".to_string(),
                ChangeKind::StatusCodeRemoved,
                Severity::Breaking,
                at("$")
            ),
            (
                "GET /users/{id}".to_string(),
                ChangeKind::FieldAdded,
                Severity::NonBreaking,
                at("$.email")
            ),
            (
                "DELETE /users/{id}".to_string(),
                ChangeKind::EndpointRemoved,
                Severity::Breaking,
                None
            ),
            (
                "GET /health".to_string(),
                ChangeKind::EndpointAdded,
                Severity::NonBreaking,
                None
            ),
        ]
    );
    assert_eq!(report.breaking().count(), 3);
}

#[test]
fn test_compare_is_pure_and_repeatable() {
    let v1 = fixture("users_v1.yaml");
    let v2 = fixture("users_v2.yaml");

    assert_eq!(compare(&v1, &v2), compare(&v1, &v2));
    assert!(compare(&v1, &v1).is_empty());
    assert!(compare(&v2, &v2).is_empty());
}

#[test]
fn test_reverse_direction_classification() {
    let v1 = fixture("users_v1.yaml");
    let v2 = fixture("users_v2.yaml");

    let report = compare(&v2, &v1);
    let kinds: Vec<ChangeKind> = report.changes.iter().map(|c| c.kind).collect();

    // dropping a response field is breaking, dropping a request field is not
    assert!(report.changes.iter().any(|c| c.kind == ChangeKind::FieldRemoved
        && c.severity == Severity::Breaking
        && c.path.as_deref() == Some("$.email")));
    assert!(report.changes.iter().any(|c| c.kind == ChangeKind::RequiredRemoved
        && c.severity == Severity::NonBreaking
        && c.path.as_deref() == Some("$.role")));
    assert!(kinds.contains(&ChangeKind::EndpointRemoved));
    assert!(kinds.contains(&ChangeKind::EndpointAdded));
}

#[test]
fn test_response_scenario_optional_field_added() {
    let user = SchemaNode::object()
        .required_property("id", SchemaNode::integer())
        .required_property("name", SchemaNode::string());
    let endpoint = EndpointId::new("GET", "/users/{id}");

    let v1 = ApiSchemaSet::new().with_endpoint(
        endpoint.clone(),
        EndpointSchemas::new().with_response(200, Some(user.clone())),
    );
    let v2 = ApiSchemaSet::new().with_endpoint(
        endpoint,
        EndpointSchemas::new().with_response(
            200,
            Some(user.property("email", SchemaNode::formatted("email"))),
        ),
    );

    let report = compare(&v1, &v2);
    assert_eq!(report.breaking().count(), 0);
    assert_eq!(report.non_breaking().count(), 1);
    assert_eq!(report.changes[0].kind, ChangeKind::FieldAdded);
}

#[test]
fn test_request_scenario_required_field_added() {
    let endpoint = EndpointId::new("POST", "/users");
    let v1 = ApiSchemaSet::new().with_endpoint(
        endpoint.clone(),
        EndpointSchemas::new()
            .with_request(SchemaNode::object().required_property("name", SchemaNode::string())),
    );
    let v2 = ApiSchemaSet::new().with_endpoint(
        endpoint,
        EndpointSchemas::new().with_request(
            SchemaNode::object()
                .required_property("name", SchemaNode::string())
                .required_property("role", SchemaNode::string()),
        ),
    );

    let report = compare(&v1, &v2);
    assert!(report.has_breaking_changes);
    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].kind, ChangeKind::RequiredAdded);
    assert_eq!(report.changes[0].severity, Severity::Breaking);
}

#[test]
fn test_diff_command_exit_policy() {
    let v1 = Path::new("tests/fixtures/users_v1.yaml");
    let v2 = Path::new("tests/fixtures/users_v2.yaml");

    assert!(commands::execute_diff(v1, v2, ReportFormat::Json, FailOn::Breaking).unwrap());
    assert!(!commands::execute_diff(v1, v1, ReportFormat::Text, FailOn::Any).unwrap());
}

#[test]
fn test_cyclic_document_is_rejected() {
    let yaml = r##"
openapi: 3.0.3
info:
  title: Tree API
  version: 1.0.0
paths:
  /tree:
    get:
      responses:
        '200':
          description: A tree
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Tree'
components:
  schemas:
    Tree:
      type: object
      properties:
        children:
          type: array
          items:
            $ref: '#/components/schemas/Tree'
"##;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let result = load_schema_set(file.path());
    assert!(matches!(
        result,
        Err(TreatyError::CyclicSchema(members)) if members == vec!["Tree", "Tree"]
    ));
}
