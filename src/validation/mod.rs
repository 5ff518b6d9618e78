//! Structural validation of JSON values against schema and matcher trees.

mod exchange;
pub mod formats;
mod matchers;
pub mod path;
mod structural;

pub use exchange::{
    ObservedRequest, ObservedResponse, QueryParameter, RequestContract, ResponseContract,
    verify_request, verify_response,
};

pub use crate::models::schema::Direction;

use crate::models::matcher::Matcher;
use crate::models::schema::{SchemaKind, SchemaNode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a validation violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    // Body structure
    MissingRequired,
    InvalidType,
    InvalidFormat,
    OutOfRange,
    InvalidEnumValue,
    PatternMismatch,
    UnexpectedNull,
    UnexpectedField,

    // HTTP exchange
    UnexpectedStatusCode,
    MissingHeader,
    InvalidHeaderValue,
    InvalidContentType,
    MissingQueryParameter,
    InvalidQueryParameterValue,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::MissingRequired => write!(f, "Missing required property"),
            ViolationKind::InvalidType => write!(f, "Invalid type"),
            ViolationKind::InvalidFormat => write!(f, "Invalid format"),
            ViolationKind::OutOfRange => write!(f, "Out of range"),
            ViolationKind::InvalidEnumValue => write!(f, "Invalid enum value"),
            ViolationKind::PatternMismatch => write!(f, "Pattern mismatch"),
            ViolationKind::UnexpectedNull => write!(f, "Unexpected null"),
            ViolationKind::UnexpectedField => write!(f, "Unexpected field"),
            ViolationKind::UnexpectedStatusCode => write!(f, "Unexpected status code"),
            ViolationKind::MissingHeader => write!(f, "Missing header"),
            ViolationKind::InvalidHeaderValue => write!(f, "Invalid header value"),
            ViolationKind::InvalidContentType => write!(f, "Invalid content type"),
            ViolationKind::MissingQueryParameter => write!(f, "Missing query parameter"),
            ViolationKind::InvalidQueryParameterValue => {
                write!(f, "Invalid query parameter value")
            }
        }
    }
}

/// A single diagnostic produced by a validation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub endpoint: Option<String>,
    pub path: String,
    pub message: String,
    pub kind: ViolationKind,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl Violation {
    pub fn new(kind: ViolationKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: None,
            path: path.into(),
            message: message.into(),
            kind,
            expected: None,
            actual: None,
        }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Move a violation produced relative to `$` under `parent`
    pub fn rebase(mut self, parent: &str) -> Self {
        self.path = path::splice(parent, &self.path);
        self
    }

    /// Format the violation with its endpoint and path context
    pub fn format(&self) -> String {
        let mut parts = Vec::new();

        if let Some(endpoint) = &self.endpoint {
            parts.push(format!("[{}]", endpoint));
        }

        parts.push(format!("{}:", self.path));
        parts.push(self.message.clone());

        match (&self.expected, &self.actual) {
            (Some(e), Some(a)) => parts.push(format!("(expected: {}, actual: {})", e, a)),
            (Some(e), None) => parts.push(format!("(expected: {})", e)),
            (None, Some(a)) => parts.push(format!("(actual: {})", a)),
            (None, None) => {}
        }

        parts.join(" ")
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// Per-call validation policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialValidationConfig {
    /// When non-empty, only these top-level properties are checked
    pub properties_to_validate: Option<Vec<String>>,
    pub ignore_extra_fields: bool,
    pub strict_mode: bool,
}

impl PartialValidationConfig {
    pub fn strict() -> Self {
        Self {
            strict_mode: true,
            ..Self::default()
        }
    }

    pub fn only<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().with_properties(properties)
    }

    /// Restrict checking to these top-level properties; an empty list checks everything
    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let properties: Vec<String> = properties.into_iter().map(Into::into).collect();
        self.properties_to_validate = (!properties.is_empty()).then_some(properties);
        self
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn with_ignore_extra_fields(mut self, ignore: bool) -> Self {
        self.ignore_extra_fields = ignore;
        self
    }

    /// Whether a top-level property falls inside the allow-list
    pub fn selects(&self, name: &str) -> bool {
        match &self.properties_to_validate {
            Some(list) if !list.is_empty() => list.iter().any(|p| p == name),
            _ => true,
        }
    }
}

/// Traversal state shared by every node of one validation pass
#[derive(Debug, Clone, Copy)]
pub struct Walker<'a> {
    direction: Direction,
    config: &'a PartialValidationConfig,
    nested: bool,
}

impl<'a> Walker<'a> {
    pub fn new(direction: Direction, config: &'a PartialValidationConfig) -> Self {
        Self {
            direction,
            config,
            nested: false,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// A walker for a sub-tree validated relative to its own `$`
    pub(crate) fn nested(&self) -> Self {
        Self {
            nested: true,
            ..*self
        }
    }

    /// The allow-list only filters properties of the root object
    pub(crate) fn is_selected(&self, at: &str, name: &str) -> bool {
        if self.nested || at != path::ROOT {
            return true;
        }
        self.config.selects(name)
    }

    /// Whether an undeclared property must be reported
    pub(crate) fn reports_extra_field(&self, additional_allowed: bool) -> bool {
        !self.config.ignore_extra_fields && (!additional_allowed || self.config.strict_mode)
    }
}

/// Something a JSON value can be checked against and sampled from
pub trait Expectation {
    /// Append every violation of `value` at `at` to `out`
    fn check(&self, walker: &Walker<'_>, value: &Value, at: &str, out: &mut Vec<Violation>);

    /// A representative value that passes `check` in the given direction
    fn sample(&self, direction: Direction) -> Value;
}

impl Expectation for SchemaNode {
    fn check(&self, walker: &Walker<'_>, value: &Value, at: &str, out: &mut Vec<Violation>) {
        structural::check_schema(self, walker, value, at, out);
    }

    fn sample(&self, direction: Direction) -> Value {
        crate::sample::schema_sample(self, direction)
    }
}

impl Expectation for Matcher {
    fn check(&self, walker: &Walker<'_>, value: &Value, at: &str, out: &mut Vec<Violation>) {
        matchers::check_matcher(self, walker, value, at, out);
    }

    fn sample(&self, direction: Direction) -> Value {
        crate::sample::matcher_sample(self, direction)
    }
}

/// A body expectation stored on a contract: a schema tree or a matcher tree
#[derive(Debug, Clone, PartialEq)]
pub enum BodySchema {
    Schema(SchemaNode),
    Matcher(Matcher),
}

impl From<SchemaNode> for BodySchema {
    fn from(schema: SchemaNode) -> Self {
        BodySchema::Schema(schema)
    }
}

impl From<Matcher> for BodySchema {
    fn from(matcher: Matcher) -> Self {
        BodySchema::Matcher(matcher)
    }
}

impl Expectation for BodySchema {
    fn check(&self, walker: &Walker<'_>, value: &Value, at: &str, out: &mut Vec<Violation>) {
        match self {
            BodySchema::Schema(schema) => schema.check(walker, value, at, out),
            BodySchema::Matcher(matcher) => matcher.check(walker, value, at, out),
        }
    }

    fn sample(&self, direction: Direction) -> Value {
        match self {
            BodySchema::Schema(schema) => schema.sample(direction),
            BodySchema::Matcher(matcher) => matcher.sample(direction),
        }
    }
}

/// Validate a JSON value, collecting every violation in one pass
pub fn validate<E>(
    value: &Value,
    expected: &E,
    direction: Direction,
    config: Option<&PartialValidationConfig>,
) -> Vec<Violation>
where
    E: Expectation + ?Sized,
{
    let default_config = PartialValidationConfig::default();
    let walker = Walker::new(direction, config.unwrap_or(&default_config));

    let mut violations = Vec::new();
    expected.check(&walker, value, path::ROOT, &mut violations);

    tracing::trace!(
        direction = %direction,
        violations = violations.len(),
        "validated value"
    );
    violations
}

/// Validate raw JSON text. Text that does not parse yields a single `InvalidFormat`.
pub fn validate_str<E>(
    raw: &str,
    expected: &E,
    direction: Direction,
    config: Option<&PartialValidationConfig>,
) -> Vec<Violation>
where
    E: Expectation + ?Sized,
{
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => validate(&value, expected, direction, config),
        Err(e) => vec![
            Violation::new(
                ViolationKind::InvalidFormat,
                path::ROOT,
                format!("body is not valid JSON: {}", e),
            )
            .with_expected("JSON document"),
        ],
    }
}

/// Short rendering of a JSON value for the `actual` field
pub(crate) fn describe_value(value: &Value) -> String {
    const LIMIT: usize = 64;
    let text = value.to_string();
    if text.chars().count() > LIMIT {
        let truncated: String = text.chars().take(LIMIT).collect();
        format!("{}...", truncated)
    } else {
        text
    }
}

pub(crate) fn type_mismatch(at: &str, expected: impl std::fmt::Display, value: &Value) -> Violation {
    let actual = SchemaKind::of(value);
    let actual = match actual {
        SchemaKind::Integer => "integer",
        SchemaKind::Number => "number",
        SchemaKind::String => "string",
        SchemaKind::Boolean => "boolean",
        SchemaKind::Object => "object",
        SchemaKind::Array => "array",
        SchemaKind::Null => "null",
        SchemaKind::Any => "any",
    };
    Violation::new(
        ViolationKind::InvalidType,
        at,
        format!("expected {} but found {}", expected, actual),
    )
    .with_expected(expected.to_string())
    .with_actual(actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_violation_format() {
        let violation = Violation::new(ViolationKind::OutOfRange, "$.age", "value out of range")
            .with_expected("<= 100")
            .with_actual("150")
            .with_endpoint("POST /users");

        assert_eq!(
            violation.format(),
            "[POST /users] $.age: value out of range (expected: <= 100, actual: 150)"
        );
    }

    #[test]
    fn test_rebase_splices_paths() {
        let violation = Violation::new(ViolationKind::InvalidType, "$.x", "bad").rebase("$.field");
        assert_eq!(violation.path, "$.field.x");
    }

    #[test]
    fn test_malformed_json_is_single_violation() {
        let violations = validate_str("{not json", &SchemaNode::object(), Direction::Request, None);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::InvalidFormat);
        assert_eq!(violations[0].path, "$");
    }

    #[test]
    fn test_allow_list_selection() {
        let config = PartialValidationConfig::only(["id"]);
        assert!(config.selects("id"));
        assert!(!config.selects("name"));
        assert!(PartialValidationConfig::only(Vec::<String>::new()).selects("name"));
    }

    #[test]
    fn test_describe_value_truncates() {
        let long = json!("x".repeat(200));
        assert!(describe_value(&long).ends_with("..."));
        assert_eq!(describe_value(&json!(150)), "150");
    }
}
