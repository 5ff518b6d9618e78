//! Verification of whole HTTP exchanges: status code, headers, content type,
//! query parameters and body.

use super::{
    BodySchema, Direction, PartialValidationConfig, Violation, ViolationKind, path, validate,
    validate_str,
};
use crate::models::contract::EndpointId;
use crate::models::matcher::Matcher;
use indexmap::IndexMap;
use serde_json::Value;

/// What a provider promises for one response
#[derive(Debug, Clone)]
pub struct ResponseContract {
    pub status: u16,
    pub headers: IndexMap<String, Matcher>,
    pub content_type: Option<String>,
    pub body: Option<BodySchema>,
}

impl ResponseContract {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: IndexMap::new(),
            content_type: None,
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, matcher: Matcher) -> Self {
        self.headers.insert(name.into(), matcher);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<BodySchema>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct QueryParameter {
    pub required: bool,
    pub matcher: Matcher,
}

/// What a provider accepts for one request
#[derive(Debug, Clone, Default)]
pub struct RequestContract {
    pub query: IndexMap<String, QueryParameter>,
    pub headers: IndexMap<String, Matcher>,
    pub content_type: Option<String>,
    pub body: Option<BodySchema>,
}

impl RequestContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, name: impl Into<String>, required: bool, matcher: Matcher) -> Self {
        self.query
            .insert(name.into(), QueryParameter { required, matcher });
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, matcher: Matcher) -> Self {
        self.headers.insert(name.into(), matcher);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<BodySchema>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObservedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ObservedResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObservedRequest {
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ObservedRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Verify an observed response. A status mismatch is reported alone.
pub fn verify_response(
    endpoint: &EndpointId,
    contract: &ResponseContract,
    observed: &ObservedResponse,
    config: Option<&PartialValidationConfig>,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    if contract.status != observed.status {
        violations.push(
            Violation::new(
                ViolationKind::UnexpectedStatusCode,
                path::ROOT,
                format!("expected status {} but got {}", contract.status, observed.status),
            )
            .with_expected(contract.status.to_string())
            .with_actual(observed.status.to_string()),
        );
    } else {
        check_headers(&contract.headers, &observed.headers, &mut violations);
        check_content_type(
            contract.content_type.as_deref(),
            &observed.headers,
            &mut violations,
        );
        if let Some(body) = &contract.body {
            check_body(
                body,
                observed.body.as_deref(),
                Direction::Response,
                config,
                &mut violations,
            );
        }
    }

    tag_endpoint(endpoint, violations)
}

/// Verify an observed request
pub fn verify_request(
    endpoint: &EndpointId,
    contract: &RequestContract,
    observed: &ObservedRequest,
    config: Option<&PartialValidationConfig>,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (name, parameter) in &contract.query {
        let at = path::child(&path::child(path::ROOT, "query"), name);
        match observed.query.iter().find(|(key, _)| key == name) {
            None if parameter.required => violations.push(
                Violation::new(
                    ViolationKind::MissingQueryParameter,
                    at,
                    format!("required query parameter '{}' is missing", name),
                )
                .with_expected(parameter.matcher.describe()),
            ),
            None => {}
            Some((_, raw)) => check_text(
                raw,
                &parameter.matcher,
                ViolationKind::InvalidQueryParameterValue,
                &at,
                &mut violations,
            ),
        }
    }

    check_headers(&contract.headers, &observed.headers, &mut violations);
    check_content_type(
        contract.content_type.as_deref(),
        &observed.headers,
        &mut violations,
    );
    if let Some(body) = &contract.body {
        check_body(
            body,
            observed.body.as_deref(),
            Direction::Request,
            config,
            &mut violations,
        );
    }

    tag_endpoint(endpoint, violations)
}

fn tag_endpoint(endpoint: &EndpointId, violations: Vec<Violation>) -> Vec<Violation> {
    let endpoint = endpoint.to_string();
    violations
        .into_iter()
        .map(|violation| violation.with_endpoint(endpoint.clone()))
        .collect()
}

/// Header names compare case-insensitively
fn find_header<'h>(headers: &'h [(String, String)], name: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn check_headers(
    expected: &IndexMap<String, Matcher>,
    observed: &[(String, String)],
    out: &mut Vec<Violation>,
) {
    for (name, matcher) in expected {
        let at = path::child(&path::child(path::ROOT, "headers"), &name.to_ascii_lowercase());
        match find_header(observed, name) {
            Some(raw) => check_text(raw, matcher, ViolationKind::InvalidHeaderValue, &at, out),
            None => out.push(
                Violation::new(
                    ViolationKind::MissingHeader,
                    at,
                    format!("header '{}' is missing", name),
                )
                .with_expected(matcher.describe()),
            ),
        }
    }
}

fn check_content_type(
    expected: Option<&str>,
    observed: &[(String, String)],
    out: &mut Vec<Violation>,
) {
    let Some(expected) = expected else {
        return;
    };

    let actual = find_header(observed, "content-type");
    let matches = actual.is_some_and(|actual| media_essence(actual) == media_essence(expected));
    if !matches {
        out.push(
            Violation::new(
                ViolationKind::InvalidContentType,
                path::child(&path::child(path::ROOT, "headers"), "content-type"),
                format!("expected content type {}", expected),
            )
            .with_expected(expected)
            .with_actual(actual.unwrap_or("none")),
        );
    }
}

/// `application/json; charset=utf-8` -> `application/json`
fn media_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Check a textual value (header or query parameter) against a matcher.
/// Nested violations are re-rooted under `at` and reported with `kind`.
fn check_text(
    raw: &str,
    matcher: &Matcher,
    kind: ViolationKind,
    at: &str,
    out: &mut Vec<Violation>,
) {
    let value = coerce_text(raw, matcher);
    let nested = validate(&value, matcher, Direction::Request, None);
    out.extend(nested.into_iter().map(|violation| {
        let message = format!("{}: {}", kind, violation.message);
        Violation {
            kind,
            message,
            ..violation.rebase(at)
        }
    }));
}

fn coerce_text(raw: &str, matcher: &Matcher) -> Value {
    if matcher.expects_number()
        && let Ok(number) = serde_json::from_str::<serde_json::Number>(raw.trim())
    {
        return Value::Number(number);
    }
    if matcher.expects_boolean() {
        match raw.trim() {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
    }
    Value::String(raw.to_string())
}

fn check_body(
    body: &BodySchema,
    raw: Option<&str>,
    direction: Direction,
    config: Option<&PartialValidationConfig>,
    out: &mut Vec<Violation>,
) {
    match raw {
        Some(raw) if !raw.trim().is_empty() => {
            out.extend(validate_str(raw, body, direction, config));
        }
        _ => out.push(
            Violation::new(
                ViolationKind::InvalidFormat,
                path::ROOT,
                format!("expected a JSON {} body but none was sent", direction),
            )
            .with_expected("JSON document")
            .with_actual("empty body"),
        ),
    }
}
