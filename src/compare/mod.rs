//! Breaking-change classification between two versions of an API.

mod schema_diff;

use crate::models::contract::{ApiSchemaSet, EndpointId, EndpointSchemas};
use crate::models::schema::{Direction, SchemaNode, Shape};
use crate::validation::path;
use schema_diff::SchemaDiff;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of difference between two API versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    EndpointAdded,
    EndpointRemoved,
    FieldAdded,
    FieldRemoved,
    TypeChanged,
    RequiredAdded,
    RequiredRemoved,
    EnumNarrowed,
    EnumWidened,
    StatusCodeRemoved,
    StatusCodeAdded,
    FormatChanged,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::EndpointAdded => "Endpoint Added",
            ChangeKind::EndpointRemoved => "Endpoint Removed",
            ChangeKind::FieldAdded => "Field Added",
            ChangeKind::FieldRemoved => "Field Removed",
            ChangeKind::TypeChanged => "Type Changed",
            ChangeKind::RequiredAdded => "Required Added",
            ChangeKind::RequiredRemoved => "Required Removed",
            ChangeKind::EnumNarrowed => "Enum Narrowed",
            ChangeKind::EnumWidened => "Enum Widened",
            ChangeKind::StatusCodeRemoved => "Status Code Removed",
            ChangeKind::StatusCodeAdded => "Status Code Added",
            ChangeKind::FormatChanged => "Format Changed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Breaking,
    NonBreaking,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Breaking => write!(f, "breaking"),
            Severity::NonBreaking => write!(f, "non-breaking"),
        }
    }
}

/// One classified difference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub endpoint: String,
    pub kind: ChangeKind,
    pub severity: Severity,
    /// `request` or `response <status>`; absent for endpoint-level changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub description: String,
}

impl Change {
    pub fn new(
        endpoint: impl Into<String>,
        kind: ChangeKind,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            kind,
            severity,
            location: None,
            path: None,
            description: description.into(),
        }
    }

    pub fn at(mut self, location: impl Into<String>, path: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self.path = Some(path.into());
        self
    }

    pub fn is_breaking(&self) -> bool {
        self.severity == Severity::Breaking
    }

    pub fn format(&self) -> String {
        let mut output = format!("[{}] {} {}", self.severity, self.kind, self.endpoint);
        if let Some(location) = &self.location {
            output.push_str(&format!(" ({}", location));
            if let Some(path) = &self.path {
                output.push_str(&format!(" {}", path));
            }
            output.push(')');
        }
        output.push_str(&format!(": {}", self.description));
        output
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// Outcome of comparing two schema sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub changes: Vec<Change>,
    pub has_breaking_changes: bool,
}

impl ComparisonReport {
    pub fn new(changes: Vec<Change>) -> Self {
        let has_breaking_changes = changes.iter().any(Change::is_breaking);
        Self {
            changes,
            has_breaking_changes,
        }
    }

    pub fn breaking(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(|c| c.is_breaking())
    }

    pub fn non_breaking(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(|c| !c.is_breaking())
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Classify every difference between `old` and `new`.
///
/// Endpoints of `old` are reported in their declared order, followed by
/// endpoints that exist only in `new`.
pub fn compare(old: &ApiSchemaSet, new: &ApiSchemaSet) -> ComparisonReport {
    let mut changes = Vec::new();

    for (id, old_endpoint) in &old.endpoints {
        match new.get(id) {
            Some(new_endpoint) => compare_endpoint(id, old_endpoint, new_endpoint, &mut changes),
            None => changes.push(Change::new(
                id.to_string(),
                ChangeKind::EndpointRemoved,
                Severity::Breaking,
                "endpoint removed",
            )),
        }
    }

    for id in new.endpoints.keys() {
        if old.get(id).is_none() {
            changes.push(Change::new(
                id.to_string(),
                ChangeKind::EndpointAdded,
                Severity::NonBreaking,
                "endpoint added",
            ));
        }
    }

    let report = ComparisonReport::new(changes);
    tracing::debug!(
        changes = report.changes.len(),
        breaking = report.breaking().count(),
        "compared api schema sets"
    );
    report
}

fn compare_endpoint(
    id: &EndpointId,
    old: &EndpointSchemas,
    new: &EndpointSchemas,
    changes: &mut Vec<Change>,
) {
    let endpoint = id.to_string();

    compare_request(&endpoint, old.request.as_ref(), new.request.as_ref(), changes);

    for (status, old_body) in &old.responses {
        let location = format!("response {}", status);
        match new.responses.get(status) {
            None => changes.push(
                Change::new(
                    &endpoint,
                    ChangeKind::StatusCodeRemoved,
                    Severity::Breaking,
                    format!("status code {} is no longer documented", status),
                )
                .at(&location, path::ROOT),
            ),
            Some(new_body) => match (old_body, new_body) {
                (Some(old_body), Some(new_body)) => {
                    SchemaDiff::new(&endpoint, &location, Direction::Response, changes)
                        .node(path::ROOT, old_body, new_body)
                }
                (Some(_), None) => changes.push(
                    Change::new(
                        &endpoint,
                        ChangeKind::FieldRemoved,
                        Severity::Breaking,
                        "response body removed",
                    )
                    .at(&location, path::ROOT),
                ),
                (None, Some(_)) => changes.push(
                    Change::new(
                        &endpoint,
                        ChangeKind::FieldAdded,
                        Severity::NonBreaking,
                        "response body added",
                    )
                    .at(&location, path::ROOT),
                ),
                (None, None) => {}
            },
        }
    }

    for status in new.responses.keys() {
        if !old.responses.contains_key(status) {
            changes.push(
                Change::new(
                    &endpoint,
                    ChangeKind::StatusCodeAdded,
                    Severity::NonBreaking,
                    format!("status code {} added", status),
                )
                .at(format!("response {}", status), path::ROOT),
            );
        }
    }
}

fn compare_request(
    endpoint: &str,
    old: Option<&SchemaNode>,
    new: Option<&SchemaNode>,
    changes: &mut Vec<Change>,
) {
    const LOCATION: &str = "request";

    match (old, new) {
        (Some(old), Some(new)) => {
            SchemaDiff::new(endpoint, LOCATION, Direction::Request, changes)
                .node(path::ROOT, old, new)
        }
        (None, Some(new)) => {
            let change = if has_required_fields(new) {
                Change::new(
                    endpoint,
                    ChangeKind::RequiredAdded,
                    Severity::Breaking,
                    "request body with required fields added",
                )
            } else {
                Change::new(
                    endpoint,
                    ChangeKind::FieldAdded,
                    Severity::NonBreaking,
                    "request body added",
                )
            };
            changes.push(change.at(LOCATION, path::ROOT));
        }
        (Some(_), None) => changes.push(
            Change::new(
                endpoint,
                ChangeKind::FieldRemoved,
                Severity::NonBreaking,
                "request body removed",
            )
            .at(LOCATION, path::ROOT),
        ),
        (None, None) => {}
    }
}

fn has_required_fields(node: &SchemaNode) -> bool {
    match &node.shape {
        Shape::Object(object) => object.required.iter().any(|name| {
            object
                .properties
                .get(name)
                .is_none_or(|p| p.visibility.allows(Direction::Request))
        }),
        Shape::Composition(composition) => composition.branches.iter().any(has_required_fields),
        _ => !node.nullable,
    }
}
