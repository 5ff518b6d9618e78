use super::schema::SchemaNode;
use indexmap::IndexMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Endpoint identity: HTTP method plus path template.
///
/// Two identities are equal when their methods match case-insensitively and
/// their path templates differ only in path-parameter names.
#[derive(Debug, Clone)]
pub struct EndpointId {
    pub method: String,
    pub path: String,
}

impl EndpointId {
    pub fn new(method: impl AsRef<str>, path: impl Into<String>) -> Self {
        Self {
            method: method.as_ref().to_uppercase(),
            path: path.into(),
        }
    }

    /// Parse `"{METHOD} {path}"`, e.g. `"GET /users/{id}"`
    pub fn parse(text: &str) -> Option<Self> {
        let (method, path) = text.trim().split_once(' ')?;
        let path = path.trim();
        if method.is_empty() || !path.starts_with('/') {
            return None;
        }
        Some(Self::new(method, path))
    }

    /// Path template with every parameter name erased: `/users/{id}` -> `/users/{}`
    pub fn normalized_path(&self) -> String {
        let mut normalized = String::with_capacity(self.path.len());
        let mut in_param = false;
        for c in self.path.chars() {
            match c {
                '{' => {
                    in_param = true;
                    normalized.push('{');
                }
                '}' => {
                    in_param = false;
                    normalized.push('}');
                }
                _ if in_param => {}
                _ => normalized.push(c),
            }
        }
        normalized.trim_end_matches('/').to_string()
    }
}

impl PartialEq for EndpointId {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.normalized_path() == other.normalized_path()
    }
}

impl Eq for EndpointId {}

impl Hash for EndpointId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        self.normalized_path().hash(state);
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Request and per-status response body schemas of one endpoint.
///
/// A status code mapped to `None` is documented but has no body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointSchemas {
    pub request: Option<SchemaNode>,
    pub responses: IndexMap<String, Option<SchemaNode>>,
}

impl EndpointSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request(mut self, schema: SchemaNode) -> Self {
        self.request = Some(schema);
        self
    }

    pub fn with_response(mut self, status: impl ToString, schema: Option<SchemaNode>) -> Self {
        self.responses.insert(status.to_string(), schema);
        self
    }

    pub fn response(&self, status: &str) -> Option<&SchemaNode> {
        self.responses.get(status).and_then(Option::as_ref)
    }
}

/// All endpoint schemas of one API version
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiSchemaSet {
    pub title: Option<String>,
    pub version: Option<String>,
    pub endpoints: IndexMap<EndpointId, EndpointSchemas>,
}

impl ApiSchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, id: EndpointId, schemas: EndpointSchemas) -> Self {
        self.insert(id, schemas);
        self
    }

    pub fn insert(&mut self, id: EndpointId, schemas: EndpointSchemas) {
        self.endpoints.insert(id, schemas);
    }

    pub fn get(&self, id: &EndpointId) -> Option<&EndpointSchemas> {
        self.endpoints.get(id)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        let id = EndpointId::parse("get /users/{id}").unwrap();
        assert_eq!(id.method, "GET");
        assert_eq!(id.path, "/users/{id}");

        assert!(EndpointId::parse("GET").is_none());
        assert!(EndpointId::parse("GET users").is_none());
    }

    #[test]
    fn test_parameter_names_do_not_affect_identity() {
        let a = EndpointId::new("GET", "/users/{id}/posts/{postId}");
        let b = EndpointId::new("get", "/users/{userId}/posts/{id}");
        let c = EndpointId::new("GET", "/users/{id}");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.normalized_path(), "/users/{}/posts/{}");

        let set = ApiSchemaSet::new().with_endpoint(a, EndpointSchemas::new());
        assert!(set.get(&b).is_some());
    }
}
