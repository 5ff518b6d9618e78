use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The subset of an OpenAPI 3.0/3.1 document needed to derive body schemas
/// https://spec.openapis.org/oas/latest.html
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// The OpenAPI version (e.g., "3.0.3")
    pub openapi: String,

    pub info: Info,

    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    pub title: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// Declared operations with their upper-case method names
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("GET", &self.get),
            ("PUT", &self.put),
            ("POST", &self.post),
            ("DELETE", &self.delete),
            ("OPTIONS", &self.options),
            ("HEAD", &self.head),
            ("PATCH", &self.patch),
            ("TRACE", &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, operation)| operation.as_ref().map(|op| (method, op)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "operationId")]
    pub operation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "requestBody")]
    pub request_body: Option<RefOr<RequestBody>>,

    /// Status code (or `default`, `2XX`) -> response
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<Response>>,
}

/// Either an inline object or a `$ref` to a component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Item(T),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaObject>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, SchemaObject>,

    #[serde(default, rename = "requestBodies")]
    pub request_bodies: IndexMap<String, RequestBody>,

    #[serde(default)]
    pub responses: IndexMap<String, Response>,
}

/// `type` is a single name in 3.0 and may be a list in 3.1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(String),
    Multiple(Vec<String>),
}

impl TypeSet {
    pub fn names(&self) -> Vec<&str> {
        match self {
            TypeSet::Single(name) => vec![name.as_str()],
            TypeSet::Multiple(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaObject>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscriminatorObject {
    #[serde(rename = "propertyName")]
    pub property_name: String,

    /// Discriminator value -> schema reference
    #[serde(default)]
    pub mapping: IndexMap<String, String>,
}

/// A JSON Schema object as it appears inside an OpenAPI document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaObject {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "$ref")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub schema_type: Option<TypeSet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "enum")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "const")]
    pub const_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaObject>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaObject>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaObject>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaObject>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaObject>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<DiscriminatorObject>,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub write_only: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaObject {
    /// Every `$ref` reachable from this schema without passing through another `$ref`
    pub fn references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<&'a str>) {
        if let Some(reference) = &self.reference {
            refs.push(reference);
            return;
        }
        for property in self.properties.values() {
            property.collect_references(refs);
        }
        if let Some(items) = &self.items {
            items.collect_references(refs);
        }
        if let Some(AdditionalProperties::Schema(schema)) = &self.additional_properties {
            schema.collect_references(refs);
        }
        for branch in self.one_of.iter().chain(&self.any_of).chain(&self.all_of) {
            branch.collect_references(refs);
        }
        if let Some(discriminator) = &self.discriminator {
            refs.extend(discriminator.mapping.values().map(String::as_str));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schema_object() {
        let yaml = r##"
type: object
required: [id]
additionalProperties: false
properties:
  id:
    type: string
    format: uuid
    readOnly: true
  tags:
    type: array
    minItems: 1
    items:
      $ref: '#/components/schemas/Tag'
  owner:
    oneOf:
      - $ref: '#/components/schemas/User'
      - type: 'null'
"##;
        let schema: SchemaObject = serde_yaml::from_str(yaml).unwrap();

        assert!(matches!(schema.schema_type, Some(TypeSet::Single(ref t)) if t == "object"));
        assert!(matches!(
            schema.additional_properties,
            Some(AdditionalProperties::Allowed(false))
        ));
        assert!(schema.properties["id"].read_only);
        assert_eq!(schema.properties["tags"].min_items, Some(1));
        assert_eq!(
            schema.references(),
            vec!["#/components/schemas/Tag", "#/components/schemas/User"]
        );
    }

    #[test]
    fn test_type_list_of_openapi_31() {
        let schema: SchemaObject = serde_yaml::from_str("type: [string, 'null']").unwrap();
        let names = schema.schema_type.as_ref().map(TypeSet::names);
        assert_eq!(names, Some(vec!["string", "null"]));
    }

    #[test]
    fn test_operations_in_method_order() {
        let yaml = r#"
post:
  responses: {}
get:
  responses: {}
"#;
        let item: PathItem = serde_yaml::from_str(yaml).unwrap();
        let methods: Vec<&str> = item.operations().map(|(m, _)| m).collect();
        assert_eq!(methods, vec!["GET", "POST"]);
    }
}
