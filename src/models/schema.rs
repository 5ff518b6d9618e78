use crate::error::{Result, TreatyError};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Which side of an exchange a payload belongs to.
///
/// Schemas are direction-agnostic; only the call site knows whether it is
/// looking at a request or a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Request => write!(f, "request"),
            Direction::Response => write!(f, "response"),
        }
    }
}

/// Directional visibility of an object property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Always,
    /// Write-only: must not appear in responses
    RequestOnly,
    /// Read-only: must not appear in requests
    ResponseOnly,
}

impl Visibility {
    /// Whether a property with this visibility may appear in the given direction
    pub fn allows(self, direction: Direction) -> bool {
        !matches!(
            (self, direction),
            (Visibility::RequestOnly, Direction::Response)
                | (Visibility::ResponseOnly, Direction::Request)
        )
    }
}

/// Declared JSON kind of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Any,
}

impl SchemaKind {
    /// Runtime kind of a JSON value. Numbers without a fractional part report `Integer`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => SchemaKind::Null,
            Value::Bool(_) => SchemaKind::Boolean,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0) {
                    SchemaKind::Integer
                } else {
                    SchemaKind::Number
                }
            }
            Value::String(_) => SchemaKind::String,
            Value::Array(_) => SchemaKind::Array,
            Value::Object(_) => SchemaKind::Object,
        }
    }

    /// Whether a value of runtime kind `actual` satisfies this declared kind
    pub fn accepts(self, actual: SchemaKind) -> bool {
        match self {
            SchemaKind::Any => true,
            SchemaKind::Number => matches!(actual, SchemaKind::Number | SchemaKind::Integer),
            expected => expected == actual,
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaKind::Object => "object",
            SchemaKind::Array => "array",
            SchemaKind::String => "string",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Null => "null",
            SchemaKind::Any => "any",
        };
        write!(f, "{}", name)
    }
}

/// Well-known string formats. Unknown tags are kept verbatim and never fail validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    Uuid,
    Email,
    DateTime,
    Date,
    Time,
    Uri,
    Other(String),
}

impl Format {
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "uuid" | "guid" => Format::Uuid,
            "email" => Format::Email,
            "date-time" => Format::DateTime,
            "date" => Format::Date,
            "time" => Format::Time,
            "uri" | "url" => Format::Uri,
            _ => Format::Other(tag.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Format::Uuid => "uuid",
            Format::Email => "email",
            Format::DateTime => "date-time",
            Format::Date => "date",
            Format::Time => "time",
            Format::Uri => "uri",
            Format::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A compiled regular expression that remembers its source text
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self> {
        let regex = Regex::new(source).map_err(|e| TreatyError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Unanchored search, as in OpenAPI `pattern`
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// The single textual check a string node carries: a format or a pattern, never both
#[derive(Debug, Clone, PartialEq)]
pub enum TextCheck {
    Format(Format),
    Pattern(Pattern),
}

/// Closed set of literals a leaf must equal
#[derive(Debug, Clone, PartialEq)]
pub enum Allowed {
    Enum(Vec<Value>),
    Const(Value),
}

impl Allowed {
    pub fn values(&self) -> &[Value] {
        match self {
            Allowed::Enum(values) => values,
            Allowed::Const(value) => std::slice::from_ref(value),
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.values().iter().any(|v| values_equal(v, value))
    }

    pub fn describe(&self) -> String {
        match self {
            Allowed::Const(value) => value.to_string(),
            Allowed::Enum(values) => format!(
                "one of [{}]",
                values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringRules {
    pub check: Option<TextCheck>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub allowed: Option<Allowed>,
}

impl StringRules {
    pub fn format(&self) -> Option<&Format> {
        match &self.check {
            Some(TextCheck::Format(format)) => Some(format),
            _ => None,
        }
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        match &self.check {
            Some(TextCheck::Pattern(pattern)) => Some(pattern),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberRules {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub allowed: Option<Allowed>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertySchema {
    pub name: String,
    pub schema: SchemaNode,
    pub visibility: Visibility,
}

impl PropertySchema {
    pub fn new(name: impl Into<String>, schema: SchemaNode) -> Self {
        Self {
            name: name.into(),
            schema,
            visibility: Visibility::Always,
        }
    }

    /// Mark as read-only (response only)
    pub fn read_only(mut self) -> Self {
        self.visibility = Visibility::ResponseOnly;
        self
    }

    /// Mark as write-only (request only)
    pub fn write_only(mut self) -> Self {
        self.visibility = Visibility::RequestOnly;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectShape {
    pub properties: IndexMap<String, PropertySchema>,
    pub required: IndexSet<String>,
    pub additional_properties: bool,
}

impl Default for ObjectShape {
    fn default() -> Self {
        Self {
            properties: IndexMap::new(),
            required: IndexSet::new(),
            additional_properties: true,
        }
    }
}

impl ObjectShape {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayShape {
    pub items: Box<SchemaNode>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositionMode {
    OneOf,
    AnyOf,
    AllOf,
}

impl fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositionMode::OneOf => write!(f, "oneOf"),
            CompositionMode::AnyOf => write!(f, "anyOf"),
            CompositionMode::AllOf => write!(f, "allOf"),
        }
    }
}

/// Selects a composition branch from the value of a named property
#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    pub property_name: String,
    /// Discriminator value -> branch index
    pub mapping: IndexMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub mode: CompositionMode,
    pub branches: Vec<SchemaNode>,
    pub discriminator: Option<Discriminator>,
}

/// The single active shape descriptor of a node
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Any,
    Null,
    Boolean(Option<Allowed>),
    String(StringRules),
    Integer(NumberRules),
    Number(NumberRules),
    Object(ObjectShape),
    Array(ArrayShape),
    Composition(Composition),
}

/// Immutable description of an expected JSON shape
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub shape: Shape,
    pub nullable: bool,
    pub example: Option<Value>,
    pub description: Option<String>,
}

impl SchemaNode {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            nullable: false,
            example: None,
            description: None,
        }
    }

    pub fn any() -> Self {
        Self::new(Shape::Any)
    }

    pub fn null() -> Self {
        Self::new(Shape::Null)
    }

    pub fn boolean() -> Self {
        Self::new(Shape::Boolean(None))
    }

    pub fn string() -> Self {
        Self::new(Shape::String(StringRules::default()))
    }

    pub fn integer() -> Self {
        Self::new(Shape::Integer(NumberRules::default()))
    }

    pub fn number() -> Self {
        Self::new(Shape::Number(NumberRules::default()))
    }

    pub fn object() -> Self {
        Self::new(Shape::Object(ObjectShape::default()))
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::new(Shape::Array(ArrayShape {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }))
    }

    pub fn composition(mode: CompositionMode, branches: Vec<SchemaNode>) -> Self {
        Self::new(Shape::Composition(Composition {
            mode,
            branches,
            discriminator: None,
        }))
    }

    pub fn one_of(branches: Vec<SchemaNode>) -> Self {
        Self::composition(CompositionMode::OneOf, branches)
    }

    pub fn any_of(branches: Vec<SchemaNode>) -> Self {
        Self::composition(CompositionMode::AnyOf, branches)
    }

    pub fn all_of(branches: Vec<SchemaNode>) -> Self {
        Self::composition(CompositionMode::AllOf, branches)
    }

    /// Shorthand for a string node carrying a format
    pub fn formatted(tag: &str) -> Self {
        Self::string().with_format(tag)
    }

    /// Declared kind; compositions report `Any`
    pub fn kind(&self) -> SchemaKind {
        match &self.shape {
            Shape::Any | Shape::Composition(_) => SchemaKind::Any,
            Shape::Null => SchemaKind::Null,
            Shape::Boolean(_) => SchemaKind::Boolean,
            Shape::String(_) => SchemaKind::String,
            Shape::Integer(_) => SchemaKind::Integer,
            Shape::Number(_) => SchemaKind::Number,
            Shape::Object(_) => SchemaKind::Object,
            Shape::Array(_) => SchemaKind::Array,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectShape> {
        match &self.shape {
            Shape::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Enumeration or constant attached to a leaf
    pub fn allowed(&self) -> Option<&Allowed> {
        match &self.shape {
            Shape::Boolean(allowed) => allowed.as_ref(),
            Shape::String(rules) => rules.allowed.as_ref(),
            Shape::Integer(rules) | Shape::Number(rules) => rules.allowed.as_ref(),
            _ => None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a format to a string node, replacing any pattern
    pub fn with_format(mut self, tag: &str) -> Self {
        if let Shape::String(rules) = &mut self.shape {
            rules.check = Some(TextCheck::Format(Format::parse(tag)));
        }
        self
    }

    /// Attach a pattern to a string node, replacing any format
    pub fn with_pattern(mut self, source: &str) -> Result<Self> {
        if let Shape::String(rules) = &mut self.shape {
            rules.check = Some(TextCheck::Pattern(Pattern::new(source)?));
        }
        Ok(self)
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        if let Shape::String(rules) = &mut self.shape {
            rules.min_length = min;
            rules.max_length = max;
        }
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        if let Shape::Integer(rules) | Shape::Number(rules) = &mut self.shape {
            rules.minimum = min;
            rules.maximum = max;
        }
        self
    }

    pub fn with_item_count(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        if let Shape::Array(array) = &mut self.shape {
            array.min_items = min;
            array.max_items = max;
        }
        self
    }

    pub fn with_enum(self, values: Vec<Value>) -> Self {
        self.with_allowed(Allowed::Enum(values))
    }

    pub fn with_const(self, value: Value) -> Self {
        self.with_allowed(Allowed::Const(value))
    }

    fn with_allowed(mut self, allowed: Allowed) -> Self {
        match &mut self.shape {
            Shape::Boolean(slot) => *slot = Some(allowed),
            Shape::String(rules) => rules.allowed = Some(allowed),
            Shape::Integer(rules) | Shape::Number(rules) => rules.allowed = Some(allowed),
            _ => {}
        }
        self
    }

    /// Add an optional property
    pub fn property(self, name: impl Into<String>, schema: SchemaNode) -> Self {
        self.with_property(PropertySchema::new(name, schema), false)
    }

    /// Add a required property
    pub fn required_property(self, name: impl Into<String>, schema: SchemaNode) -> Self {
        self.with_property(PropertySchema::new(name, schema), true)
    }

    pub fn with_property(mut self, property: PropertySchema, required: bool) -> Self {
        if let Shape::Object(object) = &mut self.shape {
            if required {
                object.required.insert(property.name.clone());
            } else {
                object.required.shift_remove(&property.name);
            }
            object.properties.insert(property.name.clone(), property);
        }
        self
    }

    pub fn additional_properties(mut self, allowed: bool) -> Self {
        if let Shape::Object(object) = &mut self.shape {
            object.additional_properties = allowed;
        }
        self
    }

    /// Attach a discriminator to a composition. Every mapped index must name a branch.
    pub fn with_discriminator<I, K>(mut self, property_name: &str, mapping: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, usize)>,
        K: Into<String>,
    {
        let Shape::Composition(composition) = &mut self.shape else {
            return Err(TreatyError::InvalidSchema(format!(
                "discriminator '{}' requires a composition node",
                property_name
            )));
        };

        let mapping: IndexMap<String, usize> =
            mapping.into_iter().map(|(k, i)| (k.into(), i)).collect();
        if let Some((value, index)) = mapping
            .iter()
            .find(|(_, index)| **index >= composition.branches.len())
        {
            return Err(TreatyError::InvalidSchema(format!(
                "discriminator value '{}' maps to branch {} but only {} branches exist",
                value,
                index,
                composition.branches.len()
            )));
        }

        composition.discriminator = Some(Discriminator {
            property_name: property_name.to_string(),
            mapping,
        });
        Ok(self)
    }
}

/// JSON equality that treats `1` and `1.0` as the same number
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}
