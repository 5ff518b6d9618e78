//! Matchers: "a value of this kind" rules, and the builder that turns typed
//! example literals into matcher trees.

use super::schema::Pattern;
use crate::error::Result;
use indexmap::IndexMap;
use serde_json::Value;

/// A leaf rule, or one of the two structural wrappers (`ObjectOf`, `EachLike`)
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    Guid,
    AnyString,
    NonEmptyString,
    Email,
    Uri,
    Regex(Pattern),
    IntegerRange { min: Option<i64>, max: Option<i64> },
    DecimalRange { min: Option<f64>, max: Option<f64> },
    Boolean,
    DateTime,
    DateOnly,
    TimeOnly,
    OneOf(Vec<Value>),
    NullOnly,
    AnyValue,
    /// Accepts null, otherwise defers to the wrapped matcher
    Nullable(Box<Matcher>),
    /// Exact equality with an example value
    Literal(Value),
    ObjectOf(IndexMap<String, Matcher>),
    EachLike { item: Box<Matcher>, min_count: usize },
}

impl Matcher {
    pub fn regex(source: &str) -> Result<Self> {
        Ok(Matcher::Regex(Pattern::new(source)?))
    }

    pub fn integer(min: Option<i64>, max: Option<i64>) -> Self {
        Matcher::IntegerRange { min, max }
    }

    pub fn decimal(min: Option<f64>, max: Option<f64>) -> Self {
        Matcher::DecimalRange { min, max }
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Matcher::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn each_like(item: impl Into<Template>, min_count: usize) -> Self {
        Matcher::EachLike {
            item: Box::new(item.into().build()),
            min_count,
        }
    }

    pub fn or_null(self) -> Self {
        match self {
            Matcher::Nullable(_) | Matcher::NullOnly | Matcher::AnyValue => self,
            other => Matcher::Nullable(Box::new(other)),
        }
    }

    /// Whether null is an accepted value
    pub fn accepts_null(&self) -> bool {
        match self {
            Matcher::NullOnly | Matcher::AnyValue | Matcher::Nullable(_) => true,
            Matcher::Literal(value) => value.is_null(),
            Matcher::OneOf(values) => values.iter().any(Value::is_null),
            _ => false,
        }
    }

    /// Whether text values (headers, query parameters) should be read as numbers
    pub fn expects_number(&self) -> bool {
        match self {
            Matcher::IntegerRange { .. } | Matcher::DecimalRange { .. } => true,
            Matcher::Nullable(inner) => inner.expects_number(),
            Matcher::Literal(value) => value.is_number(),
            Matcher::OneOf(values) => values.iter().any(Value::is_number),
            _ => false,
        }
    }

    pub fn expects_boolean(&self) -> bool {
        match self {
            Matcher::Boolean => true,
            Matcher::Nullable(inner) => inner.expects_boolean(),
            Matcher::Literal(value) => value.is_boolean(),
            Matcher::OneOf(values) => values.iter().any(Value::is_boolean),
            _ => false,
        }
    }

    /// Short human description used in violation messages
    pub fn describe(&self) -> String {
        match self {
            Matcher::Guid => "guid".to_string(),
            Matcher::AnyString => "string".to_string(),
            Matcher::NonEmptyString => "non-empty string".to_string(),
            Matcher::Email => "email".to_string(),
            Matcher::Uri => "uri".to_string(),
            Matcher::Regex(pattern) => format!("string matching /{}/", pattern.as_str()),
            Matcher::IntegerRange { min, max } => {
                describe_range("integer", min.map(|v| v.to_string()), max.map(|v| v.to_string()))
            }
            Matcher::DecimalRange { min, max } => describe_range(
                "decimal",
                min.map(format_number),
                max.map(format_number),
            ),
            Matcher::Boolean => "boolean".to_string(),
            Matcher::DateTime => "date-time".to_string(),
            Matcher::DateOnly => "date".to_string(),
            Matcher::TimeOnly => "time".to_string(),
            Matcher::OneOf(values) => format!(
                "one of [{}]",
                values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Matcher::NullOnly => "null".to_string(),
            Matcher::AnyValue => "any value".to_string(),
            Matcher::Nullable(inner) => format!("{} or null", inner.describe()),
            Matcher::Literal(value) => value.to_string(),
            Matcher::ObjectOf(_) => "object".to_string(),
            Matcher::EachLike { min_count, .. } => {
                format!("array with at least {} items", min_count)
            }
        }
    }
}

fn describe_range(name: &str, min: Option<String>, max: Option<String>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{} between {} and {}", name, min, max),
        (Some(min), None) => format!("{} >= {}", name, min),
        (None, Some(max)) => format!("{} <= {}", name, max),
        (None, None) => name.to_string(),
    }
}

/// Render a bound without a trailing `.0` for whole numbers
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Typed structural description of an expected body: plain literals mixed
/// with matcher instances.
#[derive(Debug, Clone)]
pub enum Template {
    Literal(Value),
    Match(Matcher),
    Object(IndexMap<String, Template>),
    Array(Vec<Template>),
}

impl Template {
    pub fn object() -> ObjectTemplate {
        ObjectTemplate::default()
    }

    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Template>,
    {
        Template::Array(items.into_iter().map(Into::into).collect())
    }

    /// Convert into a matcher tree. Matcher leaves stay leaves; objects become
    /// `ObjectOf`, non-empty arrays become `EachLike` of their first element,
    /// everything else is literal equality.
    pub fn build(self) -> Matcher {
        match self {
            Template::Match(matcher) => matcher,
            Template::Literal(value) => from_literal(value),
            Template::Object(fields) => Matcher::ObjectOf(
                fields
                    .into_iter()
                    .map(|(name, field)| (name, field.build()))
                    .collect(),
            ),
            Template::Array(items) => match items.into_iter().next() {
                Some(first) => Matcher::EachLike {
                    item: Box::new(first.build()),
                    min_count: 1,
                },
                None => Matcher::Literal(Value::Array(vec![])),
            },
        }
    }
}

fn from_literal(value: Value) -> Matcher {
    match value {
        Value::Object(map) => Matcher::ObjectOf(
            map.into_iter()
                .map(|(name, field)| (name, from_literal(field)))
                .collect(),
        ),
        Value::Array(items) if !items.is_empty() => {
            let first = items.into_iter().next().unwrap_or(Value::Null);
            Matcher::EachLike {
                item: Box::new(from_literal(first)),
                min_count: 1,
            }
        }
        other => Matcher::Literal(other),
    }
}

/// Fluent builder for object templates
#[derive(Debug, Clone, Default)]
pub struct ObjectTemplate {
    fields: IndexMap<String, Template>,
}

impl ObjectTemplate {
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Template>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Matcher {
        Template::from(self).build()
    }
}

impl From<ObjectTemplate> for Template {
    fn from(object: ObjectTemplate) -> Self {
        Template::Object(object.fields)
    }
}

impl From<Matcher> for Template {
    fn from(matcher: Matcher) -> Self {
        Template::Match(matcher)
    }
}

impl From<Value> for Template {
    fn from(value: Value) -> Self {
        Template::Literal(value)
    }
}

impl From<&str> for Template {
    fn from(value: &str) -> Self {
        Template::Literal(Value::from(value))
    }
}

impl From<String> for Template {
    fn from(value: String) -> Self {
        Template::Literal(Value::from(value))
    }
}

impl From<i32> for Template {
    fn from(value: i32) -> Self {
        Template::Literal(Value::from(value))
    }
}

impl From<i64> for Template {
    fn from(value: i64) -> Self {
        Template::Literal(Value::from(value))
    }
}

impl From<f64> for Template {
    fn from(value: f64) -> Self {
        Template::Literal(Value::from(value))
    }
}

impl From<bool> for Template {
    fn from(value: bool) -> Self {
        Template::Literal(Value::from(value))
    }
}
