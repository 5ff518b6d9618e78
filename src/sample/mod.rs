//! Synthesis of representative JSON values from schema and matcher trees.
//!
//! Every generated value passes validation against the tree it came from in
//! the same direction. Object generation applies the validator's visibility
//! rule in reverse: write-only properties are never emitted in responses and
//! read-only properties are never emitted in requests.

mod pattern;

use crate::models::matcher::Matcher;
use crate::models::schema::{
    Composition, CompositionMode, Format, NumberRules, ObjectShape, SchemaNode, Shape, StringRules,
    TextCheck,
};
use pattern::pattern_sample;
use crate::validation::{Direction, Expectation, validate};
use serde_json::{Map, Value, json};

const UUID_SAMPLE: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
const EMAIL_SAMPLE: &str = "user@example.com";
const DATE_TIME_SAMPLE: &str = "2024-01-01T00:00:00Z";
const DATE_SAMPLE: &str = "2024-01-01";
const TIME_SAMPLE: &str = "12:00:00";
const URI_SAMPLE: &str = "https://example.com";
const STRING_SAMPLE: &str = "string";

/// Generate a representative value for a schema or matcher tree
pub fn generate_sample<E>(expected: &E, direction: Direction) -> Value
where
    E: Expectation + ?Sized,
{
    let sample = expected.sample(direction);
    tracing::trace!(direction = %direction, "generated sample");
    sample
}

pub(crate) fn schema_sample(node: &SchemaNode, direction: Direction) -> Value {
    if let Some(example) = &node.example
        && validate(example, node, direction, None).is_empty()
    {
        return example.clone();
    }

    match &node.shape {
        Shape::Any => json!(STRING_SAMPLE),
        Shape::Null => Value::Null,
        Shape::Boolean(allowed) => allowed
            .as_ref()
            .and_then(|a| a.values().first().cloned())
            .unwrap_or(Value::Bool(true)),
        Shape::String(rules) => string_sample(rules),
        Shape::Integer(rules) => integer_sample(rules),
        Shape::Number(rules) => number_sample(rules),
        Shape::Object(object) => {
            let map: Map<String, Value> = object
                .properties
                .values()
                .filter(|property| property.visibility.allows(direction))
                .map(|property| {
                    (
                        property.name.clone(),
                        schema_sample(&property.schema, direction),
                    )
                })
                .collect();
            Value::Object(map)
        }
        Shape::Array(array) => {
            let count = array
                .min_items
                .unwrap_or(1)
                .max(1)
                .min(array.max_items.unwrap_or(usize::MAX));
            let item = schema_sample(&array.items, direction);
            Value::Array(vec![item; count])
        }
        Shape::Composition(composition) => composition_sample(node, composition, direction),
    }
}

fn composition_sample(node: &SchemaNode, composition: &Composition, direction: Direction) -> Value {
    if let Some(discriminator) = &composition.discriminator
        && let Some((tag, &index)) = discriminator.mapping.first()
        && let Some(branch) = composition.branches.get(index)
    {
        let mut sample = schema_sample(branch, direction);
        if let Value::Object(map) = &mut sample {
            map.insert(discriminator.property_name.clone(), Value::String(tag.clone()));
        }
        return sample;
    }

    match composition.mode {
        CompositionMode::AllOf => {
            let mut merged = Map::new();
            let mut scalar = None;
            for branch in &composition.branches {
                match schema_sample(branch, direction) {
                    Value::Object(map) => merged.extend(map),
                    other => scalar = scalar.or(Some(other)),
                }
            }
            // a closed branch rejects properties only its siblings declare
            let closed: Vec<&ObjectShape> = composition
                .branches
                .iter()
                .filter_map(SchemaNode::as_object)
                .filter(|object| !object.additional_properties)
                .collect();
            merged.retain(|name, _| {
                closed
                    .iter()
                    .all(|object| object.properties.contains_key(name))
            });

            match scalar {
                Some(value) if merged.is_empty() => value,
                _ => Value::Object(merged),
            }
        }
        CompositionMode::AnyOf | CompositionMode::OneOf => {
            let candidates: Vec<Value> = composition
                .branches
                .iter()
                .map(|branch| schema_sample(branch, direction))
                .collect();
            candidates
                .iter()
                .find(|candidate| validate(*candidate, node, direction, None).is_empty())
                .or_else(|| candidates.first())
                .cloned()
                .unwrap_or(Value::Null)
        }
    }
}

fn string_sample(rules: &StringRules) -> Value {
    if let Some(first) = rules.allowed.as_ref().and_then(|a| a.values().first()) {
        return first.clone();
    }

    match &rules.check {
        Some(TextCheck::Format(format)) => {
            match format_sample(format, rules.min_length, rules.max_length) {
                Some(text) => json!(text),
                None => json!(fit_length(STRING_SAMPLE, rules.min_length, rules.max_length)),
            }
        }
        Some(TextCheck::Pattern(pattern)) => {
            json!(pattern_sample(pattern, rules.min_length, rules.max_length))
        }
        None => json!(fit_length(STRING_SAMPLE, rules.min_length, rules.max_length)),
    }
}

/// A value of the format, preferring one inside the length bounds
fn format_sample(format: &Format, min: Option<usize>, max: Option<usize>) -> Option<String> {
    let candidates = match format {
        Format::Uuid => vec![UUID_SAMPLE.to_string()],
        Format::Email => {
            let domain = EMAIL_SAMPLE.split_once('@').map_or("", |(_, domain)| domain);
            let local = fit_length("user", min.map(|m| m.saturating_sub(domain.len() + 1)), None);
            vec![format!("{}@{}", local, domain), "a@b.co".to_string()]
        }
        Format::DateTime => vec![
            DATE_TIME_SAMPLE.to_string(),
            "2024-01-01T00:00:00.000+00:00".to_string(),
        ],
        Format::Date => vec![DATE_SAMPLE.to_string()],
        Format::Time => vec![
            TIME_SAMPLE.to_string(),
            "12:00".to_string(),
            "12:00:00.000Z".to_string(),
        ],
        Format::Uri => {
            let padding = min.unwrap_or(0).saturating_sub(URI_SAMPLE.len() + 1);
            let uri = match min {
                Some(min) if min > URI_SAMPLE.len() => {
                    format!("{}/{}", URI_SAMPLE, "x".repeat(padding))
                }
                _ => URI_SAMPLE.to_string(),
            };
            vec![uri, "urn:x".to_string()]
        }
        Format::Other(_) => return None,
    };

    let fits = |text: &&String| {
        let length = text.chars().count();
        min.is_none_or(|min| length >= min) && max.is_none_or(|max| length <= max)
    };
    match candidates.iter().find(fits) {
        Some(text) => Some(text.clone()),
        None => candidates.first().map(|text| fit_length(text, min, max)),
    }
}

fn fit_length(base: &str, min: Option<usize>, max: Option<usize>) -> String {
    let mut text: String = base.to_string();
    if let Some(min) = min {
        while text.chars().count() < min {
            text.push('x');
        }
    }
    if let Some(max) = max {
        text = text.chars().take(max).collect();
    }
    text
}

fn integer_sample(rules: &NumberRules) -> Value {
    if let Some(first) = rules.allowed.as_ref().and_then(|a| a.values().first()) {
        return first.clone();
    }

    let low = rules.minimum.map(f64::ceil);
    let high = rules.maximum.map(f64::floor);
    let n = match (low, high) {
        (Some(low), Some(high)) => ((low + high) / 2.0).floor(),
        _ => clamp(0.0, low, high),
    };
    json!(n as i64)
}

fn number_sample(rules: &NumberRules) -> Value {
    if let Some(first) = rules.allowed.as_ref().and_then(|a| a.values().first()) {
        return first.clone();
    }

    let n = match (rules.minimum, rules.maximum) {
        (Some(low), Some(high)) => (low + high) / 2.0,
        (low, high) => clamp(0.0, low, high),
    };
    float_value(n)
}

fn clamp(default: f64, low: Option<f64>, high: Option<f64>) -> f64 {
    let mut n = default;
    if let Some(low) = low {
        n = n.max(low);
    }
    if let Some(high) = high {
        n = n.min(high);
    }
    n
}

fn float_value(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or_else(|| json!(0))
}

pub(crate) fn matcher_sample(matcher: &Matcher, direction: Direction) -> Value {
    match matcher {
        Matcher::Guid => json!(UUID_SAMPLE),
        Matcher::AnyString | Matcher::NonEmptyString => json!(STRING_SAMPLE),
        Matcher::Email => json!(EMAIL_SAMPLE),
        Matcher::Uri => json!(URI_SAMPLE),
        Matcher::Regex(pattern) => json!(pattern_sample(pattern, None, None)),
        Matcher::IntegerRange { min, max } => {
            let n = match (min, max) {
                (Some(low), Some(high)) => ((i128::from(*low) + i128::from(*high)) / 2) as i64,
                (low, high) => clamp(0.0, low.map(|v| v as f64), high.map(|v| v as f64)) as i64,
            };
            json!(n)
        }
        Matcher::DecimalRange { min, max } => {
            let n = match (min, max) {
                (Some(low), Some(high)) => (low + high) / 2.0,
                (low, high) => clamp(0.0, *low, *high),
            };
            float_value(n)
        }
        Matcher::Boolean => Value::Bool(true),
        Matcher::DateTime => json!(DATE_TIME_SAMPLE),
        Matcher::DateOnly => json!(DATE_SAMPLE),
        Matcher::TimeOnly => json!(TIME_SAMPLE),
        Matcher::OneOf(values) => values.first().cloned().unwrap_or(Value::Null),
        Matcher::NullOnly => Value::Null,
        Matcher::AnyValue => json!(STRING_SAMPLE),
        Matcher::Nullable(inner) => matcher_sample(inner, direction),
        Matcher::Literal(value) => value.clone(),
        Matcher::ObjectOf(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), matcher_sample(field, direction)))
                .collect(),
        ),
        Matcher::EachLike { item, min_count } => {
            let item = matcher_sample(item, direction);
            Value::Array(vec![item; (*min_count).max(1)])
        }
    }
}
