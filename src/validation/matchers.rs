use super::structural::{check_bounds, check_item_count};
use super::{Violation, ViolationKind, Walker, describe_value, formats, path, type_mismatch};
use crate::models::matcher::Matcher;
use crate::models::schema::{SchemaKind, values_equal};
use serde_json::Value;

pub(crate) fn check_matcher(
    matcher: &Matcher,
    walker: &Walker<'_>,
    value: &Value,
    at: &str,
    out: &mut Vec<Violation>,
) {
    if value.is_null() {
        if !matcher.accepts_null() {
            out.push(
                Violation::new(
                    ViolationKind::UnexpectedNull,
                    at,
                    "value is null but the matcher does not accept null",
                )
                .with_expected(matcher.describe())
                .with_actual("null"),
            );
        }
        return;
    }

    match matcher {
        Matcher::AnyValue => {}
        Matcher::NullOnly => out.push(type_mismatch(at, SchemaKind::Null, value)),
        Matcher::Nullable(inner) => check_matcher(inner, walker, value, at, out),
        Matcher::AnyString => {
            if !value.is_string() {
                out.push(type_mismatch(at, SchemaKind::String, value));
            }
        }
        Matcher::NonEmptyString => {
            if let Some(text) = expect_string(value, at, out)
                && text.is_empty()
            {
                out.push(
                    Violation::new(ViolationKind::OutOfRange, at, "string must not be empty")
                        .with_expected("non-empty string")
                        .with_actual(describe_value(value)),
                );
            }
        }
        Matcher::Guid => check_format(value, "guid", formats::is_uuid, at, out),
        Matcher::Email => check_format(value, "email", formats::is_email, at, out),
        Matcher::Uri => check_format(value, "uri", formats::is_uri, at, out),
        Matcher::DateTime => check_format(value, "date-time", formats::is_date_time, at, out),
        Matcher::DateOnly => check_format(value, "date", formats::is_date, at, out),
        Matcher::TimeOnly => check_format(value, "time", formats::is_time, at, out),
        Matcher::Regex(pattern) => {
            if let Some(text) = expect_string(value, at, out)
                && !pattern.is_match(text)
            {
                out.push(
                    Violation::new(
                        ViolationKind::PatternMismatch,
                        at,
                        format!("value does not match pattern /{}/", pattern.as_str()),
                    )
                    .with_expected(pattern.as_str())
                    .with_actual(describe_value(value)),
                );
            }
        }
        Matcher::IntegerRange { min, max } => {
            if SchemaKind::of(value) != SchemaKind::Integer {
                out.push(type_mismatch(at, SchemaKind::Integer, value));
                return;
            }
            if let Some(n) = value.as_f64() {
                check_bounds(
                    n,
                    min.map(|m| m as f64),
                    max.map(|m| m as f64),
                    value,
                    at,
                    out,
                );
            }
        }
        Matcher::DecimalRange { min, max } => match value.as_f64() {
            Some(n) => check_bounds(n, *min, *max, value, at, out),
            None => out.push(type_mismatch(at, SchemaKind::Number, value)),
        },
        Matcher::Boolean => {
            if !value.is_boolean() {
                out.push(type_mismatch(at, SchemaKind::Boolean, value));
            }
        }
        Matcher::OneOf(values) => {
            if !values.iter().any(|v| values_equal(v, value)) {
                out.push(
                    Violation::new(
                        ViolationKind::InvalidEnumValue,
                        at,
                        "value is not one of the allowed values",
                    )
                    .with_expected(matcher.describe())
                    .with_actual(describe_value(value)),
                );
            }
        }
        Matcher::Literal(expected) => check_literal(expected, value, at, out),
        Matcher::ObjectOf(fields) => {
            let Some(map) = value.as_object() else {
                out.push(type_mismatch(at, SchemaKind::Object, value));
                return;
            };

            for (name, field) in fields {
                if !walker.is_selected(at, name) {
                    continue;
                }
                let child_at = path::child(at, name);
                match map.get(name) {
                    Some(child) => check_nested(field, walker, child, &child_at, out),
                    None => out.push(
                        Violation::new(
                            ViolationKind::MissingRequired,
                            child_at,
                            format!("required property '{}' is missing", name),
                        )
                        .with_expected(field.describe()),
                    ),
                }
            }

            for (name, child) in map {
                if fields.contains_key(name) || !walker.is_selected(at, name) {
                    continue;
                }
                if walker.reports_extra_field(true) {
                    out.push(
                        Violation::new(
                            ViolationKind::UnexpectedField,
                            path::child(at, name),
                            format!("property '{}' is not declared by the contract", name),
                        )
                        .with_actual(describe_value(child)),
                    );
                }
            }
        }
        Matcher::EachLike { item, min_count } => {
            let Some(items) = value.as_array() else {
                out.push(type_mismatch(at, SchemaKind::Array, value));
                return;
            };

            check_item_count(items.len(), Some(*min_count), None, at, out);
            for (i, element) in items.iter().enumerate() {
                check_nested(item, walker, element, &path::index(at, i), out);
            }
        }
    }
}

/// Validate a nested matcher relative to its own root, then splice the
/// resulting paths under `at`.
fn check_nested(
    matcher: &Matcher,
    walker: &Walker<'_>,
    value: &Value,
    at: &str,
    out: &mut Vec<Violation>,
) {
    let mut nested = Vec::new();
    check_matcher(matcher, &walker.nested(), value, path::ROOT, &mut nested);
    out.extend(nested.into_iter().map(|violation| violation.rebase(at)));
}

fn expect_string<'v>(value: &'v Value, at: &str, out: &mut Vec<Violation>) -> Option<&'v str> {
    let text = value.as_str();
    if text.is_none() {
        out.push(type_mismatch(at, SchemaKind::String, value));
    }
    text
}

fn check_format(
    value: &Value,
    name: &str,
    conforms: fn(&str) -> bool,
    at: &str,
    out: &mut Vec<Violation>,
) {
    if let Some(text) = expect_string(value, at, out)
        && !conforms(text)
    {
        out.push(
            Violation::new(
                ViolationKind::InvalidFormat,
                at,
                format!("value is not a valid {}", name),
            )
            .with_expected(name)
            .with_actual(describe_value(value)),
        );
    }
}

fn check_literal(expected: &Value, value: &Value, at: &str, out: &mut Vec<Violation>) {
    let expected_kind = SchemaKind::of(expected);
    let same_kind = expected_kind == SchemaKind::of(value) || (expected.is_number() && value.is_number());
    if !same_kind {
        out.push(type_mismatch(at, expected_kind, value));
        return;
    }
    if !values_equal(expected, value) {
        out.push(
            Violation::new(
                ViolationKind::InvalidEnumValue,
                at,
                "value does not equal the expected literal",
            )
            .with_expected(describe_value(expected))
            .with_actual(describe_value(value)),
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::models::matcher::{Matcher, Template};
    use crate::validation::{Direction, PartialValidationConfig, ViolationKind, validate};
    use serde_json::json;

    #[test]
    fn test_integer_range_scenario() {
        let violations = validate(&json!(150), &Matcher::integer(Some(0), Some(100)), Direction::Response, None);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::OutOfRange);
        assert_eq!(violations[0].expected.as_deref(), Some("<= 100"));
        assert_eq!(violations[0].actual.as_deref(), Some("150"));
        assert_eq!(violations[0].path, "$");
    }

    #[test]
    fn test_leaf_matchers() {
        let cases = [
            (Matcher::Guid, json!("3fa85f64-5717-4562-b3fc-2c963f66afa6"), json!("123")),
            (Matcher::Email, json!("ada@example.com"), json!("ada")),
            (Matcher::Uri, json!("https://example.com"), json!("example")),
            (Matcher::DateTime, json!("2024-01-01T00:00:00Z"), json!("yesterday")),
            (Matcher::DateOnly, json!("2024-01-01"), json!("01/01/2024")),
            (Matcher::TimeOnly, json!("08:15:00"), json!("8 o'clock")),
        ];

        for (matcher, good, bad) in cases {
            assert!(validate(&good, &matcher, Direction::Response, None).is_empty(), "{:?}", matcher);
            let violations = validate(&bad, &matcher, Direction::Response, None);
            assert_eq!(violations.len(), 1, "{:?}", matcher);
            assert_eq!(violations[0].kind, ViolationKind::InvalidFormat);
        }
    }

    #[test]
    fn test_type_errors_on_leaf_matchers() {
        let violations = validate(&json!(42), &Matcher::Guid, Direction::Response, None);
        assert_eq!(violations[0].kind, ViolationKind::InvalidType);

        let violations = validate(&json!(4.2), &Matcher::integer(None, None), Direction::Response, None);
        assert_eq!(violations[0].kind, ViolationKind::InvalidType);

        assert!(validate(&json!(4), &Matcher::decimal(Some(0.0), None), Direction::Response, None).is_empty());
    }

    #[test]
    fn test_non_empty_string_and_one_of() {
        let violations = validate(&json!(""), &Matcher::NonEmptyString, Direction::Request, None);
        assert_eq!(violations[0].kind, ViolationKind::OutOfRange);

        let status = Matcher::one_of(["active", "disabled"]);
        assert!(validate(&json!("active"), &status, Direction::Request, None).is_empty());
        let violations = validate(&json!("deleted"), &status, Direction::Request, None);
        assert_eq!(violations[0].kind, ViolationKind::InvalidEnumValue);
    }

    #[test]
    fn test_null_handling() {
        assert!(validate(&json!(null), &Matcher::NullOnly, Direction::Response, None).is_empty());
        assert!(validate(&json!(null), &Matcher::Email.or_null(), Direction::Response, None).is_empty());

        let violations = validate(&json!(null), &Matcher::Email, Direction::Response, None);
        assert_eq!(violations[0].kind, ViolationKind::UnexpectedNull);

        let violations = validate(&json!("x"), &Matcher::NullOnly, Direction::Response, None);
        assert_eq!(violations[0].kind, ViolationKind::InvalidType);
    }

    #[test]
    fn test_nested_paths_are_spliced() {
        let contract = Template::object()
            .field("id", Matcher::integer(Some(1), None))
            .field(
                "owner",
                Template::object().field("email", Matcher::Email),
            )
            .field(
                "items",
                Matcher::each_like(Template::object().field("sku", Matcher::NonEmptyString), 2),
            )
            .build();

        let value = json!({
            "id": 0,
            "owner": {"email": "nope"},
            "items": [{"sku": ""}]
        });
        let violations = validate(&value, &contract, Direction::Response, None);
        let found: Vec<_> = violations.iter().map(|v| (v.path.as_str(), v.kind)).collect();

        assert_eq!(
            found,
            vec![
                ("$.id", ViolationKind::OutOfRange),
                ("$.owner.email", ViolationKind::InvalidFormat),
                ("$.items", ViolationKind::OutOfRange),
                ("$.items[0].sku", ViolationKind::OutOfRange),
            ]
        );
    }

    #[test]
    fn test_literal_equality() {
        let contract = Template::object().field("kind", "user").field("version", 2).build();

        assert!(validate(&json!({"kind": "user", "version": 2.0}), &contract, Direction::Response, None).is_empty());

        let violations = validate(&json!({"kind": "admin", "version": "2"}), &contract, Direction::Response, None);
        let kinds: Vec<_> = violations.iter().map(|v| v.kind).collect();
        assert_eq!(kinds, vec![ViolationKind::InvalidEnumValue, ViolationKind::InvalidType]);
    }

    #[test]
    fn test_object_of_strictness() {
        let contract = Template::object().field("id", Matcher::Guid).build();
        let value = json!({"id": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "extra": 1});

        assert!(validate(&value, &contract, Direction::Response, None).is_empty());

        let strict = PartialValidationConfig::strict();
        let violations = validate(&value, &contract, Direction::Response, Some(&strict));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::UnexpectedField);
        assert_eq!(violations[0].path, "$.extra");
    }

    #[test]
    fn test_nested_objects_ignore_top_level_allow_list() {
        let contract = Template::object()
            .field("owner", Template::object().field("name", Matcher::AnyString))
            .field("id", Matcher::Guid)
            .build();
        let config = PartialValidationConfig::only(["owner"]);

        let violations = validate(&json!({"owner": {}}), &contract, Direction::Response, Some(&config));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "$.owner.name");
    }
}
