use super::{Violation, ViolationKind, Walker, describe_value, formats, path, type_mismatch};
use crate::models::matcher::format_number;
use crate::models::schema::{
    Allowed, ArrayShape, Composition, CompositionMode, Discriminator, NumberRules, ObjectShape,
    SchemaKind, SchemaNode, Shape, StringRules, TextCheck, Visibility,
};
use serde_json::{Map, Value};

/// Walk `value` against `node`. `InvalidType` and `UnexpectedNull` stop descent
/// into the offending subtree; every other violation lets sibling checks continue.
pub(crate) fn check_schema(
    node: &SchemaNode,
    walker: &Walker<'_>,
    value: &Value,
    at: &str,
    out: &mut Vec<Violation>,
) {
    if value.is_null() {
        match &node.shape {
            _ if node.nullable => {}
            Shape::Null | Shape::Any => {}
            Shape::Composition(composition) => {
                check_composition(composition, walker, value, at, out)
            }
            _ => out.push(
                Violation::new(
                    ViolationKind::UnexpectedNull,
                    at,
                    "value is null but the schema is not nullable",
                )
                .with_expected(node.kind().to_string())
                .with_actual("null"),
            ),
        }
        return;
    }

    match &node.shape {
        Shape::Any => {}
        Shape::Null => out.push(type_mismatch(at, SchemaKind::Null, value)),
        Shape::Boolean(allowed) => {
            if !value.is_boolean() {
                out.push(type_mismatch(at, SchemaKind::Boolean, value));
                return;
            }
            check_allowed(allowed.as_ref(), value, at, out);
        }
        Shape::String(rules) => match value.as_str() {
            Some(text) => check_string(rules, text, value, at, out),
            None => out.push(type_mismatch(at, SchemaKind::String, value)),
        },
        Shape::Integer(rules) => {
            if SchemaKind::of(value) != SchemaKind::Integer {
                out.push(type_mismatch(at, SchemaKind::Integer, value));
                return;
            }
            check_number(rules, value, at, out);
        }
        Shape::Number(rules) => {
            if !value.is_number() {
                out.push(type_mismatch(at, SchemaKind::Number, value));
                return;
            }
            check_number(rules, value, at, out);
        }
        Shape::Object(object) => match value.as_object() {
            Some(map) => check_object(object, walker, map, at, out),
            None => out.push(type_mismatch(at, SchemaKind::Object, value)),
        },
        Shape::Array(array) => match value.as_array() {
            Some(items) => check_array(array, walker, items, at, out),
            None => out.push(type_mismatch(at, SchemaKind::Array, value)),
        },
        Shape::Composition(composition) => check_composition(composition, walker, value, at, out),
    }
}

fn check_string(rules: &StringRules, text: &str, value: &Value, at: &str, out: &mut Vec<Violation>) {
    match &rules.check {
        Some(TextCheck::Format(format)) => {
            if !formats::conforms(format, text) {
                out.push(
                    Violation::new(
                        ViolationKind::InvalidFormat,
                        at,
                        format!("value is not a valid {}", format),
                    )
                    .with_expected(format.tag())
                    .with_actual(describe_value(value)),
                );
            }
        }
        Some(TextCheck::Pattern(pattern)) => {
            if !pattern.is_match(text) {
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
        None => {}
    }

    let length = text.chars().count();
    if let Some(min) = rules.min_length
        && length < min
    {
        out.push(
            Violation::new(
                ViolationKind::OutOfRange,
                at,
                format!("string is shorter than {} characters", min),
            )
            .with_expected(format!(">= {} characters", min))
            .with_actual(format!("{} characters", length)),
        );
    }
    if let Some(max) = rules.max_length
        && length > max
    {
        out.push(
            Violation::new(
                ViolationKind::OutOfRange,
                at,
                format!("string is longer than {} characters", max),
            )
            .with_expected(format!("<= {} characters", max))
            .with_actual(format!("{} characters", length)),
        );
    }

    check_allowed(rules.allowed.as_ref(), value, at, out);
}

fn check_number(rules: &NumberRules, value: &Value, at: &str, out: &mut Vec<Violation>) {
    if let Some(n) = value.as_f64() {
        check_bounds(n, rules.minimum, rules.maximum, value, at, out);
    }
    check_allowed(rules.allowed.as_ref(), value, at, out);
}

/// Shared by schema ranges and matcher ranges
pub(crate) fn check_bounds(
    n: f64,
    minimum: Option<f64>,
    maximum: Option<f64>,
    value: &Value,
    at: &str,
    out: &mut Vec<Violation>,
) {
    if let Some(min) = minimum
        && n < min
    {
        out.push(
            Violation::new(
                ViolationKind::OutOfRange,
                at,
                format!("value is below the minimum of {}", format_number(min)),
            )
            .with_expected(format!(">= {}", format_number(min)))
            .with_actual(describe_value(value)),
        );
    }
    if let Some(max) = maximum
        && n > max
    {
        out.push(
            Violation::new(
                ViolationKind::OutOfRange,
                at,
                format!("value is above the maximum of {}", format_number(max)),
            )
            .with_expected(format!("<= {}", format_number(max)))
            .with_actual(describe_value(value)),
        );
    }
}

fn check_allowed(allowed: Option<&Allowed>, value: &Value, at: &str, out: &mut Vec<Violation>) {
    if let Some(allowed) = allowed
        && !allowed.contains(value)
    {
        out.push(
            Violation::new(
                ViolationKind::InvalidEnumValue,
                at,
                "value is not one of the allowed values",
            )
            .with_expected(allowed.describe())
            .with_actual(describe_value(value)),
        );
    }
}

fn check_object(
    object: &ObjectShape,
    walker: &Walker<'_>,
    map: &Map<String, Value>,
    at: &str,
    out: &mut Vec<Violation>,
) {
    let direction = walker.direction();

    for (name, property) in &object.properties {
        if !walker.is_selected(at, name) {
            continue;
        }
        let child_at = path::child(at, name);

        match map.get(name) {
            None => {
                if object.is_required(name) && property.visibility.allows(direction) {
                    out.push(
                        Violation::new(
                            ViolationKind::MissingRequired,
                            child_at,
                            format!("required property '{}' is missing", name),
                        )
                        .with_expected(property.schema.kind().to_string()),
                    );
                }
            }
            Some(_) if !property.visibility.allows(direction) => {
                let label = match property.visibility {
                    Visibility::RequestOnly => "write-only",
                    _ => "read-only",
                };
                out.push(
                    Violation::new(
                        ViolationKind::UnexpectedField,
                        child_at,
                        format!(
                            "property '{}' is {} and must not appear in a {} (visibility violation, not a schema violation)",
                            name, label, direction
                        ),
                    )
                    .with_expected(format!("absent in {}", direction)),
                );
            }
            Some(child) => check_schema(&property.schema, walker, child, &child_at, out),
        }
    }

    for (name, child) in map {
        if object.properties.contains_key(name) || !walker.is_selected(at, name) {
            continue;
        }
        if walker.reports_extra_field(object.additional_properties) {
            out.push(
                Violation::new(
                    ViolationKind::UnexpectedField,
                    path::child(at, name),
                    format!("property '{}' is not declared by the schema", name),
                )
                .with_actual(describe_value(child)),
            );
        }
    }
}

fn check_array(
    array: &ArrayShape,
    walker: &Walker<'_>,
    items: &[Value],
    at: &str,
    out: &mut Vec<Violation>,
) {
    check_item_count(items.len(), array.min_items, array.max_items, at, out);

    for (i, item) in items.iter().enumerate() {
        check_schema(&array.items, walker, item, &path::index(at, i), out);
    }
}

pub(crate) fn check_item_count(
    count: usize,
    min: Option<usize>,
    max: Option<usize>,
    at: &str,
    out: &mut Vec<Violation>,
) {
    if let Some(min) = min
        && count < min
    {
        out.push(
            Violation::new(
                ViolationKind::OutOfRange,
                at,
                format!("array has fewer than {} items", min),
            )
            .with_expected(format!(">= {} items", min))
            .with_actual(format!("{} items", count)),
        );
    }
    if let Some(max) = max
        && count > max
    {
        out.push(
            Violation::new(
                ViolationKind::OutOfRange,
                at,
                format!("array has more than {} items", max),
            )
            .with_expected(format!("<= {} items", max))
            .with_actual(format!("{} items", count)),
        );
    }
}

fn check_composition(
    composition: &Composition,
    walker: &Walker<'_>,
    value: &Value,
    at: &str,
    out: &mut Vec<Violation>,
) {
    if let Some(discriminator) = &composition.discriminator {
        check_discriminated(composition, discriminator, walker, value, at, out);
        return;
    }

    let branch_count = composition.branches.len();
    match composition.mode {
        CompositionMode::AllOf => {
            for branch in &composition.branches {
                check_schema(branch, walker, value, at, out);
            }
        }
        CompositionMode::AnyOf => {
            if !composition
                .branches
                .iter()
                .any(|branch| passes(branch, walker, value, at))
            {
                out.push(no_branch_matched(composition.mode, branch_count, value, at));
            }
        }
        CompositionMode::OneOf => {
            let matched = composition
                .branches
                .iter()
                .filter(|branch| passes(branch, walker, value, at))
                .count();
            match matched {
                1 => {}
                0 => out.push(no_branch_matched(composition.mode, branch_count, value, at)),
                n => out.push(
                    Violation::new(
                        ViolationKind::InvalidType,
                        at,
                        format!(
                            "value is ambiguous: it matches {} of the {} oneOf branches",
                            n, branch_count
                        ),
                    )
                    .with_expected("exactly one matching branch")
                    .with_actual(format!("{} matching branches", n)),
                ),
            }
        }
    }
}

fn check_discriminated(
    composition: &Composition,
    discriminator: &Discriminator,
    walker: &Walker<'_>,
    value: &Value,
    at: &str,
    out: &mut Vec<Violation>,
) {
    let Some(map) = value.as_object() else {
        out.push(type_mismatch(at, SchemaKind::Object, value));
        return;
    };

    let tag_at = path::child(at, &discriminator.property_name);
    let Some(tag) = map.get(&discriminator.property_name) else {
        out.push(Violation::new(
            ViolationKind::MissingRequired,
            tag_at,
            format!(
                "discriminator property '{}' is missing",
                discriminator.property_name
            ),
        ));
        return;
    };

    let branch = tag
        .as_str()
        .and_then(|t| discriminator.mapping.get(t))
        .and_then(|&i| composition.branches.get(i));

    match branch {
        Some(branch) => check_schema(branch, walker, value, at, out),
        None => out.push(
            Violation::new(
                ViolationKind::InvalidEnumValue,
                tag_at,
                "discriminator value does not select any branch",
            )
            .with_expected(format!(
                "one of [{}]",
                discriminator
                    .mapping
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
            .with_actual(describe_value(tag)),
        ),
    }
}

fn passes(branch: &SchemaNode, walker: &Walker<'_>, value: &Value, at: &str) -> bool {
    let mut scratch = Vec::new();
    check_schema(branch, walker, value, at, &mut scratch);
    scratch.is_empty()
}

fn no_branch_matched(mode: CompositionMode, branch_count: usize, value: &Value, at: &str) -> Violation {
    Violation::new(
        ViolationKind::InvalidType,
        at,
        format!("value matches none of the {} {} branches", branch_count, mode),
    )
    .with_expected(format!("{} of {} branches", mode, branch_count))
    .with_actual(SchemaKind::of(value).to_string())
}

#[cfg(test)]
mod tests {
    use crate::models::schema::{PropertySchema, SchemaNode};
    use crate::validation::{
        Direction, PartialValidationConfig, ViolationKind, validate,
    };
    use serde_json::json;

    fn user_schema() -> SchemaNode {
        SchemaNode::object()
            .required_property("id", SchemaNode::integer())
            .required_property("name", SchemaNode::string().with_length(Some(1), None))
            .property("email", SchemaNode::formatted("email"))
    }

    #[test]
    fn test_missing_required_reports_path() {
        let violations = validate(&json!({"id": 1}), &user_schema(), Direction::Response, None);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MissingRequired);
        assert_eq!(violations[0].path, "$.name");
    }

    #[test]
    fn test_null_short_circuits() {
        let schema = SchemaNode::object().required_property("name", SchemaNode::string());
        let violations = validate(&json!({"name": null}), &schema, Direction::Request, None);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::UnexpectedNull);

        let nullable = SchemaNode::object().required_property("name", SchemaNode::string().nullable());
        assert!(validate(&json!({"name": null}), &nullable, Direction::Request, None).is_empty());
    }

    #[test]
    fn test_type_mismatch_stops_descent() {
        let schema = SchemaNode::object().required_property(
            "tags",
            SchemaNode::array(SchemaNode::string()).with_item_count(Some(1), None),
        );
        let violations = validate(&json!({"tags": "a"}), &schema, Direction::Request, None);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::InvalidType);
        assert_eq!(violations[0].expected.as_deref(), Some("array"));
        assert_eq!(violations[0].actual.as_deref(), Some("string"));
    }

    #[test]
    fn test_integer_rejects_fractional_numbers() {
        let violations = validate(&json!(1.5), &SchemaNode::integer(), Direction::Request, None);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::InvalidType);

        assert!(validate(&json!(2.0), &SchemaNode::integer(), Direction::Request, None).is_empty());
        assert!(validate(&json!(2), &SchemaNode::number(), Direction::Request, None).is_empty());
    }

    #[test]
    fn test_independent_leaf_checks_accumulate() {
        let schema = SchemaNode::string()
            .with_format("email")
            .with_length(Some(20), None)
            .with_enum(vec![json!("someone@example.com")]);

        let violations = validate(&json!("nope"), &schema, Direction::Request, None);
        let kinds: Vec<_> = violations.iter().map(|v| v.kind).collect();

        assert_eq!(
            kinds,
            vec![
                ViolationKind::InvalidFormat,
                ViolationKind::OutOfRange,
                ViolationKind::InvalidEnumValue
            ]
        );
    }

    #[test]
    fn test_pattern_mismatch() {
        let schema = SchemaNode::string().with_pattern("^[A-Z]{3}$").unwrap();
        let violations = validate(&json!("usd"), &schema, Direction::Request, None);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::PatternMismatch);
        assert_eq!(violations[0].expected.as_deref(), Some("^[A-Z]{3}$"));
    }

    #[test]
    fn test_numeric_range() {
        let schema = SchemaNode::integer().with_range(Some(0.0), Some(100.0));
        let violations = validate(&json!(150), &schema, Direction::Request, None);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::OutOfRange);
        assert_eq!(violations[0].expected.as_deref(), Some("<= 100"));
        assert_eq!(violations[0].actual.as_deref(), Some("150"));
    }

    #[test]
    fn test_array_paths_preserve_index_order() {
        let schema = SchemaNode::object().required_property(
            "scores",
            SchemaNode::array(SchemaNode::integer().with_range(Some(0.0), None)),
        );
        let violations = validate(&json!({"scores": [1, -1, 2, -5]}), &schema, Direction::Request, None);

        let paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["$.scores[1]", "$.scores[3]"]);
    }

    #[test]
    fn test_extra_fields_lenient_by_default() {
        let value = json!({"id": 1, "name": "Ada", "nickname": "countess"});
        assert!(validate(&value, &user_schema(), Direction::Response, None).is_empty());

        let strict = PartialValidationConfig::strict();
        let violations = validate(&value, &user_schema(), Direction::Response, Some(&strict));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::UnexpectedField);
        assert_eq!(violations[0].path, "$.nickname");
    }

    #[test]
    fn test_closed_schema_and_ignore_extra_fields() {
        let schema = user_schema().additional_properties(false);
        let value = json!({"id": 1, "name": "Ada", "extra": true});

        assert_eq!(validate(&value, &schema, Direction::Response, None).len(), 1);

        let ignore = PartialValidationConfig::default()
            .with_strict_mode(true)
            .with_ignore_extra_fields(true);
        assert!(validate(&value, &schema, Direction::Response, Some(&ignore)).is_empty());
    }

    #[test]
    fn test_allow_list_skips_other_required_properties() {
        let config = PartialValidationConfig::only(["id"]);
        let violations = validate(&json!({"id": "x"}), &user_schema(), Direction::Response, Some(&config));

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "$.id");
        assert_eq!(violations[0].kind, ViolationKind::InvalidType);
    }

    #[test]
    fn test_allow_list_only_applies_at_root() {
        let schema = SchemaNode::object().required_property(
            "owner",
            SchemaNode::object().required_property("name", SchemaNode::string()),
        );
        let config = PartialValidationConfig::only(["owner"]);
        let violations = validate(&json!({"owner": {}}), &schema, Direction::Request, Some(&config));

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "$.owner.name");
    }

    #[test]
    fn test_visibility_violation_is_unexpected_field() {
        let schema = SchemaNode::object()
            .with_property(PropertySchema::new("password", SchemaNode::string()).write_only(), true)
            .with_property(PropertySchema::new("id", SchemaNode::integer()).read_only(), true);

        let response = validate(&json!({"id": 1, "password": "s3cret"}), &schema, Direction::Response, None);
        assert_eq!(response.len(), 1);
        assert_eq!(response[0].kind, ViolationKind::UnexpectedField);
        assert_eq!(response[0].path, "$.password");
        assert!(response[0].message.contains("visibility violation"));

        // read-only id is neither required nor allowed in a request
        assert!(validate(&json!({"password": "s3cret"}), &schema, Direction::Request, None).is_empty());
        let request = validate(&json!({"id": 1, "password": "s3cret"}), &schema, Direction::Request, None);
        assert_eq!(request.len(), 1);
        assert_eq!(request[0].path, "$.id");
    }

    #[test]
    fn test_one_of_and_any_of() {
        let a = SchemaNode::object().required_property("x", SchemaNode::integer());
        let b = SchemaNode::object().required_property("y", SchemaNode::integer());
        let one_of = SchemaNode::one_of(vec![a.clone(), b.clone()]);
        let any_of = SchemaNode::any_of(vec![a, b]);

        assert!(validate(&json!({"x": 1}), &one_of, Direction::Request, None).is_empty());

        let ambiguous = validate(&json!({"x": 1, "y": 2}), &one_of, Direction::Request, None);
        assert_eq!(ambiguous.len(), 1);
        assert!(ambiguous[0].message.contains("ambiguous"));
        assert!(validate(&json!({"x": 1, "y": 2}), &any_of, Direction::Request, None).is_empty());

        let none = validate(&json!({"z": 1}), &any_of, Direction::Request, None);
        assert_eq!(none.len(), 1);
        assert_eq!(none[0].kind, ViolationKind::InvalidType);
    }

    #[test]
    fn test_all_of_concatenates_branch_violations() {
        let schema = SchemaNode::all_of(vec![
            SchemaNode::object().required_property("x", SchemaNode::integer()),
            SchemaNode::object().required_property("y", SchemaNode::integer()),
        ]);
        let violations = validate(&json!({}), &schema, Direction::Request, None);
        let paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["$.x", "$.y"]);
    }

    #[test]
    fn test_discriminator_reports_selected_branch_directly() {
        let cat = SchemaNode::object()
            .required_property("kind", SchemaNode::string())
            .required_property("lives", SchemaNode::integer());
        let dog = SchemaNode::object()
            .required_property("kind", SchemaNode::string())
            .required_property("good", SchemaNode::boolean());
        let schema = SchemaNode::one_of(vec![cat, dog])
            .with_discriminator("kind", [("cat", 0), ("dog", 1)])
            .unwrap();

        let violations = validate(&json!({"kind": "dog"}), &schema, Direction::Response, None);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MissingRequired);
        assert_eq!(violations[0].path, "$.good");

        let unknown = validate(&json!({"kind": "bird"}), &schema, Direction::Response, None);
        assert_eq!(unknown[0].kind, ViolationKind::InvalidEnumValue);
        assert_eq!(unknown[0].path, "$.kind");

        let missing = validate(&json!({"lives": 9}), &schema, Direction::Response, None);
        assert_eq!(missing[0].kind, ViolationKind::MissingRequired);
        assert_eq!(missing[0].path, "$.kind");
    }

    #[test]
    fn test_const_and_boolean_enum() {
        let schema = SchemaNode::object()
            .required_property("version", SchemaNode::integer().with_const(json!(2)))
            .required_property("active", SchemaNode::boolean().with_const(json!(true)));

        let violations = validate(&json!({"version": 1, "active": false}), &schema, Direction::Request, None);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.kind == ViolationKind::InvalidEnumValue));
    }
}
