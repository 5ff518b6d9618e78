use super::{Change, ChangeKind, Severity};
use crate::models::schema::{
    Allowed, Composition, Direction, NumberRules, ObjectShape, PropertySchema, SchemaNode, Shape,
    StringRules, TextCheck, values_equal,
};
use crate::validation::path;
use serde_json::Value;

/// Walks an old and a new schema tree in lock-step, recording classified changes
pub(super) struct SchemaDiff<'a> {
    endpoint: &'a str,
    location: &'a str,
    direction: Direction,
    changes: &'a mut Vec<Change>,
}

impl<'a> SchemaDiff<'a> {
    pub(super) fn new(
        endpoint: &'a str,
        location: &'a str,
        direction: Direction,
        changes: &'a mut Vec<Change>,
    ) -> Self {
        Self {
            endpoint,
            location,
            direction,
            changes,
        }
    }

    pub(super) fn node(&mut self, at: &str, old: &SchemaNode, new: &SchemaNode) {
        self.nullability(at, old.nullable, new.nullable);

        match (&old.shape, &new.shape) {
            (Shape::Any, Shape::Any) | (Shape::Null, Shape::Null) => {}
            (Shape::Boolean(old), Shape::Boolean(new)) => {
                self.allowed(at, old.as_ref(), new.as_ref())
            }
            (Shape::String(old), Shape::String(new)) => self.string(at, old, new),
            (Shape::Integer(old), Shape::Integer(new))
            | (Shape::Number(old), Shape::Number(new)) => self.number(at, old, new),
            (Shape::Object(old), Shape::Object(new)) => self.object(at, old, new),
            (Shape::Array(old), Shape::Array(new)) => {
                let items = format!("{}[*]", at);
                self.node(&items, &old.items, &new.items)
            }
            (Shape::Composition(old), Shape::Composition(new)) => self.composition(at, old, new),
            (old_shape, new_shape) => self.record(
                at,
                ChangeKind::TypeChanged,
                Severity::Breaking,
                format!(
                    "type changed from {} to {}",
                    shape_name(old_shape),
                    shape_name(new_shape)
                ),
            ),
        }
    }

    /// Severity that depends on which side of the exchange the schema describes
    fn by_direction(&self, request: Severity, response: Severity) -> Severity {
        match self.direction {
            Direction::Request => request,
            Direction::Response => response,
        }
    }

    fn record(&mut self, at: &str, kind: ChangeKind, severity: Severity, description: String) {
        self.changes.push(
            Change::new(self.endpoint, kind, severity, description).at(self.location, at),
        );
    }

    fn nullability(&mut self, at: &str, old: bool, new: bool) {
        match (old, new) {
            (false, true) => {
                let severity = self.by_direction(Severity::NonBreaking, Severity::Breaking);
                self.record(
                    at,
                    ChangeKind::TypeChanged,
                    severity,
                    "became nullable".to_string(),
                );
            }
            (true, false) => {
                let severity = self.by_direction(Severity::Breaking, Severity::NonBreaking);
                self.record(
                    at,
                    ChangeKind::TypeChanged,
                    severity,
                    "no longer nullable".to_string(),
                );
            }
            _ => {}
        }
    }

    fn string(&mut self, at: &str, old: &StringRules, new: &StringRules) {
        if old.check != new.check {
            self.record(
                at,
                ChangeKind::FormatChanged,
                Severity::Breaking,
                format!(
                    "{} changed to {}",
                    describe_check(old.check.as_ref()),
                    describe_check(new.check.as_ref())
                ),
            );
        }
        self.allowed(at, old.allowed.as_ref(), new.allowed.as_ref());
    }

    fn number(&mut self, at: &str, old: &NumberRules, new: &NumberRules) {
        self.allowed(at, old.allowed.as_ref(), new.allowed.as_ref());
    }

    fn allowed(&mut self, at: &str, old: Option<&Allowed>, new: Option<&Allowed>) {
        match (old, new) {
            (None, None) => {}
            (None, Some(new)) => self.record(
                at,
                ChangeKind::EnumNarrowed,
                Severity::Breaking,
                format!("restricted to {}", new.describe()),
            ),
            (Some(_), None) => self.record(
                at,
                ChangeKind::EnumWidened,
                Severity::NonBreaking,
                "value restriction removed".to_string(),
            ),
            (Some(old), Some(new)) => {
                let removed = missing_from(old.values(), new);
                let added = missing_from(new.values(), old);
                if !removed.is_empty() {
                    self.record(
                        at,
                        ChangeKind::EnumNarrowed,
                        Severity::Breaking,
                        format!("values removed: {}", join_values(&removed)),
                    );
                }
                if !added.is_empty() {
                    self.record(
                        at,
                        ChangeKind::EnumWidened,
                        Severity::NonBreaking,
                        format!("values added: {}", join_values(&added)),
                    );
                }
            }
        }
    }

    fn object(&mut self, at: &str, old: &ObjectShape, new: &ObjectShape) {
        for (name, old_property) in &old.properties {
            let child = path::child(at, name);
            let was_visible = old_property.visibility.allows(self.direction);
            let new_property = new
                .properties
                .get(name)
                .filter(|p| p.visibility.allows(self.direction));

            match (was_visible, new_property) {
                (false, None) => {}
                (false, Some(new_property)) => {
                    self.property_added(&child, new_property, new.is_required(name))
                }
                (true, None) => self.property_removed(&child, name, old.is_required(name)),
                (true, Some(new_property)) => {
                    self.requirement(&child, name, old.is_required(name), new.is_required(name));
                    self.node(&child, &old_property.schema, &new_property.schema);
                }
            }
        }

        for (name, new_property) in &new.properties {
            if old.properties.contains_key(name) || !new_property.visibility.allows(self.direction)
            {
                continue;
            }
            let child = path::child(at, name);
            self.property_added(&child, new_property, new.is_required(name));
        }
    }

    fn property_added(&mut self, at: &str, property: &PropertySchema, required: bool) {
        if required && self.direction == Direction::Request {
            self.record(
                at,
                ChangeKind::RequiredAdded,
                Severity::Breaking,
                format!("required property '{}' added", property.name),
            );
        } else {
            self.record(
                at,
                ChangeKind::FieldAdded,
                Severity::NonBreaking,
                format!("property '{}' added", property.name),
            );
        }
    }

    /// Dropping a required property is `RequiredRemoved`, any other drop is `FieldRemoved`
    fn property_removed(&mut self, at: &str, name: &str, was_required: bool) {
        let severity = self.by_direction(Severity::NonBreaking, Severity::Breaking);
        let (kind, description) = if was_required {
            (
                ChangeKind::RequiredRemoved,
                format!("required property '{}' removed", name),
            )
        } else {
            (ChangeKind::FieldRemoved, format!("property '{}' removed", name))
        };
        self.record(at, kind, severity, description);
    }

    fn requirement(&mut self, at: &str, name: &str, was_required: bool, is_required: bool) {
        match (was_required, is_required) {
            (true, false) => {
                let severity = self.by_direction(Severity::NonBreaking, Severity::Breaking);
                self.record(
                    at,
                    ChangeKind::RequiredRemoved,
                    severity,
                    format!("property '{}' is no longer required", name),
                );
            }
            (false, true) => {
                let severity = self.by_direction(Severity::Breaking, Severity::NonBreaking);
                self.record(
                    at,
                    ChangeKind::RequiredAdded,
                    severity,
                    format!("property '{}' is now required", name),
                );
            }
            _ => {}
        }
    }

    fn composition(&mut self, at: &str, old: &Composition, new: &Composition) {
        if old.mode != new.mode || old.branches.len() != new.branches.len() {
            self.record(
                at,
                ChangeKind::TypeChanged,
                Severity::Breaking,
                format!(
                    "composition changed from {} of {} to {} of {}",
                    old.mode,
                    old.branches.len(),
                    new.mode,
                    new.branches.len()
                ),
            );
            return;
        }

        match (&old.discriminator, &new.discriminator) {
            (Some(old_d), Some(new_d)) if old_d.property_name != new_d.property_name => {
                self.record(
                    at,
                    ChangeKind::TypeChanged,
                    Severity::Breaking,
                    format!(
                        "discriminator changed from '{}' to '{}'",
                        old_d.property_name, new_d.property_name
                    ),
                );
            }
            (Some(old_d), Some(new_d)) => {
                let tag_path = path::child(at, &old_d.property_name);
                let old_tags: Vec<Value> =
                    old_d.mapping.keys().map(|k| Value::String(k.clone())).collect();
                let new_tags: Vec<Value> =
                    new_d.mapping.keys().map(|k| Value::String(k.clone())).collect();
                self.allowed(
                    &tag_path,
                    Some(&Allowed::Enum(old_tags)),
                    Some(&Allowed::Enum(new_tags)),
                );
            }
            (None, Some(new_d)) => self.record(
                at,
                ChangeKind::TypeChanged,
                Severity::Breaking,
                format!("discriminator '{}' added", new_d.property_name),
            ),
            (Some(old_d), None) => self.record(
                at,
                ChangeKind::TypeChanged,
                Severity::NonBreaking,
                format!("discriminator '{}' removed", old_d.property_name),
            ),
            (None, None) => {}
        }

        for (old_branch, new_branch) in old.branches.iter().zip(&new.branches) {
            self.node(at, old_branch, new_branch);
        }
    }
}

fn shape_name(shape: &Shape) -> String {
    match shape {
        Shape::Any => "any".to_string(),
        Shape::Null => "null".to_string(),
        Shape::Boolean(_) => "boolean".to_string(),
        Shape::String(_) => "string".to_string(),
        Shape::Integer(_) => "integer".to_string(),
        Shape::Number(_) => "number".to_string(),
        Shape::Object(_) => "object".to_string(),
        Shape::Array(_) => "array".to_string(),
        Shape::Composition(c) => c.mode.to_string(),
    }
}

fn describe_check(check: Option<&TextCheck>) -> String {
    match check {
        Some(TextCheck::Format(format)) => format!("format '{}'", format),
        Some(TextCheck::Pattern(pattern)) => format!("pattern '{}'", pattern.as_str()),
        None => "no format".to_string(),
    }
}

fn missing_from(values: &[Value], other: &Allowed) -> Vec<Value> {
    values
        .iter()
        .filter(|v| !other.values().iter().any(|o| values_equal(v, o)))
        .cloned()
        .collect()
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
