//! JSON paths in `$`, `$.field`, `$.list[0]`, `$['odd key']` notation.

pub const ROOT: &str = "$";

/// Path of a named child
pub fn child(parent: &str, name: &str) -> String {
    if is_plain_name(name) {
        format!("{}.{}", parent, name)
    } else {
        format!("{}['{}']", parent, name.replace('\'', "\\'"))
    }
}

/// Path of an array element
pub fn index(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Re-root a path produced relative to `$` under `parent`.
///
/// `splice("$.field", "$.x")` is `$.field.x`, `splice("$.field", "$")` is `$.field`.
pub fn splice(parent: &str, nested: &str) -> String {
    match nested.strip_prefix('$') {
        Some(rest) => format!("{}{}", parent, rest),
        None if nested.is_empty() => parent.to_string(),
        None => child(parent, nested),
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_and_index() {
        assert_eq!(child(ROOT, "name"), "$.name");
        assert_eq!(index(&child(ROOT, "items"), 2), "$.items[2]");
        assert_eq!(child(ROOT, "a.b"), "$['a.b']");
    }

    #[test]
    fn test_splice() {
        assert_eq!(splice("$.field", "$.x"), "$.field.x");
        assert_eq!(splice("$.field", "$"), "$.field");
        assert_eq!(splice("$.list", "$[0].id"), "$.list[0].id");
        assert_eq!(splice("$.headers", "x-trace"), "$.headers.x-trace");
    }
}
