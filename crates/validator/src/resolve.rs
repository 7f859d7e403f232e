//! Path resolution: locate the JSON values an element path names.
//!
//! Supports plain dotted traversal, fan-out across arrays (each element
//! searched independently, results flattened), and choice paths ending in
//! the `[x]` placeholder, tried once per declared type with the
//! capitalized type code substituted; the first type that yields any
//! value wins.

use serde_json::Value;

/// Marker for choice elements: `Observation.value[x]`.
pub const CHOICE_MARKER: &str = "[x]";

/// Resolve a plain dotted path relative to `scope`.
pub fn resolve_path(scope: &Value, path: &str) -> Vec<Value> {
    let mut current: Vec<&Value> = vec![scope];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(child) = item.get(segment) {
                            next.push(child);
                        }
                    }
                }
                other => {
                    if let Some(child) = other.get(segment) {
                        next.push(child);
                    }
                }
            }
        }
        current = next;
    }

    // Flatten trailing arrays so callers see individual values.
    let mut out = Vec::new();
    for value in current {
        match value {
            Value::Array(items) => out.extend(items.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    out
}

/// Resolve an element path, expanding a `[x]` choice against the declared
/// types. Returns the resolved values and, for choice paths, the type code
/// that yielded them.
pub fn resolve_element(
    scope: &Value,
    path: &str,
    types: &[String],
) -> (Vec<Value>, Option<String>) {
    if !path.contains(CHOICE_MARKER) {
        return (resolve_path(scope, path), None);
    }
    for code in types {
        let concrete = path.replace(CHOICE_MARKER, &capitalize(code));
        let values = resolve_path(scope, &concrete);
        if !values.is_empty() {
            return (values, Some(code.clone()));
        }
    }
    (Vec::new(), None)
}

/// Uppercase the first character: `dateTime` becomes `DateTime` when
/// substituted into a choice path.
pub fn capitalize(code: &str) -> String {
    let mut chars = code.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_traversal() {
        let doc = json!({"code": {"text": "Smoker"}});
        assert_eq!(resolve_path(&doc, "code.text"), vec![json!("Smoker")]);
        assert!(resolve_path(&doc, "code.missing").is_empty());
    }

    #[test]
    fn array_fan_out_flattens() {
        let doc = json!({
            "name": [
                {"given": ["Amy", "A."]},
                {"given": ["Beth"]}
            ]
        });
        assert_eq!(
            resolve_path(&doc, "name.given"),
            vec![json!("Amy"), json!("A."), json!("Beth")]
        );
    }

    #[test]
    fn empty_array_resolves_to_nothing() {
        let doc = json!({"name": []});
        assert!(resolve_path(&doc, "name").is_empty());
    }

    #[test]
    fn choice_tries_types_in_order() {
        let doc = json!({"valueQuantity": {"value": 85.5}});
        let types = vec!["string".to_string(), "Quantity".to_string()];
        let (values, chosen) = resolve_element(&doc, "value[x]", &types);
        assert_eq!(values.len(), 1);
        assert_eq!(chosen.as_deref(), Some("Quantity"));
    }

    #[test]
    fn choice_with_no_match_is_empty() {
        let doc = json!({"valueBoolean": true});
        let types = vec!["string".to_string()];
        let (values, chosen) = resolve_element(&doc, "value[x]", &types);
        assert!(values.is_empty());
        assert_eq!(chosen, None);
    }

    #[test]
    fn capitalize_type_codes() {
        assert_eq!(capitalize("string"), "String");
        assert_eq!(capitalize("dateTime"), "DateTime");
        assert_eq!(capitalize("CodeableConcept"), "CodeableConcept");
    }
}
