//! The recursive validation walk.
//!
//! Walks a profile's element tree against one document, resolving the
//! values each node names and applying cardinality, type, fixed/pattern,
//! binding, and length checks. Nested complex types recurse through the
//! type registry with findings path-prefixed into the caller's set.
//!
//! The walk is total: unknown type codes and unresolvable terminology
//! degrade to warnings, and a malformed input document short-circuits
//! with a single error.

use serde_json::Value;

use crate::findings::Findings;
use crate::profile::{Binding, BindingStrength, ElementNode, Profile};
use crate::resolve::resolve_element;
use crate::terminology::ValueSetIndex;
use crate::types::{check_primitive, PrimitiveKind, TypeCategory, TypeRegistry};

/// Recursion ceiling for self-referential type trees.
const MAX_DEPTH: usize = 32;

struct Walk<'a> {
    types: &'a TypeRegistry,
    terminology: &'a ValueSetIndex,
}

/// Validate a parsed document against a profile.
pub fn validate(
    document: &Value,
    profile: &Profile,
    types: &TypeRegistry,
    terminology: &ValueSetIndex,
) -> Findings {
    let mut findings = Findings::new();

    if let Some(resource_type) = document.get("resourceType").and_then(Value::as_str) {
        if resource_type != profile.root {
            findings.error(format!(
                "expected resource type {} -- found {}",
                profile.root, resource_type
            ));
            return findings;
        }
    }

    let walk = Walk { types, terminology };
    for node in &profile.elements {
        walk.check_node(node, &profile.root, document, &mut findings, 0);
    }
    findings
}

/// Validate raw text. Unparseable input short-circuits with one error.
pub fn validate_text(
    text: &str,
    profile: &Profile,
    types: &TypeRegistry,
    terminology: &ValueSetIndex,
) -> Findings {
    match serde_json::from_str::<Value>(text) {
        Ok(document) => validate(&document, profile, types, terminology),
        Err(e) => Findings::single_error(format!("document is not valid JSON: {}", e)),
    }
}

impl<'a> Walk<'a> {
    fn check_node(
        &self,
        node: &ElementNode,
        parent_path: &str,
        scope: &Value,
        findings: &mut Findings,
        depth: usize,
    ) {
        if depth > MAX_DEPTH {
            findings.warning(format!(
                "{}: maximum validation depth exceeded -- element not checked",
                node.path
            ));
            return;
        }

        let relative = node.relative_path(parent_path);
        let (mut values, chosen_type) = resolve_element(scope, relative, &node.types);

        // Extension elements match only the values carrying their profile URL.
        if let Some(url) = &node.profile_url {
            values.retain(|v| v.get("url").and_then(Value::as_str) == Some(url.as_str()));
        }

        let count = values.len();
        if count < node.min as usize || !node.max.allows(count) {
            findings.error(format!(
                "{}: failed cardinality test ({}..{}) -- found {}",
                node.path, node.min, node.max, count
            ));
        }
        if values.is_empty() {
            // Cardinality already covers "required but missing".
            return;
        }

        if let Some(fixed) = &node.fixed {
            if !values.iter().any(|v| v == fixed) {
                findings.error(format!(
                    "{}: expected fixed value {} -- found {}",
                    node.path,
                    fixed,
                    display(&values[0])
                ));
            }
        }

        let type_code = chosen_type.or_else(|| node.types.first().cloned());
        if let Some(code) = &type_code {
            for value in &values {
                self.check_type(node, code, value, findings, depth);
            }
        }

        if !node.children.is_empty() {
            for value in &values {
                for child in &node.children {
                    self.check_node(child, &node.path, value, findings, depth + 1);
                }
            }
        } else if let Some(code) = &type_code {
            self.recurse_registered_type(node, code, &values, findings, depth);
        }
    }

    /// Leaf node of complex type: validate each value against the type's
    /// own element tree from the registry.
    fn recurse_registered_type(
        &self,
        node: &ElementNode,
        code: &str,
        values: &[Value],
        findings: &mut Findings,
        depth: usize,
    ) {
        let elements = match self.types.classify(code) {
            TypeCategory::Complex(_) | TypeCategory::Resource(_) => {
                match self.types.elements(code) {
                    Some(elements) => elements,
                    None => return,
                }
            }
            _ => return,
        };
        for value in values {
            let mut nested = Findings::new();
            for child in elements {
                self.check_node(child, code, value, &mut nested, depth + 1);
            }
            findings.merge_prefixed(&node.path, nested);
        }
    }

    fn check_type(
        &self,
        node: &ElementNode,
        code: &str,
        value: &Value,
        findings: &mut Findings,
        _depth: usize,
    ) {
        match self.types.classify(code) {
            TypeCategory::Primitive(kind) => {
                if !check_primitive(kind, value) {
                    findings.error(format!(
                        "{}: '{}' is not a valid {}",
                        node.path,
                        display(value),
                        code
                    ));
                    return;
                }
                if kind == PrimitiveKind::Code {
                    if let Some(binding) = &node.binding {
                        self.check_binding(node, binding, value, findings);
                    }
                }
                if let Some(limit) = node.max_length {
                    if value.as_str().is_some_and(|s| s.len() > limit) {
                        findings.error(format!(
                            "{}: value exceeds maximum length of {}",
                            node.path, limit
                        ));
                    }
                }
            }
            TypeCategory::Complex(_) | TypeCategory::Resource(_) => {
                if code == "CodeableConcept" {
                    if let Some(pattern) = &node.pattern {
                        check_coding_pattern(node, pattern, value, findings);
                    }
                }
            }
            TypeCategory::Unknown(code) => {
                findings.warning(format!(
                    "{}: unable to resolve type '{}' -- skipping type check",
                    node.path, code
                ));
            }
        }
    }

    /// Terminology membership for a bound code, with strength-based
    /// severity and the short-description fallback when the referenced
    /// value set has no enumerable form.
    fn check_binding(
        &self,
        node: &ElementNode,
        binding: &Binding,
        value: &Value,
        findings: &mut Findings,
    ) {
        let code = match value.as_str() {
            Some(code) => code,
            None => return,
        };
        match self.terminology.contains(&binding.value_set, code) {
            Some(true) => {}
            Some(false) => {
                let message = format!(
                    "{}: code '{}' is not in value set {}",
                    node.path, code, binding.value_set
                );
                match binding.strength {
                    BindingStrength::Required => findings.error(message),
                    BindingStrength::Extensible => findings.warning(message),
                    BindingStrength::Preferred | BindingStrength::Example => {
                        findings.info(message)
                    }
                }
            }
            None => {
                // No enumerable terminology: degrade, never silently pass.
                findings.warning(format!(
                    "{}: value set {} could not be resolved -- checked '{}' against the element description",
                    node.path, binding.value_set, code
                ));
                let described = node
                    .short
                    .as_ref()
                    .is_some_and(|s| s.to_lowercase().contains(&code.to_lowercase()));
                if !described && binding.strength == BindingStrength::Required {
                    findings.error(format!(
                        "{}: code '{}' does not appear in the element description",
                        node.path, code
                    ));
                }
            }
        }
    }
}

/// At least one coding in the value must match the pattern's system+code.
fn check_coding_pattern(
    node: &ElementNode,
    pattern: &Value,
    value: &Value,
    findings: &mut Findings,
) {
    let expected: Vec<(&str, &str)> = pattern_codings(pattern);
    if expected.is_empty() {
        return;
    }
    let codings = value
        .get("coding")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let matched = codings.iter().any(|coding| {
        expected.iter().any(|(system, code)| {
            coding.get("system").and_then(Value::as_str) == Some(*system)
                && coding.get("code").and_then(Value::as_str) == Some(*code)
        })
    });
    if !matched {
        let (system, code) = expected[0];
        findings.error(format!(
            "{}: no coding matches pattern {}|{}",
            node.path, system, code
        ));
    }
}

/// Extract (system, code) pairs from a pattern shaped either as a
/// CodeableConcept (`{"coding": [...]}`) or a bare coding object.
fn pattern_codings(pattern: &Value) -> Vec<(&str, &str)> {
    let codings: Vec<&Value> = match pattern.get("coding").and_then(Value::as_array) {
        Some(items) => items.iter().collect(),
        None => vec![pattern],
    };
    codings
        .into_iter()
        .filter_map(|coding| {
            let system = coding.get("system").and_then(Value::as_str)?;
            let code = coding.get("code").and_then(Value::as_str)?;
            Some((system, code))
        })
        .collect()
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
