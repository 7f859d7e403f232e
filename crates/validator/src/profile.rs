//! Profile model: a read-only tree of element constraints.
//!
//! Profiles arrive as a flat list of dotted-path elements (the pre-parsed
//! schema an out-of-scope loader produces). `Profile::build` nests each
//! element under its path prefix and optionally prunes to a differential:
//! the subset of paths that were actually constrained, plus their
//! ancestors. The built tree is never mutated during validation.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Upper cardinality bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Max {
    Count(u32),
    Unbounded,
}

impl fmt::Display for Max {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Max::Count(n) => write!(f, "{}", n),
            Max::Unbounded => write!(f, "*"),
        }
    }
}

impl Max {
    /// Parse the conventional string form: an integer or `*`.
    pub fn parse(text: &str) -> Max {
        match text.trim() {
            "*" => Max::Unbounded,
            other => other.parse().map(Max::Count).unwrap_or(Max::Unbounded),
        }
    }

    pub fn allows(&self, count: usize) -> bool {
        match self {
            Max::Count(n) => count <= *n as usize,
            Max::Unbounded => true,
        }
    }
}

/// How strictly a terminology binding must be honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingStrength {
    Required,
    Extensible,
    Preferred,
    Example,
}

/// A terminology constraint on a coded element.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Binding {
    pub strength: BindingStrength,
    /// Reference to the bound terminology (a value-set URL).
    pub value_set: String,
}

/// One element of a flat profile definition.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatElement {
    /// Dotted path rooted at the resource type, e.g. `Patient.name.family`.
    pub path: String,
    pub min: u32,
    pub max: Max,
    /// Declared type codes; more than one only for choice elements.
    #[serde(default)]
    pub types: Vec<String>,
    /// Human-readable short description; also the fallback heuristic for
    /// bindings with no enumerable terminology.
    #[serde(default)]
    pub short: Option<String>,
    #[serde(default)]
    pub binding: Option<Binding>,
    /// Exact value the element must carry.
    #[serde(default)]
    pub fixed: Option<Value>,
    /// Pattern the element must partially match (coding system+code).
    #[serde(default)]
    pub pattern: Option<Value>,
    #[serde(default)]
    pub max_length: Option<usize>,
    /// For extension elements: the profile URL resolved values must carry
    /// in their `url` field.
    #[serde(default)]
    pub profile_url: Option<String>,
}

impl FlatElement {
    pub fn new(path: &str, min: u32, max: Max) -> FlatElement {
        FlatElement {
            path: path.to_string(),
            min,
            max,
            types: Vec::new(),
            short: None,
            binding: None,
            fixed: None,
            pattern: None,
            max_length: None,
            profile_url: None,
        }
    }

    pub fn types<I, S>(mut self, types: I) -> FlatElement
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn short(mut self, short: impl Into<String>) -> FlatElement {
        self.short = Some(short.into());
        self
    }

    pub fn binding(mut self, strength: BindingStrength, value_set: impl Into<String>) -> FlatElement {
        self.binding = Some(Binding {
            strength,
            value_set: value_set.into(),
        });
        self
    }

    pub fn fixed(mut self, value: Value) -> FlatElement {
        self.fixed = Some(value);
        self
    }

    pub fn pattern(mut self, value: Value) -> FlatElement {
        self.pattern = Some(value);
        self
    }

    pub fn max_length(mut self, limit: usize) -> FlatElement {
        self.max_length = Some(limit);
        self
    }

    pub fn profile_url(mut self, url: impl Into<String>) -> FlatElement {
        self.profile_url = Some(url.into());
        self
    }
}

/// A node of the built constraint tree.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub path: String,
    pub min: u32,
    pub max: Max,
    pub types: Vec<String>,
    pub short: Option<String>,
    pub binding: Option<Binding>,
    pub fixed: Option<Value>,
    pub pattern: Option<Value>,
    pub max_length: Option<usize>,
    pub profile_url: Option<String>,
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    fn from_flat(element: &FlatElement) -> ElementNode {
        ElementNode {
            path: element.path.clone(),
            min: element.min,
            max: element.max,
            types: element.types.clone(),
            short: element.short.clone(),
            binding: element.binding.clone(),
            fixed: element.fixed.clone(),
            pattern: element.pattern.clone(),
            max_length: element.max_length,
            profile_url: element.profile_url.clone(),
            children: Vec::new(),
        }
    }

    /// The last path segment relative to the parent node.
    pub fn relative_path(&self, parent_path: &str) -> &str {
        self.path
            .strip_prefix(parent_path)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&self.path)
    }
}

/// A built profile: root type name plus the nested constraint tree.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Resource type the profile constrains, e.g. `Patient`.
    pub root: String,
    /// Canonical URL identifying the profile.
    pub url: Option<String>,
    /// Children of the root (the root itself carries no constraints).
    pub elements: Vec<ElementNode>,
}

impl Profile {
    /// Build the tree from a flat element list.
    ///
    /// Elements must be ordered so that a parent path appears before its
    /// children (definition order in every real schema). An element whose
    /// parent path is absent from the list attaches to the nearest present
    /// ancestor; with no ancestor it becomes a root child.
    ///
    /// When `differential` is non-empty, the tree is pruned to exactly
    /// those paths plus their ancestors.
    pub fn build(root: &str, elements: &[FlatElement], differential: &[String]) -> Profile {
        let keep: Option<BTreeSet<&str>> = if differential.is_empty() {
            None
        } else {
            let mut keep: BTreeSet<&str> = BTreeSet::new();
            for path in differential {
                // A retained path retains every ancestor.
                let mut end = path.len();
                loop {
                    keep.insert(&path[..end]);
                    match path[..end].rfind('.') {
                        Some(dot) => end = dot,
                        None => break,
                    }
                }
            }
            Some(keep)
        };

        let root_prefix = format!("{}.", root);
        let mut tree: Vec<ElementNode> = Vec::new();
        for element in elements {
            if element.path == root {
                continue;
            }
            if let Some(keep) = &keep {
                if !keep.contains(element.path.as_str()) {
                    continue;
                }
            }
            if !element.path.starts_with(&root_prefix) {
                continue;
            }
            insert_node(&mut tree, ElementNode::from_flat(element));
        }

        Profile {
            root: root.to_string(),
            url: None,
            elements: tree,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Profile {
        self.url = Some(url.into());
        self
    }
}

/// Attach `node` under the deepest sibling whose path is a dotted prefix
/// of the node's path, or at this level when none is.
fn insert_node(siblings: &mut Vec<ElementNode>, node: ElementNode) {
    for candidate in siblings.iter_mut() {
        let prefix = format!("{}.", candidate.path);
        if node.path.starts_with(&prefix) {
            insert_node(&mut candidate.children, node);
            return;
        }
    }
    siblings.push(node);
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn patient_elements() -> Vec<FlatElement> {
        vec![
            FlatElement::new("Patient.name", 1, Max::Unbounded).types(["HumanName"]),
            FlatElement::new("Patient.name.family", 1, Max::Count(1)).types(["string"]),
            FlatElement::new("Patient.name.given", 0, Max::Unbounded).types(["string"]),
            FlatElement::new("Patient.gender", 0, Max::Count(1)).types(["code"]),
        ]
    }

    #[test]
    fn nests_by_dotted_prefix() {
        let profile = Profile::build("Patient", &patient_elements(), &[]);
        assert_eq!(profile.elements.len(), 2);
        let name = &profile.elements[0];
        assert_eq!(name.path, "Patient.name");
        assert_eq!(name.children.len(), 2);
        assert_eq!(name.children[0].path, "Patient.name.family");
        assert_eq!(name.children[0].relative_path(&name.path), "family");
    }

    #[test]
    fn differential_prunes_to_paths_plus_ancestors() {
        let differential = vec!["Patient.name.family".to_string()];
        let profile = Profile::build("Patient", &patient_elements(), &differential);
        assert_eq!(profile.elements.len(), 1);
        let name = &profile.elements[0];
        assert_eq!(name.path, "Patient.name");
        assert_eq!(name.children.len(), 1);
        assert_eq!(name.children[0].path, "Patient.name.family");
    }

    #[test]
    fn foreign_root_elements_are_ignored() {
        let mut elements = patient_elements();
        elements.push(FlatElement::new("Observation.code", 1, Max::Count(1)));
        let profile = Profile::build("Patient", &elements, &[]);
        assert!(profile
            .elements
            .iter()
            .all(|e| e.path.starts_with("Patient.")));
    }

    #[test]
    fn max_parse_and_display() {
        assert_eq!(Max::parse("3"), Max::Count(3));
        assert_eq!(Max::parse("*"), Max::Unbounded);
        assert_eq!(Max::Count(1).to_string(), "1");
        assert_eq!(Max::Unbounded.to_string(), "*");
        assert!(Max::Count(2).allows(2));
        assert!(!Max::Count(2).allows(3));
        assert!(Max::Unbounded.allows(700));
    }
}
