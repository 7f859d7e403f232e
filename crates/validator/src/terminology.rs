//! Terminology membership: enumerable value sets for binding checks.
//!
//! A `ValueSetIndex` maps a terminology reference (value-set URL) to the
//! codes it enumerates. An unresolvable reference is not an error -- the
//! binding check degrades to the short-description heuristic and at worst
//! records a warning, so validation stays total.

use std::collections::{BTreeMap, BTreeSet};

/// Index of enumerable value sets keyed by reference URL.
#[derive(Debug, Default)]
pub struct ValueSetIndex {
    sets: BTreeMap<String, BTreeSet<String>>,
}

impl ValueSetIndex {
    pub fn new() -> ValueSetIndex {
        ValueSetIndex::default()
    }

    /// Register the codes a value set enumerates.
    pub fn register<I, S>(&mut self, reference: impl Into<String>, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sets.insert(
            reference.into(),
            codes.into_iter().map(Into::into).collect(),
        );
    }

    /// Whether the reference resolves to an enumerable set at all.
    pub fn resolves(&self, reference: &str) -> bool {
        self.sets.contains_key(reference)
    }

    /// Membership check. `None` when the reference does not resolve.
    pub fn contains(&self, reference: &str, code: &str) -> Option<bool> {
        self.sets.get(reference).map(|codes| codes.contains(code))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let mut index = ValueSetIndex::new();
        index.register(
            "http://example.test/ValueSet/administrative-gender",
            ["male", "female", "other", "unknown"],
        );
        assert_eq!(
            index.contains("http://example.test/ValueSet/administrative-gender", "male"),
            Some(true)
        );
        assert_eq!(
            index.contains("http://example.test/ValueSet/administrative-gender", "m"),
            Some(false)
        );
        assert_eq!(index.contains("http://example.test/ValueSet/unknown", "male"), None);
    }
}
