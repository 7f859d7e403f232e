//! The sequence registry: write-once at startup, read-only thereafter.
//!
//! `RegistryBuilder` assigns each test a process-wide monotonically
//! increasing index as sequences register in source order; the index is
//! used only to compute the stable `<prefix>-<index>` identifier and is
//! independent of the per-result index. The built `SequenceRegistry` is
//! immutable and safe for unlimited concurrent readers, so simultaneously
//! running sequence instances share one `Arc` without synchronization.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::sequence::SequenceDefinition;
use crate::test::TestDefinition;

/// Errors detected at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateSequence { name: String },
    /// A context key declared twice within one sequence's schema.
    DuplicateContextKey { sequence: String, key: String },
    EmptySequence { name: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateSequence { name } => {
                write!(f, "sequence '{}' registered twice", name)
            }
            RegistryError::DuplicateContextKey { sequence, key } => {
                write!(
                    f,
                    "sequence '{}' declares context key '{}' more than once",
                    sequence, key
                )
            }
            RegistryError::EmptySequence { name } => {
                write!(f, "sequence '{}' has no tests", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Builder. Registration order is preserved; ids are assigned here.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    sequences: Vec<SequenceDefinition>,
    next_index: usize,
}

impl RegistryBuilder {
    pub fn new() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Register a sequence, assigning stable ids to its tests.
    pub fn register(&mut self, mut sequence: SequenceDefinition) -> Result<(), RegistryError> {
        if sequence.tests.is_empty() {
            return Err(RegistryError::EmptySequence {
                name: sequence.name.clone(),
            });
        }
        if self.sequences.iter().any(|s| s.name == sequence.name) {
            return Err(RegistryError::DuplicateSequence {
                name: sequence.name.clone(),
            });
        }

        let mut seen = BTreeSet::new();
        for key in sequence.requires.iter().chain(sequence.defines.iter()) {
            if !seen.insert(key.as_str()) {
                return Err(RegistryError::DuplicateContextKey {
                    sequence: sequence.name.clone(),
                    key: key.clone(),
                });
            }
        }

        for test in &mut sequence.tests {
            self.next_index += 1;
            test.id = format!("{}-{:02}", sequence.prefix, self.next_index);
        }
        self.sequences.push(sequence);
        Ok(())
    }

    pub fn build(self) -> SequenceRegistry {
        let mut by_name = BTreeMap::new();
        let mut test_locations = BTreeMap::new();
        let mut total_tests = 0;
        for (seq_idx, sequence) in self.sequences.iter().enumerate() {
            by_name.insert(sequence.name.clone(), seq_idx);
            for (test_idx, test) in sequence.tests.iter().enumerate() {
                test_locations.insert(test.id.clone(), (seq_idx, test_idx));
                total_tests += 1;
            }
        }
        SequenceRegistry {
            sequences: self.sequences,
            by_name,
            test_locations,
            total_tests,
        }
    }
}

/// Read-only collection of registered sequences.
#[derive(Debug)]
pub struct SequenceRegistry {
    sequences: Vec<SequenceDefinition>,
    by_name: BTreeMap<String, usize>,
    test_locations: BTreeMap<String, (usize, usize)>,
    total_tests: usize,
}

impl SequenceRegistry {
    /// Sequences in registration order.
    pub fn sequences(&self) -> impl Iterator<Item = &SequenceDefinition> {
        self.sequences.iter()
    }

    pub fn sequence(&self, name: &str) -> Option<&SequenceDefinition> {
        self.by_name.get(name).map(|&idx| &self.sequences[idx])
    }

    /// Look up a test by its stable `<prefix>-<index>` identifier.
    pub fn test(&self, id: &str) -> Option<&TestDefinition> {
        self.test_locations
            .get(id)
            .map(|&(seq_idx, test_idx)| &self.sequences[seq_idx].tests[test_idx])
    }

    /// Every registered test, in registration order across sequences.
    pub fn tests(&self) -> impl Iterator<Item = &TestDefinition> {
        self.sequences.iter().flat_map(|s| s.tests.iter())
    }

    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    pub fn total_tests(&self) -> usize {
        self.total_tests
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestDefinition;

    fn noop_test(title: &str) -> TestDefinition {
        TestDefinition::new(title, |_session| Ok(()))
    }

    fn two_sequences() -> SequenceRegistry {
        let mut builder = RegistryBuilder::new();
        builder
            .register(
                SequenceDefinition::new("capability", "CAP")
                    .test(noop_test("fetch capability document"))
                    .test(noop_test("check supported resources")),
            )
            .unwrap();
        builder
            .register(
                SequenceDefinition::new("patient_access", "PAT")
                    .requires(["patient_id"])
                    .test(noop_test("read patient")),
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn ids_are_monotonic_across_sequences() {
        let registry = two_sequences();
        let capability = registry.sequence("capability").unwrap();
        assert_eq!(capability.tests[0].id, "CAP-01");
        assert_eq!(capability.tests[1].id, "CAP-02");
        let patient = registry.sequence("patient_access").unwrap();
        assert_eq!(patient.tests[0].id, "PAT-03");
    }

    #[test]
    fn lookup_by_test_id() {
        let registry = two_sequences();
        let test = registry.test("PAT-03").unwrap();
        assert_eq!(test.title, "read patient");
        assert!(registry.test("PAT-99").is_none());
    }

    #[test]
    fn counts() {
        let registry = two_sequences();
        assert_eq!(registry.sequence_count(), 2);
        assert_eq!(registry.total_tests(), 3);
    }

    #[test]
    fn duplicate_sequence_rejected() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(SequenceDefinition::new("dup", "D").test(noop_test("a")))
            .unwrap();
        let err = builder
            .register(SequenceDefinition::new("dup", "D").test(noop_test("b")))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateSequence { .. }));
    }

    #[test]
    fn duplicate_context_key_rejected() {
        let mut builder = RegistryBuilder::new();
        let err = builder
            .register(
                SequenceDefinition::new("s", "S")
                    .requires(["token"])
                    .defines(["token"])
                    .test(noop_test("a")),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateContextKey { .. }));
    }

    #[test]
    fn empty_sequence_rejected() {
        let mut builder = RegistryBuilder::new();
        let err = builder
            .register(SequenceDefinition::new("empty", "E"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptySequence { .. }));
    }
}
