//! Sequence definitions: named, ordered suites of tests.
//!
//! A sequence is a stateless template -- identity is its `name`, and every
//! run instantiates a fresh `SequenceResult` against it. The declared
//! `requires`/`defines` sets form the context-key schema its test bodies
//! may read and write.

use std::collections::BTreeSet;

use crate::test::TestDefinition;

#[derive(Debug, Clone)]
pub struct SequenceDefinition {
    /// Identity. Unique within a registry.
    pub name: String,
    /// Short prefix for stable test ids (`<prefix>-<index>`).
    pub prefix: String,
    pub title: String,
    pub description: String,
    /// Logical test-case id for grouped aggregation; sequences sharing a
    /// test case are rolled up together.
    pub test_case: Option<String>,
    /// Whether this sequence counts toward the instance's final result.
    pub required: bool,
    /// Context keys that should exist before the sequence runs. Missing
    /// keys do not gate the run; tests self-skip via `TestSession::require`.
    pub requires: Vec<String>,
    /// Context keys the sequence writes during or after running.
    pub defines: Vec<String>,
    pub tests: Vec<TestDefinition>,
}

impl SequenceDefinition {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> SequenceDefinition {
        SequenceDefinition {
            name: name.into(),
            prefix: prefix.into(),
            title: String::new(),
            description: String::new(),
            test_case: None,
            required: true,
            requires: Vec::new(),
            defines: Vec::new(),
            tests: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> SequenceDefinition {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> SequenceDefinition {
        self.description = description.into();
        self
    }

    pub fn test_case(mut self, test_case: impl Into<String>) -> SequenceDefinition {
        self.test_case = Some(test_case.into());
        self
    }

    pub fn optional(mut self) -> SequenceDefinition {
        self.required = false;
        self
    }

    pub fn requires<I, S>(mut self, keys: I) -> SequenceDefinition
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn defines<I, S>(mut self, keys: I) -> SequenceDefinition
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defines = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn test(mut self, test: TestDefinition) -> SequenceDefinition {
        self.tests.push(test);
        self
    }

    /// The full declared context-key schema (requires ∪ defines).
    pub fn declared_keys(&self) -> BTreeSet<&str> {
        self.requires
            .iter()
            .chain(self.defines.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn total_tests(&self) -> usize {
        self.tests.len()
    }
}
