//! Validation findings: errors, warnings, information.

use serde::Serialize;

/// The outcome of one validation call. Produced per call, not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Findings {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub information: Vec<String>,
}

impl Findings {
    pub fn new() -> Findings {
        Findings::default()
    }

    /// A single-error findings set, used when the input document itself is
    /// malformed and the walk short-circuits.
    pub fn single_error(message: impl Into<String>) -> Findings {
        Findings {
            errors: vec![message.into()],
            warnings: Vec::new(),
            information: Vec::new(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.information.push(message.into());
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.information.is_empty()
    }

    /// Merge another findings set into this one, prefixing each message
    /// with the path at which the nested validation ran.
    pub fn merge_prefixed(&mut self, prefix: &str, other: Findings) {
        self.errors
            .extend(other.errors.into_iter().map(|m| format!("{}: {}", prefix, m)));
        self.warnings
            .extend(other.warnings.into_iter().map(|m| format!("{}: {}", prefix, m)));
        self.information
            .extend(other.information.into_iter().map(|m| format!("{}: {}", prefix, m)));
    }

    pub fn merge(&mut self, other: Findings) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.information.extend(other.information);
    }
}
