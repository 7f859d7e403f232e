//! Per-session context: the key/value state shared across a sequence's tests.
//!
//! The context is a typed map with a declared key schema. A sequence
//! declares the variables it `requires` and `defines`; the runner installs
//! those as the writable key set before the first test runs. Writes to
//! undeclared keys are a programming error in the test body, not silently
//! accepted. External callback parameters merge under the reserved
//! `callback_params` key, which is always writable.
//!
//! A `Context` is exclusively owned by one `SequenceResult` for that
//! result's lifetime; independent sequence runs never share one.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved key that callback parameters merge under on resume.
pub const CALLBACK_PARAMS_KEY: &str = "callback_params";

/// Errors from context access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A test body wrote a key its sequence never declared.
    UndeclaredKey { key: String },
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::UndeclaredKey { key } => {
                write!(f, "write to undeclared context key '{}'", key)
            }
        }
    }
}

impl std::error::Error for ContextError {}

/// Key/value session state with a declared writable-key schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    values: BTreeMap<String, Value>,
    allowed_keys: BTreeSet<String>,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    /// Insert a value and mark its key as writable. Used when seeding a
    /// fresh instance context (server URL, credentials, operator-supplied
    /// parameters) before any sequence runs.
    pub fn seed(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.allowed_keys.insert(key.clone());
        self.values.insert(key, value);
    }

    /// Extend the writable-key set with a sequence's declared variables.
    /// Called by the runner when a sequence starts.
    pub fn allow_keys<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            self.allowed_keys.insert(key.into());
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Write a declared key. `callback_params` is always writable.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ContextError> {
        if key != CALLBACK_PARAMS_KEY && !self.allowed_keys.contains(key) {
            return Err(ContextError::UndeclaredKey {
                key: key.to_string(),
            });
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Merge external callback parameters under `callback_params`.
    /// Existing parameters from an earlier callback are replaced wholesale.
    pub fn merge_callback(&mut self, params: BTreeMap<String, String>) {
        let object: serde_json::Map<String, Value> = params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        self.values
            .insert(CALLBACK_PARAMS_KEY.to_string(), Value::Object(object));
    }

    /// A single parameter from the most recent callback, if any.
    pub fn callback_param(&self, name: &str) -> Option<&str> {
        self.values
            .get(CALLBACK_PARAMS_KEY)?
            .get(name)?
            .as_str()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
