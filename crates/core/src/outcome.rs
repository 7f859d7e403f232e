//! Typed outcome model for test bodies.
//!
//! A test body reports exactly one outcome: completing normally is a pass,
//! and any early exit carries a `Signal`. Signals are ordinary control flow
//! -- a body writes `session.require("patient_id")?` or
//! `assert_that(ok, "…")?` and the first signal raised ends the body. The
//! runner catches the signal at its single boundary and translates it into
//! a `TestStatus` on the recorded result.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type returned by every test body. `Ok(())` is a pass.
pub type TestOutcome = Result<(), Signal>;

/// A non-pass outcome signaled by a test body.
///
/// `Cancel` is deliberately absent: cancellation is injected by the runner's
/// cancel operation, never signaled from inside a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// An assertion did not hold. Carries a human-readable message and
    /// optional raw detail (e.g. a response body) for diagnostics.
    Fail {
        message: String,
        detail: Option<serde_json::Value>,
    },
    /// Any unexpected condition, including defects in the body itself.
    /// Never downgraded to `Fail`.
    Error { message: String },
    /// The test is inapplicable given the current context.
    Skip { message: String },
    /// Functionality acknowledged but intentionally unimplemented.
    Todo { message: String },
    /// The test cannot complete until an external callback arrives at the
    /// named endpoint.
    Wait { endpoint: String },
    /// Like `Wait`, but the caller must first navigate the end user to
    /// `url` before waiting at `endpoint`.
    Redirect { url: String, endpoint: String },
}

impl Signal {
    /// A failed assertion with no attached detail.
    pub fn fail(message: impl Into<String>) -> Signal {
        Signal::Fail {
            message: message.into(),
            detail: None,
        }
    }

    /// A failed assertion with raw response detail attached.
    pub fn fail_with(message: impl Into<String>, detail: serde_json::Value) -> Signal {
        Signal::Fail {
            message: message.into(),
            detail: Some(detail),
        }
    }

    pub fn error(message: impl Into<String>) -> Signal {
        Signal::Error {
            message: message.into(),
        }
    }

    pub fn skip(message: impl Into<String>) -> Signal {
        Signal::Skip {
            message: message.into(),
        }
    }

    pub fn todo(message: impl Into<String>) -> Signal {
        Signal::Todo {
            message: message.into(),
        }
    }

    pub fn wait(endpoint: impl Into<String>) -> Signal {
        Signal::Wait {
            endpoint: endpoint.into(),
        }
    }

    pub fn redirect(url: impl Into<String>, endpoint: impl Into<String>) -> Signal {
        Signal::Redirect {
            url: url.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Fail { message, .. } => write!(f, "fail: {}", message),
            Signal::Error { message } => write!(f, "error: {}", message),
            Signal::Skip { message } => write!(f, "skip: {}", message),
            Signal::Todo { message } => write!(f, "todo: {}", message),
            Signal::Wait { endpoint } => write!(f, "wait at '{}'", endpoint),
            Signal::Redirect { url, endpoint } => {
                write!(f, "redirect to '{}' then wait at '{}'", url, endpoint)
            }
        }
    }
}

/// Status recorded on a `TestResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Pass,
    Fail,
    Error,
    Skip,
    Todo,
    Wait,
    Cancel,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
            TestStatus::Error => "error",
            TestStatus::Skip => "skip",
            TestStatus::Todo => "todo",
            TestStatus::Wait => "wait",
            TestStatus::Cancel => "cancel",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_signal_wins() {
        fn body() -> TestOutcome {
            Err(Signal::skip("no patient id"))?;
            Err(Signal::fail("unreachable"))
        }
        assert_eq!(body(), Err(Signal::skip("no patient id")));
    }

    #[test]
    fn status_serializes_snake_case() {
        let s = serde_json::to_string(&TestStatus::Pass).unwrap();
        assert_eq!(s, "\"pass\"");
        let back: TestStatus = serde_json::from_str("\"cancel\"").unwrap();
        assert_eq!(back, TestStatus::Cancel);
    }
}
