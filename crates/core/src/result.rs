//! Result records produced by the runner.
//!
//! `TestResult` and `SequenceResult` are the durable artifacts of a run.
//! Timestamps are RFC 3339 strings stamped by the runner; records carry
//! them as plain strings so the storage layer stays serialization-neutral.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{HttpRequest, HttpResponse};
use crate::outcome::TestStatus;

/// One outbound exchange made by a test body, attached to its result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: String,
    pub url: String,
    pub request_headers: Vec<(String, String)>,
    pub request_body: Option<String>,
    /// None when the request never produced a response (transport failure).
    pub status: Option<u16>,
    pub response_headers: Vec<(String, String)>,
    pub response_body: Option<String>,
}

impl RequestRecord {
    pub fn from_exchange(request: &HttpRequest, response: &HttpResponse) -> RequestRecord {
        RequestRecord {
            method: request.method.clone(),
            url: request.url.clone(),
            request_headers: request.headers.clone(),
            request_body: request.body.clone(),
            status: Some(response.status),
            response_headers: response.headers.clone(),
            response_body: Some(response.body.clone()),
        }
    }

    pub fn from_failure(request: &HttpRequest) -> RequestRecord {
        RequestRecord {
            method: request.method.clone(),
            url: request.url.clone(),
            request_headers: request.headers.clone(),
            request_body: request.body.clone(),
            status: None,
            response_headers: Vec::new(),
            response_body: None,
        }
    }
}

/// The recorded outcome of one executed test.
///
/// Immutable once the sequence moves past it, with two exceptions applied
/// by the runner: a `wait` result is corrected to `pass` when the awaited
/// callback arrives, and `cancel` overwrites the last result on cancel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    pub name: String,
    /// Position within the owning `SequenceResult`; matches registration
    /// order and is strictly increasing.
    pub index: usize,
    pub status: TestStatus,
    pub message: Option<String>,
    pub detail: Option<Value>,
    pub required: bool,
    pub warnings: Vec<String>,
    pub requests: Vec<RequestRecord>,
    /// RFC 3339 timestamp string.
    pub created_at: String,
}

/// Derived status of a sequence run. Precedence rules live in
/// `crate::aggregate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStatus {
    Pass,
    Fail,
    Error,
    Skip,
    Wait,
    Cancel,
}

impl SequenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceStatus::Pass => "pass",
            SequenceStatus::Fail => "fail",
            SequenceStatus::Error => "error",
            SequenceStatus::Skip => "skip",
            SequenceStatus::Wait => "wait",
            SequenceStatus::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for SequenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The durable record of one sequence run against one instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceResult {
    pub id: String,
    pub instance_id: String,
    pub sequence_name: String,
    /// Logical test-case id used by grouped aggregation.
    pub test_case: Option<String>,
    pub required: bool,
    pub results: Vec<TestResult>,
    pub status: SequenceStatus,
    /// Endpoint name the run is suspended at; non-null only while the last
    /// result's status is `wait`.
    pub wait_at: Option<String>,
    /// URL the end user must be navigated to before the wait is satisfied.
    pub redirect_to: Option<String>,
    /// Sequence names queued to run after this one completes.
    pub next_sequences: Vec<String>,
    /// RFC 3339 timestamp string.
    pub created_at: String,
}

impl SequenceResult {
    pub fn is_waiting(&self) -> bool {
        self.wait_at.is_some()
    }

    /// Terminal means no further tests will run without a fresh start.
    pub fn is_terminal(&self) -> bool {
        self.wait_at.is_none()
            && matches!(
                self.status,
                SequenceStatus::Pass
                    | SequenceStatus::Fail
                    | SequenceStatus::Error
                    | SequenceStatus::Cancel
            )
    }

    pub fn last_result(&self) -> Option<&TestResult> {
        self.results.last()
    }
}
