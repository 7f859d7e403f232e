//! Per-test execution view handed to a test body.
//!
//! A `TestSession` wraps the sequence's context, the injected HTTP client,
//! a warning sink for soft assertions, and the transient request log the
//! runner attaches to the recorded result. One session is constructed per
//! test invocation; the request log therefore only ever holds the calls
//! made by the current body.

use serde_json::Value;

use crate::context::Context;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::outcome::{Signal, TestOutcome};
use crate::result::RequestRecord;

/// Hard assertion helper: a false condition fails the test.
pub fn assert_that(condition: bool, message: impl Into<String>) -> TestOutcome {
    if condition {
        Ok(())
    } else {
        Err(Signal::fail(message))
    }
}

/// Source of signed correlation tokens binding the running sequence result
/// to a wait endpoint. A body that suspends for an external redirect embeds
/// such a token in the redirect URL so the callback can be tied back to the
/// suspended run. Implemented by the runner; absent in bare test setups.
pub trait CorrelationSource: Send + Sync {
    fn token(&self, endpoint: &str) -> String;
}

pub struct TestSession<'a> {
    context: &'a mut Context,
    client: &'a dyn HttpClient,
    correlation: Option<&'a dyn CorrelationSource>,
    warnings: Vec<String>,
    requests: Vec<RequestRecord>,
}

impl<'a> TestSession<'a> {
    pub fn new(context: &'a mut Context, client: &'a dyn HttpClient) -> TestSession<'a> {
        TestSession {
            context,
            client,
            correlation: None,
            warnings: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn with_correlation(mut self, source: &'a dyn CorrelationSource) -> TestSession<'a> {
        self.correlation = Some(source);
        self
    }

    /// A signed token for the given wait endpoint. An Error outcome when no
    /// correlation source is installed: suspending tests only make sense
    /// under the runner.
    pub fn correlation_token(&self, endpoint: &str) -> Result<String, Signal> {
        match self.correlation {
            Some(source) => Ok(source.token(endpoint)),
            None => Err(Signal::error(
                "no correlation source installed; cannot build a resume token",
            )),
        }
    }

    pub fn context(&self) -> &Context {
        self.context
    }

    /// Read a context value the sequence depends on, self-skipping when it
    /// was never established by an earlier sequence or operator input.
    pub fn require(&self, key: &str) -> Result<Value, Signal> {
        self.context
            .get(key)
            .cloned()
            .ok_or_else(|| Signal::skip(format!("required context value '{}' is missing", key)))
    }

    /// String form of `require` for the common case.
    pub fn require_str(&self, key: &str) -> Result<String, Signal> {
        match self.require(key)? {
            Value::String(s) => Ok(s),
            other => Err(Signal::error(format!(
                "context value '{}' is not a string: {}",
                key, other
            ))),
        }
    }

    /// Write a declared context key. An undeclared key is a defect in the
    /// test body and surfaces as an Error outcome, not a Fail.
    pub fn put(&mut self, key: &str, value: Value) -> TestOutcome {
        self.context
            .set(key, value)
            .map_err(|e| Signal::error(e.to_string()))
    }

    /// A parameter from the external callback that satisfied the most
    /// recent wait, if one has arrived.
    pub fn callback_param(&self, name: &str) -> Option<String> {
        self.context.callback_param(name).map(str::to_string)
    }

    /// Soft assertion: a false condition records a warning on the result
    /// instead of changing its status.
    pub fn warn_unless(&mut self, condition: bool, message: impl Into<String>) {
        if !condition {
            self.warnings.push(message.into());
        }
    }

    /// Record a warning directly (e.g. forwarded validator warnings).
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    // ── Outbound calls ────────────────────────────────────────────────────

    /// Issue a request, recording it for attachment to the result.
    /// Transport failure is an Error outcome: the harness could not reach
    /// the server, which is never a plain assertion failure.
    pub fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, Signal> {
        match self.client.execute(&request) {
            Ok(response) => {
                self.requests.push(RequestRecord::from_exchange(&request, &response));
                Ok(response)
            }
            Err(e) => {
                self.requests.push(RequestRecord::from_failure(&request));
                Err(Signal::error(format!(
                    "request to {} failed: {}",
                    request.url, e
                )))
            }
        }
    }

    /// GET a URL with optional bearer token, expecting a JSON body.
    pub fn get_json(
        &mut self,
        url: &str,
        token: Option<&str>,
    ) -> Result<(HttpResponse, Value), Signal> {
        let mut request = HttpRequest::get(url).header("Accept", "application/json");
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        let response = self.execute(request)?;
        let json = response
            .json()
            .map_err(|e| Signal::fail_with(e.to_string(), Value::String(response.body.clone())))?;
        Ok((response, json))
    }

    /// POST a form body (`application/x-www-form-urlencoded`).
    pub fn post_form(
        &mut self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpResponse, Signal> {
        let body = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = HttpRequest::post(url, body)
            .header("Content-Type", "application/x-www-form-urlencoded");
        self.execute(request)
    }

    /// Consume the session, yielding the warnings and request log the
    /// runner attaches to the recorded result.
    pub fn finish(self) -> (Vec<String>, Vec<RequestRecord>) {
        (self.warnings, self.requests)
    }
}

/// Percent-encode a form component. Unreserved characters per RFC 3986
/// pass through; everything else is `%XX`-escaped.
fn urlencode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
