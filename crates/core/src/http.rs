//! Outbound HTTP collaborator seam.
//!
//! Test bodies issue requests through an injected `HttpClient`; the runner
//! only requires that each call's method/URL/headers/body and the
//! response's status/headers/body be retrievable afterward so they can be
//! attached to the recorded result. The `ureq`-backed implementation lives
//! in `crucible-runner`; tests use scripted in-memory clients.

use std::fmt;

/// A single outbound request as issued by a test body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> HttpRequest {
        HttpRequest {
            method: "GET".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> HttpRequest {
        HttpRequest {
            method: "POST".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> HttpRequest {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The response to an outbound request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the response body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, HttpError> {
        serde_json::from_str(&self.body).map_err(|e| HttpError {
            message: format!("response body is not valid JSON: {}", e),
        })
    }
}

/// Transport-level failure (connect, timeout, TLS). Protocol-level
/// non-2xx responses are returned as `HttpResponse`, not as errors.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for HttpError {}

/// The injected client test bodies call through.
///
/// Calls are synchronous and bounded by the implementation's own timeout
/// policy; they never define a suspension point.
pub trait HttpClient: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError>;
}
