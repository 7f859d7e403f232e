//! `ureq`-backed implementation of the outbound HTTP collaborator.
//!
//! Calls are synchronous and bounded by the agent's global timeout. The
//! server under test is expected to answer with protocol-level errors
//! (4xx/5xx) that tests assert on, so status errors are disabled and every
//! response comes back as data.

use std::time::Duration;

use crucible_core::{HttpClient, HttpError, HttpRequest, HttpResponse};
use ureq::Agent;

/// Default per-call timeout for requests against the server under test.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct UreqClient {
    agent: Agent,
}

impl UreqClient {
    pub fn new() -> UreqClient {
        UreqClient::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> UreqClient {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .into();
        UreqClient { agent }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        UreqClient::new()
    }
}

impl HttpClient for UreqClient {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let response = match request.method.as_str() {
            "GET" => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            "POST" => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send(request.body.as_deref().unwrap_or(""))
            }
            "DELETE" => {
                let mut builder = self.agent.delete(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            other => {
                return Err(HttpError {
                    message: format!("unsupported HTTP method: {}", other),
                })
            }
        };

        let response = response.map_err(|e| HttpError {
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or("").to_string(),
                )
            })
            .collect();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| HttpError {
                message: format!("failed to read response body: {}", e),
            })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
