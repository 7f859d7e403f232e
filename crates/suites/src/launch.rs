//! Standalone authorization launch: the suspend/resume sequence.
//!
//! Test 1 builds the authorization URL (with the signed correlation token
//! as the OAuth `state` parameter) and signals Redirect; the runner
//! suspends there. Once the authorization server redirects the user back
//! to the harness's callback endpoint, the run resumes: test 2 inspects
//! the delivered parameters and test 3 exchanges the code for a token.

use crucible_core::{assert_that, SequenceDefinition, Signal, TestDefinition};
use serde_json::{json, Value};

/// Endpoint name the callback handler routes to.
pub const LAUNCH_ENDPOINT: &str = "launch";

pub fn sequence() -> SequenceDefinition {
    SequenceDefinition::new("standalone_launch", "SAL")
        .title("Standalone authorization launch")
        .description(
            "Walks the authorization-code flow: redirects the user to the \
             authorization endpoint, waits for the callback, and exchanges \
             the returned code for an access token.",
        )
        .test_case("auth")
        .requires(["authorize_url", "token_url", "client_id", "redirect_uri"])
        .defines(["auth_code", "access_token"])
        .test(
            TestDefinition::new("User is redirected to the authorization endpoint", |session| {
                let authorize_url = session.require_str("authorize_url")?;
                let client_id = session.require_str("client_id")?;
                let redirect_uri = session.require_str("redirect_uri")?;
                let state = session.correlation_token(LAUNCH_ENDPOINT)?;
                let url = format!(
                    "{}?response_type=code&client_id={}&redirect_uri={}&state={}",
                    authorize_url, client_id, redirect_uri, state
                );
                Err(Signal::redirect(url, LAUNCH_ENDPOINT))
            })
            .description(
                "The harness cannot complete this step itself; an end user \
                 must authorize the request in a browser.",
            ),
        )
        .test(
            TestDefinition::new("Callback delivered an authorization code", |session| {
                if let Some(error) = session.callback_param("error") {
                    return Err(Signal::fail(format!(
                        "authorization server returned error '{}'",
                        error
                    )));
                }
                let code = session
                    .callback_param("code")
                    .ok_or_else(|| Signal::fail("callback did not include a code parameter"))?;
                session.put("auth_code", json!(code))
            }),
        )
        .test(
            TestDefinition::new("Code exchanges for an access token", |session| {
                let token_url = session.require_str("token_url")?;
                let client_id = session.require_str("client_id")?;
                let redirect_uri = session.require_str("redirect_uri")?;
                let code = session.require_str("auth_code")?;
                let response = session.post_form(
                    &token_url,
                    &[
                        ("grant_type", "authorization_code"),
                        ("code", &code),
                        ("client_id", &client_id),
                        ("redirect_uri", &redirect_uri),
                    ],
                )?;
                assert_that(
                    response.status == 200,
                    format!("token endpoint returned {}", response.status),
                )?;
                let body = response.json().map_err(|e| {
                    Signal::fail_with(e.to_string(), Value::String(response.body.clone()))
                })?;
                let access_token = body
                    .get("access_token")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        Signal::fail_with("token response has no access_token", body.clone())
                    })?;
                session.warn_unless(
                    body.get("token_type")
                        .and_then(Value::as_str)
                        .is_some_and(|t| t.eq_ignore_ascii_case("bearer")),
                    "token_type is not 'bearer'",
                );
                session.put("access_token", json!(access_token))
            })
            .reference("https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.3"),
        )
        .test(
            TestDefinition::new("Token response scopes the granted access", |_session| {
                Err(Signal::todo(
                    "scope narrowing checks are not implemented yet",
                ))
            })
            .optional(),
        )
}
