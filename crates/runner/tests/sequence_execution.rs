//! Integration tests for the sequence execution engine: full runs,
//! suspend/resume, cancellation, and the runner boundary.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use crucible_core::{
    assert_that, HttpClient, HttpError, HttpRequest, HttpResponse, RegistryBuilder,
    SequenceDefinition, SequenceRegistry, SequenceStatus, Signal, TestDefinition, TestStatus,
};
use crucible_runner::{ChannelObserver, RunnerError, SequenceRunner};
use crucible_storage::{MemoryRepository, Repository};

/// Client that answers every request with a fixed JSON body.
struct CannedClient;

impl HttpClient for CannedClient {
    fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        Ok(HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: "{\"resourceType\":\"Patient\",\"id\":\"example\"}".to_string(),
        })
    }
}

fn runner_for(registry: SequenceRegistry) -> (SequenceRunner, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::new());
    let runner = SequenceRunner::new(
        Arc::new(registry),
        Arc::clone(&repository) as Arc<dyn Repository>,
        Arc::new(CannedClient),
    );
    (runner, repository)
}

fn straight_through_registry() -> SequenceRegistry {
    let mut builder = RegistryBuilder::new();
    builder
        .register(
            SequenceDefinition::new("demo", "DM")
                .title("Demo sequence")
                .defines(["patient_id"])
                .test(TestDefinition::new("fetch patient", |session| {
                    let (response, body) =
                        session.get_json("https://example.test/Patient/example", None)?;
                    assert_that(response.status == 200, "expected 200")?;
                    let id = body["id"].as_str().unwrap_or_default().to_string();
                    session.put("patient_id", json!(id))
                }))
                .test(TestDefinition::new("check id", |session| {
                    let id = session.require_str("patient_id")?;
                    assert_that(id == "example", format!("unexpected id '{}'", id))
                }))
                .test(
                    TestDefinition::new("optional extras", |session| {
                        session.warn_unless(false, "no extras supported");
                        Ok(())
                    })
                    .optional(),
                ),
        )
        .unwrap();
    builder.build()
}

fn waiting_registry() -> SequenceRegistry {
    let mut builder = RegistryBuilder::new();
    builder
        .register(
            SequenceDefinition::new("launch", "LN")
                .defines(["auth_code"])
                .test(TestDefinition::new("prepare", |_session| Ok(())))
                .test(TestDefinition::new("redirect user", |session| {
                    let token = session.correlation_token("launch")?;
                    Err(Signal::redirect(
                        format!("https://auth.example.test/authorize?state={}", token),
                        "launch",
                    ))
                }))
                .test(TestDefinition::new("callback delivered code", |session| {
                    let code = session
                        .callback_param("code")
                        .ok_or_else(|| Signal::fail("callback carried no code"))?;
                    session.put("auth_code", json!(code))
                })),
        )
        .unwrap();
    builder.build()
}

#[tokio::test]
async fn full_run_records_one_result_per_test_in_order() {
    let (runner, _repo) = runner_for(straight_through_registry());
    let result = runner.start("inst", "demo").await.unwrap();

    assert_eq!(result.results.len(), 3);
    for (i, test_result) in result.results.iter().enumerate() {
        assert_eq!(test_result.index, i);
    }
    assert_eq!(result.results[0].status, TestStatus::Pass);
    assert_eq!(result.results[1].status, TestStatus::Pass);
    assert_eq!(result.status, SequenceStatus::Pass);
    assert!(result.is_terminal());

    // The optional test passed but collected a warning.
    assert_eq!(result.results[2].warnings, vec!["no extras supported"]);
    assert_eq!(result.results[2].status, TestStatus::Pass);

    // The outbound call was attached to the first result.
    assert_eq!(result.results[0].requests.len(), 1);
    assert_eq!(result.results[0].requests[0].method, "GET");
}

#[tokio::test]
async fn context_persists_across_sequences() {
    let (runner, repo) = runner_for(straight_through_registry());
    runner.start("inst", "demo").await.unwrap();
    let context = repo.load_context("inst").await.unwrap();
    assert_eq!(context.get_str("patient_id"), Some("example"));
}

#[tokio::test]
async fn wait_suspends_and_resume_continues() {
    let (runner, repo) = runner_for(waiting_registry());
    let result = runner.start("inst", "launch").await.unwrap();

    assert_eq!(result.results.len(), 2);
    assert_eq!(result.wait_at.as_deref(), Some("launch"));
    assert!(result
        .redirect_to
        .as_deref()
        .is_some_and(|url| url.starts_with("https://auth.example.test/authorize?state=")));
    assert_eq!(result.status, SequenceStatus::Wait);
    assert_eq!(result.results[1].status, TestStatus::Wait);
    assert!(!result.is_terminal());

    let mut params = BTreeMap::new();
    params.insert("code".to_string(), "authcode-1".to_string());
    let resumed = runner.resume(&result.id, params).await.unwrap();

    assert_eq!(resumed.results.len(), 3);
    assert_eq!(resumed.results[1].status, TestStatus::Pass);
    assert_eq!(resumed.results[2].status, TestStatus::Pass);
    assert!(resumed.wait_at.is_none());
    assert_eq!(resumed.status, SequenceStatus::Pass);

    // The callback code landed in the persisted context.
    let context = repo.load_context("inst").await.unwrap();
    assert_eq!(context.get_str("auth_code"), Some("authcode-1"));
}

#[tokio::test]
async fn resume_never_reexecutes_recorded_tests() {
    let (runner, _repo) = runner_for(waiting_registry());
    let result = runner.start("inst", "launch").await.unwrap();
    let recorded_first = result.results[0].created_at.clone();

    let mut params = BTreeMap::new();
    params.insert("code".to_string(), "x".to_string());
    let resumed = runner.resume(&result.id, params).await.unwrap();

    // Earlier results were carried over untouched, and the appended results
    // start at the prior count.
    assert_eq!(resumed.results[0].created_at, recorded_first);
    assert_eq!(resumed.results[2].index, 2);
}

#[tokio::test]
async fn resume_via_signed_token() {
    let (runner, _repo) = runner_for(waiting_registry());
    let result = runner.start("inst", "launch").await.unwrap();

    let redirect = result.redirect_to.clone().unwrap();
    let token = redirect.split("state=").nth(1).unwrap().to_string();

    let mut params = BTreeMap::new();
    params.insert("code".to_string(), "via-token".to_string());
    let resumed = runner.resume_with_token(&token, params).await.unwrap();
    assert_eq!(resumed.id, result.id);
    assert_eq!(resumed.status, SequenceStatus::Pass);
}

#[tokio::test]
async fn resume_with_no_pending_wait_is_a_usage_error() {
    let (runner, _repo) = runner_for(straight_through_registry());
    let result = runner.start("inst", "demo").await.unwrap();
    let err = runner.resume(&result.id, BTreeMap::new()).await.unwrap_err();
    assert!(matches!(err, RunnerError::NoPendingWait { .. }));

    let err = runner.resume("no-such-id", BTreeMap::new()).await.unwrap_err();
    assert!(matches!(err, RunnerError::ResultNotFound { .. }));
}

#[tokio::test]
async fn failing_and_skipping_tests_do_not_abort_the_loop() {
    let mut builder = RegistryBuilder::new();
    builder
        .register(
            SequenceDefinition::new("mixed", "MX")
                .test(TestDefinition::new("fails", |_s| {
                    Err(Signal::fail("expected 200 -- got 404"))
                }))
                .test(TestDefinition::new("skips", |_s| {
                    Err(Signal::skip("no prerequisite resource"))
                }))
                .test(TestDefinition::new("todo", |_s| {
                    Err(Signal::todo("not implemented yet"))
                }))
                .test(TestDefinition::new("still runs", |_s| Ok(()))),
        )
        .unwrap();
    let (runner, _repo) = runner_for(builder.build());

    let result = runner.start("inst", "mixed").await.unwrap();
    assert_eq!(result.results.len(), 4);
    assert_eq!(result.results[0].status, TestStatus::Fail);
    assert_eq!(result.results[1].status, TestStatus::Skip);
    assert_eq!(result.results[2].status, TestStatus::Todo);
    assert_eq!(result.results[3].status, TestStatus::Pass);
    assert_eq!(result.status, SequenceStatus::Fail);
}

#[tokio::test]
async fn panicking_body_becomes_fatal_error_result() {
    let mut builder = RegistryBuilder::new();
    builder
        .register(
            SequenceDefinition::new("broken", "BR")
                .test(TestDefinition::new("defective body", |_s| {
                    panic!("index out of range");
                }))
                .test(TestDefinition::new("subsequent test", |_s| Ok(()))),
        )
        .unwrap();
    let (runner, _repo) = runner_for(builder.build());

    let result = runner.start("inst", "broken").await.unwrap();
    assert_eq!(result.results[0].status, TestStatus::Error);
    let message = result.results[0].message.as_deref().unwrap();
    assert!(message.starts_with("Fatal Error:"), "got: {}", message);
    assert!(message.contains("index out of range"));
    // The loop continued past the defect.
    assert_eq!(result.results[1].status, TestStatus::Pass);
    assert_eq!(result.status, SequenceStatus::Error);
}

#[tokio::test]
async fn undeclared_context_write_is_an_error_outcome() {
    let mut builder = RegistryBuilder::new();
    builder
        .register(
            SequenceDefinition::new("sloppy", "SL").test(TestDefinition::new(
                "writes undeclared key",
                |session| session.put("never_declared", json!(1)),
            )),
        )
        .unwrap();
    let (runner, _repo) = runner_for(builder.build());

    let result = runner.start("inst", "sloppy").await.unwrap();
    assert_eq!(result.results[0].status, TestStatus::Error);
    assert!(result.results[0]
        .message
        .as_deref()
        .unwrap()
        .contains("undeclared context key"));
}

#[tokio::test]
async fn cancel_fills_shape_and_is_idempotent() {
    let (runner, _repo) = runner_for(waiting_registry());
    let result = runner.start("inst", "launch").await.unwrap();
    assert_eq!(result.results.len(), 2);

    let cancelled = runner.cancel(&result.id, "operator aborted").await.unwrap();
    assert_eq!(cancelled.status, SequenceStatus::Cancel);
    assert!(cancelled.wait_at.is_none());
    // Every registered test is represented by exactly one result.
    assert_eq!(cancelled.results.len(), 3);
    assert_eq!(cancelled.results[1].status, TestStatus::Cancel);
    assert_eq!(cancelled.results[2].status, TestStatus::Cancel);
    assert_eq!(
        cancelled.results[2].message.as_deref(),
        Some("operator aborted")
    );

    let again = runner.cancel(&result.id, "second call").await.unwrap();
    assert_eq!(again.results.len(), 3);
    assert_eq!(
        again.results[2].message.as_deref(),
        Some("operator aborted")
    );
    assert_eq!(again.status, SequenceStatus::Cancel);
}

#[tokio::test]
async fn progress_is_emitted_after_each_test() {
    let (observer, mut receiver) = ChannelObserver::new();
    let repository = Arc::new(MemoryRepository::new());
    let runner = SequenceRunner::new(
        Arc::new(straight_through_registry()),
        repository as Arc<dyn Repository>,
        Arc::new(CannedClient),
    )
    .with_observer(Arc::new(observer));

    runner.start("inst", "demo").await.unwrap();

    let mut updates = Vec::new();
    while let Ok(update) = receiver.try_recv() {
        updates.push(update);
    }
    assert_eq!(updates.len(), 3);
    assert_eq!(updates[0].completed, 1);
    assert_eq!(updates[2].completed, 3);
    assert!(updates.iter().all(|u| u.total == 3));
    assert_eq!(updates[2].last_outcome, TestStatus::Pass);
}

#[tokio::test]
async fn incremental_persistence_survives_suspension() {
    let (runner, repo) = runner_for(waiting_registry());
    let result = runner.start("inst", "launch").await.unwrap();

    // The suspended result is durably stored with its wait marker, so a
    // different process could pick it up.
    let stored = repo.load(&result.id).await.unwrap().unwrap();
    assert_eq!(stored.results.len(), 2);
    assert_eq!(stored.wait_at.as_deref(), Some("launch"));
    assert_eq!(stored.status, SequenceStatus::Wait);
}
