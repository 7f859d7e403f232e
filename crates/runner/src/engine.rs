//! Sequence execution: start, resume, cancel.
//!
//! State machine per sequence result:
//! `NotStarted -> Running -> {Waiting | Terminal}`; `Waiting -> Running`
//! on resume; terminal states are pass/fail/error/cancel. Fail, Error,
//! Skip, and Todo outcomes never abort the loop; only Wait/Redirect (and
//! an operator cancel) stop it early. An uncaught panic inside a test
//! body is contained here and recorded as an Error result -- the runner
//! itself never crashes because of a misbehaving body.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crucible_core::{
    sequence_status, Context, CorrelationSource, HttpClient, SequenceDefinition, SequenceResult,
    SequenceStatus, Signal, TestOutcome, TestResult, TestSession, TestStatus,
};
use crucible_storage::{Repository, StorageError};

use crate::error::RunnerError;
use crate::observer::{NullObserver, ProgressObserver, ProgressUpdate};
use crate::token::TokenSigner;

pub struct SequenceRunner {
    registry: Arc<crucible_core::SequenceRegistry>,
    repository: Arc<dyn Repository>,
    client: Arc<dyn HttpClient>,
    observer: Arc<dyn ProgressObserver>,
    signer: Arc<TokenSigner>,
}

impl SequenceRunner {
    pub fn new(
        registry: Arc<crucible_core::SequenceRegistry>,
        repository: Arc<dyn Repository>,
        client: Arc<dyn HttpClient>,
    ) -> SequenceRunner {
        SequenceRunner {
            registry,
            repository,
            client,
            observer: Arc::new(NullObserver),
            signer: Arc::new(TokenSigner::generate()),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> SequenceRunner {
        self.observer = observer;
        self
    }

    pub fn with_signer(mut self, signer: Arc<TokenSigner>) -> SequenceRunner {
        self.signer = signer;
        self
    }

    pub fn registry(&self) -> &crucible_core::SequenceRegistry {
        &self.registry
    }

    /// Start (or re-enter) a sequence for an instance. Creates a fresh
    /// sequence result, loads the instance context, and runs every test
    /// from the top. Returns the result whether it completed or suspended.
    pub async fn start(
        &self,
        instance_id: &str,
        sequence_name: &str,
    ) -> Result<SequenceResult, RunnerError> {
        let sequence = self
            .registry
            .sequence(sequence_name)
            .ok_or_else(|| RunnerError::UnknownSequence {
                name: sequence_name.to_string(),
            })?;

        let mut context = match self.repository.load_context(instance_id).await {
            Ok(context) => context,
            Err(StorageError::ContextNotFound { .. }) => Context::new(),
            Err(e) => return Err(e.into()),
        };
        context.allow_keys(sequence.declared_keys().iter().map(|k| k.to_string()));

        let mut result = SequenceResult {
            id: generate_id(),
            instance_id: instance_id.to_string(),
            sequence_name: sequence.name.clone(),
            test_case: sequence.test_case.clone(),
            required: sequence.required,
            results: Vec::new(),
            status: SequenceStatus::Pass,
            wait_at: None,
            redirect_to: None,
            next_sequences: Vec::new(),
            created_at: now_rfc3339(),
        };

        self.run(sequence, &mut result, &mut context).await?;
        self.repository.save_context(instance_id, &context).await?;
        Ok(result)
    }

    /// Resume a suspended sequence result after its external callback
    /// arrived. The last result's `wait` is corrected to `pass` (the wait
    /// has been satisfied), callback parameters merge into the context,
    /// and execution continues from the recorded position. Already-recorded
    /// tests are never re-executed.
    pub async fn resume(
        &self,
        result_id: &str,
        callback_params: BTreeMap<String, String>,
    ) -> Result<SequenceResult, RunnerError> {
        let mut result = self
            .repository
            .load(result_id)
            .await?
            .ok_or_else(|| RunnerError::ResultNotFound {
                id: result_id.to_string(),
            })?;

        let waiting = result.wait_at.is_some()
            && result
                .last_result()
                .is_some_and(|r| r.status == TestStatus::Wait);
        if !waiting {
            return Err(RunnerError::NoPendingWait {
                id: result_id.to_string(),
            });
        }

        if let Some(last) = result.results.last_mut() {
            last.status = TestStatus::Pass;
            last.message = Some("callback received".to_string());
        }
        result.wait_at = None;
        result.redirect_to = None;
        result.status = sequence_status(&result.results);
        self.repository.save(&result).await?;

        let sequence = self
            .registry
            .sequence(&result.sequence_name)
            .ok_or_else(|| RunnerError::UnknownSequence {
                name: result.sequence_name.clone(),
            })?;
        let mut context = self.repository.load_context(&result.instance_id).await?;
        context.allow_keys(sequence.declared_keys().iter().map(|k| k.to_string()));
        context.merge_callback(callback_params);

        self.run(sequence, &mut result, &mut context).await?;
        self.repository
            .save_context(&result.instance_id, &context)
            .await?;
        Ok(result)
    }

    /// Verify a correlation token without resuming. Callback handlers use
    /// this to check the token's endpoint against the one they serve.
    pub fn verify_token(&self, token: &str) -> Result<crate::token::ResumeClaims, RunnerError> {
        Ok(self.signer.verify(token)?)
    }

    /// Resume via a signed correlation token from a redirect callback.
    pub async fn resume_with_token(
        &self,
        token: &str,
        callback_params: BTreeMap<String, String>,
    ) -> Result<SequenceResult, RunnerError> {
        let claims = self.signer.verify(token)?;
        self.resume(&claims.result_id, callback_params).await
    }

    /// Operator-initiated abort. Idempotent: cancelling an already-terminal
    /// result is a no-op. Every unexecuted test is filled in with a
    /// cancelled result so the suite's shape stays fully populated.
    pub async fn cancel(
        &self,
        result_id: &str,
        reason: &str,
    ) -> Result<SequenceResult, RunnerError> {
        let mut result = self
            .repository
            .load(result_id)
            .await?
            .ok_or_else(|| RunnerError::ResultNotFound {
                id: result_id.to_string(),
            })?;
        if result.is_terminal() {
            return Ok(result);
        }

        let sequence = self
            .registry
            .sequence(&result.sequence_name)
            .ok_or_else(|| RunnerError::UnknownSequence {
                name: result.sequence_name.clone(),
            })?;

        if let Some(last) = result.results.last_mut() {
            last.status = TestStatus::Cancel;
            last.message = Some(reason.to_string());
        }
        for (index, test) in sequence
            .tests
            .iter()
            .enumerate()
            .skip(result.results.len())
        {
            result.results.push(TestResult {
                test_id: test.id.clone(),
                name: test.title.clone(),
                index,
                status: TestStatus::Cancel,
                message: Some(reason.to_string()),
                detail: None,
                required: test.required,
                warnings: Vec::new(),
                requests: Vec::new(),
                created_at: now_rfc3339(),
            });
        }
        result.wait_at = None;
        result.redirect_to = None;
        result.status = SequenceStatus::Cancel;
        self.repository.save(&result).await?;
        Ok(result)
    }

    /// Execute tests from the recorded resume point until the sequence
    /// completes or suspends. The result is persisted after every test.
    async fn run(
        &self,
        sequence: &SequenceDefinition,
        result: &mut SequenceResult,
        context: &mut Context,
    ) -> Result<(), RunnerError> {
        let resume_point = result.results.len();
        let total = sequence.total_tests();

        for (index, test) in sequence.tests.iter().enumerate().skip(resume_point) {
            let correlation = Correlation {
                signer: Arc::clone(&self.signer),
                result_id: result.id.clone(),
            };

            let (outcome, warnings, requests) = {
                let mut session =
                    TestSession::new(context, self.client.as_ref()).with_correlation(&correlation);
                let outcome: TestOutcome =
                    match catch_unwind(AssertUnwindSafe(|| (test.body)(&mut session))) {
                        Ok(outcome) => outcome,
                        Err(panic) => Err(Signal::error(panic_message(panic.as_ref()))),
                    };
                let (warnings, requests) = session.finish();
                (outcome, warnings, requests)
            };

            let (status, message, detail, wait) = translate(outcome);
            result.results.push(TestResult {
                test_id: test.id.clone(),
                name: test.title.clone(),
                index,
                status,
                message,
                detail,
                required: test.required,
                warnings,
                requests,
                created_at: now_rfc3339(),
            });
            if let Some(directive) = &wait {
                result.wait_at = Some(directive.endpoint.clone());
                result.redirect_to = directive.redirect.clone();
            }
            result.status = sequence_status(&result.results);
            self.repository.save(result).await?;

            self.observer.on_progress(ProgressUpdate {
                sequence_name: sequence.name.clone(),
                completed: result.results.len(),
                total,
                last_outcome: status,
            });

            if wait.is_some() {
                break;
            }
        }
        Ok(())
    }
}

/// Wait directive carried out of a suspension outcome.
struct WaitDirective {
    endpoint: String,
    redirect: Option<String>,
}

/// Translate a body outcome into result fields. The runner is the single
/// boundary where signals are caught; nothing escapes it.
fn translate(
    outcome: TestOutcome,
) -> (
    TestStatus,
    Option<String>,
    Option<serde_json::Value>,
    Option<WaitDirective>,
) {
    match outcome {
        Ok(()) => (TestStatus::Pass, None, None, None),
        Err(Signal::Fail { message, detail }) => (TestStatus::Fail, Some(message), detail, None),
        Err(Signal::Error { message }) => (
            TestStatus::Error,
            Some(format!("Fatal Error: {}", message)),
            None,
            None,
        ),
        Err(Signal::Skip { message }) => (TestStatus::Skip, Some(message), None, None),
        Err(Signal::Todo { message }) => (TestStatus::Todo, Some(message), None, None),
        Err(Signal::Wait { endpoint }) => (
            TestStatus::Wait,
            Some(format!("waiting for callback at '{}'", endpoint)),
            None,
            Some(WaitDirective {
                endpoint,
                redirect: None,
            }),
        ),
        Err(Signal::Redirect { url, endpoint }) => (
            TestStatus::Wait,
            Some(format!(
                "redirecting user to '{}'; waiting for callback at '{}'",
                url, endpoint
            )),
            None,
            Some(WaitDirective {
                endpoint,
                redirect: Some(url),
            }),
        ),
    }
}

struct Correlation {
    signer: Arc<TokenSigner>,
    result_id: String,
}

impl CorrelationSource for Correlation {
    fn token(&self, endpoint: &str) -> String {
        self.signer.sign(&self.result_id, endpoint)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "test body panicked".to_string()
    }
}

fn generate_id() -> String {
    format!("{:016x}{:016x}", rand::random::<u64>(), rand::random::<u64>())
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}
