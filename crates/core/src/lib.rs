//! crucible-core: data model for the Crucible conformance harness.
//!
//! Defines the typed outcome model, the per-session context store, test and
//! sequence definitions, the read-only sequence registry, result records,
//! and result aggregation. Execution lives in `crucible-runner`; this crate
//! is pure model plus the seams (HTTP collaborator trait, test session)
//! that test bodies are written against.

pub mod aggregate;
pub mod context;
pub mod http;
pub mod outcome;
pub mod registry;
pub mod result;
pub mod sequence;
pub mod session;

pub use aggregate::{
    group_status, instance_passed, latest_results, sequence_status, summarize, GroupStatus,
    ResultSummary,
};
pub use context::{Context, ContextError, CALLBACK_PARAMS_KEY};
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse};
pub use outcome::{Signal, TestOutcome, TestStatus};
pub use registry::{RegistryBuilder, RegistryError, SequenceRegistry};
pub use result::{RequestRecord, SequenceResult, SequenceStatus, TestResult};
pub use sequence::SequenceDefinition;
pub use session::{assert_that, CorrelationSource, TestSession};
pub use test::{TestBody, TestDefinition};
