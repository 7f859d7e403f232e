//! crucible-runner: the sequence execution engine.
//!
//! Pulls tests from the registry in order, executes them against the
//! instance's context, persists the sequence result incrementally, and
//! implements the suspend/resume protocol for tests that depend on an
//! out-of-band HTTP redirect. Execution within one sequence result is
//! strictly sequential; independent sequence results run concurrently
//! relative to each other and share no mutable context.

pub mod engine;
pub mod error;
pub mod http;
pub mod observer;
pub mod token;

pub use engine::SequenceRunner;
pub use error::RunnerError;
pub use http::UreqClient;
pub use observer::{ChannelObserver, LogObserver, NullObserver, ProgressObserver, ProgressUpdate};
pub use token::{ResumeClaims, TokenError, TokenSigner};
