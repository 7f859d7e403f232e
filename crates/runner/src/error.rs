use crucible_storage::StorageError;

/// Errors returned by the runner's public operations. These are caller
/// mistakes or infrastructure failures -- never test outcomes, which are
/// recorded on results instead.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// `resume` was invoked on a result that is not waiting for a callback.
    #[error("no pending wait on sequence result {id}")]
    NoPendingWait { id: String },

    /// No sequence result with the given id exists.
    #[error("sequence result not found: {id}")]
    ResultNotFound { id: String },

    /// The named sequence is not registered.
    #[error("unknown sequence: {name}")]
    UnknownSequence { name: String },

    /// The resume-correlation token did not verify.
    #[error(transparent)]
    Token(#[from] crate::token::TokenError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
