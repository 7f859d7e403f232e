/// All errors that can be returned by a Repository implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No sequence result with the given id.
    #[error("sequence result not found: {id}")]
    ResultNotFound { id: String },

    /// No context stored for the given instance.
    #[error("context not found for instance: {instance_id}")]
    ContextNotFound { instance_id: String },

    /// Record could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A backend-specific storage error (connection, I/O, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
