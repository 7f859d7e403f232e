use async_trait::async_trait;

use crucible_core::{Context, SequenceResult};

use crate::error::StorageError;

/// Durable storage for sequence results and instance contexts.
///
/// ## Upsert semantics
///
/// `save` and `save_context` are whole-record upserts: the stored record is
/// replaced atomically. The runner persists the full `SequenceResult` after
/// every test, so partial-write recovery is never needed.
///
/// ## Writer discipline
///
/// A single logical session is never advanced concurrently: callers must
/// ensure at most one writer per sequence-result id at a time. No
/// cross-session locking is required since sessions share no mutable state.
///
/// ## Thread safety
///
/// Implementations must be `Send + Sync + 'static` to be shared across the
/// serve layer's async tasks.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Load a sequence result by id. `Ok(None)` when it does not exist.
    async fn load(&self, id: &str) -> Result<Option<SequenceResult>, StorageError>;

    /// Upsert a sequence result.
    async fn save(&self, result: &SequenceResult) -> Result<(), StorageError>;

    /// All sequence results recorded for an instance, in write order.
    async fn list(&self, instance_id: &str) -> Result<Vec<SequenceResult>, StorageError>;

    /// Load an instance's context.
    ///
    /// Returns `Err(StorageError::ContextNotFound)` if the instance has no
    /// stored context.
    async fn load_context(&self, instance_id: &str) -> Result<Context, StorageError>;

    /// Upsert an instance's context.
    async fn save_context(&self, instance_id: &str, context: &Context)
        -> Result<(), StorageError>;
}
