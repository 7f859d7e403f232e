//! Shared server state.

use std::sync::Arc;

use crucible_core::{RegistryError, SequenceRegistry};
use crucible_runner::{LogObserver, SequenceRunner, UreqClient};
use crucible_storage::{MemoryRepository, Repository};

/// State shared across request handlers. The repository is the process's
/// single store; the runner enforces one writer per sequence result by
/// construction (each run call owns its result until it returns).
pub(crate) struct AppState {
    pub(crate) registry: Arc<SequenceRegistry>,
    pub(crate) repository: Arc<MemoryRepository>,
    pub(crate) runner: SequenceRunner,
}

impl AppState {
    pub(crate) fn new() -> Result<AppState, RegistryError> {
        let registry = Arc::new(crucible_suites::build_registry()?);
        let repository = Arc::new(MemoryRepository::new());
        let runner = SequenceRunner::new(
            Arc::clone(&registry),
            Arc::clone(&repository) as Arc<dyn Repository>,
            Arc::new(UreqClient::new()),
        )
        .with_observer(Arc::new(LogObserver));
        Ok(AppState {
            registry,
            repository,
            runner,
        })
    }

    pub(crate) fn new_instance_id() -> String {
        format!("{:016x}", rand::random::<u64>())
    }
}
