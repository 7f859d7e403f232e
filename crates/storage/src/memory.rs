//! In-memory reference backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crucible_core::{Context, SequenceResult};

use crate::error::StorageError;
use crate::traits::Repository;

/// Reference `Repository` over `RwLock`-guarded maps. Write order per
/// instance is preserved so `list` reflects creation order, which the
/// aggregator's tie-breaking depends on.
#[derive(Default)]
pub struct MemoryRepository {
    results: RwLock<BTreeMap<String, SequenceResult>>,
    /// Per-instance result ids in write order.
    instance_index: RwLock<BTreeMap<String, Vec<String>>>,
    contexts: RwLock<BTreeMap<String, Context>>,
}

impl MemoryRepository {
    pub fn new() -> MemoryRepository {
        MemoryRepository::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn load(&self, id: &str) -> Result<Option<SequenceResult>, StorageError> {
        Ok(self.results.read().await.get(id).cloned())
    }

    async fn save(&self, result: &SequenceResult) -> Result<(), StorageError> {
        let mut results = self.results.write().await;
        if !results.contains_key(&result.id) {
            self.instance_index
                .write()
                .await
                .entry(result.instance_id.clone())
                .or_default()
                .push(result.id.clone());
        }
        results.insert(result.id.clone(), result.clone());
        Ok(())
    }

    async fn list(&self, instance_id: &str) -> Result<Vec<SequenceResult>, StorageError> {
        let index = self.instance_index.read().await;
        let results = self.results.read().await;
        Ok(index
            .get(instance_id)
            .into_iter()
            .flatten()
            .filter_map(|id| results.get(id).cloned())
            .collect())
    }

    async fn load_context(&self, instance_id: &str) -> Result<Context, StorageError> {
        self.contexts
            .read()
            .await
            .get(instance_id)
            .cloned()
            .ok_or_else(|| StorageError::ContextNotFound {
                instance_id: instance_id.to_string(),
            })
    }

    async fn save_context(
        &self,
        instance_id: &str,
        context: &Context,
    ) -> Result<(), StorageError> {
        self.contexts
            .write()
            .await
            .insert(instance_id.to_string(), context.clone());
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_core::SequenceStatus;

    fn sequence_result(id: &str, instance_id: &str) -> SequenceResult {
        SequenceResult {
            id: id.to_string(),
            instance_id: instance_id.to_string(),
            sequence_name: "capability".to_string(),
            test_case: None,
            required: true,
            results: Vec::new(),
            status: SequenceStatus::Pass,
            wait_at: None,
            redirect_to: None,
            next_sequences: Vec::new(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let repo = MemoryRepository::new();
        repo.save(&sequence_result("r1", "inst")).await.unwrap();
        let loaded = repo.load("r1").await.unwrap().unwrap();
        assert_eq!(loaded.sequence_name, "capability");
        assert!(repo.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_is_an_upsert() {
        let repo = MemoryRepository::new();
        let mut result = sequence_result("r1", "inst");
        repo.save(&result).await.unwrap();
        result.status = SequenceStatus::Fail;
        repo.save(&result).await.unwrap();
        let loaded = repo.load("r1").await.unwrap().unwrap();
        assert_eq!(loaded.status, SequenceStatus::Fail);
        assert_eq!(repo.list("inst").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_preserves_write_order_per_instance() {
        let repo = MemoryRepository::new();
        repo.save(&sequence_result("z", "inst")).await.unwrap();
        repo.save(&sequence_result("a", "inst")).await.unwrap();
        repo.save(&sequence_result("x", "other")).await.unwrap();
        let ids: Vec<String> = repo
            .list("inst")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[tokio::test]
    async fn context_round_trip_and_missing() {
        let repo = MemoryRepository::new();
        assert!(matches!(
            repo.load_context("inst").await,
            Err(StorageError::ContextNotFound { .. })
        ));
        let mut context = Context::new();
        context.seed("server_url", serde_json::json!("https://example.test"));
        repo.save_context("inst", &context).await.unwrap();
        let loaded = repo.load_context("inst").await.unwrap();
        assert_eq!(loaded.get_str("server_url"), Some("https://example.test"));
    }
}
